//! Interval table built from a chord shape and an octave range.

use tactus_types::{ChordShape, MAX_RANGE, MIN_RANGE};

/// Most notes a chord shape contributes per octave.
pub const NOTES_PER_OCTAVE: usize = 3;
/// Upper bound on table length.
pub const MAX_TABLE_LEN: usize = MAX_RANGE as usize * NOTES_PER_OCTAVE;

/// Ordered semitone offsets above the base note. Stored inline so that
/// rebuilding never touches the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpeggioTable {
    offsets: [u8; MAX_TABLE_LEN],
    len: usize,
}

impl Default for ArpeggioTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl ArpeggioTable {
    pub const fn empty() -> Self {
        Self {
            offsets: [0; MAX_TABLE_LEN],
            len: 0,
        }
    }

    /// Build the table for `range` octaves of `chord`. Range is clamped to
    /// 1..=9; no chord gives an empty table.
    pub fn build(chord: Option<ChordShape>, range: u8) -> Self {
        let mut table = Self::empty();
        let Some(chord) = chord else {
            return table;
        };

        let range = range.clamp(MIN_RANGE, MAX_RANGE);
        for octave in 0..range {
            for &interval in chord.intervals() {
                table.offsets[table.len] = 12 * octave + interval;
                table.len += 1;
            }
        }
        table
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.as_slice().get(index).copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.offsets[..self.len]
    }
}
