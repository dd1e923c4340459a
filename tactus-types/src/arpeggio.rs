use serde::{Deserialize, Serialize};

use crate::control::ControlSnapshot;

/// Smallest arpeggio range, in octaves.
pub const MIN_RANGE: u8 = 1;
/// Largest arpeggio range, in octaves.
pub const MAX_RANGE: u8 = 9;
/// Longest gate, in percent of a step.
pub const MAX_GATE: f32 = 200.0;
/// Most positions that can be silenced at the start of each cycle.
pub const MAX_CYCLE: u8 = 6;
/// Highest skip probability, in percent.
pub const MAX_SKIP: f32 = 100.0;

/// Chord shape the arpeggio is built from, one entry per octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordShape {
    Octave,
    Major,
    Minor,
}

impl ChordShape {
    pub const ALL: [ChordShape; 3] = [ChordShape::Octave, ChordShape::Major, ChordShape::Minor];

    /// Map a host parameter index (0=octave, 1=major, 2=minor).
    pub fn from_index(index: i32) -> Option<ChordShape> {
        match index {
            0 => Some(ChordShape::Octave),
            1 => Some(ChordShape::Major),
            2 => Some(ChordShape::Minor),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            ChordShape::Octave => 0,
            ChordShape::Major => 1,
            ChordShape::Minor => 2,
        }
    }

    /// Semitone offsets inside one octave, in playing order.
    ///
    /// The triads play root, third, then the remaining third of the pair
    /// (major: 0, 4, 3; minor: 0, 3, 4).
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            ChordShape::Octave => &[0],
            ChordShape::Major => &[0, 4, 3],
            ChordShape::Minor => &[0, 3, 4],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChordShape::Octave => "Octave",
            ChordShape::Major => "Major",
            ChordShape::Minor => "Minor",
        }
    }

    pub fn next(&self) -> ChordShape {
        match self {
            ChordShape::Octave => ChordShape::Major,
            ChordShape::Major => ChordShape::Minor,
            ChordShape::Minor => ChordShape::Octave,
        }
    }

    pub fn prev(&self) -> ChordShape {
        match self {
            ChordShape::Octave => ChordShape::Minor,
            ChordShape::Major => ChordShape::Octave,
            ChordShape::Minor => ChordShape::Major,
        }
    }
}

/// Rhythmic length of one arpeggio step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subdivision {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl Subdivision {
    /// Map a host parameter index (0=whole ... 5=1/32).
    pub fn from_index(index: i32) -> Option<Subdivision> {
        match index {
            0 => Some(Subdivision::Whole),
            1 => Some(Subdivision::Half),
            2 => Some(Subdivision::Quarter),
            3 => Some(Subdivision::Eighth),
            4 => Some(Subdivision::Sixteenth),
            5 => Some(Subdivision::ThirtySecond),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Subdivision::Whole => 0,
            Subdivision::Half => 1,
            Subdivision::Quarter => 2,
            Subdivision::Eighth => 3,
            Subdivision::Sixteenth => 4,
            Subdivision::ThirtySecond => 5,
        }
    }

    /// Denominator of the note value (1, 2, 4, 8, 16, 32). Never zero.
    pub fn note_length(&self) -> u32 {
        match self {
            Subdivision::Whole => 1,
            Subdivision::Half => 2,
            Subdivision::Quarter => 4,
            Subdivision::Eighth => 8,
            Subdivision::Sixteenth => 16,
            Subdivision::ThirtySecond => 32,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Subdivision::Whole => "1/1",
            Subdivision::Half => "1/2",
            Subdivision::Quarter => "1/4",
            Subdivision::Eighth => "1/8",
            Subdivision::Sixteenth => "1/16",
            Subdivision::ThirtySecond => "1/32",
        }
    }

    /// Length of one step as a fraction of a bar in the given signature.
    ///
    /// `beat_unit` and `beats_per_bar` are the denominator and numerator of
    /// the time signature; both must be non-zero.
    pub fn fraction_of_bar(&self, beats_per_bar: u32, beat_unit: u32) -> f64 {
        beat_unit as f64 / (self.note_length() as f64 * beats_per_bar as f64)
    }
}

/// Order in which the arpeggio table is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArpDirection {
    Up,
    Down,
    UpDown,
}

impl ArpDirection {
    /// Map a host parameter index (0=up, 1=down, 2=up-down).
    pub fn from_index(index: i32) -> Option<ArpDirection> {
        match index {
            0 => Some(ArpDirection::Up),
            1 => Some(ArpDirection::Down),
            2 => Some(ArpDirection::UpDown),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            ArpDirection::Up => 0,
            ArpDirection::Down => 1,
            ArpDirection::UpDown => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArpDirection::Up => "Up",
            ArpDirection::Down => "Down",
            ArpDirection::UpDown => "Up/Down",
        }
    }

    pub fn next(&self) -> ArpDirection {
        match self {
            ArpDirection::Up => ArpDirection::Down,
            ArpDirection::Down => ArpDirection::UpDown,
            ArpDirection::UpDown => ArpDirection::Up,
        }
    }
}

/// Arpeggiator configuration, resolved from the host's control values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArpeggioConfig {
    /// `None` when the host reported an unknown shape: nothing plays.
    pub chord: Option<ChordShape>,
    pub range: u8,          // 1-9 octaves
    pub subdivision: Subdivision,
    pub gate: f32,          // 0-200 percent of a step
    pub cycle: u8,          // 0-6 positions silenced per cycle
    pub skip: f32,          // 0-100 percent chance to rest
    pub direction: ArpDirection,
}

impl Default for ArpeggioConfig {
    fn default() -> Self {
        Self {
            chord: Some(ChordShape::Octave),
            range: 1,
            subdivision: Subdivision::Quarter,
            gate: 50.0,
            cycle: 0,
            skip: 0.0,
            direction: ArpDirection::Up,
        }
    }
}

impl ArpeggioConfig {
    /// Resolve raw control values against the currently active config.
    ///
    /// Numeric values are clamped to their ranges. An unknown chord index
    /// clears the chord; unknown subdivision or direction indices keep the
    /// values from `previous`.
    pub fn from_controls(controls: &ControlSnapshot, previous: &ArpeggioConfig) -> Self {
        let chord = control_index(controls.chord).and_then(ChordShape::from_index);
        let subdivision = control_index(controls.subdivision)
            .and_then(Subdivision::from_index)
            .unwrap_or(previous.subdivision);
        let direction = control_index(controls.direction)
            .and_then(ArpDirection::from_index)
            .unwrap_or(previous.direction);

        Self {
            chord,
            range: control_index(controls.range)
                .map(|r| r.clamp(MIN_RANGE as i32, MAX_RANGE as i32) as u8)
                .unwrap_or(previous.range),
            subdivision,
            gate: clamp_finite(controls.gate, MAX_GATE).unwrap_or(previous.gate),
            cycle: control_index(controls.cycle)
                .map(|c| c.clamp(0, MAX_CYCLE as i32) as u8)
                .unwrap_or(previous.cycle),
            skip: clamp_finite(controls.skip, MAX_SKIP).unwrap_or(previous.skip),
            direction,
        }
    }
}

/// Host controls arrive as floats; enum and count ports are rounded.
fn control_index(value: f32) -> Option<i32> {
    if value.is_finite() {
        Some(value.round() as i32)
    } else {
        None
    }
}

fn clamp_finite(value: f32, max: f32) -> Option<f32> {
    if value.is_finite() {
        Some(value.clamp(0.0, max))
    } else {
        None
    }
}
