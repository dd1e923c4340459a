//! Direction and modulation walk over an [`ArpeggioTable`].
//!
//! The walk is a pure function of the table, a logical step index and the
//! pattern parameters; the only side effect is the random roll taken for
//! skip probability.

use tactus_types::{ArpDirection, ArpeggioConfig};

use crate::chord_table::ArpeggioTable;
use crate::rng::RandomSource;

/// Outcome of one step of the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Play the table entry at `index`, `offset` semitones above the base note.
    Note { index: usize, offset: u8 },
    Rest,
}

/// The subset of [`ArpeggioConfig`] that shapes the walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternParams {
    pub direction: ArpDirection,
    /// Positions silenced at the start of every cycle.
    pub cycle: u8,
    /// Percent chance that a playable step rests anyway.
    pub skip: f32,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self::from(&ArpeggioConfig::default())
    }
}

impl From<&ArpeggioConfig> for PatternParams {
    fn from(config: &ArpeggioConfig) -> Self {
        Self {
            direction: config.direction,
            cycle: config.cycle,
            skip: config.skip,
        }
    }
}

/// Steps in one full traversal of a table of `len` entries.
pub fn cycle_period(len: usize, direction: ArpDirection) -> usize {
    match direction {
        ArpDirection::Up | ArpDirection::Down => len,
        // Forward then back without repeating either endpoint.
        ArpDirection::UpDown if len > 1 => 2 * len - 2,
        ArpDirection::UpDown => len,
    }
}

/// Table index visited at `position` (which must be below the period).
pub fn table_index(position: usize, len: usize, direction: ArpDirection) -> usize {
    match direction {
        ArpDirection::Up => position,
        ArpDirection::Down => len - 1 - position,
        ArpDirection::UpDown if position < len => position,
        ArpDirection::UpDown => 2 * len - 2 - position,
    }
}

/// Take one step from `step_index`, returning what to play and the next index.
///
/// An empty table rests without advancing. Otherwise the index always
/// advances, wrapping at the cycle period, whether or not the step rests.
pub fn walk<R: RandomSource + ?Sized>(
    table: &ArpeggioTable,
    step_index: u32,
    params: &PatternParams,
    rng: &mut R,
) -> (Step, u32) {
    let len = table.len();
    if len == 0 {
        return (Step::Rest, step_index);
    }

    let period = cycle_period(len, params.direction);
    let position = step_index as usize % period;
    let next = ((position + 1) % period) as u32;

    // At least one position per cycle always survives the cycle skip.
    let silenced = (params.cycle as usize).min(period - 1);
    if position < silenced {
        return (Step::Rest, next);
    }

    if params.skip > 0.0 && rng.percent() < params.skip {
        return (Step::Rest, next);
    }

    let index = table_index(position, len, params.direction);
    match table.get(index) {
        Some(offset) => (Step::Note { index, offset }, next),
        None => (Step::Rest, next),
    }
}
