//! Raw control-port values as the host hands them over each block.

use serde::{Deserialize, Serialize};

use crate::arpeggio::ArpeggioConfig;

/// One sample of every control port, exactly as the host reports it.
///
/// Values are floats because that is what plugin control ports carry;
/// [`ArpeggioConfig::from_controls`] turns them into typed values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSnapshot {
    pub chord: f32,       // 0=octave, 1=major, 2=minor
    pub range: f32,       // 1-9
    pub subdivision: f32, // 0=whole ... 5=1/32
    pub gate: f32,        // 0-200 percent
    pub cycle: f32,       // 0-6
    pub skip: f32,        // 0-100 percent
    pub direction: f32,   // 0=up, 1=down, 2=up-down
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self::from(&ArpeggioConfig::default())
    }
}

impl From<&ArpeggioConfig> for ControlSnapshot {
    fn from(config: &ArpeggioConfig) -> Self {
        Self {
            // Out of the 0..=2 range on purpose: resolves back to "no chord".
            chord: config.chord.map_or(-1.0, |c| c.index() as f32),
            range: config.range as f32,
            subdivision: config.subdivision.index() as f32,
            gate: config.gate,
            cycle: config.cycle as f32,
            skip: config.skip,
            direction: config.direction.index() as f32,
        }
    }
}
