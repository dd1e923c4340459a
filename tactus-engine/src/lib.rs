//! # tactus-engine
//!
//! Real-time arpeggiation core. Everything reachable from
//! [`Arpeggiator::process`] is allocation-free and lock-free, and reports
//! problems through counters instead of logging or failing.

pub mod arp_state;
pub mod arpeggiator;
pub mod chord_table;
pub mod rng;
pub mod scheduler;
pub mod sequence;
pub mod telemetry;
pub mod transport;
pub mod walker;

pub use arp_state::{ArpPlayState, SoundingNote};
pub use arpeggiator::{Arpeggiator, BlockReport};
pub use chord_table::ArpeggioTable;
pub use rng::{RandomSource, ScriptedRandom};
pub use scheduler::{StepScheduler, DEFAULT_VELOCITY};
pub use sequence::EventSequence;
pub use telemetry::BlockTelemetry;
pub use transport::{PlayState, Transport, TransportChange};
pub use walker::{walk, PatternParams, Step};
