//! # tactus-types
//!
//! Shared type definitions for the tactus arpeggiator.
//! This crate contains the plain data exchanged between the host-facing
//! layer (tactus-core) and the real-time engine (tactus-engine).

pub mod arpeggio;
pub mod control;
pub mod event;

pub use arpeggio::{
    ArpDirection, ArpeggioConfig, ChordShape, Subdivision, MAX_CYCLE, MAX_GATE, MAX_RANGE,
    MAX_SKIP, MIN_RANGE,
};
pub use control::ControlSnapshot;
pub use event::{EventBody, MidiKind, MidiMessage, TimedEvent, TransportUpdate};

/// Highest valid MIDI note number.
pub const MAX_NOTE: u8 = 127;
