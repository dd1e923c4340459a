//! Frame-stamped events flowing into and out of the arpeggiator.
//!
//! Sizes follow the atom-sequence layout plugin hosts use for event ports:
//! every event carries a 16-byte header (frame time, body size, body type)
//! followed by its body padded to 8 bytes.

use serde::{Deserialize, Serialize};

pub const STATUS_NOTE_OFF: u8 = 0x80;
pub const STATUS_NOTE_ON: u8 = 0x90;

/// Bytes taken by the per-event header.
pub const EVENT_HEADER_BYTES: u32 = 16;
/// Bytes taken by the header of a transport object body.
pub const OBJECT_HEADER_BYTES: u32 = 8;
/// Bytes taken by one key/value property of a transport object.
pub const PROPERTY_BYTES: u32 = 16;

/// Round a body size up to the 8-byte event alignment.
pub fn pad_size(size: u32) -> u32 {
    (size + 7) & !7
}

/// A raw three-byte channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiMessage {
    pub bytes: [u8; 3],
}

/// Classification of a [`MidiMessage`] as seen by the arpeggiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiKind {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    Other,
}

impl MidiMessage {
    pub fn new(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            bytes: [status, data1, data2],
        }
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(STATUS_NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F)
    }

    pub fn note_off(channel: u8, note: u8) -> Self {
        Self::new(STATUS_NOTE_OFF | (channel & 0x0F), note & 0x7F, 0)
    }

    pub fn status(&self) -> u8 {
        self.bytes[0]
    }

    pub fn channel(&self) -> u8 {
        self.bytes[0] & 0x0F
    }

    /// Note-on with velocity 0 counts as a note-off.
    pub fn kind(&self) -> MidiKind {
        let [status, data1, data2] = self.bytes;
        match status & 0xF0 {
            STATUS_NOTE_ON if data2 > 0 => MidiKind::NoteOn {
                note: data1,
                velocity: data2,
            },
            STATUS_NOTE_ON | STATUS_NOTE_OFF => MidiKind::NoteOff { note: data1 },
            _ => MidiKind::Other,
        }
    }
}

/// Host transport report; every field is independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportUpdate {
    /// Position within the bar in beats, e.g. 2.031.
    pub bar_beat: Option<f32>,
    pub bpm: Option<f32>,
    /// Fraction of normal speed: 0 is stopped, 1 is playing.
    pub speed: Option<f32>,
    /// Numerator of the time signature.
    pub beats_per_bar: Option<f32>,
    /// Denominator of the time signature.
    pub beat_unit: Option<i32>,
}

impl TransportUpdate {
    pub fn field_count(&self) -> u32 {
        [
            self.bar_beat.is_some(),
            self.bpm.is_some(),
            self.speed.is_some(),
            self.beats_per_bar.is_some(),
            self.beat_unit.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count() as u32
    }

    /// True when this update reports a position inside the first beat of a bar.
    pub fn is_bar_start(&self) -> bool {
        matches!(self.bar_beat, Some(beat) if (0.0..1.0).contains(&beat))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EventBody {
    Transport(TransportUpdate),
    Midi(MidiMessage),
}

impl EventBody {
    /// Unpadded body size in bytes.
    pub fn body_size(&self) -> u32 {
        match self {
            EventBody::Transport(update) => {
                OBJECT_HEADER_BYTES + PROPERTY_BYTES * update.field_count()
            }
            EventBody::Midi(msg) => msg.bytes.len() as u32,
        }
    }
}

/// An event tagged with its frame offset inside the current block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub frame: u32,
    pub body: EventBody,
}

impl TimedEvent {
    pub fn midi(frame: u32, msg: MidiMessage) -> Self {
        Self {
            frame,
            body: EventBody::Midi(msg),
        }
    }

    pub fn transport(frame: u32, update: TransportUpdate) -> Self {
        Self {
            frame,
            body: EventBody::Transport(update),
        }
    }

    /// Bytes this event occupies in an output sequence.
    pub fn wire_size(&self) -> u32 {
        EVENT_HEADER_BYTES + pad_size(self.body.body_size())
    }

    pub fn as_midi(&self) -> Option<&MidiMessage> {
        match &self.body {
            EventBody::Midi(msg) => Some(msg),
            EventBody::Transport(_) => None,
        }
    }
}
