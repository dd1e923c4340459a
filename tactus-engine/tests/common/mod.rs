#![allow(dead_code)]

use tactus_engine::{
    Arpeggiator, BlockReport, EventSequence, RandomSource, ScriptedRandom, Transport,
};
use tactus_types::{ControlSnapshot, MidiKind, MidiMessage, TimedEvent, TransportUpdate};

pub const RATE: f64 = 48_000.0;
/// One beat at 120 BPM.
pub const BEAT: u64 = 24_000;
/// Divides BEAT evenly, so beat-aligned positions fall on block starts.
pub const BLOCK: u32 = 480;

pub fn controls(chord: f32, range: f32, gate: f32) -> ControlSnapshot {
    ControlSnapshot {
        chord,
        range,
        subdivision: 2.0,
        gate,
        cycle: 0.0,
        skip: 0.0,
        direction: 0.0,
    }
}

pub fn transport(frame: u32, update: TransportUpdate) -> TimedEvent {
    TimedEvent::transport(frame, update)
}

pub fn play(frame: u32) -> TimedEvent {
    transport(
        frame,
        TransportUpdate {
            speed: Some(1.0),
            ..TransportUpdate::default()
        },
    )
}

pub fn stop(frame: u32) -> TimedEvent {
    transport(
        frame,
        TransportUpdate {
            speed: Some(0.0),
            ..TransportUpdate::default()
        },
    )
}

pub fn bar(frame: u32, bar_beat: f32) -> TimedEvent {
    transport(
        frame,
        TransportUpdate {
            bar_beat: Some(bar_beat),
            ..TransportUpdate::default()
        },
    )
}

pub fn note_on(frame: u32, note: u8) -> TimedEvent {
    TimedEvent::midi(frame, MidiMessage::note_on(0, note, 100))
}

pub fn note_off(frame: u32, note: u8) -> TimedEvent {
    TimedEvent::midi(frame, MidiMessage::note_off(0, note))
}

/// Drives an arpeggiator block by block and keeps every MIDI event it
/// emits, stamped with its absolute frame.
pub struct Session<R: RandomSource> {
    pub arp: Arpeggiator<R>,
    pub controls: ControlSnapshot,
    pub position: u64,
    pub capacity: u32,
    pub log: Vec<(u64, MidiKind)>,
    pub reports: Vec<BlockReport>,
    out: EventSequence,
}

impl Session<ScriptedRandom> {
    pub fn new(controls: ControlSnapshot) -> Self {
        Self::scripted(controls, vec![])
    }

    pub fn scripted(controls: ControlSnapshot, rolls: Vec<f32>) -> Self {
        let arp =
            Arpeggiator::with_parts(Transport::new(RATE), 127, ScriptedRandom::new(rolls));
        Session::with_arp(arp, controls)
    }
}

impl<R: RandomSource> Session<R> {
    pub fn with_arp(mut arp: Arpeggiator<R>, controls: ControlSnapshot) -> Self {
        arp.activate(0);
        Self {
            arp,
            controls,
            position: 0,
            capacity: 1 << 16,
            log: Vec::new(),
            reports: Vec::new(),
            out: EventSequence::default(),
        }
    }

    /// Process one block; `input` frames are relative to the block.
    pub fn block(&mut self, input: &[TimedEvent]) -> BlockReport {
        let report = self
            .arp
            .process(&self.controls, input, BLOCK, self.capacity, &mut self.out);
        for event in self.out.iter() {
            if let Some(msg) = event.as_midi() {
                self.log.push((self.position + event.frame as u64, msg.kind()));
            }
        }
        self.position += BLOCK as u64;
        self.reports.push(report);
        report
    }

    /// Process empty blocks until `position` reaches `target`.
    pub fn run_until(&mut self, target: u64) {
        while self.position < target {
            self.block(&[]);
        }
    }

    pub fn note_ons(&self) -> Vec<(u64, u8)> {
        self.log
            .iter()
            .filter_map(|(frame, kind)| match kind {
                MidiKind::NoteOn { note, .. } => Some((*frame, *note)),
                _ => None,
            })
            .collect()
    }

    pub fn note_offs(&self) -> Vec<(u64, u8)> {
        self.log
            .iter()
            .filter_map(|(frame, kind)| match kind {
                MidiKind::NoteOff { note } => Some((*frame, *note)),
                _ => None,
            })
            .collect()
    }

    /// Largest number of generated notes sounding at once.
    pub fn max_polyphony(&self) -> usize {
        let mut sounding = 0usize;
        let mut max = 0;
        for (_, kind) in &self.log {
            match kind {
                MidiKind::NoteOn { .. } => sounding += 1,
                MidiKind::NoteOff { .. } => sounding = sounding.saturating_sub(1),
                MidiKind::Other => {}
            }
            max = max.max(sounding);
        }
        max
    }
}
