//! Block processor: the per-block entry point.
//!
//! Walks the chronological input, lets the scheduler cover each gap
//! between input events, and reacts to the events themselves: transport
//! updates go to the [`Transport`], note-on/off move the held base note,
//! everything else is forwarded untouched.
//!
//! Control changes are sampled into a pending config at the start of every
//! block and only become active at a bar boundary, so the pattern never
//! jumps mid-bar. The first block after activation commits immediately.

use tactus_types::{
    ArpeggioConfig, ControlSnapshot, EventBody, MidiKind, TimedEvent, TransportUpdate,
};

use crate::rng::RandomSource;
use crate::scheduler::{StepScheduler, DEFAULT_VELOCITY};
use crate::sequence::EventSequence;
use crate::telemetry::BlockTelemetry;
use crate::transport::Transport;

/// What happened during one `process` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockReport {
    /// Events written to the output sequence.
    pub emitted: u32,
    /// Events rejected for capacity.
    pub dropped: u32,
    /// The pending config became active during this block.
    pub committed: bool,
    pub started: bool,
    pub stopped: bool,
}

pub struct Arpeggiator<R: RandomSource = fastrand::Rng> {
    active: ArpeggioConfig,
    pending: ArpeggioConfig,
    /// Commit on the next block regardless of bar position.
    dirty: bool,
    transport: Transport,
    scheduler: StepScheduler,
    rng: R,
    telemetry: BlockTelemetry,
}

impl Arpeggiator<fastrand::Rng> {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_parts(
            Transport::new(sample_rate),
            DEFAULT_VELOCITY,
            fastrand::Rng::new(),
        )
    }
}

impl<R: RandomSource> Arpeggiator<R> {
    pub fn with_parts(transport: Transport, velocity: u8, rng: R) -> Self {
        Self {
            active: ArpeggioConfig::default(),
            pending: ArpeggioConfig::default(),
            dirty: true,
            transport,
            scheduler: StepScheduler::new(velocity),
            rng,
            telemetry: BlockTelemetry::new(),
        }
    }

    /// Prepare for processing: reseed the random source, zero the frame
    /// counter and forget any held or sounding note.
    pub fn activate(&mut self, seed: u64) {
        self.rng.reseed(seed);
        self.transport.reset();
        self.scheduler.clear();
        self.scheduler.restart();
        self.telemetry.reset();
        self.dirty = true;
    }

    /// Drop runtime state. Nothing is emitted; a host that deactivates
    /// stops calling `process` altogether.
    pub fn deactivate(&mut self) {
        self.scheduler.clear();
    }

    /// Process one block of `block_len` frames.
    ///
    /// `input` must be ordered by frame; stamps that go backwards or past
    /// the block are clamped. `out` is reset to `capacity_bytes` first.
    pub fn process(
        &mut self,
        controls: &ControlSnapshot,
        input: &[TimedEvent],
        block_len: u32,
        capacity_bytes: u32,
        out: &mut EventSequence,
    ) -> BlockReport {
        out.reset(capacity_bytes);
        let mut report = BlockReport::default();

        self.pending = ArpeggioConfig::from_controls(controls, &self.pending);
        if self.dirty {
            self.dirty = false;
            self.commit(true);
            report.committed = true;
        }

        let mut cursor = 0;
        for event in input {
            let frame = event.frame.clamp(cursor, block_len);
            self.scheduler
                .run(&mut self.transport, &mut self.rng, cursor, frame, out);
            cursor = frame;

            match &event.body {
                EventBody::Transport(update) => {
                    self.handle_transport(update, frame, out, &mut report);
                }
                EventBody::Midi(msg) => match msg.kind() {
                    MidiKind::NoteOn { note, .. } => {
                        self.scheduler.hold(note, msg.channel());
                    }
                    MidiKind::NoteOff { note } => {
                        self.scheduler.release(note);
                    }
                    MidiKind::Other => {
                        out.push(TimedEvent::midi(frame, *msg));
                    }
                },
            }
        }
        self.scheduler
            .run(&mut self.transport, &mut self.rng, cursor, block_len, out);

        report.emitted = out.len() as u32;
        report.dropped = out.dropped();
        self.telemetry.record(report.emitted, report.dropped);
        report
    }

    fn handle_transport(
        &mut self,
        update: &TransportUpdate,
        frame: u32,
        out: &mut EventSequence,
        report: &mut BlockReport,
    ) {
        let change = self.transport.apply(update);
        if change.stopped {
            self.scheduler.flush(frame, out);
            report.stopped = true;
        }
        if change.started {
            self.scheduler.restart();
            report.started = true;
        }
        if change.bar_start && self.commit(false) {
            report.committed = true;
        }
    }

    /// Make the pending config active. Returns false when nothing changed
    /// and `force` is not set.
    fn commit(&mut self, force: bool) -> bool {
        if !force && self.pending == self.active {
            return false;
        }
        self.active = self.pending;
        self.transport.set_subdivision(self.active.subdivision);
        self.scheduler.configure(&self.active);
        true
    }

    pub fn config(&self) -> &ArpeggioConfig {
        &self.active
    }

    pub fn pending_config(&self) -> &ArpeggioConfig {
        &self.pending
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn scheduler(&self) -> &StepScheduler {
        &self.scheduler
    }

    pub fn telemetry_mut(&mut self) -> &mut BlockTelemetry {
        &mut self.telemetry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRandom;
    use tactus_types::{ChordShape, MidiMessage};

    fn arp() -> Arpeggiator<ScriptedRandom> {
        // 1 beat = 100 frames.
        let mut arp = Arpeggiator::with_parts(
            Transport::with_tempo(100.0, 60.0, 4, 4),
            100,
            ScriptedRandom::new(vec![]),
        );
        arp.activate(0);
        arp
    }

    fn play() -> TimedEvent {
        TimedEvent::transport(
            0,
            TransportUpdate {
                speed: Some(1.0),
                ..TransportUpdate::default()
            },
        )
    }

    #[test]
    fn test_first_block_commits_immediately() {
        let mut arp = arp();
        let controls = ControlSnapshot {
            chord: 1.0,
            range: 2.0,
            ..ControlSnapshot::default()
        };
        let mut out = EventSequence::default();
        let report = arp.process(&controls, &[], 64, 1024, &mut out);
        assert!(report.committed);
        assert_eq!(arp.config().chord, Some(ChordShape::Major));
        assert_eq!(arp.scheduler().table().len(), 6);

        let report = arp.process(&controls, &[], 64, 1024, &mut out);
        assert!(!report.committed);
    }

    #[test]
    fn test_other_midi_is_forwarded_and_notes_consumed() {
        let mut arp = arp();
        let cc = MidiMessage::new(0xB0, 1, 64);
        let input = [
            TimedEvent::midi(3, MidiMessage::note_on(0, 60, 90)),
            TimedEvent::midi(5, cc),
            TimedEvent::midi(9, MidiMessage::note_off(0, 60)),
        ];
        let mut out = EventSequence::default();
        arp.process(&ControlSnapshot::default(), &input, 16, 1024, &mut out);
        assert_eq!(out.events(), &[TimedEvent::midi(5, cc)]);
        assert_eq!(arp.scheduler().play_state().base_note, None);
    }

    #[test]
    fn test_velocity_comes_from_construction() {
        let mut arp = arp();
        let input = [play(), TimedEvent::midi(0, MidiMessage::note_on(2, 60, 30))];
        let mut out = EventSequence::default();
        arp.process(&ControlSnapshot::default(), &input, 10, 1024, &mut out);
        assert_eq!(
            out.events(),
            &[TimedEvent::midi(0, MidiMessage::note_on(2, 60, 100))]
        );
    }

    #[test]
    fn test_out_of_order_frames_are_clamped() {
        let mut arp = arp();
        let a = MidiMessage::new(0xB0, 1, 1);
        let b = MidiMessage::new(0xB0, 2, 2);
        let c = MidiMessage::new(0xB0, 3, 3);
        let input = [
            TimedEvent::midi(8, a),
            TimedEvent::midi(4, b),
            TimedEvent::midi(99, c),
        ];
        let mut out = EventSequence::default();
        arp.process(&ControlSnapshot::default(), &input, 16, 1024, &mut out);
        assert_eq!(
            out.events(),
            &[
                TimedEvent::midi(8, a),
                TimedEvent::midi(8, b),
                TimedEvent::midi(16, c),
            ]
        );
    }

    #[test]
    fn test_deactivate_forgets_notes() {
        let mut arp = arp();
        let input = [play(), TimedEvent::midi(0, MidiMessage::note_on(0, 60, 90))];
        let mut out = EventSequence::default();
        arp.process(&ControlSnapshot::default(), &input, 10, 1024, &mut out);
        assert!(arp.scheduler().play_state().sounding.is_some());

        arp.deactivate();
        assert_eq!(arp.scheduler().play_state().base_note, None);
        assert!(arp.scheduler().play_state().sounding.is_none());
    }
}
