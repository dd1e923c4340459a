//! Sample-accurate step scheduling.
//!
//! For a frame range of the current block the scheduler finds every step
//! boundary and every due note-off inside it and emits the matching MIDI
//! events at their exact offsets. Only frames where something can happen
//! are visited, so the cost is proportional to the events emitted rather
//! than to the block length.

use tactus_types::{ArpeggioConfig, MidiMessage, TimedEvent, MAX_NOTE};

use crate::arp_state::{ArpPlayState, SoundingNote};
use crate::chord_table::ArpeggioTable;
use crate::rng::RandomSource;
use crate::sequence::EventSequence;
use crate::transport::Transport;
use crate::walker::{walk, PatternParams, Step};

pub const DEFAULT_VELOCITY: u8 = 127;

#[derive(Debug, Clone)]
pub struct StepScheduler {
    table: ArpeggioTable,
    pattern: PatternParams,
    gate: f32,
    velocity: u8,
    play: ArpPlayState,
}

impl Default for StepScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_VELOCITY)
    }
}

impl StepScheduler {
    pub fn new(velocity: u8) -> Self {
        let config = ArpeggioConfig::default();
        Self {
            table: ArpeggioTable::build(config.chord, config.range),
            pattern: PatternParams::from(&config),
            gate: config.gate,
            velocity: velocity.clamp(1, MAX_NOTE),
            play: ArpPlayState::default(),
        }
    }

    /// Adopt a committed config: rebuild the table and restart the pattern.
    pub fn configure(&mut self, config: &ArpeggioConfig) {
        self.table = ArpeggioTable::build(config.chord, config.range);
        self.pattern = PatternParams::from(config);
        self.gate = config.gate;
        self.play.step_index = 0;
    }

    /// Restart the pattern from its first position.
    pub fn restart(&mut self) {
        self.play.step_index = 0;
    }

    pub fn hold(&mut self, note: u8, channel: u8) -> bool {
        self.play.hold(note, channel)
    }

    pub fn release(&mut self, note: u8) -> bool {
        self.play.release(note)
    }

    /// Emit the note-off of a still-sounding note at `frame`, now.
    pub fn flush(&mut self, frame: u32, out: &mut EventSequence) {
        if let Some(sounding) = self.play.sounding.take() {
            out.push(TimedEvent::midi(
                frame,
                MidiMessage::note_off(sounding.channel, sounding.note),
            ));
        }
    }

    /// Forget all runtime state without emitting anything.
    pub fn clear(&mut self) {
        self.play = ArpPlayState::default();
    }

    pub fn table(&self) -> &ArpeggioTable {
        &self.table
    }

    pub fn play_state(&self) -> &ArpPlayState {
        &self.play
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Schedule the block frames `[begin, end)`.
    ///
    /// `transport.elapsed_frames()` is the absolute position of `begin`;
    /// it advances by the range length. Nothing happens while stopped.
    pub fn run<R: RandomSource + ?Sized>(
        &mut self,
        transport: &mut Transport,
        rng: &mut R,
        begin: u32,
        end: u32,
        out: &mut EventSequence,
    ) {
        if end <= begin || !transport.is_playing() {
            return;
        }

        let step_frames = transport.step_frames();
        let start = transport.elapsed_frames();
        let stop = start + (end - begin) as u64;
        let mut at = start;

        while at < stop {
            let next_step = at.div_ceil(step_frames) * step_frames;
            let next_off = self
                .play
                .sounding
                .map_or(u64::MAX, |s| s.off_frame.max(at));
            let next = next_step.min(next_off);
            if next >= stop {
                break;
            }

            let frame = begin + (next - start) as u32;
            if next == next_off {
                self.flush(frame, out);
            }
            if next == next_step {
                self.step(next, frame, step_frames, rng, out);
            }
            at = next + 1;
        }

        transport.advance(end - begin);
    }

    fn step<R: RandomSource + ?Sized>(
        &mut self,
        now: u64,
        frame: u32,
        step_frames: u64,
        rng: &mut R,
        out: &mut EventSequence,
    ) {
        // The walk advances on every boundary, held note or not, so the
        // pattern stays aligned with the transport.
        let (step, next_index) = walk(&self.table, self.play.step_index, &self.pattern, rng);
        self.play.step_index = next_index;

        let Some(base) = self.play.base_note else {
            return;
        };
        let Step::Note { offset, .. } = step else {
            return;
        };
        let note = base as u16 + offset as u16;
        if note > MAX_NOTE as u16 {
            return;
        }
        let gate_frames = (self.gate as f64 * step_frames as f64 / 100.0) as u64;
        if gate_frames == 0 {
            return;
        }

        // Monophonic: a note still held over from a long gate ends here.
        self.flush(frame, out);

        let channel = self.play.base_channel;
        let note = note as u8;
        if out.push(TimedEvent::midi(
            frame,
            MidiMessage::note_on(channel, note, self.velocity),
        )) {
            self.play.sounding = Some(SoundingNote {
                note,
                channel,
                off_frame: now + gate_frames,
            });
        }
    }
}
