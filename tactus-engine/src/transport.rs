//! Tempo and transport tracking.
//!
//! Owns the host's tempo, time signature and play state, and turns the
//! current rhythmic subdivision into a whole-frame step length.

use tactus_types::{Subdivision, TransportUpdate};

pub const DEFAULT_BPM: f32 = 120.0;
pub const DEFAULT_BEATS_PER_BAR: u32 = 4;
pub const DEFAULT_BEAT_UNIT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

/// What a transport update changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportChange {
    /// Stopped to playing: elapsed frames were reset.
    pub started: bool,
    /// Playing to stopped.
    pub stopped: bool,
    /// The update reported a position within the first beat of a bar.
    pub bar_start: bool,
    /// Tempo or signature changed, so the step length was recomputed.
    pub timing_changed: bool,
}

#[derive(Debug, Clone)]
pub struct Transport {
    sample_rate: f64,
    bpm: f32,
    beats_per_bar: u32,
    beat_unit: u32,
    speed: f32,
    subdivision: Subdivision,
    frames_per_beat: f64,
    step_frames: u64,
    /// Frames processed while playing since the last restart.
    elapsed_frames: u64,
}

impl Transport {
    /// 120 BPM in 4/4, stopped, stepping in quarter notes.
    pub fn new(sample_rate: f64) -> Self {
        Self::with_tempo(sample_rate, DEFAULT_BPM, DEFAULT_BEATS_PER_BAR, DEFAULT_BEAT_UNIT)
    }

    /// Start from the given tempo and signature; invalid values fall back
    /// to the defaults.
    pub fn with_tempo(sample_rate: f64, bpm: f32, beats_per_bar: u32, beat_unit: u32) -> Self {
        let mut transport = Self {
            sample_rate,
            bpm: if valid_bpm(bpm) { bpm } else { DEFAULT_BPM },
            beats_per_bar: if beats_per_bar > 0 { beats_per_bar } else { DEFAULT_BEATS_PER_BAR },
            beat_unit: if beat_unit > 0 { beat_unit } else { DEFAULT_BEAT_UNIT },
            speed: 0.0,
            subdivision: Subdivision::Quarter,
            frames_per_beat: 0.0,
            step_frames: 1,
            elapsed_frames: 0,
        };
        transport.recompute();
        transport
    }

    /// Apply a host transport update. Malformed fields are ignored one by
    /// one; the rest of the update still applies.
    pub fn apply(&mut self, update: &TransportUpdate) -> TransportChange {
        let mut change = TransportChange::default();

        if let Some(bpm) = update.bpm {
            if valid_bpm(bpm) && bpm != self.bpm {
                self.bpm = bpm;
                change.timing_changed = true;
            }
        }

        if let Some(speed) = update.speed {
            if speed.is_finite() && speed != self.speed {
                let was_playing = self.is_playing();
                self.speed = speed;
                match (was_playing, self.is_playing()) {
                    (false, true) => {
                        self.elapsed_frames = 0;
                        change.started = true;
                    }
                    (true, false) => change.stopped = true,
                    _ => {}
                }
            }
        }

        if let Some(beats_per_bar) = update.beats_per_bar {
            if beats_per_bar.is_finite() && beats_per_bar >= 1.0 {
                let beats_per_bar = beats_per_bar as u32;
                if beats_per_bar != self.beats_per_bar {
                    self.beats_per_bar = beats_per_bar;
                    change.timing_changed = true;
                }
            }
        }

        if let Some(beat_unit) = update.beat_unit {
            if beat_unit >= 1 && beat_unit as u32 != self.beat_unit {
                self.beat_unit = beat_unit as u32;
                change.timing_changed = true;
            }
        }

        change.bar_start = update.is_bar_start();

        if change.timing_changed {
            self.recompute();
            log::trace!(
                target: "engine::transport",
                "{} bpm {}/{}: {} frames per step",
                self.bpm,
                self.beats_per_bar,
                self.beat_unit,
                self.step_frames
            );
        }
        change
    }

    pub fn set_subdivision(&mut self, subdivision: Subdivision) {
        if subdivision != self.subdivision {
            self.subdivision = subdivision;
            self.recompute();
        }
    }

    /// step = bar frames x the subdivision's fraction of a bar, which reduces
    /// to frames_per_beat x beat_unit / note_length. The reduced form keeps
    /// whole-frame tempos exact.
    fn recompute(&mut self) {
        self.frames_per_beat = 60.0 / self.bpm as f64 * self.sample_rate;
        let frames = self.frames_per_beat * self.beat_unit as f64
            / self.subdivision.note_length() as f64;
        self.step_frames = (frames as u64).max(1);
    }

    pub fn advance(&mut self, frames: u32) {
        self.elapsed_frames += frames as u64;
    }

    /// Zero the frame counter (instance activation).
    pub fn reset(&mut self) {
        self.elapsed_frames = 0;
    }

    pub fn is_playing(&self) -> bool {
        self.speed >= 1.0
    }

    pub fn play_state(&self) -> PlayState {
        if self.is_playing() {
            PlayState::Playing
        } else {
            PlayState::Stopped
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }

    pub fn beat_unit(&self) -> u32 {
        self.beat_unit
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn subdivision(&self) -> Subdivision {
        self.subdivision
    }

    pub fn frames_per_beat(&self) -> f64 {
        self.frames_per_beat
    }

    /// Length of one arpeggio step in frames; always at least 1.
    pub fn step_frames(&self) -> u64 {
        self.step_frames
    }

    pub fn elapsed_frames(&self) -> u64 {
        self.elapsed_frames
    }
}

fn valid_bpm(bpm: f32) -> bool {
    bpm.is_finite() && bpm > 0.0
}
