//! A plugin instance: the arpeggiator plus the plumbing around it.
//!
//! The host-facing lifecycle is instantiate, then any number of
//! activate / run... / deactivate rounds. `run` is the only call made on
//! the audio thread; it reads controls through the lock-free receiver and
//! reports through the non-blocking feedback sender.

use tactus_engine::{Arpeggiator, EventSequence, Transport};
use tactus_types::TimedEvent;

use crate::config::Config;
use crate::control::{control_channel, ControlPublisher, ControlReceiver};
use crate::feedback::{
    feedback_channel, EngineFeedback, FeedbackMonitor, FeedbackSender, FEEDBACK_CAPACITY,
};

#[derive(Debug, Clone, PartialEq)]
pub enum InstanceError {
    InvalidSampleRate(f64),
}

impl std::fmt::Display for InstanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSampleRate(rate) => write!(f, "invalid sample rate: {}", rate),
        }
    }
}

impl std::error::Error for InstanceError {}

/// Control-thread ends handed out at instantiation.
pub struct InstanceHandles {
    pub controls: ControlPublisher,
    pub feedback: FeedbackMonitor,
}

pub struct ArpeggiatorInstance {
    arp: Arpeggiator,
    controls: ControlReceiver,
    feedback: FeedbackSender,
    out: EventSequence,
    seed: Option<u64>,
    telemetry_window: u32,
    blocks_since_summary: u32,
    active: bool,
}

impl ArpeggiatorInstance {
    pub fn instantiate(
        sample_rate: f64,
        config: &Config,
    ) -> Result<(Self, InstanceHandles), InstanceError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(InstanceError::InvalidSampleRate(sample_rate));
        }

        let (beats_per_bar, beat_unit) = config.time_signature();
        let transport = Transport::with_tempo(sample_rate, config.bpm(), beats_per_bar, beat_unit);
        let arp = Arpeggiator::with_parts(transport, config.velocity(), fastrand::Rng::new());

        let (publisher, receiver) = control_channel(config.controls());
        let (sender, monitor) = feedback_channel(FEEDBACK_CAPACITY);

        log::info!(target: "core::instance",
            "instantiated at {} Hz, {} bpm {}/{}",
            sample_rate, config.bpm(), beats_per_bar, beat_unit
        );

        let instance = Self {
            arp,
            controls: receiver,
            feedback: sender,
            out: EventSequence::default(),
            seed: config.seed(),
            telemetry_window: config.telemetry_window(),
            blocks_since_summary: 0,
            active: false,
        };
        let handles = InstanceHandles {
            controls: publisher,
            feedback: monitor,
        };
        Ok((instance, handles))
    }

    /// Reset runtime state and reseed. Uses the configured seed when there
    /// is one, otherwise a fresh one.
    pub fn activate(&mut self) {
        let seed = self.seed.unwrap_or_else(|| fastrand::u64(..));
        self.arp.activate(seed);
        self.blocks_since_summary = 0;
        self.active = true;
        log::debug!(target: "core::instance", "activated with seed {}", seed);
    }

    /// Process one block and return its output.
    ///
    /// Outside an activate/deactivate pair the output is always empty.
    pub fn run(
        &mut self,
        input: &[TimedEvent],
        block_len: u32,
        capacity_bytes: u32,
    ) -> &EventSequence {
        if !self.active {
            self.out.reset(capacity_bytes);
            return &self.out;
        }

        let controls = self.controls.latest();
        let report = self
            .arp
            .process(&controls, input, block_len, capacity_bytes, &mut self.out);

        if report.committed {
            self.feedback
                .send(EngineFeedback::ConfigCommitted(*self.arp.config()));
        }
        if report.stopped {
            self.feedback.send(EngineFeedback::PlayingChanged(false));
        }
        if report.started {
            self.feedback.send(EngineFeedback::PlayingChanged(true));
        }
        if report.dropped > 0 {
            self.feedback.send(EngineFeedback::EventsDropped(report.dropped));
        }

        self.blocks_since_summary += 1;
        if self.blocks_since_summary >= self.telemetry_window {
            self.blocks_since_summary = 0;
            let (avg_events, max_events, dropped_total, blocks) =
                self.arp.telemetry_mut().take_summary();
            self.feedback.send(EngineFeedback::TelemetrySummary {
                avg_events,
                max_events,
                dropped_total,
                blocks,
            });
        }

        &self.out
    }

    pub fn deactivate(&mut self) {
        self.arp.deactivate();
        self.active = false;
        log::debug!(target: "core::instance", "deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn arpeggiator(&self) -> &Arpeggiator {
        &self.arp
    }
}
