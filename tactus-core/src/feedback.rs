//! Diagnostics from the audio thread, logged on the control thread.
//!
//! The audio side only ever calls `try_send` on a bounded channel, so it
//! never blocks; when the control thread falls behind, messages are lost.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use tactus_types::ArpeggioConfig;

/// Channel capacity for feedback messages.
pub const FEEDBACK_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineFeedback {
    /// A new config became active (first block or bar boundary).
    ConfigCommitted(ArpeggioConfig),
    PlayingChanged(bool),
    /// Output events dropped for capacity in one block.
    EventsDropped(u32),
    /// Periodic summary of output activity.
    TelemetrySummary {
        /// Average events per block in the window
        avg_events: u32,
        /// Largest block in the window
        max_events: u32,
        /// Cumulative events dropped since activation
        dropped_total: u64,
        /// Blocks processed since activation
        blocks: u64,
    },
}

/// Audio-thread half of the feedback channel.
#[derive(Clone)]
pub struct FeedbackSender {
    tx: Sender<EngineFeedback>,
}

impl FeedbackSender {
    /// Queue a message without blocking. Returns false if it was lost.
    pub fn send(&self, msg: EngineFeedback) -> bool {
        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Control-thread half of the feedback channel.
pub struct FeedbackMonitor {
    rx: Receiver<EngineFeedback>,
}

impl FeedbackMonitor {
    pub fn try_recv(&self) -> Option<EngineFeedback> {
        match self.rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take everything queued so far.
    pub fn drain(&self) -> Vec<EngineFeedback> {
        self.rx.try_iter().collect()
    }

    /// Log everything queued so far. Returns the number of messages.
    pub fn drain_and_log(&self) -> usize {
        let mut count = 0;
        while let Some(msg) = self.try_recv() {
            log_feedback(&msg);
            count += 1;
        }
        count
    }
}

pub fn feedback_channel(capacity: usize) -> (FeedbackSender, FeedbackMonitor) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (FeedbackSender { tx }, FeedbackMonitor { rx })
}

fn log_feedback(msg: &EngineFeedback) {
    match msg {
        EngineFeedback::ConfigCommitted(config) => {
            log::info!(target: "core::feedback",
                "config committed: {} x{} {} {} gate={}% cycle={} skip={}%",
                config.chord.map_or("none", |c| c.name()),
                config.range,
                config.subdivision.name(),
                config.direction.name(),
                config.gate,
                config.cycle,
                config.skip
            );
        }
        EngineFeedback::PlayingChanged(playing) => {
            log::info!(target: "core::feedback",
                "transport {}", if *playing { "started" } else { "stopped" });
        }
        EngineFeedback::EventsDropped(count) => {
            log::warn!(target: "core::feedback",
                "output buffer full, dropped {} events", count);
        }
        EngineFeedback::TelemetrySummary { avg_events, max_events, dropped_total, blocks } => {
            log::debug!(target: "core::feedback",
                "Telemetry: avg={} max={} dropped={} blocks={}",
                avg_events, max_events, dropped_total, blocks
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_channel_drops() {
        let (tx, monitor) = feedback_channel(2);
        assert!(tx.send(EngineFeedback::PlayingChanged(true)));
        assert!(tx.send(EngineFeedback::EventsDropped(3)));
        assert!(!tx.send(EngineFeedback::PlayingChanged(false)));

        assert_eq!(
            monitor.drain(),
            vec![
                EngineFeedback::PlayingChanged(true),
                EngineFeedback::EventsDropped(3),
            ]
        );
        assert!(monitor.try_recv().is_none());
    }

    #[test]
    fn test_drain_and_log_counts() {
        let (tx, monitor) = feedback_channel(FEEDBACK_CAPACITY);
        tx.send(EngineFeedback::ConfigCommitted(ArpeggioConfig::default()));
        tx.send(EngineFeedback::TelemetrySummary {
            avg_events: 1,
            max_events: 2,
            dropped_total: 0,
            blocks: 10,
        });
        assert_eq!(monitor.drain_and_log(), 2);
        assert_eq!(monitor.drain_and_log(), 0);
    }

    #[test]
    fn test_disconnected_monitor() {
        let (tx, monitor) = feedback_channel(4);
        drop(monitor);
        assert!(!tx.send(EngineFeedback::PlayingChanged(true)));
    }
}
