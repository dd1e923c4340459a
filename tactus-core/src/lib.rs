//! # tactus-core
//!
//! Everything around the real-time engine that a host integration needs:
//! layered configuration, the control-value hand-off to the audio thread,
//! the instance lifecycle and the feedback channel back to the control
//! thread.

pub mod config;
pub mod control;
pub mod feedback;
pub mod instance;

pub use config::{Config, ConfigError};
pub use control::{control_channel, ControlPublisher, ControlReceiver};
pub use feedback::{feedback_channel, EngineFeedback, FeedbackMonitor, FeedbackSender};
pub use instance::{ArpeggiatorInstance, InstanceError, InstanceHandles};
