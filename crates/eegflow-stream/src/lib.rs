//! eegflow-stream: Frame fan-out, recording and the live service
//!
//! The hub pushes each raw sample through its processing chain exactly
//! once and multicasts the resulting frames; the manager owns settings
//! and rebuilds; recording sessions turn frame streams into CSV files;
//! the service wires a sample source to all of it.

pub mod hub;
pub mod manager;
pub mod recording;
pub mod service;

pub use hub::{FrameCallback, MulticastHub};
pub use manager::PipelineManager;
pub use recording::{DiskSink, FileSink, RecordingLimit, RecordingSession, RecordingState};
pub use service::{ServiceCommand, StreamService};
