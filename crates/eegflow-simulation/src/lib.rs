//! eegflow-simulation: Synthetic EEG signal sources
//!
//! Seeded waveform generation and a streaming source that stands in
//! for real headband hardware during development and testing.

pub mod generator;
pub mod patterns;
pub mod source;

pub use generator::{GeneratorConfig, SignalGenerator};
pub use patterns::WaveformPattern;
pub use source::{
    start_synthetic_source, ConnectionStatus, SourceCommand, SourceConfig, SyntheticSource,
};
