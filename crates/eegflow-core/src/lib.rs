//! eegflow-core: Foundation types for the EEG streaming pipeline
//!
//! Samples, epochs, spectral frames, pipeline settings and the shared
//! error taxonomy. No processing logic lives here.

pub mod epoch;
pub mod error;
pub mod frame;
pub mod sample;
pub mod settings;

pub use epoch::Epoch;
pub use error::{EegError, EegResult};
pub use frame::{BandPowerFrame, BandPowers, PipelineFrame, PowerSpectrum, BAND_EDGES};
pub use sample::{ChannelReading, Sample};
pub use settings::{PipelineMode, PipelineSettings};
