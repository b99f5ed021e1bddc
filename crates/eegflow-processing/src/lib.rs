//! eegflow-processing: Streaming signal stages for EEG pipelines
//!
//! Channel synchronization, per-channel bandpass filtering, epoch
//! windowing, spectral transforms, and the chain builder that wires
//! them for one configuration.

pub mod bandpass;
pub mod chain;
pub mod epocher;
pub mod spectral;
pub mod synchronizer;

pub use bandpass::BandpassFilter;
pub use chain::{ChainMetrics, SignalChain};
pub use epocher::EpochWindower;
pub use spectral::{slice_range, SpectralTransform};
pub use synchronizer::ChannelSynchronizer;
