//! Sample: one synchronized multi-channel reading

use crate::error::{EegError, EegResult};
use serde::{Deserialize, Serialize};

/// One timestamped vector of per-electrode voltages plus a fixed
/// auxiliary slot (marker/trigger channel on most headbands).
///
/// Channel count is fixed for a pipeline instance and timestamps
/// strictly increase within one stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp: f64,
    /// Per-electrode voltages in microvolts
    pub channels: Vec<f32>,
    /// Auxiliary slot carried alongside the electrode data
    pub aux: f32,
}

impl Sample {
    pub fn new(timestamp: f64, channels: Vec<f32>) -> Self {
        Sample {
            timestamp,
            channels,
            aux: 0.0,
        }
    }

    pub fn with_aux(timestamp: f64, channels: Vec<f32>, aux: f32) -> Self {
        Sample {
            timestamp,
            channels,
            aux,
        }
    }

    /// Number of electrode channels in this sample
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Validate the sample against a configured channel count
    pub fn check_channels(&self, expected: usize) -> EegResult<()> {
        if self.channels.len() != expected {
            return Err(EegError::ChannelMismatch {
                expected,
                actual: self.channels.len(),
            });
        }
        Ok(())
    }
}

/// One raw reading from a single electrode, before synchronization.
///
/// Device transports deliver per-electrode streams independently; the
/// synchronizer pairs readings by `index` into whole [`Sample`]s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelReading {
    /// Electrode identifier, 0-based
    pub channel: usize,
    /// Monotonic per-electrode sample index
    pub index: u64,
    /// Reading value in microvolts
    pub value: f32,
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp: f64,
}

impl ChannelReading {
    pub fn new(channel: usize, index: u64, value: f32, timestamp: f64) -> Self {
        ChannelReading {
            channel,
            index,
            value,
            timestamp,
        }
    }
}
