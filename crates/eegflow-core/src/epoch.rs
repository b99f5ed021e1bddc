//! Epoch: fixed-length window of consecutive multi-channel samples

use crate::error::{EegError, EegResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rectangular snapshot of the filtered sample stream: exactly the
/// same number of samples per channel, tagged with sampling rate and
/// the timestamp of its oldest sample.
///
/// Epochs are created as copies of the windower's buffer and are never
/// mutated after emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epoch {
    /// Unique identifier for this epoch
    pub id: Uuid,
    /// Per-channel sample vectors, all of identical length
    pub channels: Vec<Vec<f32>>,
    /// Sampling rate in Hz
    pub sampling_rate: f32,
    /// Timestamp of the first sample, milliseconds since the Unix epoch
    pub start_timestamp: f64,
}

impl Epoch {
    /// Create a new epoch, validating the rectangular-shape invariant
    pub fn new(channels: Vec<Vec<f32>>, sampling_rate: f32, start_timestamp: f64) -> EegResult<Self> {
        let first_len = match channels.first() {
            Some(ch) => ch.len(),
            None => {
                return Err(EegError::InvalidConfiguration {
                    message: "Epoch requires at least one channel".to_string(),
                })
            }
        };

        if first_len == 0 {
            return Err(EegError::InvalidConfiguration {
                message: "Epoch channels cannot be empty".to_string(),
            });
        }

        for (idx, ch) in channels.iter().enumerate() {
            if ch.len() != first_len {
                return Err(EegError::TransformError {
                    message: format!(
                        "Channel {} has {} samples, expected {}",
                        idx,
                        ch.len(),
                        first_len
                    ),
                });
            }
        }

        Ok(Epoch {
            id: Uuid::new_v4(),
            channels,
            sampling_rate,
            start_timestamp,
        })
    }

    /// Number of channels in this epoch
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel
    pub fn samples_per_channel(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Epoch length in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples_per_channel() as f32 / self.sampling_rate
    }

    /// Data for one channel
    pub fn channel_data(&self, channel_index: usize) -> EegResult<&[f32]> {
        self.channels
            .get(channel_index)
            .map(|c| c.as_slice())
            .ok_or_else(|| EegError::ChannelMismatch {
                expected: self.channels.len(),
                actual: channel_index + 1,
            })
    }

    /// Time offsets of each sample relative to the epoch start, in ms
    pub fn time_offsets_ms(&self) -> Vec<f32> {
        let dt_ms = 1000.0 / self.sampling_rate;
        (0..self.samples_per_channel())
            .map(|i| i as f32 * dt_ms)
            .collect()
    }
}
