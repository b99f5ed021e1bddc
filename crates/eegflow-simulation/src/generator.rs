//! Synthetic EEG sample generation

use crate::patterns::WaveformPattern;
use eegflow_core::{EegError, EegResult, Sample};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Configuration for the synthetic signal generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Sampling rate in Hz
    pub srate: f32,
    /// Number of electrode channels
    pub channel_count: usize,
    /// Deterministic waveform underneath the noise
    pub pattern: WaveformPattern,
    /// Gaussian noise standard deviation in microvolts (0.0 = clean)
    pub noise_std: f32,
    /// Powerline interference frequency, if simulated
    pub powerline_freq: Option<f32>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            srate: 256.0,
            channel_count: 4,
            pattern: WaveformPattern::Sine {
                frequency: 10.0,
                amplitude: 20.0,
            },
            noise_std: 2.0,
            powerline_freq: Some(50.0),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> EegResult<()> {
        if self.srate <= 0.0 {
            return Err(EegError::InvalidConfiguration {
                message: format!("Sampling rate must be positive, got {}", self.srate),
            });
        }
        if self.channel_count == 0 {
            return Err(EegError::InvalidConfiguration {
                message: "Channel count must be at least 1".to_string(),
            });
        }
        if self.noise_std < 0.0 {
            return Err(EegError::InvalidConfiguration {
                message: "Noise standard deviation cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Produces time-ordered synthetic [`Sample`]s at the configured rate.
///
/// Each channel carries the same base pattern with a small per-channel
/// phase offset, plus seeded Gaussian noise and optional powerline
/// interference. Timestamps strictly increase.
pub struct SignalGenerator {
    config: GeneratorConfig,
    rng: rand::rngs::StdRng,
    normal: Normal<f32>,
    sample_index: u64,
    base_timestamp: f64,
}

impl SignalGenerator {
    pub fn new(config: GeneratorConfig) -> EegResult<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });
        let rng = rand::rngs::StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, config.noise_std.max(f32::MIN_POSITIVE)).map_err(|e| {
            EegError::InvalidConfiguration {
                message: format!("Failed to create noise distribution: {}", e),
            }
        })?;

        Ok(SignalGenerator {
            config,
            rng,
            normal,
            sample_index: 0,
            base_timestamp: 0.0,
        })
    }

    /// Anchor timestamps at a wall-clock origin in epoch milliseconds
    pub fn set_base_timestamp(&mut self, base_ms: f64) {
        self.base_timestamp = base_ms;
    }

    /// Generate the next sample in the stream
    pub fn next_sample(&mut self) -> Sample {
        let time = self.sample_index as f32 / self.config.srate;
        let timestamp = self.base_timestamp + self.sample_index as f64 * 1000.0 / self.config.srate as f64;

        let mut channels = Vec::with_capacity(self.config.channel_count);
        for channel_idx in 0..self.config.channel_count {
            // Slight per-channel phase shift so channels aren't identical.
            let phase_offset = channel_idx as f32 * 0.05;
            let mut value = self.config.pattern.value_at(time + phase_offset);

            if self.config.noise_std > 0.0 {
                value += self.normal.sample(&mut self.rng);
            }
            if let Some(freq) = self.config.powerline_freq {
                value += 1.0 * (2.0 * std::f32::consts::PI * freq * time).sin();
            }

            channels.push(value);
        }

        self.sample_index += 1;
        Sample::new(timestamp, channels)
    }

    /// Generate a batch of consecutive samples
    pub fn next_batch(&mut self, count: usize) -> Vec<Sample> {
        (0..count).map(|_| self.next_sample()).collect()
    }

    /// Restart the time axis (useful when a stream is stopped)
    pub fn reset_time(&mut self) {
        self.sample_index = 0;
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Swap in a new configuration, re-validating it
    pub fn update_config(&mut self, config: GeneratorConfig) -> EegResult<()> {
        config.validate()?;
        if (config.noise_std - self.config.noise_std).abs() > f32::EPSILON {
            self.normal = Normal::new(0.0, config.noise_std.max(f32::MIN_POSITIVE)).map_err(|e| {
                EegError::InvalidConfiguration {
                    message: format!("Failed to create noise distribution: {}", e),
                }
            })?;
        }
        self.config = config;
        Ok(())
    }

    /// Occasionally useful in demos: a marker value in the aux slot
    pub fn next_sample_with_marker(&mut self, marker: f32) -> Sample {
        let mut sample = self.next_sample();
        sample.aux = marker;
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_config() -> GeneratorConfig {
        GeneratorConfig {
            noise_std: 0.0,
            powerline_freq: None,
            seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let mut generator = SignalGenerator::new(GeneratorConfig::default()).unwrap();
        let batch = generator.next_batch(100);
        for pair in batch.windows(2) {
            assert!(pair[1].timestamp > pair[0].timestamp);
        }
    }

    #[test]
    fn test_channel_count_respected() {
        let config = GeneratorConfig {
            channel_count: 8,
            ..Default::default()
        };
        let mut generator = SignalGenerator::new(config).unwrap();
        assert_eq!(generator.next_sample().channel_count(), 8);
    }

    #[test]
    fn test_seeded_generation_reproducible() {
        let config = GeneratorConfig {
            seed: Some(42),
            ..Default::default()
        };
        let mut a = SignalGenerator::new(config.clone()).unwrap();
        let mut b = SignalGenerator::new(config).unwrap();
        assert_eq!(a.next_batch(64), b.next_batch(64));
    }

    #[test]
    fn test_clean_sine_matches_pattern() {
        let mut generator = SignalGenerator::new(clean_config()).unwrap();
        let sample = generator.next_batch(10).pop().unwrap();
        let expected = WaveformPattern::Sine {
            frequency: 10.0,
            amplitude: 20.0,
        }
        .value_at(9.0 / 256.0);
        assert!((sample.channels[0] - expected).abs() < 1e-4);
    }

    #[test]
    fn test_reset_time_restarts_axis() {
        let mut generator = SignalGenerator::new(clean_config()).unwrap();
        let first = generator.next_sample();
        generator.next_batch(50);
        generator.reset_time();
        let restarted = generator.next_sample();
        assert_eq!(first.timestamp, restarted.timestamp);
        assert_eq!(first.channels, restarted.channels);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GeneratorConfig {
            channel_count: 0,
            ..Default::default()
        };
        assert!(SignalGenerator::new(config).is_err());
    }
}
