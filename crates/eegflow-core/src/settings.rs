//! Pipeline configuration and validation

use crate::error::{EegError, EegResult};
use serde::{Deserialize, Serialize};

/// Which representation the assembled chain emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineMode {
    /// Filtered time-domain epochs
    Raw,
    /// Power spectral density, sliced to the configured range
    Spectrum,
    /// Mean power per canonical band
    BandPower,
}

/// The full set of tunable pipeline parameters.
///
/// `duration` and `interval` are measured in samples, never in
/// milliseconds. Mutating any field requires rebuilding the whole
/// bandpass → windower → spectral chain; stateful filters are never
/// reconfigured in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Bandpass low cutoff in Hz
    pub cut_off_low: f32,
    /// Bandpass high cutoff in Hz
    pub cut_off_high: f32,
    /// Epoch length in samples
    pub duration: usize,
    /// Samples between epoch emissions
    pub interval: usize,
    /// FFT transform size; the epoch is segmented into `duration / bins`
    /// windows whose power spectra are averaged
    pub bins: usize,
    /// Lower edge of the spectrum slice in Hz
    pub slice_fft_low: f32,
    /// Upper edge of the spectrum slice in Hz
    pub slice_fft_high: f32,
    /// Sampling rate in Hz
    pub srate: f32,
    /// Number of electrode channels
    pub channel_count: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            cut_off_low: 2.0,
            cut_off_high: 50.0,
            duration: 1024,
            interval: 256,
            bins: 256,
            slice_fft_low: 1.0,
            slice_fft_high: 30.0,
            srate: 256.0,
            channel_count: 4,
        }
    }
}

impl PipelineSettings {
    /// Nyquist frequency for the configured sampling rate
    pub fn nyquist(&self) -> f32 {
        self.srate / 2.0
    }

    /// Epoch emission period in seconds
    pub fn interval_secs(&self) -> f32 {
        self.interval as f32 / self.srate
    }

    /// Reject invalid parameter combinations before any stage is built
    pub fn validate(&self) -> EegResult<()> {
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
        if self.duration == 0 || self.interval == 0 {
            return Err(EegError::InvalidConfiguration {
                message: "Epoch duration and interval must be at least 1 sample".to_string(),
            });
        }
        if self.cut_off_low >= self.cut_off_high {
            return Err(EegError::InvalidConfiguration {
                message: format!(
                    "Low cutoff {}Hz must be below high cutoff {}Hz",
                    self.cut_off_low, self.cut_off_high
                ),
            });
        }
        if self.cut_off_low <= 0.0 {
            return Err(EegError::InvalidConfiguration {
                message: format!("Low cutoff must be positive, got {}Hz", self.cut_off_low),
            });
        }
        if self.cut_off_high >= self.nyquist() {
            return Err(EegError::InvalidConfiguration {
                message: format!(
                    "High cutoff {}Hz must be below the Nyquist frequency {}Hz",
                    self.cut_off_high,
                    self.nyquist()
                ),
            });
        }
        if !self.bins.is_power_of_two() {
            return Err(EegError::InvalidConfiguration {
                message: format!("Transform size must be a power of two, got {}", self.bins),
            });
        }
        if self.duration % self.bins != 0 {
            return Err(EegError::InvalidConfiguration {
                message: format!(
                    "Epoch duration {} must be a multiple of the transform size {}",
                    self.duration, self.bins
                ),
            });
        }
        if self.slice_fft_low < 0.0 || self.slice_fft_low >= self.slice_fft_high {
            return Err(EegError::InvalidConfiguration {
                message: format!(
                    "Spectrum slice [{}, {}]Hz is inverted or negative",
                    self.slice_fft_low, self.slice_fft_high
                ),
            });
        }
        if self.slice_fft_high > self.nyquist() {
            return Err(EegError::InvalidConfiguration {
                message: format!(
                    "Spectrum slice upper edge {}Hz exceeds the Nyquist frequency {}Hz",
                    self.slice_fft_high,
                    self.nyquist()
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_valid() {
        assert!(PipelineSettings::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_cutoffs_rejected() {
        let settings = PipelineSettings {
            cut_off_low: 50.0,
            cut_off_high: 2.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_cutoff_above_nyquist_rejected() {
        let settings = PipelineSettings {
            cut_off_high: 200.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_slice_outside_nyquist_rejected() {
        let settings = PipelineSettings {
            slice_fft_high: 500.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_duration_must_be_multiple_of_bins() {
        let settings = PipelineSettings {
            duration: 1000,
            bins: 256,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let ok = PipelineSettings {
            duration: 1024,
            bins: 256,
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_non_power_of_two_bins_rejected() {
        let settings = PipelineSettings {
            duration: 900,
            bins: 300,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
