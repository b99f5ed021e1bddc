//! Frequency-domain frames and the consumer-facing frame enum

use crate::epoch::Epoch;
use serde::{Deserialize, Serialize};

/// Canonical physiological band boundaries in Hz.
///
/// Gamma is open-ended; its effective upper edge is the Nyquist
/// frequency of the configuration that produced the frame.
pub const BAND_EDGES: [(&str, f32, f32); 5] = [
    ("delta", 1.0, 4.0),
    ("theta", 4.0, 8.0),
    ("alpha", 8.0, 13.0),
    ("beta", 13.0, 30.0),
    ("gamma", 30.0, f32::INFINITY),
];

/// Per-channel power spectral density, sliced to the configured range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerSpectrum {
    /// Power per frequency bin, one vector per channel
    pub channels: Vec<Vec<f32>>,
    /// Bin-center frequencies in Hz, ascending, parallel to each channel
    pub frequencies: Vec<f32>,
    /// Timestamp of the source epoch, milliseconds since the Unix epoch
    pub timestamp: f64,
}

impl PowerSpectrum {
    /// Index of the bin with the highest power for one channel
    pub fn peak_bin(&self, channel: usize) -> Option<usize> {
        let data = self.channels.get(channel)?;
        data.iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }

    /// Frequency of the strongest bin for one channel
    pub fn peak_frequency(&self, channel: usize) -> Option<f32> {
        self.peak_bin(channel).map(|i| self.frequencies[i])
    }
}

/// Mean power per canonical band for a single channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPowers {
    pub delta: f32,
    pub theta: f32,
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl BandPowers {
    /// Band values in canonical order (delta through gamma)
    pub fn as_array(&self) -> [f32; 5] {
        [self.delta, self.theta, self.alpha, self.beta, self.gamma]
    }

    /// Band names in canonical order
    pub fn names() -> [&'static str; 5] {
        ["delta", "theta", "alpha", "beta", "gamma"]
    }
}

/// Per-channel band powers derived from one epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandPowerFrame {
    /// One entry per channel, channel order preserved
    pub channels: Vec<BandPowers>,
    /// Timestamp of the source epoch, milliseconds since the Unix epoch
    pub timestamp: f64,
}

/// The unit of delivery to hub subscribers.
///
/// Consumers receive the frame shaped as `{ data, labels }`: per-channel
/// value vectors plus one shared label axis (time offsets in ms for raw
/// epochs, bin frequencies for spectra, band indices for band power).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineFrame {
    Raw(Epoch),
    Spectrum(PowerSpectrum),
    Bands(BandPowerFrame),
}

impl PipelineFrame {
    /// Timestamp carried by the frame, milliseconds since the Unix epoch
    pub fn timestamp(&self) -> f64 {
        match self {
            PipelineFrame::Raw(e) => e.start_timestamp,
            PipelineFrame::Spectrum(s) => s.timestamp,
            PipelineFrame::Bands(b) => b.timestamp,
        }
    }

    /// Number of channels in the frame
    pub fn channel_count(&self) -> usize {
        match self {
            PipelineFrame::Raw(e) => e.channel_count(),
            PipelineFrame::Spectrum(s) => s.channels.len(),
            PipelineFrame::Bands(b) => b.channels.len(),
        }
    }

    /// Shared label axis for all channels
    pub fn labels(&self) -> Vec<f32> {
        match self {
            PipelineFrame::Raw(e) => e.time_offsets_ms(),
            PipelineFrame::Spectrum(s) => s.frequencies.clone(),
            PipelineFrame::Bands(_) => (0..5).map(|i| i as f32).collect(),
        }
    }

    /// Per-channel value vectors, channel order preserved
    pub fn data(&self) -> Vec<Vec<f32>> {
        match self {
            PipelineFrame::Raw(e) => e.channels.clone(),
            PipelineFrame::Spectrum(s) => s.channels.clone(),
            PipelineFrame::Bands(b) => b.channels.iter().map(|c| c.as_array().to_vec()).collect(),
        }
    }

    /// CSV header row for recordings of this frame shape
    pub fn csv_header(&self) -> String {
        let mut columns = vec!["Timestamp (ms)".to_string()];
        match self {
            PipelineFrame::Raw(e) => {
                for ch in 0..e.channel_count() {
                    for offset in e.time_offsets_ms() {
                        columns.push(format!("ch{}_{:.1}ms", ch, offset));
                    }
                }
            }
            PipelineFrame::Spectrum(s) => {
                for ch in 0..s.channels.len() {
                    for freq in &s.frequencies {
                        columns.push(format!("ch{}_{:.2}Hz", ch, freq));
                    }
                }
            }
            PipelineFrame::Bands(b) => {
                for ch in 0..b.channels.len() {
                    for name in BandPowers::names() {
                        columns.push(format!("ch{}_{}", ch, name));
                    }
                }
            }
        }
        columns.push("info".to_string());
        columns.join(",")
    }

    /// CSV data row: timestamp, all channel values flattened, info field
    pub fn csv_row(&self, info: &str) -> String {
        let mut fields = vec![format!("{}", self.timestamp())];
        for channel in self.data() {
            for value in channel {
                fields.push(format!("{}", value));
            }
        }
        fields.push(info.to_string());
        fields.join(",")
    }
}
