//! Pre-defined waveform patterns for synthetic EEG

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Deterministic waveform underlying the synthetic signal, before
/// noise and powerline components are added
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WaveformPattern {
    /// Constant offset (electrode at rest)
    Flat { level: f32 },
    /// Single sine, e.g. a posterior alpha rhythm
    Sine { frequency: f32, amplitude: f32 },
    /// Sum of sines: `(frequency, amplitude)` pairs
    Mixed { components: Vec<(f32, f32)> },
}

impl WaveformPattern {
    /// Signal value at a given time, in microvolts
    pub fn value_at(&self, time: f32) -> f32 {
        match self {
            WaveformPattern::Flat { level } => *level,

            WaveformPattern::Sine { frequency, amplitude } => {
                amplitude * (2.0 * PI * frequency * time).sin()
            }

            WaveformPattern::Mixed { components } => components
                .iter()
                .map(|(frequency, amplitude)| amplitude * (2.0 * PI * frequency * time).sin())
                .sum(),
        }
    }

    /// Pattern description for logs and demo UIs
    pub fn description(&self) -> &'static str {
        match self {
            WaveformPattern::Flat { .. } => "Flat offset",
            WaveformPattern::Sine { .. } => "Single sine",
            WaveformPattern::Mixed { .. } => "Mixed sines",
        }
    }

    /// Common presets for demos and tests
    pub fn presets() -> Vec<(&'static str, WaveformPattern)> {
        vec![
            ("Eyes closed (alpha)", WaveformPattern::Sine {
                frequency: 10.0,
                amplitude: 20.0,
            }),
            ("Drowsy (theta)", WaveformPattern::Sine {
                frequency: 6.0,
                amplitude: 15.0,
            }),
            ("Focused (beta)", WaveformPattern::Sine {
                frequency: 20.0,
                amplitude: 8.0,
            }),
            ("Resting mix", WaveformPattern::Mixed {
                components: vec![(10.0, 20.0), (6.0, 8.0), (20.0, 4.0)],
            }),
            ("Flatline", WaveformPattern::Flat { level: 0.0 }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_at_quarter_period() {
        let pattern = WaveformPattern::Sine {
            frequency: 10.0,
            amplitude: 2.0,
        };
        let v = pattern.value_at(0.025); // quarter period of 10 Hz
        assert!((v - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_mixed_is_sum_of_sines() {
        let mixed = WaveformPattern::Mixed {
            components: vec![(10.0, 1.0), (20.0, 0.5)],
        };
        let a = WaveformPattern::Sine { frequency: 10.0, amplitude: 1.0 };
        let b = WaveformPattern::Sine { frequency: 20.0, amplitude: 0.5 };
        let t = 0.013;
        assert!((mixed.value_at(t) - (a.value_at(t) + b.value_at(t))).abs() < 1e-5);
    }

    #[test]
    fn test_presets_nonempty() {
        assert!(!WaveformPattern::presets().is_empty());
    }
}
