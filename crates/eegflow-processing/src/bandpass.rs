//! Per-channel stateful bandpass filtering

use eegflow_core::{EegError, EegResult, Sample};

/// Single biquad section (2nd order)
#[derive(Debug, Clone)]
struct BiquadSection {
    // Coefficients: y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    // State per channel
    x1: Vec<f32>,
    x2: Vec<f32>,
    y1: Vec<f32>,
    y2: Vec<f32>,
}

impl BiquadSection {
    fn new(channel_count: usize) -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: vec![0.0; channel_count],
            x2: vec![0.0; channel_count],
            y1: vec![0.0; channel_count],
            y2: vec![0.0; channel_count],
        }
    }

    /// 2nd order Butterworth lowpass via bilinear transform
    fn lowpass(cutoff: f32, srate: f32, channel_count: usize) -> Self {
        let k = (std::f32::consts::PI * cutoff / srate).tan();
        let sqrt2 = std::f32::consts::SQRT_2;
        let k2 = k * k;
        let norm = k2 + sqrt2 * k + 1.0;

        let mut section = Self::new(channel_count);
        section.b0 = k2 / norm;
        section.b1 = 2.0 * section.b0;
        section.b2 = section.b0;
        section.a1 = (2.0 * (k2 - 1.0)) / norm;
        section.a2 = (k2 - sqrt2 * k + 1.0) / norm;
        section
    }

    /// 2nd order Butterworth highpass via bilinear transform
    fn highpass(cutoff: f32, srate: f32, channel_count: usize) -> Self {
        let k = (std::f32::consts::PI * cutoff / srate).tan();
        let sqrt2 = std::f32::consts::SQRT_2;
        let k2 = k * k;
        let norm = k2 + sqrt2 * k + 1.0;

        let mut section = Self::new(channel_count);
        section.b0 = 1.0 / norm;
        section.b1 = -2.0 * section.b0;
        section.b2 = section.b0;
        section.a1 = (2.0 * (k2 - 1.0)) / norm;
        section.a2 = (k2 - sqrt2 * k + 1.0) / norm;
        section
    }

    fn process_sample(&mut self, input: f32, channel: usize) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1[channel] + self.b2 * self.x2[channel]
            - self.a1 * self.y1[channel]
            - self.a2 * self.y2[channel];

        self.x2[channel] = self.x1[channel];
        self.x1[channel] = input;
        self.y2[channel] = self.y1[channel];
        self.y1[channel] = output;

        output
    }

    fn reset(&mut self) {
        self.x1.fill(0.0);
        self.x2.fill(0.0);
        self.y1.fill(0.0);
        self.y2.fill(0.0);
    }
}

/// Butterworth bandpass built as a highpass/lowpass biquad cascade.
///
/// One filter state instance per channel; state persists across samples
/// within one configuration and is discarded wholesale on rebuild.
/// Output is deterministic for identical input and configuration.
pub struct BandpassFilter {
    sections: Vec<BiquadSection>,
    channel_count: usize,
    low: f32,
    high: f32,
}

impl BandpassFilter {
    /// Create a bandpass filter for `[low, high]` Hz.
    ///
    /// Rejects `low >= high` and `high >= srate / 2`.
    pub fn new(low: f32, high: f32, srate: f32, channel_count: usize) -> EegResult<Self> {
        if channel_count == 0 {
            return Err(EegError::InvalidConfiguration {
                message: "Bandpass filter requires at least one channel".to_string(),
            });
        }
        if low <= 0.0 || low >= high {
            return Err(EegError::InvalidConfiguration {
                message: format!("Invalid bandpass range [{}, {}]Hz", low, high),
            });
        }
        if high >= srate / 2.0 {
            return Err(EegError::InvalidConfiguration {
                message: format!(
                    "High cutoff {}Hz must be below the Nyquist frequency {}Hz",
                    high,
                    srate / 2.0
                ),
            });
        }

        let sections = vec![
            BiquadSection::highpass(low, srate, channel_count),
            BiquadSection::lowpass(high, srate, channel_count),
        ];

        Ok(BandpassFilter {
            sections,
            channel_count,
            low,
            high,
        })
    }

    /// Filter one sample, producing a sample of identical shape
    pub fn apply(&mut self, sample: &Sample) -> EegResult<Sample> {
        sample.check_channels(self.channel_count)?;

        let mut filtered = Vec::with_capacity(self.channel_count);
        for (channel, &value) in sample.channels.iter().enumerate() {
            let mut v = value;
            for section in &mut self.sections {
                v = section.process_sample(v, channel);
            }
            filtered.push(v);
        }

        Ok(Sample::with_aux(sample.timestamp, filtered, sample.aux))
    }

    /// Zero all per-channel filter state
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    /// Configured passband edges in Hz
    pub fn band(&self) -> (f32, f32) {
        (self.low, self.high)
    }
}
