//! Frequency transform: PSD and band-power aggregation per epoch

use eegflow_core::{
    BandPowerFrame, BandPowers, EegError, EegResult, Epoch, PipelineSettings, PowerSpectrum,
    BAND_EDGES,
};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Indices of the bins whose center frequency lies in `[low, high]`,
/// as a half-open range over an ascending frequency axis.
pub fn slice_range(frequencies: &[f32], low: f32, high: f32) -> (usize, usize) {
    let start = frequencies.partition_point(|&f| f < low);
    let end = frequencies.partition_point(|&f| f <= high);
    (start, end)
}

/// Welch-style spectral transform over one epoch.
///
/// Each channel is split into `duration / bins` consecutive segments of
/// exactly `bins` samples; every segment is Hann-windowed, FFT'd, and
/// the one-sided segment powers are averaged. Shape policy: an epoch
/// whose per-channel length is not a positive multiple of `bins` fails
/// the frame with a transform error, never silent zero-padding or
/// truncation.
pub struct SpectralTransform {
    bins: usize,
    srate: f32,
    slice_low: f32,
    slice_high: f32,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    transforms_run: u64,
}

impl SpectralTransform {
    pub fn new(settings: &PipelineSettings) -> EegResult<Self> {
        settings.validate()?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(settings.bins);

        // Hann window
        let window: Vec<f32> = (0..settings.bins)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / settings.bins as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        Ok(SpectralTransform {
            bins: settings.bins,
            srate: settings.srate,
            slice_low: settings.slice_fft_low,
            slice_high: settings.slice_fft_high,
            fft,
            window,
            transforms_run: 0,
        })
    }

    /// Bin-center frequencies of the one-sided spectrum, ascending
    pub fn frequencies(&self) -> Vec<f32> {
        (0..self.bins / 2)
            .map(|k| k as f32 * self.srate / self.bins as f32)
            .collect()
    }

    /// How many epoch-level transforms have executed
    pub fn transforms_run(&self) -> u64 {
        self.transforms_run
    }

    /// Averaged one-sided power spectrum for every channel, unsliced
    fn full_spectrum(&mut self, epoch: &Epoch) -> EegResult<Vec<Vec<f32>>> {
        let samples = epoch.samples_per_channel();
        if samples == 0 || samples % self.bins != 0 {
            return Err(EegError::TransformError {
                message: format!(
                    "Epoch length {} is not a multiple of the transform size {}",
                    samples, self.bins
                ),
            });
        }

        self.transforms_run += 1;
        let segments = samples / self.bins;
        let half = self.bins / 2;
        let scale = 2.0 / (self.bins as f32 * self.bins as f32);

        let mut spectra = Vec::with_capacity(epoch.channel_count());
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.bins];

        for channel in &epoch.channels {
            let mut power = vec![0.0f32; half];
            for segment in channel.chunks_exact(self.bins) {
                for (dst, (&v, &w)) in buffer.iter_mut().zip(segment.iter().zip(&self.window)) {
                    *dst = Complex::new(v * w, 0.0);
                }
                self.fft.process(&mut buffer);
                for (p, c) in power.iter_mut().zip(buffer.iter().take(half)) {
                    *p += c.norm_sqr() * scale;
                }
            }
            for p in &mut power {
                *p /= segments as f32;
            }
            spectra.push(power);
        }

        Ok(spectra)
    }

    /// PSD per channel, sliced to the configured frequency range
    pub fn power_spectrum(&mut self, epoch: &Epoch) -> EegResult<PowerSpectrum> {
        let spectra = self.full_spectrum(epoch)?;
        let frequencies = self.frequencies();
        let (start, end) = slice_range(&frequencies, self.slice_low, self.slice_high);

        Ok(PowerSpectrum {
            channels: spectra.into_iter().map(|s| s[start..end].to_vec()).collect(),
            frequencies: frequencies[start..end].to_vec(),
            timestamp: epoch.start_timestamp,
        })
    }

    /// Mean power per canonical band for every channel
    pub fn band_powers(&mut self, epoch: &Epoch) -> EegResult<BandPowerFrame> {
        let spectra = self.full_spectrum(epoch)?;
        let frequencies = self.frequencies();
        let nyquist = self.srate / 2.0;

        let channels = spectra
            .into_iter()
            .map(|spectrum| {
                let mut bands = [0.0f32; 5];
                for (slot, &(_, low, high)) in bands.iter_mut().zip(BAND_EDGES.iter()) {
                    let high = high.min(nyquist);
                    let (start, end) = slice_range(&frequencies, low, high);
                    if end > start {
                        *slot = spectrum[start..end].iter().sum::<f32>() / (end - start) as f32;
                    }
                }
                BandPowers {
                    delta: bands[0],
                    theta: bands[1],
                    alpha: bands[2],
                    beta: bands[3],
                    gamma: bands[4],
                }
            })
            .collect();

        Ok(BandPowerFrame {
            channels,
            timestamp: epoch.start_timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PipelineSettings {
        PipelineSettings {
            duration: 512,
            interval: 128,
            bins: 256,
            srate: 256.0,
            slice_fft_low: 1.0,
            slice_fft_high: 30.0,
            channel_count: 1,
            ..Default::default()
        }
    }

    fn sine_epoch(freq: f32, srate: f32, samples: usize, channels: usize) -> Epoch {
        let data: Vec<f32> = (0..samples)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / srate).sin())
            .collect();
        Epoch::new(vec![data; channels], srate, 0.0).unwrap()
    }

    #[test]
    fn test_slice_range_exact_bounds() {
        let freqs: Vec<f32> = (0..128).map(|k| k as f32).collect();
        let (start, end) = slice_range(&freqs, 1.0, 30.0);
        assert_eq!(start, 1);
        assert_eq!(end, 31); // 30 Hz bin included
        assert!(freqs[start..end].iter().all(|&f| (1.0..=30.0).contains(&f)));
        assert!(freqs[start..end].windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_slice_range_fractional_bounds() {
        let freqs = vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5];
        let (start, end) = slice_range(&freqs, 0.6, 2.2);
        assert_eq!(&freqs[start..end], &[1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_sine_peak_at_expected_bin() {
        let mut transform = SpectralTransform::new(&settings()).unwrap();
        let epoch = sine_epoch(10.0, 256.0, 512, 1);
        let spectrum = transform.power_spectrum(&epoch).unwrap();
        // 1 Hz resolution, sliced from 1 Hz: the 10 Hz peak sits at index 9.
        assert_eq!(spectrum.peak_frequency(0), Some(10.0));
    }

    #[test]
    fn test_shape_mismatch_fails_frame() {
        let mut transform = SpectralTransform::new(&settings()).unwrap();
        let epoch = sine_epoch(10.0, 256.0, 500, 1);
        assert!(matches!(
            transform.power_spectrum(&epoch),
            Err(EegError::TransformError { .. })
        ));
        // A failed frame does not count as a transform run.
        assert_eq!(transform.transforms_run(), 0);
    }

    #[test]
    fn test_band_powers_alpha_dominant() {
        let mut transform = SpectralTransform::new(&settings()).unwrap();
        let epoch = sine_epoch(10.0, 256.0, 512, 2);
        let frame = transform.band_powers(&epoch).unwrap();
        assert_eq!(frame.channels.len(), 2);
        for bands in &frame.channels {
            assert!(bands.alpha > bands.delta);
            assert!(bands.alpha > bands.theta);
            assert!(bands.alpha > bands.beta);
            assert!(bands.alpha > bands.gamma);
        }
    }

    #[test]
    fn test_channel_order_preserved() {
        let srate = 256.0;
        let ch0: Vec<f32> = (0..512)
            .map(|i| (2.0 * std::f32::consts::PI * 6.0 * i as f32 / srate).sin())
            .collect();
        let ch1: Vec<f32> = (0..512)
            .map(|i| (2.0 * std::f32::consts::PI * 20.0 * i as f32 / srate).sin())
            .collect();
        let epoch = Epoch::new(vec![ch0, ch1], srate, 0.0).unwrap();

        let mut transform = SpectralTransform::new(&settings()).unwrap();
        let spectrum = transform.power_spectrum(&epoch).unwrap();
        assert_eq!(spectrum.peak_frequency(0), Some(6.0));
        assert_eq!(spectrum.peak_frequency(1), Some(20.0));
    }

    #[test]
    fn test_transform_counter() {
        let mut transform = SpectralTransform::new(&settings()).unwrap();
        let epoch = sine_epoch(10.0, 256.0, 512, 1);
        transform.power_spectrum(&epoch).unwrap();
        transform.power_spectrum(&epoch).unwrap();
        transform.band_powers(&epoch).unwrap();
        assert_eq!(transform.transforms_run(), 3);
    }
}
