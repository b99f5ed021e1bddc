//! Epoch windowing over the filtered sample stream

use eegflow_core::{EegResult, Epoch, Sample};
use std::collections::VecDeque;

/// Buffers samples into fixed-length, possibly-overlapping epochs.
///
/// Maintains a per-channel ring buffer of the last `duration` samples
/// and emits a copied snapshot every `interval` samples once the buffer
/// has first filled. `interval <= duration` yields overlapping epochs,
/// `interval > duration` yields gaps; both are supported. No partial
/// epoch is ever emitted, including right after a reset.
pub struct EpochWindower {
    duration: usize,
    interval: usize,
    srate: f32,
    channel_count: usize,
    buffers: Vec<VecDeque<f32>>,
    timestamps: VecDeque<f64>,
    primed: bool,
    samples_since_emit: usize,
}

impl EpochWindower {
    pub fn new(duration: usize, interval: usize, srate: f32, channel_count: usize) -> Self {
        EpochWindower {
            duration,
            interval,
            srate,
            channel_count,
            buffers: vec![VecDeque::with_capacity(duration); channel_count],
            timestamps: VecDeque::with_capacity(duration),
            primed: false,
            samples_since_emit: 0,
        }
    }

    /// Push one filtered sample; returns an epoch when one is due
    pub fn push(&mut self, sample: &Sample) -> EegResult<Option<Epoch>> {
        sample.check_channels(self.channel_count)?;

        for (buffer, &value) in self.buffers.iter_mut().zip(sample.channels.iter()) {
            buffer.push_back(value);
            if buffer.len() > self.duration {
                buffer.pop_front();
            }
        }
        self.timestamps.push_back(sample.timestamp);
        if self.timestamps.len() > self.duration {
            self.timestamps.pop_front();
        }

        if !self.primed {
            if self.timestamps.len() == self.duration {
                self.primed = true;
                self.samples_since_emit = 0;
                return self.snapshot().map(Some);
            }
            return Ok(None);
        }

        self.samples_since_emit += 1;
        if self.samples_since_emit >= self.interval {
            self.samples_since_emit = 0;
            return self.snapshot().map(Some);
        }

        Ok(None)
    }

    /// Copy, not a view: the returned epoch is detached from the ring
    fn snapshot(&self) -> EegResult<Epoch> {
        let channels: Vec<Vec<f32>> = self
            .buffers
            .iter()
            .map(|b| b.iter().copied().collect())
            .collect();
        let start = *self.timestamps.front().unwrap_or(&0.0);
        Epoch::new(channels, self.srate, start)
    }

    /// Discard all buffered state; refilling starts from zero
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
        self.timestamps.clear();
        self.primed = false;
        self.samples_since_emit = 0;
    }

    /// Configured epoch length in samples
    pub fn duration(&self) -> usize {
        self.duration
    }

    /// Configured emission stride in samples
    pub fn interval(&self) -> usize {
        self.interval
    }
}
