//! Alignment of independent per-electrode streams into whole samples

use eegflow_core::{EegError, EegResult, ChannelReading, Sample};
use std::collections::BTreeMap;

/// Partially assembled sample for one index
struct PendingSlot {
    values: Vec<Option<f32>>,
    filled: usize,
    timestamp: f64,
}

impl PendingSlot {
    fn new(channel_count: usize) -> Self {
        PendingSlot {
            values: vec![None; channel_count],
            filled: 0,
            timestamp: 0.0,
        }
    }

    fn complete(&self) -> bool {
        self.filled == self.values.len()
    }
}

/// Pairs per-electrode readings by sample index into combined samples.
///
/// One combined sample is released per completed index, in index order:
/// a completed index is held until every smaller index has completed or
/// been evicted. The pending window is bounded: if a channel silently
/// stops producing, the oldest incomplete index is evicted once
/// `max_pending` distinct indices are in flight, so partial state never
/// grows unboundedly.
pub struct ChannelSynchronizer {
    channel_count: usize,
    max_pending: usize,
    pending: BTreeMap<u64, PendingSlot>,
    /// Highest index already released or evicted; late readings below
    /// this watermark are dropped.
    watermark: Option<u64>,
    evicted: u64,
}

impl ChannelSynchronizer {
    pub fn new(channel_count: usize, max_pending: usize) -> EegResult<Self> {
        if channel_count == 0 {
            return Err(EegError::InvalidConfiguration {
                message: "Synchronizer requires at least one channel".to_string(),
            });
        }
        if max_pending == 0 {
            return Err(EegError::InvalidConfiguration {
                message: "Pending window must hold at least one index".to_string(),
            });
        }
        Ok(ChannelSynchronizer {
            channel_count,
            max_pending,
            pending: BTreeMap::new(),
            watermark: None,
            evicted: 0,
        })
    }

    /// Feed one reading; returns any samples released in index order
    pub fn push_reading(&mut self, reading: ChannelReading) -> EegResult<Vec<Sample>> {
        if reading.channel >= self.channel_count {
            return Err(EegError::ChannelMismatch {
                expected: self.channel_count,
                actual: reading.channel + 1,
            });
        }

        // Straggler for an index we already moved past.
        if let Some(watermark) = self.watermark {
            if reading.index <= watermark {
                return Ok(Vec::new());
            }
        }

        if !self.pending.contains_key(&reading.index) && self.pending.len() >= self.max_pending {
            self.evict_oldest_incomplete();
        }

        let slot = self
            .pending
            .entry(reading.index)
            .or_insert_with(|| PendingSlot::new(self.channel_count));
        if slot.values[reading.channel].is_none() {
            slot.filled += 1;
        }
        slot.values[reading.channel] = Some(reading.value);
        slot.timestamp = slot.timestamp.max(reading.timestamp);

        Ok(self.drain_ready())
    }

    /// Validate and pass through an already-combined sample
    pub fn push_sample(&self, sample: &Sample) -> EegResult<()> {
        sample.check_channels(self.channel_count)
    }

    /// Release completed slots from the front of the index order
    fn drain_ready(&mut self) -> Vec<Sample> {
        let mut released = Vec::new();
        while self
            .pending
            .first_key_value()
            .map_or(false, |(_, slot)| slot.complete())
        {
            if let Some((index, slot)) = self.pending.pop_first() {
                self.watermark = Some(index);
                let channels = slot.values.into_iter().map(|v| v.unwrap_or(0.0)).collect();
                released.push(Sample::new(slot.timestamp, channels));
            }
        }
        released
    }

    fn evict_oldest_incomplete(&mut self) {
        let oldest_incomplete = self
            .pending
            .iter()
            .find(|(_, slot)| !slot.complete())
            .map(|(&index, _)| index);
        if let Some(index) = oldest_incomplete {
            self.pending.remove(&index);
            self.watermark = Some(self.watermark.map_or(index, |w| w.max(index)));
            self.evicted += 1;
        }
    }

    /// How many incomplete indices have been evicted so far
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Indices currently awaiting readings
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(channel: usize, index: u64, value: f32) -> ChannelReading {
        ChannelReading::new(channel, index, value, index as f64)
    }

    #[test]
    fn test_emits_when_all_channels_arrive() {
        let mut sync = ChannelSynchronizer::new(3, 16).unwrap();
        assert!(sync.push_reading(reading(0, 0, 0.1)).unwrap().is_empty());
        assert!(sync.push_reading(reading(1, 0, 0.2)).unwrap().is_empty());
        let released = sync.push_reading(reading(2, 0, 0.3)).unwrap();
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].channels, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_index_order_preserved() {
        let mut sync = ChannelSynchronizer::new(2, 16).unwrap();
        // Index 1 completes before index 0.
        sync.push_reading(reading(0, 1, 1.0)).unwrap();
        let held = sync.push_reading(reading(1, 1, 1.5)).unwrap();
        assert!(held.is_empty(), "index 1 must wait for index 0");

        sync.push_reading(reading(0, 0, 0.1)).unwrap();
        let released = sync.push_reading(reading(1, 0, 0.2)).unwrap();
        assert_eq!(released.len(), 2);
        assert_eq!(released[0].channels, vec![0.1, 0.2]);
        assert_eq!(released[1].channels, vec![1.0, 1.5]);
    }

    #[test]
    fn test_invalid_channel_rejected() {
        let mut sync = ChannelSynchronizer::new(2, 16).unwrap();
        assert!(matches!(
            sync.push_reading(reading(2, 0, 0.0)),
            Err(EegError::ChannelMismatch { expected: 2, .. })
        ));
    }

    #[test]
    fn test_abandoned_index_evicted() {
        let mut sync = ChannelSynchronizer::new(2, 4).unwrap();
        // Channel 1 never delivers index 0.
        sync.push_reading(reading(0, 0, 0.0)).unwrap();
        for index in 1..=4 {
            sync.push_reading(reading(0, index, 0.0)).unwrap();
            sync.push_reading(reading(1, index, 0.0)).unwrap();
        }
        // The window overflowed, index 0 was dropped, later indices flowed.
        assert_eq!(sync.evicted(), 1);
        assert!(sync.pending_len() <= 4);
    }

    #[test]
    fn test_eviction_releases_queued_samples() {
        let mut sync = ChannelSynchronizer::new(2, 2).unwrap();
        // Index 0 stays incomplete; index 1 completes behind it.
        sync.push_reading(reading(0, 0, 9.0)).unwrap();
        sync.push_reading(reading(0, 1, 1.0)).unwrap();
        assert!(sync.push_reading(reading(1, 1, 2.0)).unwrap().is_empty());

        // A third index forces the eviction of index 0, unblocking index 1.
        let released = sync.push_reading(reading(0, 2, 5.0)).unwrap();
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].channels, vec![1.0, 2.0]);
    }

    #[test]
    fn test_straggler_below_watermark_dropped() {
        let mut sync = ChannelSynchronizer::new(2, 16).unwrap();
        sync.push_reading(reading(0, 0, 0.1)).unwrap();
        sync.push_reading(reading(1, 0, 0.2)).unwrap();
        // A duplicate reading for the already-released index is ignored.
        let released = sync.push_reading(reading(0, 0, 9.9)).unwrap();
        assert!(released.is_empty());
        assert_eq!(sync.pending_len(), 0);
    }

    #[test]
    fn test_pass_through_sample_validation() {
        let sync = ChannelSynchronizer::new(4, 16).unwrap();
        assert!(sync.push_sample(&Sample::new(0.0, vec![0.0; 4])).is_ok());
        assert!(sync.push_sample(&Sample::new(0.0, vec![0.0; 3])).is_err());
    }
}
