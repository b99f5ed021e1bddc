//! Single-execution fan-out of pipeline frames

use eegflow_core::{EegError, EegResult, PipelineFrame, PipelineMode, PipelineSettings, Sample};
use eegflow_processing::{ChainMetrics, SignalChain};
use std::sync::Arc;
use tracing::{debug, warn};

/// Callback invoked once per delivered frame
pub type FrameCallback = Box<dyn FnMut(&Arc<PipelineFrame>) + Send>;

struct SubscriberSlot {
    id: u64,
    name: String,
    callback: FrameCallback,
    /// Deliveries left before the slot retires; `None` = unbounded
    remaining: Option<usize>,
}

/// Owns one [`SignalChain`] and fans its frames out to subscribers.
///
/// Every raw sample is pushed through the chain exactly once no matter
/// how many subscribers are attached; each resulting frame is shared by
/// `Arc` and delivered synchronously, in subscription order, during the
/// same `push_sample` call. A subscriber attached after a frame was
/// produced never sees that frame.
pub struct MulticastHub {
    chain: SignalChain,
    subscribers: Vec<SubscriberSlot>,
    next_id: u64,
    frames_delivered: u64,
}

impl MulticastHub {
    pub fn new(settings: PipelineSettings, mode: PipelineMode) -> EegResult<Self> {
        let chain = SignalChain::build(settings, mode)?;
        Ok(MulticastHub {
            chain,
            subscribers: Vec::new(),
            next_id: 0,
            frames_delivered: 0,
        })
    }

    /// Attach a subscriber that receives every future frame
    pub fn subscribe(&mut self, name: impl Into<String>, callback: FrameCallback) -> u64 {
        self.add_slot(name.into(), callback, None)
    }

    /// Attach a subscriber that retires after `limit` deliveries
    pub fn subscribe_bounded(
        &mut self,
        name: impl Into<String>,
        limit: usize,
        callback: FrameCallback,
    ) -> u64 {
        self.add_slot(name.into(), callback, Some(limit))
    }

    fn add_slot(&mut self, name: String, callback: FrameCallback, remaining: Option<usize>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        // A zero-frame subscription is already exhausted; never register it.
        if remaining == Some(0) {
            debug!(subscriber = %name, id, "zero-bound subscriber not attached");
            return id;
        }
        debug!(subscriber = %name, id, bounded = remaining.is_some(), "hub subscriber attached");
        self.subscribers.push(SubscriberSlot {
            id,
            name,
            callback,
            remaining,
        });
        id
    }

    /// Detach a subscriber; returns false if the id is unknown
    pub fn unsubscribe(&mut self, id: u64) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|slot| slot.id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Feed one raw sample through the chain, fanning out any frame it
    /// yields. Returns true when a frame was delivered this call.
    ///
    /// A transform failure drops only the affected frame; the hub and
    /// chain remain usable. Upstream errors (channel mismatch, source)
    /// propagate to the caller.
    pub fn push_sample(&mut self, sample: &Sample) -> EegResult<bool> {
        match self.chain.push(sample) {
            Ok(Some(frame)) => {
                self.deliver(frame);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(EegError::TransformError { message }) => {
                warn!(%message, "dropping frame after transform failure");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn deliver(&mut self, frame: PipelineFrame) {
        let frame = Arc::new(frame);
        self.frames_delivered += 1;

        let mut retired = Vec::new();
        for slot in &mut self.subscribers {
            (slot.callback)(&frame);
            if let Some(remaining) = &mut slot.remaining {
                *remaining -= 1;
                if *remaining == 0 {
                    debug!(subscriber = %slot.name, id = slot.id, "bounded subscriber retired");
                    retired.push(slot.id);
                }
            }
        }
        if !retired.is_empty() {
            self.subscribers.retain(|slot| !retired.contains(&slot.id));
        }
    }

    /// Replace the chain with one built for new settings, keeping all
    /// subscribers attached. Invalid settings leave the old chain live.
    pub fn rebuild(&mut self, settings: PipelineSettings, mode: PipelineMode) -> EegResult<()> {
        self.chain = SignalChain::build(settings, mode)?;
        debug!(?mode, "hub chain rebuilt");
        Ok(())
    }

    /// Clear stage state without touching subscribers or configuration
    pub fn reset_chain(&mut self) {
        self.chain.reset();
    }

    pub fn settings(&self) -> &PipelineSettings {
        self.chain.settings()
    }

    pub fn mode(&self) -> PipelineMode {
        self.chain.mode()
    }

    pub fn metrics(&self) -> ChainMetrics {
        self.chain.metrics()
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }

    /// Epoch-level transform executions in the current chain
    pub fn transforms_run(&self) -> u64 {
        self.chain.transforms_run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    fn settings() -> PipelineSettings {
        PipelineSettings {
            duration: 256,
            interval: 64,
            bins: 256,
            srate: 256.0,
            channel_count: 2,
            ..Default::default()
        }
    }

    fn feed_sine(hub: &mut MulticastHub, count: usize) -> usize {
        let srate = hub.settings().srate;
        let channels = hub.settings().channel_count;
        let mut delivered = 0;
        for i in 0..count {
            let t = i as f32 / srate;
            let v = (2.0 * std::f32::consts::PI * 10.0 * t).sin();
            let sample = Sample::new(i as f64 * 1000.0 / srate as f64, vec![v; channels]);
            if hub.push_sample(&sample).unwrap() {
                delivered += 1;
            }
        }
        delivered
    }

    #[test]
    fn test_single_execution_many_subscribers() {
        let mut hub = MulticastHub::new(settings(), PipelineMode::Spectrum).unwrap();

        let counts: Vec<Arc<AtomicU64>> = (0..3).map(|_| Arc::new(AtomicU64::new(0))).collect();
        for count in &counts {
            let count = Arc::clone(count);
            hub.subscribe("viewer", Box::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }

        let delivered = feed_sine(&mut hub, 512);
        assert_eq!(delivered, 5);
        // Three subscribers, but the spectral transform ran once per epoch.
        assert_eq!(hub.transforms_run(), 5);
        for count in &counts {
            assert_eq!(count.load(Ordering::SeqCst), 5);
        }
    }

    #[test]
    fn test_late_subscriber_sees_no_old_frames() {
        let mut hub = MulticastHub::new(settings(), PipelineMode::Raw).unwrap();
        feed_sine(&mut hub, 320); // two frames already delivered

        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = Arc::clone(&seen);
        hub.subscribe("latecomer", Box::new(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(seen.load(Ordering::SeqCst), 0);
        feed_sine(&mut hub, 64);
        // Only the frame produced after attachment arrives.
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bounded_subscriber_retires() {
        let mut hub = MulticastHub::new(settings(), PipelineMode::Raw).unwrap();
        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = Arc::clone(&seen);
        hub.subscribe_bounded("one-shot", 1, Box::new(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }));

        feed_sine(&mut hub, 512);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_zero_bound_subscriber_never_delivers() {
        let mut hub = MulticastHub::new(settings(), PipelineMode::Raw).unwrap();
        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = Arc::clone(&seen);
        let id = hub.subscribe_bounded("nothing", 0, Box::new(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(hub.subscriber_count(), 0);
        feed_sine(&mut hub, 512);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert!(!hub.unsubscribe(id));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut hub = MulticastHub::new(settings(), PipelineMode::Raw).unwrap();
        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = Arc::clone(&seen);
        let id = hub.subscribe("viewer", Box::new(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }));

        feed_sine(&mut hub, 256);
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        feed_sine(&mut hub, 256);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rebuild_keeps_subscribers() {
        let mut hub = MulticastHub::new(settings(), PipelineMode::Raw).unwrap();
        let frames = Arc::new(Mutex::new(Vec::new()));
        let frames_clone = Arc::clone(&frames);
        hub.subscribe("viewer", Box::new(move |frame| {
            frames_clone.lock().unwrap().push(Arc::clone(frame));
        }));

        feed_sine(&mut hub, 256);
        hub.rebuild(settings(), PipelineMode::BandPower).unwrap();
        assert_eq!(hub.subscriber_count(), 1);
        feed_sine(&mut hub, 256);

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert!(matches!(*frames[0], PipelineFrame::Raw(_)));
        assert!(matches!(*frames[1], PipelineFrame::Bands(_)));
    }

    #[test]
    fn test_invalid_rebuild_leaves_hub_usable() {
        let mut hub = MulticastHub::new(settings(), PipelineMode::Raw).unwrap();
        let bad = PipelineSettings {
            cut_off_low: 90.0,
            ..settings()
        };
        assert!(hub.rebuild(bad, PipelineMode::Raw).is_err());
        assert_eq!(feed_sine(&mut hub, 256), 1);
    }
}
