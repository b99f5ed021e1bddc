//! Pipeline ownership: settings, rebuilds and named consumers

use crate::hub::{FrameCallback, MulticastHub};
use eegflow_core::{EegError, EegResult, PipelineMode, PipelineSettings, Sample};
use eegflow_processing::ChainMetrics;
use std::collections::HashMap;
use tracing::info;

/// Owns the hub and its configuration.
///
/// All pipeline state is held here by value; nothing is global, so two
/// managers in one process never interfere. Consumers are attached by
/// name and survive reconfiguration: a settings or mode change rebuilds
/// the processing chain while every named consumer stays subscribed.
pub struct PipelineManager {
    hub: MulticastHub,
    consumers: HashMap<String, u64>,
}

impl PipelineManager {
    pub fn new(settings: PipelineSettings, mode: PipelineMode) -> EegResult<Self> {
        Ok(PipelineManager {
            hub: MulticastHub::new(settings, mode)?,
            consumers: HashMap::new(),
        })
    }

    /// Attach a named consumer; names must be unique
    pub fn attach(&mut self, name: impl Into<String>, callback: FrameCallback) -> EegResult<()> {
        let name = name.into();
        if self.consumers.contains_key(&name) {
            return Err(EegError::InvalidConfiguration {
                message: format!("Consumer '{}' is already attached", name),
            });
        }
        let id = self.hub.subscribe(name.clone(), callback);
        self.consumers.insert(name, id);
        Ok(())
    }

    /// Detach a named consumer; returns false if the name is unknown
    pub fn detach(&mut self, name: &str) -> bool {
        match self.consumers.remove(name) {
            Some(id) => self.hub.unsubscribe(id),
            None => false,
        }
    }

    pub fn consumer_names(&self) -> Vec<&str> {
        self.consumers.keys().map(String::as_str).collect()
    }

    /// Feed one raw sample; returns true when a frame was delivered
    pub fn process(&mut self, sample: &Sample) -> EegResult<bool> {
        self.hub.push_sample(sample)
    }

    /// Apply new settings, rebuilding the chain from scratch.
    ///
    /// Settings are validated before the old chain is dropped; on error
    /// the running configuration is untouched. No filter or window state
    /// survives a successful rebuild.
    pub fn update_settings(&mut self, settings: PipelineSettings) -> EegResult<()> {
        settings.validate()?;
        let mode = self.hub.mode();
        self.hub.rebuild(settings, mode)?;
        info!("pipeline rebuilt with new settings");
        Ok(())
    }

    /// Switch output mode, rebuilding the chain from scratch
    pub fn set_mode(&mut self, mode: PipelineMode) -> EegResult<()> {
        let settings = self.hub.settings().clone();
        self.hub.rebuild(settings, mode)?;
        info!(?mode, "pipeline mode changed");
        Ok(())
    }

    pub fn settings(&self) -> &PipelineSettings {
        self.hub.settings()
    }

    pub fn mode(&self) -> PipelineMode {
        self.hub.mode()
    }

    pub fn metrics(&self) -> ChainMetrics {
        self.hub.metrics()
    }

    pub fn hub_mut(&mut self) -> &mut MulticastHub {
        &mut self.hub
    }
}
