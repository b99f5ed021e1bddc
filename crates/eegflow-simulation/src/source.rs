//! Streaming synthetic sample source with connection lifecycle

use crate::generator::{GeneratorConfig, SignalGenerator};
use eegflow_core::{EegResult, Sample};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

/// Connection lifecycle of a sample source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Configuration for the streaming source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Generator configuration
    pub generator: GeneratorConfig,
    /// Tick rate in Hz, i.e. how often a batch of samples is pushed
    pub update_rate: f32,
    /// Broadcast channel capacity in samples
    pub buffer_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            update_rate: 10.0,
            buffer_size: 2048,
        }
    }
}

/// Commands for controlling the source
#[derive(Debug, Clone)]
pub enum SourceCommand {
    Start,
    Stop,
    UpdateConfig(SourceConfig),
}

/// Synthetic [`Sample`] stream standing in for a headband connection.
///
/// Emits samples over a broadcast channel at the configured tick rate
/// and publishes its connection status over a watch channel, matching
/// the SampleSource contract a real device transport would expose.
pub struct SyntheticSource {
    config: SourceConfig,
    generator: SignalGenerator,
    data_sender: broadcast::Sender<Sample>,
    command_receiver: mpsc::Receiver<SourceCommand>,
    command_sender: mpsc::Sender<SourceCommand>,
    status_sender: watch::Sender<ConnectionStatus>,
    status_receiver: watch::Receiver<ConnectionStatus>,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> EegResult<Self> {
        let generator = SignalGenerator::new(config.generator.clone())?;
        let (data_sender, _) = broadcast::channel(config.buffer_size);
        let (command_sender, command_receiver) = mpsc::channel(32);
        let (status_sender, status_receiver) = watch::channel(ConnectionStatus::Disconnected);

        Ok(SyntheticSource {
            config,
            generator,
            data_sender,
            command_receiver,
            command_sender,
            status_sender,
            status_receiver,
        })
    }

    /// Get a receiver for the sample stream
    pub fn subscribe(&self) -> broadcast::Receiver<Sample> {
        self.data_sender.subscribe()
    }

    /// Get a handle for sending control commands
    pub fn control_handle(&self) -> mpsc::Sender<SourceCommand> {
        self.command_sender.clone()
    }

    /// Get a receiver for connection status updates
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_receiver.clone()
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Drive the source until its control channel closes
    pub async fn run(&mut self) -> EegResult<()> {
        let mut tick = interval(Duration::from_secs_f32(1.0 / self.config.update_rate));
        let mut running = false;

        info!(
            update_rate = self.config.update_rate,
            srate = self.config.generator.srate,
            channels = self.config.generator.channel_count,
            "synthetic source ready"
        );

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if running {
                        let batch_len = (self.config.generator.srate / self.config.update_rate).round() as usize;
                        for sample in self.generator.next_batch(batch_len.max(1)) {
                            // No receivers is fine; the stream stays hot.
                            let _ = self.data_sender.send(sample);
                        }
                    }
                }

                command = self.command_receiver.recv() => {
                    match command {
                        Some(SourceCommand::Start) => {
                            let _ = self.status_sender.send(ConnectionStatus::Connecting);
                            self.generator.reset_time();
                            self.generator.set_base_timestamp(
                                std::time::SystemTime::now()
                                    .duration_since(std::time::UNIX_EPOCH)
                                    .map(|d| d.as_millis() as f64)
                                    .unwrap_or(0.0),
                            );
                            running = true;
                            let _ = self.status_sender.send(ConnectionStatus::Connected);
                            info!("synthetic source started");
                        }
                        Some(SourceCommand::Stop) => {
                            running = false;
                            let _ = self.status_sender.send(ConnectionStatus::Disconnected);
                            info!("synthetic source stopped");
                        }
                        Some(SourceCommand::UpdateConfig(new_config)) => {
                            if let Err(e) = self.generator.update_config(new_config.generator.clone()) {
                                warn!(error = %e, "rejected source reconfiguration");
                                continue;
                            }
                            tick = interval(Duration::from_secs_f32(1.0 / new_config.update_rate));
                            self.config = new_config;
                            debug!("synthetic source reconfigured");
                        }
                        None => {
                            let _ = self.status_sender.send(ConnectionStatus::Disconnected);
                            debug!("source control channel closed");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Create a source and drive it in a background task
pub async fn start_synthetic_source(
    config: SourceConfig,
) -> EegResult<(
    broadcast::Receiver<Sample>,
    mpsc::Sender<SourceCommand>,
    watch::Receiver<ConnectionStatus>,
)> {
    let mut source = SyntheticSource::new(config)?;
    let data_receiver = source.subscribe();
    let command_sender = source.control_handle();
    let status_receiver = source.status();

    tokio::spawn(async move {
        if let Err(e) = source.run().await {
            warn!(error = %e, "synthetic source task failed");
        }
    });

    Ok((data_receiver, command_sender, status_receiver))
}
