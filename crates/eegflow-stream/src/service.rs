//! Live stream service: source → pipeline → frame broadcast

use crate::manager::PipelineManager;
use crate::recording::{FileSink, RecordingSession, RecordingState};
use eegflow_core::{EegError, EegResult, PipelineFrame, PipelineMode, PipelineSettings, Sample};
use eegflow_simulation::{
    start_synthetic_source, ConnectionStatus, SourceCommand, SourceConfig,
};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

/// Control surface of a running service
pub enum ServiceCommand {
    UpdateSettings(PipelineSettings),
    SetMode(PipelineMode),
    /// Begin feeding frames into the given session
    StartRecording(RecordingSession),
    /// Finish the active recording and export it through the sink
    StopRecording,
    Shutdown,
}

/// Connects a sample source to a [`PipelineManager`] and re-broadcasts
/// the resulting frames.
///
/// The service is cold until [`StreamService::connect`] returns: the
/// source is started and the first pipeline is built before any caller
/// can observe the stream. The run loop processes samples strictly in
/// arrival order on a single task; it tears down when the source
/// disconnects or a shutdown command arrives.
pub struct StreamService {
    manager: PipelineManager,
    samples: broadcast::Receiver<Sample>,
    source_control: mpsc::Sender<SourceCommand>,
    status: watch::Receiver<ConnectionStatus>,
    commands: mpsc::Receiver<ServiceCommand>,
    command_sender: mpsc::Sender<ServiceCommand>,
    frame_sender: broadcast::Sender<Arc<PipelineFrame>>,
    sink: Box<dyn FileSink + Send>,
    recording: Option<Arc<Mutex<RecordingSession>>>,
}

impl StreamService {
    /// Start the source and build the pipeline; hot on return.
    /// Finished recordings are exported through `sink`.
    pub async fn connect(
        source_config: SourceConfig,
        settings: PipelineSettings,
        mode: PipelineMode,
        sink: Box<dyn FileSink + Send>,
    ) -> EegResult<Self> {
        if source_config.generator.channel_count != settings.channel_count {
            return Err(EegError::ChannelMismatch {
                expected: settings.channel_count,
                actual: source_config.generator.channel_count,
            });
        }
        if (source_config.generator.srate - settings.srate).abs() > f32::EPSILON {
            return Err(EegError::InvalidConfiguration {
                message: format!(
                    "Source rate {} Hz does not match pipeline rate {} Hz",
                    source_config.generator.srate, settings.srate
                ),
            });
        }

        let mut manager = PipelineManager::new(settings, mode)?;

        let (frame_sender, _) = broadcast::channel(64);
        let forward = frame_sender.clone();
        manager.attach("frame-broadcast", Box::new(move |frame: &Arc<PipelineFrame>| {
            // Send fails only when nobody is listening, which is fine.
            let _ = forward.send(Arc::clone(frame));
        }))?;

        let (samples, source_control, mut status) =
            start_synthetic_source(source_config).await?;
        source_control
            .send(SourceCommand::Start)
            .await
            .map_err(|_| EegError::SourceError {
                message: "Source control channel closed before start".to_string(),
            })?;
        status
            .wait_for(|s| *s == ConnectionStatus::Connected)
            .await
            .map_err(|_| EegError::SourceError {
                message: "Source dropped while connecting".to_string(),
            })?;

        let (command_sender, commands) = mpsc::channel(16);
        info!("stream service connected");

        Ok(StreamService {
            manager,
            samples,
            source_control,
            status,
            commands,
            command_sender,
            frame_sender,
            sink,
            recording: None,
        })
    }

    fn start_recording(&mut self, mut session: RecordingSession) {
        if self.recording.is_some() {
            warn!("recording already active, ignoring start");
            return;
        }
        if let Err(e) = session.start() {
            warn!(error = %e, "could not start recording");
            return;
        }
        let session = Arc::new(Mutex::new(session));
        let recorder = Arc::clone(&session);
        let attach = self.manager.attach("recording", Box::new(move |frame: &Arc<PipelineFrame>| {
            if let Ok(mut session) = recorder.lock() {
                // A recording error mid-session discards the buffer; the
                // user is never handed a silently truncated file.
                if let Err(e) = session.push_frame(frame) {
                    warn!(error = %e, "recording failed, aborting session");
                    session.abort();
                }
            }
        }));
        match attach {
            Ok(()) => self.recording = Some(session),
            Err(e) => warn!(error = %e, "could not attach recording consumer"),
        }
    }

    /// Detach the session once it stops recording on its own: a session
    /// that hit its limit is exported right away, an aborted one is
    /// discarded.
    fn reap_recording(&mut self) {
        let live = match &self.recording {
            Some(session) => session
                .lock()
                .map(|s| s.state() == RecordingState::Recording)
                .unwrap_or(false),
            None => return,
        };
        if !live {
            self.finish_recording(false);
        }
    }

    fn finish_recording(&mut self, abort: bool) {
        let Some(session) = self.recording.take() else {
            return;
        };
        self.manager.detach("recording");

        let Ok(mut session) = session.lock() else {
            error!("recording state poisoned, discarding");
            return;
        };
        match session.state() {
            RecordingState::Recording => {
                if abort {
                    session.abort();
                    return;
                }
                if let Err(e) = session.stop() {
                    warn!(error = %e, "could not stop recording");
                    return;
                }
            }
            // A session that already completed is exported even on the
            // teardown path; only in-flight buffers are discarded.
            RecordingState::Completed => {}
            RecordingState::Idle | RecordingState::Aborted => return,
        }
        match session.export(self.sink.as_mut()) {
            Ok(path) => info!(path = %path.display(), "recording saved"),
            Err(e) => warn!(error = %e, "recording export failed"),
        }
    }

    /// Receiver for the live frame stream
    pub fn subscribe_frames(&self) -> broadcast::Receiver<Arc<PipelineFrame>> {
        self.frame_sender.subscribe()
    }

    /// Handle for sending control commands
    pub fn control_handle(&self) -> mpsc::Sender<ServiceCommand> {
        self.command_sender.clone()
    }

    pub fn manager(&mut self) -> &mut PipelineManager {
        &mut self.manager
    }

    /// Drive the service until shutdown or source disconnect
    pub async fn run(&mut self) -> EegResult<()> {
        loop {
            tokio::select! {
                sample = self.samples.recv() => {
                    match sample {
                        Ok(sample) => {
                            match self.manager.process(&sample) {
                                Ok(true) => self.reap_recording(),
                                Ok(false) => {}
                                Err(e) => warn!(error = %e, "sample rejected by pipeline"),
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "sample stream lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            error!("sample stream closed");
                            self.finish_recording(true);
                            return Err(EegError::SourceError {
                                message: "Sample stream closed unexpectedly".to_string(),
                            });
                        }
                    }
                }

                changed = self.status.changed() => {
                    if changed.is_err() || *self.status.borrow() == ConnectionStatus::Disconnected {
                        info!("source disconnected, stopping service");
                        self.finish_recording(true);
                        return Ok(());
                    }
                }

                command = self.commands.recv() => {
                    match command {
                        Some(ServiceCommand::UpdateSettings(settings)) => {
                            if let Err(e) = self.manager.update_settings(settings) {
                                warn!(error = %e, "rejected settings update");
                            }
                        }
                        Some(ServiceCommand::SetMode(mode)) => {
                            if let Err(e) = self.manager.set_mode(mode) {
                                warn!(error = %e, "rejected mode change");
                            }
                        }
                        Some(ServiceCommand::StartRecording(session)) => {
                            self.start_recording(session);
                        }
                        Some(ServiceCommand::StopRecording) => {
                            self.finish_recording(false);
                        }
                        Some(ServiceCommand::Shutdown) | None => {
                            debug!("service shutting down");
                            self.finish_recording(false);
                            let _ = self.source_control.send(SourceCommand::Stop).await;
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
