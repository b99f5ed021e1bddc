//! CSV recording sessions over the frame stream

use chrono::Utc;
use eegflow_core::{EegError, EegResult, PipelineFrame};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// When a session stops accepting frames on its own
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RecordingLimit {
    /// Stop after this many frames
    Frames(u64),
    /// Stop once frame timestamps span this many seconds.
    ///
    /// Measured against the timestamps carried by the frames, anchored
    /// at the first recorded frame, so a recording of simulated data is
    /// deterministic regardless of wall-clock speed.
    Seconds(f64),
    /// Record until stopped explicitly
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingState {
    Idle,
    Recording,
    Completed,
    Aborted,
}

/// Destination for exported recordings
pub trait FileSink {
    /// Write one finished CSV file; returns the path written
    fn write_csv(&mut self, filename: &str, contents: &str) -> EegResult<PathBuf>;
}

/// Writes recordings into a directory on disk
pub struct DiskSink {
    directory: PathBuf,
}

impl DiskSink {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        DiskSink {
            directory: directory.as_ref().to_path_buf(),
        }
    }
}

impl FileSink for DiskSink {
    fn write_csv(&mut self, filename: &str, contents: &str) -> EegResult<PathBuf> {
        let path = self.directory.join(filename);
        std::fs::create_dir_all(&self.directory).map_err(|e| EegError::RecordingError {
            message: format!("Failed to create recording directory: {}", e),
        })?;
        std::fs::write(&path, contents).map_err(|e| EegError::RecordingError {
            message: format!("Failed to write {}: {}", path.display(), e),
        })?;
        Ok(path)
    }
}

/// One recording: Idle → Recording → Completed or Aborted.
///
/// The CSV header is captured once, from the first frame seen while
/// recording; every later row must match that shape. Completed sessions
/// are terminal; start a new session for the next recording.
pub struct RecordingSession {
    module: String,
    condition: String,
    limit: RecordingLimit,
    state: RecordingState,
    header: Option<String>,
    rows: Vec<String>,
    first_frame_ms: Option<f64>,
    pending_marker: Option<String>,
}

impl RecordingSession {
    /// `module` and `condition` name the recording in the exported
    /// filename, e.g. "Bands" / "EyesClosed".
    pub fn new(
        module: impl Into<String>,
        condition: impl Into<String>,
        limit: RecordingLimit,
    ) -> Self {
        RecordingSession {
            module: module.into(),
            condition: condition.into(),
            limit,
            state: RecordingState::Idle,
            header: None,
            rows: Vec::new(),
            first_frame_ms: None,
            pending_marker: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn frame_count(&self) -> usize {
        self.rows.len()
    }

    /// Begin recording; only valid from Idle
    pub fn start(&mut self) -> EegResult<()> {
        if self.state != RecordingState::Idle {
            return Err(EegError::RecordingError {
                message: format!("Cannot start recording from state {:?}", self.state),
            });
        }
        self.state = RecordingState::Recording;
        info!(module = %self.module, condition = %self.condition, "recording started");
        Ok(())
    }

    /// Attach a one-shot annotation to the next recorded frame's info column
    pub fn annotate(&mut self, marker: impl Into<String>) {
        self.pending_marker = Some(marker.into());
    }

    /// Offer a frame to the session. Frames outside the Recording state
    /// are ignored. Returns true while the session still accepts frames.
    pub fn push_frame(&mut self, frame: &PipelineFrame) -> EegResult<bool> {
        if self.state != RecordingState::Recording {
            return Ok(false);
        }

        let header = self
            .header
            .get_or_insert_with(|| frame.csv_header())
            .clone();
        let row = frame.csv_row(self.pending_marker.take().as_deref().unwrap_or(""));
        if row.split(',').count() != header.split(',').count() {
            return Err(EegError::RecordingError {
                message: "Frame shape changed mid-recording".to_string(),
            });
        }

        let timestamp = frame.timestamp();
        let first = *self.first_frame_ms.get_or_insert(timestamp);
        self.rows.push(row);

        let done = match self.limit {
            RecordingLimit::Frames(n) => self.rows.len() as u64 >= n,
            RecordingLimit::Seconds(t) => timestamp - first >= t * 1000.0,
            RecordingLimit::Unbounded => false,
        };
        if done {
            self.state = RecordingState::Completed;
            debug!(frames = self.rows.len(), "recording limit reached");
        }
        Ok(!done)
    }

    /// Stop recording without exporting; only valid while Recording
    pub fn stop(&mut self) -> EegResult<()> {
        if self.state != RecordingState::Recording {
            return Err(EegError::RecordingError {
                message: format!("Cannot stop recording from state {:?}", self.state),
            });
        }
        self.state = RecordingState::Completed;
        info!(frames = self.rows.len(), "recording stopped");
        Ok(())
    }

    /// Discard everything recorded so far
    pub fn abort(&mut self) {
        self.state = RecordingState::Aborted;
        self.header = None;
        self.rows.clear();
        self.first_frame_ms = None;
        info!(module = %self.module, "recording aborted");
    }

    /// Filename the next export will use, minus the timestamp suffix.
    /// The condition segment is omitted when unset.
    pub fn filename_prefix(&self) -> String {
        if self.condition.is_empty() {
            format!("{}_Recording", self.module)
        } else {
            format!("{}_{}_Recording", self.module, self.condition)
        }
    }

    /// Write the finished recording as CSV; only valid once Completed.
    /// Returns the path written by the sink.
    pub fn export(&self, sink: &mut dyn FileSink) -> EegResult<PathBuf> {
        if self.state != RecordingState::Completed {
            return Err(EegError::RecordingError {
                message: format!("Cannot export from state {:?}", self.state),
            });
        }
        let header = self.header.as_ref().ok_or_else(|| EegError::RecordingError {
            message: "Nothing was recorded".to_string(),
        })?;

        let mut contents = String::with_capacity(header.len() * (self.rows.len() + 1));
        contents.push_str(header);
        contents.push('\n');
        for row in &self.rows {
            contents.push_str(row);
            contents.push('\n');
        }

        let filename = format!("{}_{}.csv", self.filename_prefix(), Utc::now().timestamp_millis());
        let path = sink.write_csv(&filename, &contents)?;
        info!(path = %path.display(), frames = self.rows.len(), "recording exported");
        Ok(path)
    }
}
