use crate::{MacroError, PlaybackReport, Player, Recorder, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_stream::Stream;
use tracing::{error, info, instrument};

/// File a new session records to and plays from
pub const DEFAULT_RECORDING_FILE: &str = "recording.rec";

/// File selected by [`MacroSession::new_file`]
pub const NEW_RECORDING_FILE: &str = "new_recording.rec";

/// Notifications for whatever shell drives the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    RecordingStarted,
    RecordingSaved { path: PathBuf, events: usize },
    PlaybackStarted { path: PathBuf, events: usize },
    PlaybackFinished(PlaybackReport),
    ActiveFileChanged(PathBuf),
    Warning(String),
    Error(String),
}

/// Owns one recorder, one player and the active recording file, and exposes
/// the commands a shell needs: record, stop, play and file management.
pub struct MacroSession {
    recorder: Recorder,
    player: Player,
    active_file: PathBuf,
    status_tx: broadcast::Sender<SessionStatus>,
}

impl MacroSession {
    pub fn new(recorder: Recorder, player: Player) -> Self {
        let (status_tx, _) = broadcast::channel(100);

        Self {
            recorder,
            player,
            active_file: PathBuf::from(DEFAULT_RECORDING_FILE),
            status_tx,
        }
    }

    /// Get a stream of status notifications
    pub fn status_stream(&self) -> impl Stream<Item = SessionStatus> {
        let mut rx = self.status_tx.subscribe();
        Box::pin(async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(status) => yield status,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn active_file(&self) -> &Path {
        &self.active_file
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    /// Start a new recording. Refused while a playback is running.
    #[instrument(skip(self))]
    pub fn start_recording(&mut self) -> Result<()> {
        if self.player.is_playing() {
            return Err(MacroError::AlreadyPlaying);
        }
        self.recorder.start()?;
        self.notify(SessionStatus::RecordingStarted);
        Ok(())
    }

    /// Stop whatever is running.
    ///
    /// A recording is stopped and saved to the active file; a playback is
    /// asked to stop. Does nothing when idle.
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> Result<()> {
        if self.recorder.is_recording() {
            self.recorder.stop()?;
            if let Err(e) = self.recorder.save(&self.active_file) {
                self.report_error(format!(
                    "Failed to save recording to {}: {}",
                    self.active_file.display(),
                    e
                ));
                return Err(e);
            }
            self.notify(SessionStatus::RecordingSaved {
                path: self.active_file.clone(),
                events: self.recorder.event_count(),
            });
        } else if self.player.is_playing() {
            self.player.stop();
        }
        Ok(())
    }

    /// Load the active file and play it on a background task.
    ///
    /// The session is playing as soon as this returns. Must be called from
    /// within a tokio runtime.
    #[instrument(skip(self))]
    pub fn play(&mut self) -> Result<JoinHandle<Result<PlaybackReport>>> {
        if self.recorder.is_recording() {
            return Err(MacroError::AlreadyRecording);
        }
        if self.player.is_playing() {
            return Err(MacroError::AlreadyPlaying);
        }

        if let Err(e) = self.player.load(&self.active_file) {
            self.report_error(format!(
                "Failed to play recording from {}: {}",
                self.active_file.display(),
                e
            ));
            return Err(e);
        }

        // Playing from here on, so a `stop` right after this returns is honored
        let playback = self.player.begin()?;
        let events = self.player.events();
        let status_tx = self.status_tx.clone();
        self.notify(SessionStatus::PlaybackStarted {
            path: self.active_file.clone(),
            events: events.len(),
        });

        Ok(tokio::spawn(async move {
            let result = playback.run(&events).await;
            match &result {
                Ok(report) => {
                    for warning in &report.warnings {
                        let _ = status_tx.send(SessionStatus::Warning(warning.to_string()));
                    }
                    let _ = status_tx.send(SessionStatus::PlaybackFinished(report.clone()));
                }
                Err(e) => {
                    error!("Playback failed: {}", e);
                    let _ = status_tx.send(SessionStatus::Error(e.to_string()));
                }
            }
            result
        }))
    }

    /// Make `new_recording.rec` the active file
    pub fn new_file(&mut self) {
        self.select_file(NEW_RECORDING_FILE);
    }

    /// Make `path` the active file
    pub fn select_file<P: Into<PathBuf>>(&mut self, path: P) {
        self.active_file = path.into();
        info!("Active recording file is now {:?}", self.active_file);
        self.notify(SessionStatus::ActiveFileChanged(self.active_file.clone()));
    }

    /// Rename the active file on disk, replacing `new_path` if it exists, and
    /// keep using it under its new name
    #[instrument(skip(self, new_path))]
    pub fn rename_file<P: Into<PathBuf>>(&mut self, new_path: P) -> Result<()> {
        let new_path = new_path.into();
        if let Err(e) = fs::rename(&self.active_file, &new_path) {
            self.report_error(format!("Failed to rename file: {}", e));
            return Err(e.into());
        }
        info!("Renamed {:?} to {:?}", self.active_file, new_path);
        self.select_file(new_path);
        Ok(())
    }

    fn notify(&self, status: SessionStatus) {
        // Nobody listening is fine
        let _ = self.status_tx.send(status);
    }

    fn report_error(&self, message: String) {
        error!("{}", message);
        self.notify(SessionStatus::Error(message));
    }
}
