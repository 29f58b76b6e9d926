use crate::{
    keymap, unix_seconds, Event, EventKind, EventLog, EventType, InputHandler, InputNotification,
    InputSource, MacroError, Result, SubscriptionHandle,
};
use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::{debug, info, instrument, warn};

mod hook;

pub use self::hook::*;

/// Configuration for the macro recorder
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Whether to record mouse events
    pub record_mouse: bool,

    /// Whether to record keyboard events
    pub record_keyboard: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            record_mouse: true,
            record_keyboard: true,
        }
    }
}

/// Events captured so far plus the state needed to build the next one
#[derive(Debug, Default)]
struct Capture {
    events: Vec<Event>,

    /// Clicks and wheel notifications carry no position of their own
    last_position: Option<(i32, i32)>,

    /// Timestamps never go backwards within a recording
    last_time: f64,
}

impl Capture {
    fn record(
        &mut self,
        notification: &InputNotification,
        config: &RecorderConfig,
    ) -> Option<Event> {
        let kind = match notification.event_type {
            EventType::MouseMove { x, y } => {
                let position = (x.round() as i32, y.round() as i32);
                self.last_position = Some(position);
                config.record_mouse.then_some(EventKind::MouseMove {
                    x: position.0,
                    y: position.1,
                })
            }
            EventType::ButtonPress(button) | EventType::ButtonRelease(button) => {
                let (x, y) = self.last_position.unwrap_or_default();
                config.record_mouse.then(|| EventKind::MouseClick {
                    x,
                    y,
                    button: button.into(),
                    pressed: matches!(notification.event_type, EventType::ButtonPress(_)),
                })
            }
            EventType::Wheel { delta_x, delta_y } => {
                let (x, y) = self.last_position.unwrap_or_default();
                config.record_mouse.then_some(EventKind::MouseScroll {
                    x,
                    y,
                    dx: delta_x,
                    dy: delta_y,
                })
            }
            EventType::KeyPress(key) => config.record_keyboard.then(|| EventKind::KeyPress {
                key: keymap::key_label(key, notification.name.as_deref()),
            }),
            EventType::KeyRelease(key) => config.record_keyboard.then(|| EventKind::KeyRelease {
                key: keymap::key_label(key, notification.name.as_deref()),
            }),
        }?;

        let time = unix_seconds(notification.time).max(self.last_time);
        self.last_time = time;

        let event = Event::new(time, kind);
        self.events.push(event.clone());
        Some(event)
    }
}

/// The macro recorder
pub struct Recorder {
    /// Where global input notifications come from
    source: Arc<dyn InputSource>,

    /// The configuration
    config: RecorderConfig,

    /// The events recorded so far
    capture: Arc<Mutex<Capture>>,

    /// Live feed of recorded events
    event_tx: broadcast::Sender<Event>,

    /// Present while recording
    subscription: Option<SubscriptionHandle>,
}

impl Recorder {
    /// Create a new recorder listening to `source`
    pub fn new(source: Arc<dyn InputSource>, config: RecorderConfig) -> Self {
        let (event_tx, _) = broadcast::channel(1024);

        Self {
            source,
            config,
            capture: Arc::new(Mutex::new(Capture::default())),
            event_tx,
            subscription: None,
        }
    }

    /// Create a recorder on the global `rdev` hook
    pub fn with_global_hook(config: RecorderConfig) -> Self {
        Self::new(Arc::new(RdevInputSource::new()), config)
    }

    /// Get a stream of events as they are recorded
    pub fn event_stream(&self) -> impl Stream<Item = Event> {
        let mut rx = self.event_tx.subscribe();
        Box::pin(async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(event) => yield event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event stream lagged behind the recorder");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Whether a recording is in progress
    pub fn is_recording(&self) -> bool {
        self.subscription.is_some()
    }

    /// Start recording, discarding any previous recording
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<()> {
        if self.is_recording() {
            return Err(MacroError::AlreadyRecording);
        }
        info!("Starting macro recording");

        *self.lock_capture() = Capture::default();

        let capture = Arc::clone(&self.capture);
        let config = self.config.clone();
        let event_tx = self.event_tx.clone();
        let handler: InputHandler = Arc::new(move |notification: &InputNotification| {
            let recorded = match capture.lock() {
                Ok(mut capture) => capture.record(notification, &config),
                Err(poisoned) => poisoned.into_inner().record(notification, &config),
            };
            if let Some(event) = recorded {
                debug!(?event, "Recorded event");
                // Nobody listening is fine
                let _ = event_tx.send(event);
            }
        });

        self.subscription = Some(self.source.subscribe(handler)?);
        Ok(())
    }

    /// Stop recording. Does nothing when not recording.
    ///
    /// When this returns the input handler is detached and the recording no
    /// longer changes.
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.subscription.take() else {
            debug!("Recorder already stopped");
            return Ok(());
        };

        if let Err(e) = self.source.unsubscribe(handle) {
            self.subscription = Some(handle);
            return Err(e);
        }

        let events = self.lock_capture().events.len();
        info!(events, "Stopped macro recording");
        Ok(())
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<Event> {
        self.lock_capture().events.clone()
    }

    /// Number of recorded events
    pub fn event_count(&self) -> usize {
        self.lock_capture().events.len()
    }

    /// Save the recorded events to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        info!("Saving macro recording to {:?}", path.as_ref());
        EventLog::from(self.events()).save(path)
    }

    fn lock_capture(&self) -> MutexGuard<'_, Capture> {
        match self.capture.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to detach recorder on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdev::{Button, Key};
    use std::time::{Duration, UNIX_EPOCH};

    fn notification(secs: f64, event_type: EventType, name: Option<&str>) -> InputNotification {
        InputNotification {
            time: UNIX_EPOCH + Duration::from_secs_f64(secs),
            name: name.map(str::to_string),
            event_type,
        }
    }

    #[test]
    fn test_click_uses_last_pointer_position() {
        let mut capture = Capture::default();
        let config = RecorderConfig::default();

        let pointer = EventType::MouseMove { x: 10.4, y: 19.6 };
        capture.record(&notification(1.0, pointer, None), &config);
        let press = notification(1.5, EventType::ButtonPress(Button::Left), None);
        let click = capture.record(&press, &config).unwrap();

        assert_eq!(
            click.kind,
            EventKind::MouseClick {
                x: 10,
                y: 20,
                button: crate::MouseButton::Left,
                pressed: true
            }
        );
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let mut capture = Capture::default();
        let config = RecorderConfig::default();

        let press = notification(5.0, EventType::KeyPress(Key::KeyA), Some("a"));
        let release = notification(4.0, EventType::KeyRelease(Key::KeyA), None);
        capture.record(&press, &config);
        let late = capture.record(&release, &config).unwrap();

        assert_eq!(late.time, 5.0);
    }

    #[test]
    fn test_config_filters_families() {
        let mut capture = Capture::default();
        let config = RecorderConfig {
            record_mouse: false,
            record_keyboard: true,
        };

        let pointer = notification(1.0, EventType::MouseMove { x: 1.0, y: 1.0 }, None);
        let tab = notification(1.1, EventType::KeyPress(Key::Tab), None);

        assert!(capture.record(&pointer, &config).is_none());
        assert!(capture.record(&tab, &config).is_some());
        assert_eq!(capture.events.len(), 1);
        // Pointer position is tracked even when moves are not recorded
        assert_eq!(capture.last_position, Some((1, 1)));
    }
}
