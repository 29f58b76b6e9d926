use crate::{keymap, Event, EventKind, EventLog, EventType, InputSink, MacroError, Result};
use rdev::Button;
use std::{
    fmt,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};
use tokio::sync::{broadcast, watch};
use tokio_stream::Stream;
use tracing::{debug, info, instrument, warn};

mod synth;

pub use self::synth::*;

/// Configuration for macro playback
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Playback speed multiplier. Values <= 0 replay without any delay.
    pub speed: f64,

    /// Whether `stop` wakes a playback that is waiting between events
    pub interruptible_sleep: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            interruptible_sleep: true,
        }
    }
}

/// A problem with a single event that did not abort playback
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackWarning {
    /// The recorded key has no host equivalent
    UnmappableKey { index: usize, key: String },

    /// The host refused to synthesize the event
    SimulationFailed { index: usize, reason: String },
}

impl fmt::Display for PlaybackWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackWarning::UnmappableKey { index, key } => {
                write!(f, "event {}: invalid key '{}'", index, key)
            }
            PlaybackWarning::SimulationFailed { index, reason } => {
                write!(f, "event {}: {}", index, reason)
            }
        }
    }
}

/// Outcome of one playback
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackReport {
    /// Events synthesized
    pub executed: usize,

    /// Events skipped because of a warning
    pub skipped: usize,

    /// Whether `stop` ended the playback early
    pub cancelled: bool,

    pub warnings: Vec<PlaybackWarning>,
}

struct PlayerInner {
    sink: Arc<dyn InputSink>,
    config: PlayerConfig,
    events: Mutex<Vec<Event>>,
    playing: AtomicBool,
    stop_tx: watch::Sender<bool>,
    warning_tx: broadcast::Sender<PlaybackWarning>,
}

/// The macro player.
///
/// Clones share state, so one clone can `stop` a playback running on another
/// task.
#[derive(Clone)]
pub struct Player {
    inner: Arc<PlayerInner>,
}

impl Player {
    /// Create a new player synthesizing input through `sink`
    pub fn new(sink: Arc<dyn InputSink>, config: PlayerConfig) -> Self {
        let (stop_tx, _) = watch::channel(false);
        let (warning_tx, _) = broadcast::channel(100);

        Self {
            inner: Arc::new(PlayerInner {
                sink,
                config,
                events: Mutex::new(Vec::new()),
                playing: AtomicBool::new(false),
                stop_tx,
                warning_tx,
            }),
        }
    }

    /// Create a player that synthesizes input with `rdev`
    pub fn with_rdev(config: PlayerConfig) -> Self {
        Self::new(Arc::new(RdevInputSink::new()), config)
    }

    /// Whether a playback is in progress
    pub fn is_playing(&self) -> bool {
        self.inner.playing.load(Ordering::SeqCst)
    }

    /// The events loaded by [`Player::load`]
    pub fn events(&self) -> Vec<Event> {
        self.lock_events().clone()
    }

    /// Replace the loaded events with the recording at `path`.
    ///
    /// On error the previously loaded events are kept.
    #[instrument(skip(self, path))]
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        info!("Loading macro recording from {:?}", path.as_ref());
        let log = EventLog::load(path)?;
        *self.lock_events() = log.into_events();
        Ok(())
    }

    /// Get a stream of warnings raised during playback
    pub fn warning_stream(&self) -> impl Stream<Item = PlaybackWarning> {
        let mut rx = self.inner.warning_tx.subscribe();
        Box::pin(async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(warning) => yield warning,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Play the loaded events
    pub async fn play_loaded(&self) -> Result<PlaybackReport> {
        let events = self.events();
        self.play(&events).await
    }

    /// Replay `events`, waiting between them as long as they were apart when
    /// recorded.
    ///
    /// A bad event is skipped with a warning; only a concurrent playback is an
    /// error.
    pub async fn play(&self, events: &[Event]) -> Result<PlaybackReport> {
        self.begin()?.run(events).await
    }

    /// Claim the player for a playback without running it yet.
    ///
    /// From the moment this returns `is_playing` is true and any `stop` call
    /// cancels the returned [`Playback`], even before it is first polled.
    /// Fails with `AlreadyPlaying` while another playback holds the player.
    pub fn begin(&self) -> Result<Playback> {
        let mut claimed = false;
        // Claim and reset under the channel lock so no concurrent `stop` is lost
        self.inner.stop_tx.send_if_modified(|stopped| {
            claimed = !self.inner.playing.swap(true, Ordering::SeqCst);
            if claimed {
                *stopped = false;
            }
            false
        });
        if !claimed {
            return Err(MacroError::AlreadyPlaying);
        }

        Ok(Playback {
            player: self.clone(),
            stop_rx: self.inner.stop_tx.subscribe(),
        })
    }

    /// Ask the playback in progress to stop before its next event.
    ///
    /// Safe to call from any task or thread, and when nothing is playing.
    pub fn stop(&self) {
        if self.is_playing() {
            info!("Stopping macro playback");
        }
        self.inner.stop_tx.send_replace(true);
    }

    fn delay(&self, delta: f64) -> Duration {
        Duration::try_from_secs_f64(delta / self.inner.config.speed)
            .unwrap_or(Duration::ZERO)
    }

    fn perform(&self, event: &Event) -> Result<()> {
        let sink = &self.inner.sink;
        match &event.kind {
            EventKind::MouseMove { x, y } => sink.send(&EventType::MouseMove {
                x: f64::from(*x),
                y: f64::from(*y),
            }),
            EventKind::MouseClick {
                x,
                y,
                button,
                pressed,
            } => {
                sink.send(&EventType::MouseMove {
                    x: f64::from(*x),
                    y: f64::from(*y),
                })?;
                let button = Button::from(*button);
                if *pressed {
                    sink.send(&EventType::ButtonPress(button))
                } else {
                    sink.send(&EventType::ButtonRelease(button))
                }
            }
            EventKind::MouseScroll { dx, dy, .. } => sink.send(&EventType::Wheel {
                delta_x: *dx,
                delta_y: *dy,
            }),
            EventKind::KeyPress { key } => {
                sink.send(&EventType::KeyPress(keymap::resolve_key(key)?))
            }
            EventKind::KeyRelease { key } => {
                sink.send(&EventType::KeyRelease(keymap::resolve_key(key)?))
            }
        }
    }

    fn lock_events(&self) -> MutexGuard<'_, Vec<Event>> {
        match self.inner.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// A playback that holds the player, created by [`Player::begin`].
///
/// Dropping it, run or not, returns the player to idle.
pub struct Playback {
    player: Player,
    stop_rx: watch::Receiver<bool>,
}

impl Playback {
    fn is_stopped(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Replay `events` until they run out or the player is stopped
    #[instrument(skip(self, events), fields(events = events.len()))]
    pub async fn run(mut self, events: &[Event]) -> Result<PlaybackReport> {
        let mut report = PlaybackReport::default();
        let Some(first) = events.first() else {
            debug!("Nothing to play");
            return Ok(report);
        };
        info!("Starting macro playback");

        let inner = Arc::clone(&self.player.inner);
        let mut previous = first.time;
        for (index, event) in events.iter().enumerate() {
            if self.is_stopped() {
                report.cancelled = true;
                break;
            }

            let delay = self.player.delay(event.time - previous);
            previous = event.time;
            if !delay.is_zero() {
                if inner.config.interruptible_sleep {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.stop_rx.changed() => {}
                    }
                } else {
                    tokio::time::sleep(delay).await;
                }
            }

            // A stop during the wait cancels the pending event too
            if self.is_stopped() {
                report.cancelled = true;
                break;
            }

            match self.player.perform(event) {
                Ok(()) => report.executed += 1,
                Err(e) => {
                    let warning = match e {
                        MacroError::UnmappableKey(key) => {
                            PlaybackWarning::UnmappableKey { index, key }
                        }
                        other => PlaybackWarning::SimulationFailed {
                            index,
                            reason: other.to_string(),
                        },
                    };
                    warn!("Skipping event: {}", warning);
                    let _ = inner.warning_tx.send(warning.clone());
                    report.warnings.push(warning);
                    report.skipped += 1;
                }
            }
        }

        info!(
            executed = report.executed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "Finished macro playback"
        );
        Ok(report)
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.player.inner.playing.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CapturingSink;

    #[test]
    fn test_delay_scaling() {
        let sink = Arc::new(CapturingSink::new());
        let normal = Player::new(sink.clone(), PlayerConfig::default());
        let double = Player::new(
            sink.clone(),
            PlayerConfig {
                speed: 2.0,
                ..PlayerConfig::default()
            },
        );
        let instant = Player::new(
            sink,
            PlayerConfig {
                speed: 0.0,
                ..PlayerConfig::default()
            },
        );

        assert_eq!(normal.delay(0.5), Duration::from_millis(500));
        assert_eq!(double.delay(0.5), Duration::from_millis(250));
        assert_eq!(normal.delay(-1.0), Duration::ZERO);
        assert_eq!(instant.delay(3.0), Duration::ZERO);
    }

    #[test]
    fn test_warning_display() {
        let warning = PlaybackWarning::UnmappableKey {
            index: 3,
            key: "hyper".to_string(),
        };
        assert_eq!(warning.to_string(), "event 3: invalid key 'hyper'");
    }
}
