use crate::{
    InputHandler, InputNotification, InputSource, MacroError, Result, SubscriptionHandle,
};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc, Arc, Mutex, OnceLock, RwLock,
    },
    time::Duration,
};
use tracing::{debug, error, info};

/// How long to wait for the listener thread to report an early failure
const HOOK_STARTUP_GRACE: Duration = Duration::from_millis(250);

/// Subscribers of the process-wide hook, keyed by subscription id
type Subscribers = RwLock<Vec<(u64, InputHandler)>>;

struct HookHub {
    subscribers: Subscribers,
    next_id: AtomicU64,
    /// `Some(Ok(()))` once the listener thread runs, `Some(Err(_))` if it failed
    listener: Mutex<Option<std::result::Result<(), String>>>,
}

static HUB: OnceLock<Arc<HookHub>> = OnceLock::new();

fn hub() -> &'static Arc<HookHub> {
    HUB.get_or_init(|| {
        Arc::new(HookHub {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            listener: Mutex::new(None),
        })
    })
}

impl HookHub {
    fn dispatch(&self, event: &InputNotification) {
        // The read guard is held while handlers run, so `unsubscribe` waits
        // for any in-flight callback before returning.
        let subscribers = match self.subscribers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (_, handler) in subscribers.iter() {
            handler(event);
        }
    }

    /// Start the `rdev` listener thread once per process
    fn ensure_listener(self: &Arc<Self>) -> Result<()> {
        let mut state = self
            .listener
            .lock()
            .map_err(|e| {
                MacroError::InitializationError(format!("Hook state poisoned: {}", e))
            })?;

        match state.as_ref() {
            Some(Ok(())) => return Ok(()),
            Some(Err(reason)) => return Err(MacroError::InitializationError(reason.clone())),
            None => {}
        }

        let (tx, rx) = mpsc::channel();
        let hub = Arc::clone(self);
        std::thread::Builder::new()
            .name("macro-recorder-hook".to_string())
            .spawn(move || {
                debug!("Installing global input hook");
                let callback_hub = Arc::clone(&hub);
                if let Err(error) = rdev::listen(move |event| callback_hub.dispatch(&event)) {
                    error!("Failed to listen for input events: {:?}", error);
                    let _ = tx.send(format!("{:?}", error));
                }
                info!("Input hook thread has finished.");
            })?;

        let outcome = match rx.recv_timeout(HOOK_STARTUP_GRACE) {
            Ok(reason) => Err(reason),
            // No early failure: the listener is blocking inside the hook loop
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(()),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err("input hook thread exited during startup".to_string())
            }
        };
        *state = Some(outcome.clone());
        outcome.map_err(MacroError::InitializationError)
    }
}

/// [`InputSource`] backed by the process-wide `rdev` global hook.
///
/// The hook thread starts on the first subscription and lives for the rest of
/// the process; `rdev` offers no way to uninstall it. Subscriptions are
/// attached to and detached from that single thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct RdevInputSource;

impl RdevInputSource {
    pub fn new() -> Self {
        Self
    }
}

impl InputSource for RdevInputSource {
    fn subscribe(&self, handler: InputHandler) -> Result<SubscriptionHandle> {
        let hub = hub();
        hub.ensure_listener()?;

        let id = hub.next_id.fetch_add(1, Ordering::Relaxed);
        hub.subscribers
            .write()
            .map_err(|e| {
                MacroError::InitializationError(format!("Subscriber list poisoned: {}", e))
            })?
            .push((id, handler));
        debug!(subscription = id, "Subscribed to global input hook");

        Ok(SubscriptionHandle(id))
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()> {
        let hub = hub();
        let mut subscribers = match hub.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers.retain(|(id, _)| *id != handle.0);
        debug!(subscription = handle.id(), "Unsubscribed from global input hook");
        Ok(())
    }
}
