//! Scripted input implementations for exercising the engine without a display.

use crate::{
    EventType, InputHandler, InputNotification, InputSink, InputSource, Result, SubscriptionHandle,
};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, RwLock,
    },
    time::{Duration, UNIX_EPOCH},
};
use tokio::time::Instant;

/// [`InputSource`] that delivers notifications only when told to.
///
/// `feed` may be called from any thread and runs the subscribed handlers
/// inline, like a host hook thread would.
#[derive(Default)]
pub struct ScriptedInputSource {
    subscribers: RwLock<Vec<(u64, InputHandler)>>,
    next_id: AtomicU64,
}

impl ScriptedInputSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one notification to every subscriber
    pub fn feed(&self, notification: InputNotification) {
        let subscribers = match self.subscribers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (_, handler) in subscribers.iter() {
            handler(&notification);
        }
    }

    /// Deliver a notification stamped `secs` seconds after the Unix epoch
    pub fn feed_at(&self, secs: f64, event_type: EventType, name: Option<&str>) {
        self.feed(notification_at(secs, event_type, name));
    }

    pub fn subscriber_count(&self) -> usize {
        match self.subscribers.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl InputSource for ScriptedInputSource {
    fn subscribe(&self, handler: InputHandler) -> Result<SubscriptionHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut subscribers = match self.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers.push((id, handler));
        Ok(SubscriptionHandle(id))
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()> {
        let mut subscribers = match self.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers.retain(|(id, _)| *id != handle.0);
        Ok(())
    }
}

/// Build a host notification stamped `secs` seconds after the Unix epoch
pub fn notification_at(secs: f64, event_type: EventType, name: Option<&str>) -> InputNotification {
    InputNotification {
        time: UNIX_EPOCH + Duration::from_secs_f64(secs.max(0.0)),
        name: name.map(str::to_string),
        event_type,
    }
}

/// [`InputSink`] that remembers what it was asked to synthesize and when
#[derive(Default)]
pub struct CapturingSink {
    sent: Mutex<Vec<(Instant, EventType)>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesized events in order
    pub fn sent(&self) -> Vec<EventType> {
        self.lock().iter().map(|(_, event)| *event).collect()
    }

    /// When each event was synthesized, per the tokio clock
    pub fn instants(&self) -> Vec<Instant> {
        self.lock().iter().map(|(at, _)| *at).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Instant, EventType)>> {
        match self.sent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl InputSink for CapturingSink {
    fn send(&self, event: &EventType) -> Result<()> {
        self.lock().push((Instant::now(), *event));
        Ok(())
    }
}
