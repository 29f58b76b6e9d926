//! Capability seams between the engine and the host input subsystem.

use crate::Result;
use std::sync::Arc;

pub use rdev::{Event as InputNotification, EventType};

/// Callback invoked for every global input notification
pub type InputHandler = Arc<dyn Fn(&InputNotification) + Send + Sync>;

/// Identifies one subscription to an [`InputSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub(crate) u64);

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A source of global mouse and keyboard notifications.
///
/// Implementations may invoke handlers from any thread. Once `unsubscribe`
/// returns, the handler must not be running and must never be invoked again.
pub trait InputSource: Send + Sync {
    fn subscribe(&self, handler: InputHandler) -> Result<SubscriptionHandle>;

    fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()>;
}

/// Synthesizes input on the host
pub trait InputSink: Send + Sync {
    fn send(&self, event: &EventType) -> Result<()>;
}
