use crate::{EventType, InputSink, MacroError, Result};
use std::time::Duration;
use tracing::trace;

/// [`InputSink`] that synthesizes input through `rdev::simulate`
#[derive(Debug, Clone, Default)]
pub struct RdevInputSink {
    /// Pause after each synthesized event so the host can process it
    settle: Duration,
}

impl RdevInputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause for `settle` after each synthesized event.
    ///
    /// Some hosts (notably macOS) drop input injected back-to-back.
    pub fn with_settle(settle: Duration) -> Self {
        Self { settle }
    }
}

impl InputSink for RdevInputSink {
    fn send(&self, event: &EventType) -> Result<()> {
        trace!(?event, "Simulating input");
        rdev::simulate(event).map_err(|e| {
            MacroError::SimulationError(format!("{:?} ({:?})", e, event))
        })?;
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        Ok(())
    }
}
