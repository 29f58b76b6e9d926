use crate::{Event, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, Write},
    path::Path,
};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// File extension used for saved recordings
pub const RECORDING_EXTENSION: &str = "rec";

/// An ordered sequence of recorded events, persisted as a JSON array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog(Vec<Event>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.0.push(event);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.0
    }

    pub fn into_events(self) -> Vec<Event> {
        self.0
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON, validating the shape of every event
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a recording from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let log = Self::from_json(&json)?;
        debug!(path = ?path, events = log.len(), "Loaded recording");
        Ok(log)
    }

    /// Write a recording to disk.
    ///
    /// The JSON goes to a temporary file next to `path` which then replaces
    /// `path`, so an existing recording is either fully replaced or untouched.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;

        write_atomically(path, |file| file.write_all(json.as_bytes()))?;

        info!(path = ?path, events = self.len(), "Saved recording");
        Ok(())
    }
}

/// Fill a temporary file in the directory of `path` with `write`, then move it
/// over `path`. On any error the temporary file is removed and `path` is left
/// as it was.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    write(&mut file)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl From<Vec<Event>> for EventLog {
    fn from(events: Vec<Event>) -> Self {
        Self(events)
    }
}

impl FromIterator<Event> for EventLog {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
