//! Macro recorder engine
//!
//! This crate records global mouse and keyboard input as a timestamped event
//! log and replays such logs with their original timing. Recordings are saved
//! as human-readable JSON (`.rec`) files using portable key and button names.
//!
//! [`Recorder`] and [`Player`] are the two engines; [`MacroSession`] ties them
//! to an active recording file for use by a GUI or CLI shell.

pub mod error;
pub mod events;
pub mod input;
pub mod keymap;
pub mod persistence;
pub mod player;
pub mod recorder;
pub mod session;
pub mod testing;

pub use error::*;
pub use events::*;
pub use input::*;
pub use persistence::*;
pub use player::*;
pub use recorder::*;
pub use session::*;

#[cfg(test)]
mod tests;
