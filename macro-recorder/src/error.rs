use thiserror::Error;

/// Error types for macro recording and playback
#[derive(Debug, Error)]
pub enum MacroError {
    /// Error when installing the global input hook
    #[error("Failed to initialize input hook: {0}")]
    InitializationError(String),

    /// A recording session is already active
    #[error("A recording is already in progress")]
    AlreadyRecording,

    /// A playback session is already active
    #[error("A playback is already in progress")]
    AlreadyPlaying,

    /// A key name that resolves to no host key
    #[error("Unmappable key: {0}")]
    UnmappableKey(String),

    /// Error from the host input synthesis API
    #[error("Failed to synthesize input: {0}")]
    SimulationError(String),

    /// Error when the persisted recording is malformed
    #[error("Failed to parse recording: {0}")]
    ParseError(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for macro recorder operations
pub type Result<T> = std::result::Result<T, MacroError>;
