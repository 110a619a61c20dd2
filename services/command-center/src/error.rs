//! Error types for the command center service

/// Errors that can occur in the command center service
#[derive(Debug, thiserror::Error)]
pub enum CommandCenterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP request timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("A sweep is already running")]
    SweepInProgress,

    #[error("Auth not configured")]
    AuthNotConfigured,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

/// Result type alias for command center operations
pub type Result<T> = std::result::Result<T, CommandCenterError>;
