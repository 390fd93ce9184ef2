//! Error types for the netstate system
//!
//! The reconciliation engine never fails on data-shape problems; bad references
//! are logged and dropped. These errors cover the I/O-facing parts around it:
//! snapshot files, the service actor and configuration.

use thiserror::Error;

/// Result type alias for netstate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the netstate system
#[derive(Error, Debug)]
pub enum Error {
    /// Snapshot load/save errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The service actor is gone or stopped answering
    #[error("Service error: {0}")]
    Service(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a snapshot error
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a service error
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::config("bad capacity").to_string(),
            "Configuration error: bad capacity"
        );
        assert_eq!(
            Error::service("actor stopped").to_string(),
            "Service error: actor stopped"
        );
    }

    #[test]
    fn test_from_anyhow() {
        let err: Error = anyhow::anyhow!("boom").into();
        assert!(matches!(err, Error::Other(ref msg) if msg == "boom"));
    }
}
