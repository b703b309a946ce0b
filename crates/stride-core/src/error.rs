use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{0} Using local mode instead.")]
    RemoteUnavailable(#[from] RemoteError),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// True when the error came from the remote store and the mutation was kept locally.
    pub fn is_remote_unavailable(&self) -> bool {
        matches!(self, CoreError::RemoteUnavailable(_))
    }
}

/// Failures of the remote document store. Every variant is handled the same
/// way by the core: the session drops to local-only mode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Network error: {0}.")]
    Network(String),

    #[error("Request timed out after {0:?}.")]
    Timeout(Duration),

    #[error("You do not have permission to access '{0}'.")]
    PermissionDenied(String),

    #[error("Remote store returned an invalid response: {0}.")]
    InvalidResponse(String),
}

impl From<sqlx::Error> for RemoteError {
    fn from(err: sqlx::Error) -> Self {
        RemoteError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::InvalidResponse(err.to_string())
    }
}

/// Failure reported by a notification sink. Always logged and ignored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Notification delivery failed: {0}")]
pub struct DeliveryError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_unavailable_message_mentions_local_mode() {
        let err = CoreError::from(RemoteError::Network("connection reset".into()));
        assert!(err.is_remote_unavailable());
        assert_eq!(
            err.to_string(),
            "Network error: connection reset. Using local mode instead."
        );
    }

    #[test]
    fn timeout_message_carries_duration() {
        let err = CoreError::from(RemoteError::Timeout(Duration::from_secs(10)));
        assert_eq!(err.to_string(), "Request timed out after 10s. Using local mode instead.");
    }
}
