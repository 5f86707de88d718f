//! Error types for a3s-dispatch

use thiserror::Error;

/// Errors that can occur while dispatching events or running commands
#[derive(Debug, Error)]
pub enum EventError {
    /// Error raised by listener or command handler code
    ///
    /// Displays as the bare message so command results report exactly
    /// what the handler raised.
    #[error("{0}")]
    Raised(String),

    /// Payload serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport cannot deliver the event
    #[error("Transport error: {0}")]
    Transport(String),
}

impl EventError {
    /// Create a `Raised` error from any displayable message
    pub fn msg(message: impl std::fmt::Display) -> Self {
        Self::Raised(message.to_string())
    }
}

impl From<String> for EventError {
    fn from(message: String) -> Self {
        Self::Raised(message)
    }
}

impl From<&str> for EventError {
    fn from(message: &str) -> Self {
        Self::Raised(message.to_string())
    }
}

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, EventError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raised_displays_bare_message() {
        assert_eq!(EventError::msg("boom").to_string(), "boom");
        assert_eq!(EventError::from("boom").to_string(), "boom");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let err: EventError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, EventError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }

    #[test]
    fn test_transport_error_display() {
        let err = EventError::Transport("no runtime".to_string());
        assert_eq!(err.to_string(), "Transport error: no runtime");
    }
}
