//! Error types for the WhatsApp relay.

/// Top-level error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// A failed send reported by the messaging provider.
///
/// `code` is the provider's numeric error code when the response carried one.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", describe_provider_error(.code, .message))]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub status: Option<u16>,
}

impl ProviderError {
    /// Error for a request that never produced a provider response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: Some(message.into()),
            status: None,
        }
    }
}

fn describe_provider_error(code: &Option<i64>, message: &Option<String>) -> String {
    match (code, message) {
        (Some(code), Some(msg)) => format!("[{code}] {msg}"),
        (Some(code), None) => format!("provider error code {code}"),
        (None, Some(msg)) => msg.clone(),
        (None, None) => "unknown provider error".to_string(),
    }
}

/// Failure of an alert send, split by who is at fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlertError {
    /// The caller supplied a malformed destination. Maps to a client error.
    #[error("{0}")]
    Validation(String),

    /// The provider rejected or failed the send. Maps to a server error.
    #[error("{0}")]
    Delivery(String),
}

impl AlertError {
    /// The user-facing reason string.
    pub fn reason(&self) -> &str {
        match self {
            Self::Validation(reason) | Self::Delivery(reason) => reason,
        }
    }
}

/// Failure while handling an inbound reply.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The reply could not be recorded; no acknowledgement was attempted.
    #[error("Failed to persist reply: {0}")]
    Persistence(#[from] DatabaseError),

    /// The reply was recorded but the acknowledgement send failed.
    #[error("Failed to send acknowledgement: {0}")]
    Acknowledgement(#[from] ProviderError),
}

/// Result type alias for the relay.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_display() {
        let err = ProviderError {
            code: Some(21211),
            message: Some("The 'To' number is not valid.".into()),
            status: Some(400),
        };
        assert_eq!(err.to_string(), "[21211] The 'To' number is not valid.");

        let code_only = ProviderError {
            code: Some(63003),
            message: None,
            status: None,
        };
        assert_eq!(code_only.to_string(), "provider error code 63003");

        assert_eq!(ProviderError::transport("timed out").to_string(), "timed out");

        let empty = ProviderError {
            code: None,
            message: None,
            status: Some(500),
        };
        assert_eq!(empty.to_string(), "unknown provider error");
    }

    #[test]
    fn acknowledgement_failure_keeps_provider_source() {
        let err = WebhookError::from(ProviderError::transport("connection reset"));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "connection reset");
    }
}
