//! Error types for SLP service discovery.
//!
//! Only failures that abort an operation live here. Soft failures such as a
//! reverse lookup that finds no name, or a predicate key that names neither a
//! field nor an attribute, are handled where they occur and never surface as
//! errors.

use std::io;
use thiserror::Error;

/// Result type alias using SlpError as the error type.
pub type Result<T> = std::result::Result<T, SlpError>;

/// Top-level error type for all discovery operations.
#[derive(Debug, Error)]
pub enum SlpError {
    /// A service type string did not have two or three colon-separated segments
    #[error("Incorrect SLP service type: {raw:?}")]
    MalformedType { raw: String },

    /// A predicate pattern could not be compiled as a regular expression
    #[error("Invalid pattern for '{key}' ({pattern:?}): {reason}")]
    InvalidPattern {
        key: String,
        pattern: String,
        reason: String,
    },

    /// A service URL returned by the agent could not be parsed
    #[error("Invalid service URL {url:?}: {reason}")]
    InvalidServiceUrl { url: String, reason: String },

    /// The SLP agent could not be queried
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SlpError {
    /// Creates a malformed service type error.
    pub fn malformed_type(raw: impl Into<String>) -> Self {
        Self::MalformedType { raw: raw.into() }
    }

    /// Creates an invalid pattern error.
    pub fn invalid_pattern(
        key: impl Into<String>,
        pattern: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidPattern {
            key: key.into(),
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid service URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidServiceUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while talking to the SLP agent.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The agent command could not be started
    #[error("Failed to run {command}: {reason}")]
    SpawnFailed { command: String, reason: String },

    /// The agent command exited unsuccessfully
    #[error("{operation} failed with status {status}: {stderr}")]
    CommandFailed {
        operation: String,
        status: i32,
        stderr: String,
    },

    /// The agent did not answer in time
    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout { operation: String, timeout_secs: u64 },

    /// The agent answered with something that is not valid UTF-8
    #[error("{operation} returned unreadable output: {reason}")]
    InvalidOutput { operation: String, reason: String },

    /// Registration or deregistration was rejected
    #[error("Failed to {operation} {service_url}: {reason}")]
    RegistrationFailed {
        operation: String,
        service_url: String,
        reason: String,
    },
}

impl TransportError {
    /// Creates a spawn failed error.
    pub fn spawn_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(operation: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_secs,
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_type_display() {
        let err = SlpError::malformed_type("service:a:b:c");
        let display = format!("{}", err);
        assert!(display.contains("service:a:b:c"));
    }

    #[test]
    fn test_transport_error_conversion() {
        let err: SlpError = TransportError::timeout("findsrvs", 10).into();
        assert!(matches!(err, SlpError::Transport(TransportError::Timeout { .. })));
        assert!(format!("{}", err).contains("10s"));
    }

    #[test]
    fn test_config_error_helpers() {
        let err = ConfigError::invalid_value("discovery.lookup_concurrency", "must be > 0");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "slptool not found");
        let err: SlpError = io_err.into();
        assert!(matches!(err, SlpError::Io(_)));
    }
}
