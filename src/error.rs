//! Error types for Kanava
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Kanava operations
///
/// This enum encompasses all possible errors that can occur while loading
/// configuration, managing channels, talking to remote chat-completion
/// endpoints, decoding streamed responses, and persisting local state.
#[derive(Error, Debug)]
pub enum KanavaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Channel management errors (unknown channel, invalid endpoint, etc.)
    #[error("Channel error: {0}")]
    Channel(String),

    /// Remote API errors (request establishment failures, bad responses)
    #[error("API error: {0}")]
    Api(String),

    /// The response carried no readable body to stream from
    #[error("Response has no readable body stream")]
    StreamUnavailable,

    /// Local store errors (data directory, read/write failures)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Kanava operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = KanavaError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_channel_error_display() {
        let error = KanavaError::Channel("no channel selected".to_string());
        assert_eq!(error.to_string(), "Channel error: no channel selected");
    }

    #[test]
    fn test_api_error_display() {
        let error = KanavaError::Api("API request failed (500)".to_string());
        assert_eq!(error.to_string(), "API error: API request failed (500)");
    }

    #[test]
    fn test_stream_unavailable_display() {
        let error = KanavaError::StreamUnavailable;
        assert_eq!(error.to_string(), "Response has no readable body stream");
    }

    #[test]
    fn test_storage_error_display() {
        let error = KanavaError::Storage("could not determine data directory".to_string());
        assert_eq!(
            error.to_string(),
            "Storage error: could not determine data directory"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: KanavaError = io_error.into();
        assert!(matches!(error, KanavaError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_str = "{invalid json}";
        let json_error = serde_json::from_str::<serde_json::Value>(json_str).unwrap_err();
        let error: KanavaError = json_error.into();
        assert!(matches!(error, KanavaError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: KanavaError = yaml_error.into();
        assert!(matches!(error, KanavaError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KanavaError>();
    }
}
