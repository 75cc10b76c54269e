//! Error types for Growth Chat
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Growth Chat operations
///
/// Covers configuration loading, backend calls, streaming replies,
/// uploads, form validation and local persistence.
#[derive(Error, Debug)]
pub enum GrowthError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend API errors (unexpected status, malformed body)
    #[error("API error: {0}")]
    Api(String),

    /// HTTP status error returned by the backend
    #[error("HTTP error! Status: {status} - {body}")]
    Status {
        /// Numeric HTTP status code
        status: u16,
        /// Response body text, possibly empty
        body: String,
    },

    /// Authentication errors (login rejected, no active session)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Client-side form validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// File upload errors
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Streamed reply errors
    #[error("Stream error: {0}")]
    Stream(String),

    /// Local persistence errors
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

    /// Endpoint URL errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for Growth Chat operations
///
/// Uses `anyhow::Error` so callers can attach context while still being
/// able to downcast to [`GrowthError`].
pub type Result<T> = anyhow::Result<T>;
