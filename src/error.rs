//! Custom error types for refscope.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, RefscopeError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for refscope operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum RefscopeError {
    /// Invalid, missing, or conflicting search configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Missing or rejected Scopus API key
    #[error("Authentication error: {0} (set SCOPUS_API_KEY or pass --api-key)")]
    Auth(String),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Rate limited by the Scopus API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// Scopus API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code from the API
        code: i32,
        /// Error message from the API
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using `RefscopeError`
pub type Result<T> = std::result::Result<T, RefscopeError>;
