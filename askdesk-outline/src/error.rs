//! Error types for the Outline ingestion client.

use thiserror::Error;

/// Errors that can occur talking to the knowledge-base API.
#[derive(Debug, Error)]
pub enum OutlineError {
    /// A transport-level failure (connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({endpoint}): HTTP {status}")]
    Api {
        /// The endpoint that produced the error.
        endpoint: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The API answered 200 but the body did not match the expected shape.
    #[error("Decode error ({endpoint}): {message}")]
    Decode {
        /// The endpoint that produced the error.
        endpoint: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for ingestion operations.
pub type Result<T> = std::result::Result<T, OutlineError>;
