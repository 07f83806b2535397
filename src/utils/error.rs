//! Error types for the leadscan scanner
//!
//! This module defines custom error types used throughout the application.

use thiserror::Error;

/// Errors that can occur while driving a browsing surface
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Non-success status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No snapshot available for the requested page
    #[error("No page available for {0}")]
    PageUnavailable(String),

    /// Reading a saved page failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Check if the failure is transient
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimit => true,
            Self::ServerError(code) => *code >= 500,
            Self::InvalidUrl(_) | Self::PageUnavailable(_) | Self::Io(_) => false,
        }
    }
}

/// Errors from the AI-assisted classification stage
///
/// All variants are absorbed by the classifier and resolved to a fail-open
/// result; they surface only in logs.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// Transport failure or unexpected HTTP status
    #[error("Network error: {0}")]
    Network(String),

    /// Response did not contain a usable classification object
    #[error("Parse error: {0}")]
    Parse(String),

    /// The requested model does not exist on the endpoint
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// No API key configured
    #[error("No API key configured")]
    MissingKey,
}

impl From<reqwest::Error> for ClassifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ClassifyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Errors from the detection counters store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized
    #[error("Storage format error: {0}")]
    Format(#[from] serde_json::Error),
}
