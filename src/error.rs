//! Unified error handling for the leadscan crate
//!
//! Domain-specific errors live next to the code that raises them; this module
//! folds them into a single [`Error`] for use across module boundaries.
//!
//! # Architecture
//!
//! - [`LeadscanErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use leadscan::error::{Error, LeadscanErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {}", err.user_message());
//!     } else {
//!         eprintln!("Fatal error: {}", err);
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::bus::BusError;
pub use crate::utils::error::{ClassifyError, FetchError, StoreError};

/// Common trait for leadscan error types
pub trait LeadscanErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Short description suitable for the control surface
    fn user_message(&self) -> String;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Page navigation and HTTP errors
    Network,
    /// Classifier and model errors
    Classifier,
    /// Counter persistence errors
    Storage,
    /// Cross-process messaging errors
    Messaging,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Classifier => write!(f, "classifier"),
            Self::Storage => write!(f, "storage"),
            Self::Messaging => write!(f, "messaging"),
            Self::Config => write!(f, "config"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Unified error type for the leadscan crate
#[derive(Error, Debug)]
pub enum Error {
    /// Browsing surface errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// AI classification errors
    #[error("Classifier error: {0}")]
    Classify(#[from] ClassifyError),

    /// Counter store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Message bus errors
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LeadscanErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Classify(e) => !matches!(e, ClassifyError::MissingKey),
            Self::Store(StoreError::Io(_)) => true,
            Self::Store(StoreError::Format(_)) => false,
            Self::Bus(e) => matches!(e, BusError::Timeout(_)),
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Fetch(e) => format!("Could not load page: {e}"),
            Self::Classify(e) => format!("AI analysis unavailable: {e}"),
            Self::Store(e) => format!("Could not update detection history: {e}"),
            Self::Bus(e) => format!("Scanner unreachable: {e}"),
            Self::Io(e) => format!("I/O failure: {e}"),
            Self::Json(e) => format!("Malformed data: {e}"),
            Self::Config(msg) => format!("Invalid configuration: {msg}"),
            Self::Other { context, .. } => context.clone(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Classify(_) => ErrorCategory::Classifier,
            Self::Store(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Bus(_) => ErrorCategory::Messaging,
            Self::Json(_) => ErrorCategory::Other,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
