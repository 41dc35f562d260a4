//! Core error types for dependency-graph processing
//!
//! Transport and decode failures surface through `MapError`. Malformed
//! individual records are not errors: they are skipped with counts, since
//! partial backend data is the expected common case.

use thiserror::Error;

/// Core error types for snapshot fetching and scene building
#[derive(Error, Debug)]
pub enum MapError {
    #[error("transport error: {message}")]
    Transport {
        /// HTTP status code when one was received
        status: Option<u16>,
        message: String,
    },

    #[error("decode error: {source}")]
    Decode {
        #[from]
        source: serde_json::Error,
    },

    #[error("backend reported a degraded response: {message}")]
    Backend { message: String },

    #[error("layout error: {message}")]
    Layout { message: String },

    #[error("fetch superseded by a newer request")]
    Cancelled,

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl MapError {
    /// Create a new transport error
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Create a new backend-degraded error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a new layout error
    pub fn layout(message: impl Into<String>) -> Self {
        Self::Layout {
            message: message.into(),
        }
    }

    /// Returns true for errors where a retry affordance makes sense
    pub fn is_retryable(&self) -> bool {
        matches!(self, MapError::Transport { .. } | MapError::Backend { .. })
    }
}
