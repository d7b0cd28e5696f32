//! Unified error system for the Murmur feed client
//!
//! One error type covers the whole engine surface. Failures from
//! collaborators are converted at the component boundary; none escape as
//! panics or foreign error types.

use serde::{Deserialize, Serialize};

use crate::identifiers::PostId;

/// Unified error type for all feed operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum FeedError {
    /// Network or HTTP failure from a collaborator. Recoverable; retry is
    /// caller-initiated.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure
        message: String,
    },

    /// Input rejected before any mutation was attempted (e.g. empty content).
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the rejected input
        message: String,
    },

    /// An operation referenced a post no longer held in the loaded window.
    ///
    /// This can legitimately occur when a record scrolled out of the window;
    /// components generally treat it as a no-op rather than surfacing it.
    #[error("Stale target: {post_id}")]
    StaleTarget {
        /// The post that was no longer present
        post_id: PostId,
    },

    /// Serialization/deserialization failure
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure
        message: String,
    },

    /// Internal engine error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl FeedError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a stale-target error
    pub fn stale_target(post_id: PostId) -> Self {
        Self::StaleTarget { post_id }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the failed operation can succeed without caller
    /// changes (transport failures only).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Standard Result type for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
