//! Recommendation engine error types

use crate::types::ProfileId;
use alumnet_common::errors::AppError;
use thiserror::Error;

/// Result type alias using RecommendError
pub type Result<T> = std::result::Result<T, RecommendError>;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// The requester or discovery start profile does not exist
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: ProfileId,
    },

    /// Caller or programming error (bad degree bound, vector length mismatch)
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Traversal aborted; partial degree maps are discarded
    #[error("Failed to discover connections for profile {profile_id}")]
    DiscoveryFailure {
        profile_id: ProfileId,
        #[source]
        source: AppError,
    },

    /// A store read failed while ranking candidates
    #[error("Store error: {0}")]
    Store(#[from] AppError),

    #[error("Request cancelled")]
    Cancelled,
}

impl RecommendError {
    pub(crate) fn profile_not_found(id: ProfileId) -> Self {
        RecommendError::NotFound {
            resource_type: "Profile",
            id,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        RecommendError::InvalidArgument {
            message: message.into(),
        }
    }
}

impl From<RecommendError> for AppError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::NotFound { id, .. } => AppError::ProfileNotFound {
                id: id.to_string(),
            },
            RecommendError::InvalidArgument { message } => AppError::InvalidArgument { message },
            RecommendError::DiscoveryFailure { profile_id, source } => AppError::DiscoveryFailed {
                message: format!("profile {}: {}", profile_id, source),
            },
            RecommendError::Store(source) => source,
            RecommendError::Cancelled => AppError::Cancelled,
        }
    }
}
