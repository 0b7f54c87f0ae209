//! Consent protocol error types.

use chrono::{DateTime, Utc};
use consay_core::error::ConsayError;
use consay_core::models::event::ConsentStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsentError {
    /// Token not found in storage. The message never distinguishes
    /// "never issued" from "gone", to avoid enumeration.
    #[error("invalid approval link")]
    InvalidToken,

    /// Terminal-state guard tripped: the event was already resolved.
    /// Carries the existing resolution so the creator sees history
    /// instead of a generic error.
    #[error("this request has already been {status}")]
    AlreadyResolved {
        status: ConsentStatus,
        approved_at: Option<DateTime<Utc>>,
    },

    /// Expiry guard tripped on a still-pending event.
    #[error("this approval link has expired; ask the requester for a new link")]
    TokenExpired,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("failed to create consent request: {0}")]
    CreationFailed(String),

    #[error("failed to process approval: {0}")]
    ResolutionFailed(String),

    #[error("failed to load consent records: {0}")]
    ReadFailed(String),
}

impl From<ConsentError> for ConsayError {
    fn from(err: ConsentError) -> Self {
        match err {
            ConsentError::InvalidToken => ConsayError::NotFound {
                entity: "consent_event".into(),
                id: "<token>".into(),
            },
            ConsentError::Validation(message) => ConsayError::Validation { message },
            ConsentError::AlreadyResolved { .. } | ConsentError::TokenExpired => {
                ConsayError::Validation {
                    message: err.to_string(),
                }
            }
            ConsentError::CreationFailed(msg)
            | ConsentError::ResolutionFailed(msg)
            | ConsentError::ReadFailed(msg) => ConsayError::Database(msg),
        }
    }
}
