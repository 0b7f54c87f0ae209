//! Error types for the Consay system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsayError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authorization denied: {reason}")]
    Authorization { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ConsayResult<T> = Result<T, ConsayError>;
