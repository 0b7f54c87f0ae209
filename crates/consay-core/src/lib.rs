//! Consay Core — domain models, repository traits, and the shared
//! error type for the consent-management system.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{ConsayError, ConsayResult};
