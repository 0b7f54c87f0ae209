//! Domain models for Consay.
//!
//! These are the core types shared across all crates.

pub mod event;
pub mod record;
pub mod workspace;
