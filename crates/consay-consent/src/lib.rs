//! Consay Consent — the consent-record lifecycle and approval-token
//! protocol: token generation, consent copy composition, event history
//! projection, and the service orchestrating creation and resolution.

pub mod config;
pub mod copy;
pub mod error;
pub mod history;
pub mod service;
pub mod token;

pub use config::ConsentConfig;
pub use error::ConsentError;
pub use service::{
    ApprovalDetails, ConsentService, CreateConsentRequest, CreatedConsentRequest, RecordSummary,
    ResolveAction, Resolution,
};
