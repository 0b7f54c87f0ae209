//! Consent event domain model.
//!
//! An event is one discrete consent negotiation step (the initial ask,
//! or a later scope-expansion ask) and its resolution. Events for a
//! record form an append-only sequence ordered by `seq`; the most
//! recent event determines the record's current scope and status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConsayError;

/// Kind of negotiation step an event represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Initial,
    ScopeExpansion,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Initial => "initial",
            EventType::ScopeExpansion => "scope_expansion",
        }
    }
}

impl FromStr for EventType {
    type Err = ConsayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(EventType::Initial),
            "scope_expansion" => Ok(EventType::ScopeExpansion),
            other => Err(ConsayError::Validation {
                message: format!("unknown event type: {other}"),
            }),
        }
    }
}

/// Usage category a consent ask covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsentScope {
    Organic,
    PaidAds,
    OrganicAndAds,
}

impl ConsentScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentScope::Organic => "organic",
            ConsentScope::PaidAds => "paid_ads",
            ConsentScope::OrganicAndAds => "organic_and_ads",
        }
    }

    /// Display label for dashboards and rendered consent copy.
    pub fn label(&self) -> &'static str {
        match self {
            ConsentScope::Organic => "Organic social media posts only",
            ConsentScope::PaidAds => "Paid advertising",
            ConsentScope::OrganicAndAds => "Both organic posts and paid advertising",
        }
    }

    /// Whether this scope covers paid advertising usage.
    pub fn includes_paid(&self) -> bool {
        matches!(self, ConsentScope::PaidAds | ConsentScope::OrganicAndAds)
    }
}

impl fmt::Display for ConsentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentScope {
    type Err = ConsayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organic" => Ok(ConsentScope::Organic),
            "paid_ads" => Ok(ConsentScope::PaidAds),
            "organic_and_ads" => Ok(ConsentScope::OrganicAndAds),
            other => Err(ConsayError::Validation {
                message: format!("unknown scope: {other}"),
            }),
        }
    }
}

/// Resolution state of a consent event.
///
/// Starts at `Pending` and transitions at most once, to `Approved` or
/// `Declined`. There is no transition out of a terminal state. Expiry
/// is not a status: an expired-but-unresolved event stays `Pending`
/// in storage and is refused only at resolution time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    Pending,
    Approved,
    Declined,
}

impl ConsentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentStatus::Pending => "pending",
            ConsentStatus::Approved => "approved",
            ConsentStatus::Declined => "declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConsentStatus::Pending)
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentStatus {
    type Err = ConsayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ConsentStatus::Pending),
            "approved" => Ok(ConsentStatus::Approved),
            "declined" => Ok(ConsentStatus::Declined),
            other => Err(ConsayError::Validation {
                message: format!("unknown status: {other}"),
            }),
        }
    }
}

/// One consent negotiation step tied to a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentEvent {
    pub id: Uuid,
    /// The record this event belongs to.
    pub record_id: Uuid,
    /// Per-record monotonic sequence number, 1-based. Gives the event
    /// sequence an unambiguous order even when two events share a
    /// creation timestamp.
    pub seq: u32,
    pub event_type: EventType,
    /// The usage scope this ask requests.
    pub scope: ConsentScope,
    /// Immutable snapshot of the message shown to the creator. Stored
    /// at creation and never regenerated.
    pub consent_text: String,
    pub status: ConsentStatus,
    /// Single-use bearer secret authenticating the creator's response.
    pub approval_token: String,
    pub approval_token_expiry: Option<DateTime<Utc>>,
    /// Set if and only if `status` is `Approved`.
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Payload for appending a new event to a record.
///
/// The owning record id and `seq` are assigned by the repository at
/// write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub event_type: EventType,
    pub scope: ConsentScope,
    pub consent_text: String,
    pub approval_token: String,
    pub approval_token_expiry: Option<DateTime<Utc>>,
}
