//! Consent record domain model.
//!
//! A record identifies one piece of creator content under consent
//! negotiation. Records are created once and never mutated: they act
//! as a stable identity header for their append-only event sequence.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConsayError;

/// Social platform the content was published on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Instagram,
    Tiktok,
    Twitter,
    Youtube,
    Facebook,
    Linkedin,
    Other,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Twitter => "twitter",
            Platform::Youtube => "youtube",
            Platform::Facebook => "facebook",
            Platform::Linkedin => "linkedin",
            Platform::Other => "other",
        }
    }

    /// Display label for dashboards and rendered consent copy.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::Tiktok => "TikTok",
            Platform::Twitter => "Twitter/X",
            Platform::Youtube => "YouTube",
            Platform::Facebook => "Facebook",
            Platform::Linkedin => "LinkedIn",
            Platform::Other => "Other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ConsayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::Tiktok),
            "twitter" => Ok(Platform::Twitter),
            "youtube" => Ok(Platform::Youtube),
            "facebook" => Ok(Platform::Facebook),
            "linkedin" => Ok(Platform::Linkedin),
            "other" => Ok(Platform::Other),
            other => Err(ConsayError::Validation {
                message: format!("unknown platform: {other}"),
            }),
        }
    }
}

/// One piece of creator content under consent negotiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub id: Uuid,
    /// Public, URL-safe identifier. Globally unique and immutable
    /// once assigned.
    pub slug: String,
    /// URL of the creator content being negotiated over.
    pub content_url: String,
    /// Creator handle as shown on the platform (e.g., `@jane`).
    pub creator_handle: String,
    pub platform: Platform,
    /// The workspace this record belongs to.
    pub workspace_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new consent record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecord {
    pub slug: String,
    pub content_url: String,
    pub creator_handle: String,
    pub platform: Platform,
    pub workspace_id: Uuid,
}
