//! Workspace domain model.
//!
//! Workspaces are a thin multi-tenant grouping: every consent record
//! belongs to exactly one workspace, and a workspace belongs to the
//! user who created it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// The user who owns this workspace.
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspace {
    pub name: String,
    pub owner_id: Uuid,
}
