//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The consent core depends only
//! on these traits; the SurrealDB implementations live in `consay-db`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ConsayResult;
use crate::models::{
    event::{ConsentEvent, ConsentStatus, NewEvent},
    record::{ConsentRecord, CreateRecord},
    workspace::{CreateWorkspace, Workspace},
};

// ---------------------------------------------------------------------------
// Workspace (collaborator boundary)
// ---------------------------------------------------------------------------

pub trait WorkspaceRepository: Send + Sync {
    fn create(&self, input: CreateWorkspace) -> impl Future<Output = ConsayResult<Workspace>> + Send;
    /// Fetch a workspace only if it is owned by `owner_id`. A workspace
    /// owned by someone else is reported as not found, never as a
    /// distinct "exists but forbidden" case.
    fn get_owned(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = ConsayResult<Workspace>> + Send;
    fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = ConsayResult<Vec<Workspace>>> + Send;
}

// ---------------------------------------------------------------------------
// Consent records & events
// ---------------------------------------------------------------------------

pub trait ConsentRecordRepository: Send + Sync {
    /// Persist a record together with its initial event as one atomic
    /// unit. A record must never become visible without at least one
    /// event attached.
    fn create_with_initial_event(
        &self,
        record: CreateRecord,
        event: NewEvent,
    ) -> impl Future<Output = ConsayResult<(ConsentRecord, ConsentEvent)>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ConsayResult<ConsentRecord>> + Send;
    fn get_by_slug(&self, slug: &str)
    -> impl Future<Output = ConsayResult<ConsentRecord>> + Send;
    /// All records in a workspace, newest first.
    fn list_by_workspace(
        &self,
        workspace_id: Uuid,
    ) -> impl Future<Output = ConsayResult<Vec<ConsentRecord>>> + Send;
}

pub trait ConsentEventRepository: Send + Sync {
    /// Append a follow-up event to an existing record, assigning the
    /// next per-record sequence number transactionally.
    fn append(
        &self,
        record_id: Uuid,
        event: NewEvent,
    ) -> impl Future<Output = ConsayResult<ConsentEvent>> + Send;
    /// Look up an event by its approval token, joined with its record.
    fn find_by_token(
        &self,
        token: &str,
    ) -> impl Future<Output = ConsayResult<(ConsentEvent, ConsentRecord)>> + Send;
    /// The full event sequence for a record, oldest first (`seq` ASC).
    fn list_by_record(
        &self,
        record_id: Uuid,
    ) -> impl Future<Output = ConsayResult<Vec<ConsentEvent>>> + Send;
    /// Conditionally resolve an event: the write applies only if the
    /// stored status is still `pending` at write time. Returns the
    /// updated event, or `None` when the guard failed because a
    /// concurrent resolution won.
    fn resolve_if_pending(
        &self,
        id: Uuid,
        status: ConsentStatus,
        approved_at: Option<DateTime<Utc>>,
    ) -> impl Future<Output = ConsayResult<Option<ConsentEvent>>> + Send;
}
