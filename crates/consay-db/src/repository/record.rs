//! SurrealDB implementation of [`ConsentRecordRepository`].
//!
//! Record creation always writes the initial event in the same
//! transaction: a record is never observable without at least one
//! event.

use chrono::{DateTime, Utc};
use consay_core::error::ConsayResult;
use consay_core::models::event::{ConsentEvent, NewEvent};
use consay_core::models::record::{ConsentRecord, CreateRecord, Platform};
use consay_core::repository::ConsentRecordRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::event::EventRow;

#[derive(Debug, SurrealValue)]
pub(crate) struct RecordRow {
    slug: String,
    content_url: String,
    creator_handle: String,
    platform: String,
    workspace_id: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
pub(crate) struct RecordRowWithId {
    row_id: String,
    slug: String,
    content_url: String,
    creator_handle: String,
    platform: String,
    workspace_id: String,
    created_at: DateTime<Utc>,
}

pub(crate) fn row_to_record(row: RecordRow, id: Uuid) -> Result<ConsentRecord, DbError> {
    let workspace_id = Uuid::parse_str(&row.workspace_id)
        .map_err(|e| DbError::Migration(format!("invalid workspace UUID: {e}")))?;
    let platform: Platform = row
        .platform
        .parse()
        .map_err(|_| DbError::Migration(format!("unknown platform: {}", row.platform)))?;
    Ok(ConsentRecord {
        id,
        slug: row.slug,
        content_url: row.content_url,
        creator_handle: row.creator_handle,
        platform,
        workspace_id,
        created_at: row.created_at,
    })
}

impl RecordRowWithId {
    pub(crate) fn try_into_record(self) -> Result<ConsentRecord, DbError> {
        let id = Uuid::parse_str(&self.row_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        row_to_record(
            RecordRow {
                slug: self.slug,
                content_url: self.content_url,
                creator_handle: self.creator_handle,
                platform: self.platform,
                workspace_id: self.workspace_id,
                created_at: self.created_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the consent record repository.
#[derive(Clone)]
pub struct SurrealConsentRecordRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealConsentRecordRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ConsentRecordRepository for SurrealConsentRecordRepository<C> {
    async fn create_with_initial_event(
        &self,
        record: CreateRecord,
        event: NewEvent,
    ) -> ConsayResult<(ConsentRecord, ConsentEvent)> {
        let record_id = Uuid::new_v4();
        let record_id_str = record_id.to_string();
        let event_id = Uuid::new_v4();
        let event_id_str = event_id.to_string();

        // One transaction: if either write fails (including a lost
        // slug or token uniqueness race), neither row survives.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::record('consent_record', $record_id) SET \
                 slug = $slug, \
                 content_url = $content_url, \
                 creator_handle = $creator_handle, \
                 platform = $platform, \
                 workspace_id = $workspace_id; \
                 CREATE type::record('consent_event', $event_id) SET \
                 record_id = $record_id, \
                 seq = 1, \
                 event_type = $event_type, \
                 scope = $scope, \
                 consent_text = $consent_text, \
                 status = 'pending', \
                 approval_token = $approval_token, \
                 approval_token_expiry = $approval_token_expiry; \
                 COMMIT TRANSACTION;",
            )
            .bind(("record_id", record_id_str.clone()))
            .bind(("slug", record.slug))
            .bind(("content_url", record.content_url))
            .bind(("creator_handle", record.creator_handle))
            .bind(("platform", record.platform.as_str()))
            .bind(("workspace_id", record.workspace_id.to_string()))
            .bind(("event_id", event_id_str.clone()))
            .bind(("event_type", event.event_type.as_str()))
            .bind(("scope", event.scope.as_str()))
            .bind(("consent_text", event.consent_text))
            .bind(("approval_token", event.approval_token))
            .bind(("approval_token_expiry", event.approval_token_expiry))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        // Index 0 is the BEGIN statement; the CREATE results follow.
        let record_rows: Vec<RecordRow> = result.take(1).map_err(DbError::from)?;
        let record_row = record_rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "consent_record".into(),
                id: record_id_str,
            })?;

        let event_rows: Vec<EventRow> = result.take(2).map_err(DbError::from)?;
        let event_row = event_rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "consent_event".into(),
                id: event_id_str,
            })?;

        let created_record = row_to_record(record_row, record_id)?;
        let created_event = event_row.into_event(event_id)?;
        Ok((created_record, created_event))
    }

    async fn get_by_id(&self, id: Uuid) -> ConsayResult<ConsentRecord> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('consent_record', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RecordRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "consent_record".into(),
            id: id_str,
        })?;

        row_to_record(row, id).map_err(Into::into)
    }

    async fn get_by_slug(&self, slug: &str) -> ConsayResult<ConsentRecord> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS row_id, * \
                 FROM consent_record \
                 WHERE slug = $slug \
                 LIMIT 1",
            )
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RecordRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "consent_record".into(),
            id: slug.into(),
        })?;

        row.try_into_record().map_err(Into::into)
    }

    async fn list_by_workspace(&self, workspace_id: Uuid) -> ConsayResult<Vec<ConsentRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS row_id, * \
                 FROM consent_record \
                 WHERE workspace_id = $workspace_id \
                 ORDER BY created_at DESC",
            )
            .bind(("workspace_id", workspace_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RecordRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_record().map_err(Into::into))
            .collect()
    }
}
