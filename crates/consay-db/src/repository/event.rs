//! SurrealDB implementation of [`ConsentEventRepository`].
//!
//! Events are append-only. The only mutation ever issued against the
//! `consent_event` table is the conditional status transition in
//! `resolve_if_pending`, guarded by `WHERE status = 'pending'` so
//! that concurrent resolutions cannot both succeed.

use chrono::{DateTime, Utc};
use consay_core::error::ConsayResult;
use consay_core::models::event::{ConsentEvent, ConsentScope, ConsentStatus, EventType, NewEvent};
use consay_core::models::record::ConsentRecord;
use consay_core::repository::ConsentEventRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::record::{RecordRow, row_to_record};

#[derive(Debug, SurrealValue)]
pub(crate) struct EventRow {
    record_id: String,
    seq: u32,
    event_type: String,
    scope: String,
    consent_text: String,
    status: String,
    approval_token: String,
    approval_token_expiry: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
pub(crate) struct EventRowWithId {
    row_id: String,
    record_id: String,
    seq: u32,
    event_type: String,
    scope: String,
    consent_text: String,
    status: String,
    approval_token: String,
    approval_token_expiry: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl EventRow {
    pub(crate) fn into_event(self, id: Uuid) -> Result<ConsentEvent, DbError> {
        let record_id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid record UUID: {e}")))?;
        let event_type: EventType = self
            .event_type
            .parse()
            .map_err(|_| DbError::Migration(format!("unknown event type: {}", self.event_type)))?;
        let scope: ConsentScope = self
            .scope
            .parse()
            .map_err(|_| DbError::Migration(format!("unknown scope: {}", self.scope)))?;
        let status: ConsentStatus = self
            .status
            .parse()
            .map_err(|_| DbError::Migration(format!("unknown status: {}", self.status)))?;
        Ok(ConsentEvent {
            id,
            record_id,
            seq: self.seq,
            event_type,
            scope,
            consent_text: self.consent_text,
            status,
            approval_token: self.approval_token,
            approval_token_expiry: self.approval_token_expiry,
            approved_at: self.approved_at,
            created_at: self.created_at,
        })
    }
}

impl EventRowWithId {
    fn try_into_event(self) -> Result<ConsentEvent, DbError> {
        let id = Uuid::parse_str(&self.row_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        EventRow {
            record_id: self.record_id,
            seq: self.seq,
            event_type: self.event_type,
            scope: self.scope,
            consent_text: self.consent_text,
            status: self.status,
            approval_token: self.approval_token,
            approval_token_expiry: self.approval_token_expiry,
            approved_at: self.approved_at,
            created_at: self.created_at,
        }
        .into_event(id)
    }
}

/// SurrealDB implementation of the consent event repository.
#[derive(Clone)]
pub struct SurrealConsentEventRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealConsentEventRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ConsentEventRepository for SurrealConsentEventRepository<C> {
    async fn append(&self, record_id: Uuid, event: NewEvent) -> ConsayResult<ConsentEvent> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // The next per-record sequence number is read and written in
        // the same transaction; the UNIQUE (record_id, seq) index
        // rejects the loser if two appends race anyway.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $next = (SELECT VALUE seq FROM consent_event \
                 WHERE record_id = $record_id \
                 ORDER BY seq DESC LIMIT 1)[0] ?? 0; \
                 CREATE type::record('consent_event', $id) SET \
                 record_id = $record_id, \
                 seq = $next + 1, \
                 event_type = $event_type, \
                 scope = $scope, \
                 consent_text = $consent_text, \
                 status = 'pending', \
                 approval_token = $approval_token, \
                 approval_token_expiry = $approval_token_expiry; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("record_id", record_id.to_string()))
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

        // Indices 0 and 1 are the BEGIN and LET statements; the CREATE
        // result follows.
        let rows: Vec<EventRow> = result.take(2).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "consent_event".into(),
            id: id_str,
        })?;

        row.into_event(id).map_err(Into::into)
    }

    async fn find_by_token(&self, token: &str) -> ConsayResult<(ConsentEvent, ConsentRecord)> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS row_id, * \
                 FROM consent_event \
                 WHERE approval_token = $approval_token \
                 LIMIT 1",
            )
            .bind(("approval_token", token.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EventRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "consent_event".into(),
            id: token.into(),
        })?;

        let event = row.try_into_event()?;

        let record_id_str = event.record_id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM type::record('consent_record', $id)")
            .bind(("id", record_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RecordRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "consent_record".into(),
            id: record_id_str,
        })?;

        let record = row_to_record(row, event.record_id)?;
        Ok((event, record))
    }

    async fn list_by_record(&self, record_id: Uuid) -> ConsayResult<Vec<ConsentEvent>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS row_id, * \
                 FROM consent_event \
                 WHERE record_id = $record_id \
                 ORDER BY seq ASC",
            )
            .bind(("record_id", record_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EventRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_event().map_err(Into::into))
            .collect()
    }

    async fn resolve_if_pending(
        &self,
        id: Uuid,
        status: ConsentStatus,
        approved_at: Option<DateTime<Utc>>,
    ) -> ConsayResult<Option<ConsentEvent>> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('consent_event', $id) SET \
                 status = $status, \
                 approved_at = $approved_at \
                 WHERE status = 'pending' \
                 RETURN AFTER",
            )
            .bind(("id", id.to_string()))
            .bind(("status", status.as_str()))
            .bind(("approved_at", approved_at))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EventRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.into_event(id).map_err(Into::into))
            .transpose()
    }
}
