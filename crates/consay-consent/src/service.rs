//! Consent service — request creation and approval resolution.
//!
//! This is the single state-transition point for creator responses.
//! Generic over repository implementations so that the consent layer
//! has no dependency on the database crate.

use std::str::FromStr;

use chrono::Utc;
use consay_core::error::ConsayError;
use consay_core::models::event::{ConsentEvent, ConsentScope, ConsentStatus, EventType, NewEvent};
use consay_core::models::record::{ConsentRecord, CreateRecord, Platform};
use consay_core::repository::{ConsentEventRepository, ConsentRecordRepository};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ConsentConfig;
use crate::copy::{self, ConsentCopyParams, FollowUpCopyParams};
use crate::error::ConsentError;
use crate::history;
use crate::token;

/// Input for creating a consent request.
#[derive(Debug, Clone)]
pub struct CreateConsentRequest {
    pub content_url: String,
    pub creator_handle: String,
    pub platform: Platform,
    pub scope: ConsentScope,
}

/// A freshly created consent ask: the record, the ask event, the link
/// to hand to the creator, and the copy-paste message.
#[derive(Debug, Clone)]
pub struct CreatedConsentRequest {
    pub record: ConsentRecord,
    pub event: ConsentEvent,
    pub approval_url: String,
    pub consent_text: String,
}

/// A record annotated with its most recent event, for listings.
#[derive(Debug, Clone)]
pub struct RecordSummary {
    pub record: ConsentRecord,
    pub latest_event: Option<ConsentEvent>,
}

/// Read-path payload for the approval page. Status and expiry are
/// surfaced as data here, never as errors: the page must be able to
/// show "already responded" or an expired-but-viewable state.
#[derive(Debug, Clone)]
pub struct ApprovalDetails {
    pub event: ConsentEvent,
    pub record: ConsentRecord,
}

/// The creator's response to an approval link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveAction {
    Approve,
    Decline,
}

impl FromStr for ResolveAction {
    type Err = ConsentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(ResolveAction::Approve),
            "decline" => Ok(ResolveAction::Decline),
            other => Err(ConsentError::Validation(format!(
                "invalid action '{other}': must be 'approve' or 'decline'"
            ))),
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub status: ConsentStatus,
    pub record: ConsentRecord,
}

/// Consent lifecycle and approval protocol service.
pub struct ConsentService<R: ConsentRecordRepository, E: ConsentEventRepository> {
    record_repo: R,
    event_repo: E,
    config: ConsentConfig,
}

impl<R: ConsentRecordRepository, E: ConsentEventRepository> ConsentService<R, E> {
    pub fn new(record_repo: R, event_repo: E, config: ConsentConfig) -> Self {
        Self {
            record_repo,
            event_repo,
            config,
        }
    }

    /// Create a consent record plus its initial ask event as one unit
    /// and build the public approval URL.
    pub async fn create_consent_request(
        &self,
        workspace_id: Uuid,
        input: CreateConsentRequest,
    ) -> Result<CreatedConsentRequest, ConsentError> {
        // Fail fast, before any write.
        if input.content_url.trim().is_empty() {
            return Err(ConsentError::Validation("content_url is required".into()));
        }
        if input.creator_handle.trim().is_empty() {
            return Err(ConsentError::Validation("creator_handle is required".into()));
        }

        // 1. Find a free slug. The loop only exits with a slug the
        //    store has confirmed unused; the unique index is the
        //    backstop for a lost race.
        let slug = self
            .allocate_slug(|| token::generate_slug(self.config.slug_length))
            .await?;

        // 2. Compose the message shown to the creator.
        let consent_text = copy::generate_consent_text(&ConsentCopyParams {
            creator_handle: &input.creator_handle,
            platform: input.platform,
            content_url: &input.content_url,
            scope: input.scope,
        });

        // 3. Issue the approval token and its validity window.
        let approval_token = token::generate_approval_token();
        let expiry = token::token_expiry(self.config.token_ttl_days);

        // 4. Persist record + initial event atomically. A record must
        //    never be listed without its initial event.
        let (record, event) = self
            .record_repo
            .create_with_initial_event(
                CreateRecord {
                    slug,
                    content_url: input.content_url,
                    creator_handle: input.creator_handle,
                    platform: input.platform,
                    workspace_id,
                },
                NewEvent {
                    event_type: EventType::Initial,
                    scope: input.scope,
                    consent_text: consent_text.clone(),
                    approval_token: approval_token.clone(),
                    approval_token_expiry: Some(expiry),
                },
            )
            .await
            .map_err(|e| ConsentError::CreationFailed(e.to_string()))?;

        let approval_url = self.approval_url(&approval_token);

        info!(
            record_id = %record.id,
            slug = %record.slug,
            scope = %event.scope,
            "created consent request"
        );

        Ok(CreatedConsentRequest {
            record,
            event,
            approval_url,
            consent_text,
        })
    }

    /// Append a scope-expansion ask to an existing record.
    ///
    /// Only allowed once the latest event is approved, and only for a
    /// scope different from the one already granted. The new event
    /// carries its own token and expiry; the original approval is
    /// untouched.
    pub async fn create_follow_up(
        &self,
        record_id: Uuid,
        new_scope: ConsentScope,
    ) -> Result<CreatedConsentRequest, ConsentError> {
        let record = match self.record_repo.get_by_id(record_id).await {
            Ok(r) => r,
            Err(ConsayError::NotFound { .. }) => {
                return Err(ConsentError::Validation(format!(
                    "unknown record: {record_id}"
                )));
            }
            Err(e) => return Err(ConsentError::CreationFailed(e.to_string())),
        };

        let events = self
            .event_repo
            .list_by_record(record_id)
            .await
            .map_err(|e| ConsentError::CreationFailed(e.to_string()))?;

        let latest = history::latest_event(&events).ok_or_else(|| {
            ConsentError::CreationFailed(format!("record {record_id} has no events"))
        })?;

        if latest.status != ConsentStatus::Approved {
            return Err(ConsentError::Validation(
                "a follow-up requires an approved previous ask".into(),
            ));
        }
        if latest.scope == new_scope {
            return Err(ConsentError::Validation(
                "follow-up scope must differ from the approved scope".into(),
            ));
        }

        let consent_text = copy::generate_follow_up_consent_text(&FollowUpCopyParams {
            creator_handle: &record.creator_handle,
            original_scope: latest.scope,
            new_scope,
            content_url: &record.content_url,
        });

        let approval_token = token::generate_approval_token();
        let expiry = token::token_expiry(self.config.token_ttl_days);

        let event = self
            .event_repo
            .append(
                record_id,
                NewEvent {
                    event_type: EventType::ScopeExpansion,
                    scope: new_scope,
                    consent_text: consent_text.clone(),
                    approval_token: approval_token.clone(),
                    approval_token_expiry: Some(expiry),
                },
            )
            .await
            .map_err(|e| ConsentError::CreationFailed(e.to_string()))?;

        let approval_url = self.approval_url(&approval_token);

        info!(
            record_id = %record.id,
            seq = event.seq,
            scope = %event.scope,
            "created scope-expansion follow-up"
        );

        Ok(CreatedConsentRequest {
            record,
            event,
            approval_url,
            consent_text,
        })
    }

    /// All records in a workspace, newest first, each annotated with
    /// its latest event.
    pub async fn list_records(
        &self,
        workspace_id: Uuid,
    ) -> Result<Vec<RecordSummary>, ConsentError> {
        let records = self
            .record_repo
            .list_by_workspace(workspace_id)
            .await
            .map_err(|e| ConsentError::ReadFailed(e.to_string()))?;

        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            let events = self
                .event_repo
                .list_by_record(record.id)
                .await
                .map_err(|e| ConsentError::ReadFailed(e.to_string()))?;
            let latest_event = history::latest_event(&events).cloned();
            summaries.push(RecordSummary {
                record,
                latest_event,
            });
        }
        Ok(summaries)
    }

    /// Full event history for a record, oldest first.
    pub async fn record_history(
        &self,
        record_id: Uuid,
    ) -> Result<Vec<ConsentEvent>, ConsentError> {
        self.event_repo
            .list_by_record(record_id)
            .await
            .map_err(|e| ConsentError::ReadFailed(e.to_string()))
    }

    /// Read path for the approval page: token lookup only. No expiry
    /// or terminal-state guard — an already-resolved or expired event
    /// is still viewable.
    pub async fn get_approval_details(
        &self,
        approval_token: &str,
    ) -> Result<ApprovalDetails, ConsentError> {
        let (event, record) = self.lookup_token(approval_token).await?;
        Ok(ApprovalDetails { event, record })
    }

    /// Apply the creator's response to the event identified by the
    /// token.
    ///
    /// Guard order: lookup, terminal state, expiry, then a conditional
    /// write that only applies while the stored status is still
    /// `pending`. A concurrent loser is remapped to `AlreadyResolved`,
    /// the same response as an ordinary second click.
    pub async fn resolve_approval(
        &self,
        approval_token: &str,
        action: ResolveAction,
    ) -> Result<Resolution, ConsentError> {
        let (event, record) = self.lookup_token(approval_token).await?;

        // Resolution outranks expiry: a resolved event reports its
        // history even when the token has since lapsed.
        if event.status.is_terminal() {
            return Err(ConsentError::AlreadyResolved {
                status: event.status,
                approved_at: event.approved_at,
            });
        }

        if let Some(expiry) = event.approval_token_expiry {
            if Utc::now() > expiry {
                return Err(ConsentError::TokenExpired);
            }
        }

        let now = Utc::now();
        let (new_status, approved_at) = match action {
            ResolveAction::Approve => (ConsentStatus::Approved, Some(now)),
            ResolveAction::Decline => (ConsentStatus::Declined, None),
        };

        let updated = self
            .event_repo
            .resolve_if_pending(event.id, new_status, approved_at)
            .await
            .map_err(|e| ConsentError::ResolutionFailed(e.to_string()))?;

        match updated {
            Some(event) => {
                info!(
                    record_id = %record.id,
                    event_id = %event.id,
                    status = %event.status,
                    "consent request resolved"
                );
                Ok(Resolution {
                    status: event.status,
                    record,
                })
            }
            None => {
                // Lost the race against a concurrent resolution.
                // Re-observe and report the winner's result.
                warn!(event_id = %event.id, "concurrent resolution detected");
                let (current, _) = self.lookup_token(approval_token).await?;
                Err(ConsentError::AlreadyResolved {
                    status: current.status,
                    approved_at: current.approved_at,
                })
            }
        }
    }

    async fn lookup_token(
        &self,
        approval_token: &str,
    ) -> Result<(ConsentEvent, ConsentRecord), ConsentError> {
        match self.event_repo.find_by_token(approval_token).await {
            Ok(pair) => Ok(pair),
            Err(ConsayError::NotFound { .. }) => Err(ConsentError::InvalidToken),
            Err(e) => Err(ConsentError::ResolutionFailed(e.to_string())),
        }
    }

    fn approval_url(&self, approval_token: &str) -> String {
        format!(
            "{}/approve/{}",
            self.config.base_url.trim_end_matches('/'),
            approval_token
        )
    }

    /// Generate slugs until the store confirms one unused. Structured
    /// so the loop cannot exit with an unverified slug: the only `Ok`
    /// path is a confirmed miss.
    async fn allocate_slug<F>(&self, mut generate: F) -> Result<String, ConsentError>
    where
        F: FnMut() -> String,
    {
        loop {
            let slug = generate();
            match self.record_repo.get_by_slug(&slug).await {
                // Taken: regenerate and recheck.
                Ok(_) => continue,
                Err(ConsayError::NotFound { .. }) => return Ok(slug),
                Err(e) => return Err(ConsentError::CreationFailed(e.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use chrono::{DateTime, Utc};
    use consay_core::error::{ConsayError, ConsayResult};

    use super::*;

    /// Record repository stub backed by a set of taken slugs.
    struct StubRecordRepo {
        taken: HashSet<String>,
    }

    fn dummy_record(slug: &str) -> ConsentRecord {
        ConsentRecord {
            id: Uuid::new_v4(),
            slug: slug.into(),
            content_url: "https://example.com".into(),
            creator_handle: "@someone".into(),
            platform: Platform::Other,
            workspace_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    impl ConsentRecordRepository for StubRecordRepo {
        async fn create_with_initial_event(
            &self,
            _record: CreateRecord,
            _event: NewEvent,
        ) -> ConsayResult<(ConsentRecord, ConsentEvent)> {
            unreachable!("not exercised by these tests")
        }

        async fn get_by_id(&self, id: Uuid) -> ConsayResult<ConsentRecord> {
            Err(ConsayError::NotFound {
                entity: "consent_record".into(),
                id: id.to_string(),
            })
        }

        async fn get_by_slug(&self, slug: &str) -> ConsayResult<ConsentRecord> {
            if self.taken.contains(slug) {
                Ok(dummy_record(slug))
            } else {
                Err(ConsayError::NotFound {
                    entity: "consent_record".into(),
                    id: slug.into(),
                })
            }
        }

        async fn list_by_workspace(&self, _workspace_id: Uuid) -> ConsayResult<Vec<ConsentRecord>> {
            Ok(vec![])
        }
    }

    /// Event repository stub; any mutating call is a test failure.
    struct StubEventRepo;

    impl ConsentEventRepository for StubEventRepo {
        async fn append(&self, _record_id: Uuid, _event: NewEvent) -> ConsayResult<ConsentEvent> {
            unreachable!("not exercised by these tests")
        }

        async fn find_by_token(&self, token: &str) -> ConsayResult<(ConsentEvent, ConsentRecord)> {
            Err(ConsayError::NotFound {
                entity: "consent_event".into(),
                id: token.into(),
            })
        }

        async fn list_by_record(&self, _record_id: Uuid) -> ConsayResult<Vec<ConsentEvent>> {
            Ok(vec![])
        }

        async fn resolve_if_pending(
            &self,
            _id: Uuid,
            _status: ConsentStatus,
            _approved_at: Option<DateTime<Utc>>,
        ) -> ConsayResult<Option<ConsentEvent>> {
            unreachable!("not exercised by these tests")
        }
    }

    /// Event repository stub whose read paths fail with a storage error.
    struct UnavailableEventRepo;

    impl ConsentEventRepository for UnavailableEventRepo {
        async fn append(&self, _record_id: Uuid, _event: NewEvent) -> ConsayResult<ConsentEvent> {
            unreachable!("not exercised by these tests")
        }

        async fn find_by_token(&self, _token: &str) -> ConsayResult<(ConsentEvent, ConsentRecord)> {
            Err(ConsayError::Database("connection reset".into()))
        }

        async fn list_by_record(&self, _record_id: Uuid) -> ConsayResult<Vec<ConsentEvent>> {
            Err(ConsayError::Database("connection reset".into()))
        }

        async fn resolve_if_pending(
            &self,
            _id: Uuid,
            _status: ConsentStatus,
            _approved_at: Option<DateTime<Utc>>,
        ) -> ConsayResult<Option<ConsentEvent>> {
            unreachable!("not exercised by these tests")
        }
    }

    fn service(taken: &[&str]) -> ConsentService<StubRecordRepo, StubEventRepo> {
        ConsentService::new(
            StubRecordRepo {
                taken: taken.iter().map(|s| s.to_string()).collect(),
            },
            StubEventRepo,
            ConsentConfig::default(),
        )
    }

    #[tokio::test]
    async fn slug_allocation_retries_on_collision() {
        let svc = service(&["collided00"]);
        // Generator yields a duplicate once, then a fresh slug.
        let sequence = Mutex::new(vec!["fresh00", "collided00"]);
        let slug = svc
            .allocate_slug(|| sequence.lock().unwrap().pop().unwrap().to_string())
            .await
            .unwrap();
        assert_eq!(slug, "fresh00");
    }

    #[tokio::test]
    async fn slug_allocation_accepts_first_free() {
        let svc = service(&[]);
        let slug = svc.allocate_slug(|| "abc123def456".to_string()).await.unwrap();
        assert_eq!(slug, "abc123def456");
    }

    #[tokio::test]
    async fn empty_fields_rejected_before_any_write() {
        let svc = service(&[]);
        // Stub repos panic on write: reaching them would fail the test.
        let err = svc
            .create_consent_request(
                Uuid::new_v4(),
                CreateConsentRequest {
                    content_url: "  ".into(),
                    creator_handle: "@jane".into(),
                    platform: Platform::Instagram,
                    scope: ConsentScope::Organic,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConsentError::Validation(_)));

        let err = svc
            .create_consent_request(
                Uuid::new_v4(),
                CreateConsentRequest {
                    content_url: "https://instagram.com/p/abc".into(),
                    creator_handle: "".into(),
                    platform: Platform::Instagram,
                    scope: ConsentScope::Organic,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConsentError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_token_is_invalid_token() {
        let svc = service(&[]);
        let err = svc
            .resolve_approval("does-not-exist", ResolveAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsentError::InvalidToken));
    }

    #[tokio::test]
    async fn listing_failures_reported_as_read_errors() {
        let svc = ConsentService::new(
            StubRecordRepo {
                taken: HashSet::new(),
            },
            UnavailableEventRepo,
            ConsentConfig::default(),
        );

        let err = svc.record_history(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ConsentError::ReadFailed(_)));

        // Approval-path failures keep the resolution wording.
        let err = svc
            .resolve_approval("some-token", ResolveAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsentError::ResolutionFailed(_)));
    }

    #[test]
    fn action_parsing() {
        assert_eq!("approve".parse::<ResolveAction>().unwrap(), ResolveAction::Approve);
        assert_eq!("decline".parse::<ResolveAction>().unwrap(), ResolveAction::Decline);
        assert!("revoke".parse::<ResolveAction>().is_err());
    }
}
