//! Integration tests for the consent service against in-memory
//! SurrealDB: the full create/approve/decline lifecycle, the expiry
//! and replay guards, and the scope-expansion follow-up flow.

use chrono::{Duration, Utc};
use consay_consent::config::ConsentConfig;
use consay_consent::error::ConsentError;
use consay_consent::service::{
    ConsentService, CreateConsentRequest, ResolveAction,
};
use consay_core::models::event::{ConsentScope, ConsentStatus, EventType, NewEvent};
use consay_core::models::record::{CreateRecord, Platform};
use consay_core::repository::ConsentRecordRepository;
use consay_db::repository::{SurrealConsentEventRepository, SurrealConsentRecordRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;
type Service = ConsentService<SurrealConsentRecordRepository<Db>, SurrealConsentEventRepository<Db>>;

fn test_config() -> ConsentConfig {
    ConsentConfig {
        base_url: "https://consay.test".into(),
        slug_length: 12,
        token_ttl_days: 30,
    }
}

/// Spin up in-memory DB, run migrations, build the service.
async fn setup() -> (Service, Surreal<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    consay_db::run_migrations(&db).await.unwrap();

    let svc = ConsentService::new(
        SurrealConsentRecordRepository::new(db.clone()),
        SurrealConsentEventRepository::new(db.clone()),
        test_config(),
    );
    (svc, db)
}

fn request_input() -> CreateConsentRequest {
    CreateConsentRequest {
        content_url: "https://instagram.com/p/abc".into(),
        creator_handle: "@jane".into(),
        platform: Platform::Instagram,
        scope: ConsentScope::Organic,
    }
}

#[tokio::test]
async fn create_consent_request_happy_path() {
    let (svc, _db) = setup().await;

    let created = svc
        .create_consent_request(Uuid::new_v4(), request_input())
        .await
        .unwrap();

    // 12-char lowercase alphanumeric slug.
    assert_eq!(created.record.slug.len(), 12);
    assert!(
        created
            .record
            .slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    );

    // 32 bytes of entropy, base64url-encoded.
    assert_eq!(created.event.approval_token.len(), 43);
    assert_eq!(created.event.status, ConsentStatus::Pending);
    assert_eq!(created.event.seq, 1);
    assert!(created.event.approval_token_expiry.is_some());

    assert!(created.consent_text.contains("@jane"));
    assert!(created.consent_text.contains("organic social media posts"));
    assert_eq!(created.event.consent_text, created.consent_text);

    assert_eq!(
        created.approval_url,
        format!("https://consay.test/approve/{}", created.event.approval_token)
    );
}

#[tokio::test]
async fn approval_is_idempotent_from_the_creator_side() {
    let (svc, _db) = setup().await;
    let created = svc
        .create_consent_request(Uuid::new_v4(), request_input())
        .await
        .unwrap();
    let token = created.event.approval_token.clone();

    let resolution = svc
        .resolve_approval(&token, ResolveAction::Approve)
        .await
        .unwrap();
    assert_eq!(resolution.status, ConsentStatus::Approved);
    assert_eq!(resolution.record.id, created.record.id);

    // Second click reports history instead of re-triggering.
    let err = svc
        .resolve_approval(&token, ResolveAction::Approve)
        .await
        .unwrap_err();
    match err {
        ConsentError::AlreadyResolved {
            status,
            approved_at,
        } => {
            assert_eq!(status, ConsentStatus::Approved);
            assert!(approved_at.is_some());
        }
        other => panic!("expected AlreadyResolved, got {other:?}"),
    }
}

#[tokio::test]
async fn decline_records_no_approval_timestamp() {
    let (svc, _db) = setup().await;
    let created = svc
        .create_consent_request(Uuid::new_v4(), request_input())
        .await
        .unwrap();
    let token = created.event.approval_token.clone();

    let resolution = svc
        .resolve_approval(&token, ResolveAction::Decline)
        .await
        .unwrap();
    assert_eq!(resolution.status, ConsentStatus::Declined);

    let details = svc.get_approval_details(&token).await.unwrap();
    assert_eq!(details.event.status, ConsentStatus::Declined);
    assert!(details.event.approved_at.is_none());
}

#[tokio::test]
async fn unknown_token_resolves_to_invalid_token_without_mutation() {
    let (svc, _db) = setup().await;
    let created = svc
        .create_consent_request(Uuid::new_v4(), request_input())
        .await
        .unwrap();

    let err = svc
        .resolve_approval("does-not-exist", ResolveAction::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsentError::InvalidToken));

    // The existing event is untouched.
    let details = svc
        .get_approval_details(&created.event.approval_token)
        .await
        .unwrap();
    assert_eq!(details.event.status, ConsentStatus::Pending);
}

#[tokio::test]
async fn expired_pending_token_refused_but_still_readable() {
    let (svc, db) = setup().await;

    // Seed an event whose token lapsed yesterday.
    let record_repo = SurrealConsentRecordRepository::new(db);
    record_repo
        .create_with_initial_event(
            CreateRecord {
                slug: "expired00000".into(),
                content_url: "https://instagram.com/p/old".into(),
                creator_handle: "@jane".into(),
                platform: Platform::Instagram,
                workspace_id: Uuid::new_v4(),
            },
            NewEvent {
                event_type: EventType::Initial,
                scope: ConsentScope::Organic,
                consent_text: "Hi @jane!".into(),
                approval_token: "expired-token".into(),
                approval_token_expiry: Some(Utc::now() - Duration::days(1)),
            },
        )
        .await
        .unwrap();

    let err = svc
        .resolve_approval("expired-token", ResolveAction::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsentError::TokenExpired));

    // The read path surfaces expiry as data, not as an error, and the
    // event stays pending in storage.
    let details = svc.get_approval_details("expired-token").await.unwrap();
    assert_eq!(details.event.status, ConsentStatus::Pending);
    assert!(details.event.approval_token_expiry.unwrap() < Utc::now());
}

#[tokio::test]
async fn concurrent_resolutions_allow_exactly_one_winner() {
    let (svc, _db) = setup().await;
    let created = svc
        .create_consent_request(Uuid::new_v4(), request_input())
        .await
        .unwrap();
    let token = created.event.approval_token.clone();

    let (approve, decline) = tokio::join!(
        svc.resolve_approval(&token, ResolveAction::Approve),
        svc.resolve_approval(&token, ResolveAction::Decline),
    );

    let winners = [approve.is_ok(), decline.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(winners, 1, "exactly one resolution may succeed");

    // The stored status matches whichever call won.
    let details = svc.get_approval_details(&token).await.unwrap();
    match (approve, decline) {
        (Ok(r), Err(ConsentError::AlreadyResolved { .. })) => {
            assert_eq!(details.event.status, r.status);
        }
        (Err(ConsentError::AlreadyResolved { .. }), Ok(r)) => {
            assert_eq!(details.event.status, r.status);
        }
        other => panic!("unexpected outcome pair: {other:?}"),
    }
}

#[tokio::test]
async fn follow_up_appends_scope_expansion_and_drives_summary() {
    let (svc, _db) = setup().await;
    let workspace_id = Uuid::new_v4();
    let created = svc
        .create_consent_request(workspace_id, request_input())
        .await
        .unwrap();

    svc.resolve_approval(&created.event.approval_token, ResolveAction::Approve)
        .await
        .unwrap();

    let follow_up = svc
        .create_follow_up(created.record.id, ConsentScope::OrganicAndAds)
        .await
        .unwrap();
    assert_eq!(follow_up.event.event_type, EventType::ScopeExpansion);
    assert_eq!(follow_up.event.seq, 2);
    assert_eq!(follow_up.event.status, ConsentStatus::Pending);
    assert_ne!(follow_up.event.approval_token, created.event.approval_token);
    assert!(follow_up.consent_text.contains("previously approved"));

    // The listing summary reports the newer pending ask, not the
    // older approved one.
    let summaries = svc.list_records(workspace_id).await.unwrap();
    assert_eq!(summaries.len(), 1);
    let latest = summaries[0].latest_event.as_ref().unwrap();
    assert_eq!(latest.seq, 2);
    assert_eq!(latest.status, ConsentStatus::Pending);
    assert_eq!(latest.scope, ConsentScope::OrganicAndAds);

    // History stays complete and oldest-first.
    let history = svc.record_history(created.record.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].seq, 1);
    assert_eq!(history[0].status, ConsentStatus::Approved);
    assert_eq!(history[1].seq, 2);
}

#[tokio::test]
async fn follow_up_requires_an_approved_latest_event() {
    let (svc, _db) = setup().await;
    let created = svc
        .create_consent_request(Uuid::new_v4(), request_input())
        .await
        .unwrap();

    // Still pending: no follow-up yet.
    let err = svc
        .create_follow_up(created.record.id, ConsentScope::OrganicAndAds)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsentError::Validation(_)));

    svc.resolve_approval(&created.event.approval_token, ResolveAction::Approve)
        .await
        .unwrap();

    // Same scope as already granted: nothing to expand.
    let err = svc
        .create_follow_up(created.record.id, ConsentScope::Organic)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsentError::Validation(_)));
}

#[tokio::test]
async fn listing_orders_records_newest_first() {
    let (svc, _db) = setup().await;
    let workspace_id = Uuid::new_v4();

    let first = svc
        .create_consent_request(workspace_id, request_input())
        .await
        .unwrap();
    let second = svc
        .create_consent_request(
            workspace_id,
            CreateConsentRequest {
                content_url: "https://tiktok.com/@jane/video/1".into(),
                creator_handle: "@jane".into(),
                platform: Platform::Tiktok,
                scope: ConsentScope::PaidAds,
            },
        )
        .await
        .unwrap();

    let summaries = svc.list_records(workspace_id).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].record.id, second.record.id);
    assert_eq!(summaries[1].record.id, first.record.id);
}
