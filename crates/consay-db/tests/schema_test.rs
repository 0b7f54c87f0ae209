//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    consay_db::run_migrations(&db).await.unwrap();

    // Verify that key tables exist by querying INFO FOR DB.
    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    assert!(info_str.contains("workspace"), "missing workspace table");
    assert!(
        info_str.contains("consent_record"),
        "missing consent_record table"
    );
    assert!(
        info_str.contains("consent_event"),
        "missing consent_event table"
    );

    // Verify migration was recorded.
    assert!(info_str.contains("_migration"), "missing _migration table");
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    // Run twice — should not fail.
    consay_db::run_migrations(&db).await.unwrap();
    consay_db::run_migrations(&db).await.unwrap();

    // Verify only one migration record exists.
    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn enum_constraints_reject_unknown_values() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    consay_db::run_migrations(&db).await.unwrap();

    // An out-of-alphabet status must be refused at the schema level.
    let result = db
        .query(
            "CREATE consent_event SET \
             record_id = 'r', seq = 1, event_type = 'initial', \
             scope = 'organic', consent_text = 't', status = 'revoked', \
             approval_token = 'tok'",
        )
        .await
        .unwrap()
        .check();
    assert!(result.is_err(), "unknown status value must be rejected");
}
