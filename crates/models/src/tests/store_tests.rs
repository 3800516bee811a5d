use anyhow::Result;
use configs::DatabaseConfig;
use sea_orm::DatabaseConnection;

use crate::{db, state_record};

async fn memory_db() -> Result<DatabaseConnection> {
    Ok(db::init(&DatabaseConfig::in_memory()).await?)
}

#[tokio::test]
async fn get_missing_returns_none() -> Result<()> {
    let db = memory_db().await?;
    assert_eq!(state_record::get(&db, "nobody").await?, None);
    assert_eq!(state_record::count(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn put_then_get_returns_stored_text() -> Result<()> {
    let db = memory_db().await?;
    state_record::put(&db, "alice", r#"{"weight":100}"#, "2026-01-01T00:00:00.000Z").await?;

    let raw = state_record::get(&db, "alice").await?.expect("row exists");
    assert_eq!(raw, r#"{"weight":100}"#);

    let rec = state_record::find(&db, "alice").await?.expect("row exists");
    assert_eq!(rec.updated_at, "2026-01-01T00:00:00.000Z");
    Ok(())
}

#[tokio::test]
async fn put_replaces_existing_row() -> Result<()> {
    let db = memory_db().await?;
    state_record::put(&db, "alice", r#"{"a":1}"#, "2026-01-01T00:00:00.000Z").await?;
    state_record::put(&db, "alice", r#"{"b":2}"#, "2026-01-01T00:00:01.000Z").await?;

    assert_eq!(state_record::count(&db).await?, 1);
    let rec = state_record::find(&db, "alice").await?.expect("row exists");
    assert_eq!(rec.state_json, r#"{"b":2}"#);
    assert_eq!(rec.updated_at, "2026-01-01T00:00:01.000Z");
    Ok(())
}

#[tokio::test]
async fn keys_are_independent() -> Result<()> {
    let db = memory_db().await?;
    state_record::put(&db, "alice", r#"{"who":"alice"}"#, "2026-01-01T00:00:00.000Z").await?;
    state_record::put(&db, "bob", r#"{"who":"bob"}"#, "2026-01-01T00:00:00.000Z").await?;

    assert_eq!(state_record::count(&db).await?, 2);
    let alice: serde_json::Value = serde_json::from_str(&state_record::get(&db, "alice").await?.unwrap_or_default())?;
    assert_eq!(alice["who"], "alice");
    Ok(())
}

#[tokio::test]
async fn migrations_are_idempotent() -> Result<()> {
    let db = memory_db().await?;
    state_record::put(&db, "alice", "{}", "2026-01-01T00:00:00.000Z").await?;
    db::migrate(&db).await?;
    assert_eq!(state_record::count(&db).await?, 1);
    db::close(db).await?;
    Ok(())
}
