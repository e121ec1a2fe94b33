//! Postgres credential store tests
//!
//! Require a running database reachable through `configuration` /
//! `APP_DATABASE__*` variables. Run with `cargo test -- --ignored`.

use std::sync::Arc;

use device_tokens::auth::{Rotation, RotationEngine};
use device_tokens::configuration::{get_configuration, TokenSettings};
use device_tokens::store::{CredentialStore, PgCredentialStore};
use sqlx::{Connection, Executor, PgConnection, PgPool};

async fn spawn_store() -> PgCredentialStore {
    let configuration = get_configuration().expect("Failed to read configuration.");
    let mut database = configuration.database.clone();
    database.database_name = uuid::Uuid::new_v4().to_string();

    let mut connection = PgConnection::connect(&database.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, database.database_name))
        .await
        .expect("Failed to create database.");

    let pool = PgPool::connect(&database.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    let store = PgCredentialStore::new(pool);
    store.migrate().await.expect("Failed to migrate the database.");
    store
}

#[tokio::test]
#[ignore = "requires postgres"]
async fn compare_and_swap_is_scoped_per_device() {
    let store = spawn_store().await;
    store.insert_hash("u1", "d1", "h1").await.unwrap();
    store.insert_hash("u1", "d2", "h1").await.unwrap();

    assert!(!store.update_hash("u1", "d1", "stale", "h2").await.unwrap());
    assert!(store.update_hash("u1", "d1", "h1", "h2").await.unwrap());

    assert_eq!(store.lookup_hash("u1", "d1").await.unwrap().as_deref(), Some("h2"));
    assert_eq!(store.lookup_hash("u1", "d2").await.unwrap().as_deref(), Some("h1"));
    assert_eq!(store.remove_all("u1").await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires postgres"]
async fn rotation_round_trip_against_postgres() {
    let store = Arc::new(spawn_store().await);
    let mut settings = TokenSettings::with_secret("S");
    settings.hash_cost = 4;
    let engine = RotationEngine::new(&settings, store.clone()).expect("Failed to build engine");

    let pair = engine.issue("u1", "d1").await.expect("Failed to issue");
    let outcome = engine
        .rotate("garbage", &pair.refresh_token, "d1")
        .await
        .expect("Rotation failed");

    assert_eq!(outcome.rotation, Rotation::Rotated);
    assert_eq!(outcome.tokens.refresh_token, pair.refresh_token);
}
