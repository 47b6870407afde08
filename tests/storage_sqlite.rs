//! SQLite storage integration tests.
//!
//! Run with: cargo test --test storage_sqlite --features sqlite
//!
//! Uses an in-memory database by default, no external dependencies required.

mod storage;

use sqlx::sqlite::SqlitePoolOptions;

use evented_hydrate::storage::SqliteEventStore;

/// Get SQLite connection string (in-memory for tests)
fn sqlite_uri() -> String {
    std::env::var("SQLITE_URI").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

async fn connect_and_init() -> SqliteEventStore {
    // One connection: every in-memory connection is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&sqlite_uri())
        .await
        .expect("Failed to connect to SQLite");

    let store = SqliteEventStore::new(pool);
    store.init().await.expect("Failed to create schema");
    store
}

#[tokio::test]
async fn test_sqlite_local_event_store() {
    println!("=== SQLite LocalEventStore Tests ===");
    println!("Connecting to: {}", sqlite_uri());

    let store = connect_and_init().await;
    run_local_store_tests!(&store);

    println!("=== All SQLite LocalEventStore tests PASSED ===");
}

#[tokio::test]
async fn test_sqlite_init_is_idempotent() {
    let store = connect_and_init().await;
    store.init().await.expect("second init should succeed");
}

#[tokio::test]
async fn test_sqlite_file_store_via_config() {
    use evented_hydrate::config::StorageConfig;
    use evented_hydrate::storage::init_local_store;
    use evented_hydrate::LocalEventStore;

    let dir = tempfile::tempdir().expect("tempdir");
    let config = StorageConfig {
        storage_type: "sqlite".to_string(),
        path: dir
            .path()
            .join("nested")
            .join("events.db")
            .to_string_lossy()
            .into_owned(),
    };

    let store = init_local_store(&config).await.expect("store should open");
    let events = store
        .query_events(&[uuid::Uuid::new_v4()], None)
        .await
        .expect("query should succeed");
    assert!(events.is_empty());
}
