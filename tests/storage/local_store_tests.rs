//! LocalEventStore interface tests.
//!
//! These tests verify the contract of the LocalEventStore trait.
//! Each storage implementation should run these tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use evented_hydrate::{Event, LocalEventStore};

use super::SeedStore;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Create a test event `offset_ms` after the base time.
pub fn make_event(aggregate: Uuid, offset_ms: i64, command: &str) -> Event {
    Event::new(
        aggregate,
        base_time() + Duration::milliseconds(offset_ms),
        command,
        json!({ "command": command, "offset": offset_ms }),
    )
}

// =============================================================================
// LocalEventStore::query_events tests
// =============================================================================

pub async fn test_query_single_aggregate<S: SeedStore>(store: &S) {
    let root = Uuid::new_v4();
    store
        .seed(vec![make_event(root, 0, "Created"), make_event(root, 10, "Updated")])
        .await;

    let events = store
        .query_events(&[root], None)
        .await
        .expect("query should succeed");
    assert_eq!(events.len(), 2, "should have 2 events");
}

pub async fn test_query_returns_only_requested<S: SeedStore>(store: &S) {
    let wanted = Uuid::new_v4();
    let other = Uuid::new_v4();
    store
        .seed(vec![make_event(wanted, 0, "Created"), make_event(other, 5, "Created")])
        .await;

    let events = store
        .query_events(&[wanted], None)
        .await
        .expect("query should succeed");
    assert_eq!(events.len(), 1);
    assert!(events.iter().all(|e| e.aggregate_root_id == wanted));
}

pub async fn test_query_multiple_aggregates<S: SeedStore>(store: &S) {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    store
        .seed(vec![
            make_event(a, 0, "Created"),
            make_event(b, 1, "Created"),
            make_event(a, 2, "Updated"),
        ])
        .await;

    let events = store
        .query_events(&[a, b], None)
        .await
        .expect("query should succeed");
    assert_eq!(events.len(), 3, "one query should cover every id");
}

pub async fn test_query_unknown_aggregate<S: SeedStore>(store: &S) {
    let events = store
        .query_events(&[Uuid::new_v4()], None)
        .await
        .expect("query should succeed");
    assert!(events.is_empty(), "unknown aggregate should have no events");
}

pub async fn test_query_empty_ids<S: SeedStore>(store: &S) {
    let events = store
        .query_events(&[], None)
        .await
        .expect("query should succeed");
    assert!(events.is_empty());
}

pub async fn test_query_orders_by_timestamp<S: SeedStore>(store: &S) {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    // Inserted out of order on purpose.
    store
        .seed(vec![
            make_event(a, 300, "Third"),
            make_event(b, 100, "First"),
            make_event(a, 200, "Second"),
        ])
        .await;

    let events = store
        .query_events(&[a, b], None)
        .await
        .expect("query should succeed");
    let commands: Vec<_> = events.iter().map(|e| e.command_name.as_str()).collect();
    assert_eq!(commands, vec!["First", "Second", "Third"]);
}

pub async fn test_query_point_in_time_is_inclusive<S: SeedStore>(store: &S) {
    let root = Uuid::new_v4();
    store
        .seed(vec![
            make_event(root, 0, "Created"),
            make_event(root, 500, "AtCutoff"),
            make_event(root, 501, "AfterCutoff"),
        ])
        .await;

    let cutoff = base_time() + Duration::milliseconds(500);
    let events = store
        .query_events(&[root], Some(cutoff))
        .await
        .expect("query should succeed");
    let commands: Vec<_> = events.iter().map(|e| e.command_name.as_str()).collect();
    assert_eq!(commands, vec!["Created", "AtCutoff"]);
}

pub async fn test_query_point_in_time_before_everything<S: SeedStore>(store: &S) {
    let root = Uuid::new_v4();
    store.seed(vec![make_event(root, 100, "Created")]).await;

    let events = store
        .query_events(&[root], Some(base_time()))
        .await
        .expect("query should succeed");
    assert!(events.is_empty());
}

pub async fn test_query_preserves_event_data<S: SeedStore>(store: &S) {
    let root = Uuid::new_v4();
    let original = Event::new(
        root,
        base_time() + Duration::microseconds(1_234_567),
        "PriceChanged",
        json!({ "price": { "amount": 1999, "currency": "EUR" }, "tags": ["sale"] }),
    );
    store.seed(vec![original.clone()]).await;

    let events = store
        .query_events(&[root], None)
        .await
        .expect("query should succeed");
    assert_eq!(events, vec![original]);
}

/// Run all LocalEventStore tests against a store implementation.
#[macro_export]
macro_rules! run_local_store_tests {
    ($store:expr) => {
        use $crate::storage::local_store_tests::*;

        test_query_single_aggregate($store).await;
        println!("  test_query_single_aggregate: PASSED");

        test_query_returns_only_requested($store).await;
        println!("  test_query_returns_only_requested: PASSED");

        test_query_multiple_aggregates($store).await;
        println!("  test_query_multiple_aggregates: PASSED");

        test_query_unknown_aggregate($store).await;
        println!("  test_query_unknown_aggregate: PASSED");

        test_query_empty_ids($store).await;
        println!("  test_query_empty_ids: PASSED");

        test_query_orders_by_timestamp($store).await;
        println!("  test_query_orders_by_timestamp: PASSED");

        test_query_point_in_time_is_inclusive($store).await;
        println!("  test_query_point_in_time_is_inclusive: PASSED");

        test_query_point_in_time_before_everything($store).await;
        println!("  test_query_point_in_time_before_everything: PASSED");

        test_query_preserves_event_data($store).await;
        println!("  test_query_preserves_event_data: PASSED");
    };
}
