//! Integration tests for the in-memory storage adapters.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use tidemark_core::error::EventStoreError;
use tidemark_core::event::{Actor, EventContext};
use tidemark_core::store::{DispatchCursorStore, EventStore, StoredEvent};
use tidemark_store::{InMemoryCursorStore, InMemoryEventStore};

/// Helper to build a `StoredEvent` with sensible defaults.
fn make_stored_event(stream_id: &str, sequence_number: i64) -> StoredEvent {
    StoredEvent {
        event_id: Uuid::new_v4(),
        stream_id: stream_id.to_owned(),
        event_type: "test.recorded".to_owned(),
        payload: serde_json::json!({"key": "value"}),
        sequence_number,
        context: EventContext::new(
            Uuid::new_v4(),
            Actor::System("store-tests".to_owned()),
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ),
    }
}

// --- read_stream ---

#[tokio::test]
async fn test_read_stream_returns_empty_vec_for_nonexistent_stream() {
    let store = InMemoryEventStore::new();

    let events = store.read_stream("missing").await.unwrap();

    assert!(events.is_empty());
}

// --- append + read_stream round-trip ---

#[tokio::test]
async fn test_append_and_read_single_event() {
    let store = InMemoryEventStore::new();
    let event = make_stored_event("B1", 1);
    let expected_event_id = event.event_id;

    let version = store.append("B1", 0, &[event]).await.unwrap();
    assert_eq!(version, 1);

    let loaded = store.read_stream("B1").await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].event_id, expected_event_id);
    assert_eq!(loaded[0].stream_id, "B1");
    assert_eq!(loaded[0].sequence_number, 1);
}

#[tokio::test]
async fn test_append_multiple_events_preserves_sequence_order() {
    let store = InMemoryEventStore::new();
    let events = vec![
        make_stored_event("B1", 1),
        make_stored_event("B1", 2),
        make_stored_event("B1", 3),
    ];

    let version = store.append("B1", 0, &events).await.unwrap();
    assert_eq!(version, 3);

    let loaded = store.read_stream("B1").await.unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0].sequence_number, 1);
    assert_eq!(loaded[1].sequence_number, 2);
    assert_eq!(loaded[2].sequence_number, 3);
}

// --- stream isolation ---

#[tokio::test]
async fn test_stream_isolation() {
    let store = InMemoryEventStore::new();

    store
        .append("A", 0, &[make_stored_event("A", 1)])
        .await
        .unwrap();
    store
        .append("B", 0, &[make_stored_event("B", 1)])
        .await
        .unwrap();

    let loaded_a = store.read_stream("A").await.unwrap();
    let loaded_b = store.read_stream("B").await.unwrap();

    assert_eq!(loaded_a.len(), 1);
    assert_eq!(loaded_b.len(), 1);
    assert_eq!(loaded_a[0].stream_id, "A");
    assert_eq!(loaded_b[0].stream_id, "B");
}

// --- concurrency ---

#[tokio::test]
async fn test_stale_expected_version_is_rejected() {
    let store = InMemoryEventStore::new();

    store
        .append("B1", 0, &[make_stored_event("B1", 1)])
        .await
        .unwrap();

    // A second writer that loaded at version 0 loses the race.
    let result = store.append("B1", 0, &[make_stored_event("B1", 1)]).await;

    match result {
        Err(EventStoreError::Conflict {
            stream_id,
            expected,
            actual,
        }) => {
            assert_eq!(stream_id, "B1");
            assert_eq!(expected, 0);
            assert_eq!(actual, 1);
        }
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_conflicting_append_leaves_stream_untouched() {
    let store = InMemoryEventStore::new();
    store
        .append("B1", 0, &[make_stored_event("B1", 1)])
        .await
        .unwrap();

    let result = store
        .append(
            "B1",
            0,
            &[make_stored_event("B1", 1), make_stored_event("B1", 2)],
        )
        .await;
    assert!(result.is_err());

    // Nothing from the losing batch leaked into either log.
    assert_eq!(store.read_stream("B1").await.unwrap().len(), 1);
    assert_eq!(store.read_after(0, 100).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sequential_appends_with_correct_expected_version() {
    let store = InMemoryEventStore::new();

    store
        .append(
            "B1",
            0,
            &[make_stored_event("B1", 1), make_stored_event("B1", 2)],
        )
        .await
        .unwrap();
    let version = store
        .append(
            "B1",
            2,
            &[make_stored_event("B1", 3), make_stored_event("B1", 4)],
        )
        .await
        .unwrap();
    assert_eq!(version, 4);

    let loaded = store.read_stream("B1").await.unwrap();
    assert_eq!(loaded.len(), 4);
    for (i, event) in loaded.iter().enumerate() {
        assert_eq!(event.sequence_number, i64::try_from(i + 1).unwrap());
    }
}

#[tokio::test]
async fn test_concurrent_writers_to_different_streams_both_succeed() {
    let store = Arc::new(InMemoryEventStore::new());

    let store_a = Arc::clone(&store);
    let store_b = Arc::clone(&store);
    let writer_a =
        tokio::spawn(async move { store_a.append("A", 0, &[make_stored_event("A", 1)]).await });
    let writer_b =
        tokio::spawn(async move { store_b.append("B", 0, &[make_stored_event("B", 1)]).await });

    writer_a.await.unwrap().unwrap();
    writer_b.await.unwrap().unwrap();

    assert_eq!(store.read_stream("A").await.unwrap().len(), 1);
    assert_eq!(store.read_stream("B").await.unwrap().len(), 1);
}

// --- edge cases ---

#[tokio::test]
async fn test_append_empty_events_is_noop() {
    let store = InMemoryEventStore::new();

    let version = store.append("B1", 0, &[]).await.unwrap();
    assert_eq!(version, 0);

    assert!(store.read_stream("B1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_append_rejects_out_of_sequence_batch() {
    let store = InMemoryEventStore::new();

    let result = store.append("B1", 0, &[make_stored_event("B1", 5)]).await;

    assert!(matches!(result, Err(EventStoreError::Storage(_))));
}

// --- global append order ---

#[tokio::test]
async fn test_read_after_returns_events_across_streams_in_append_order() {
    let store = InMemoryEventStore::new();

    store
        .append("A", 0, &[make_stored_event("A", 1)])
        .await
        .unwrap();
    store
        .append("B", 0, &[make_stored_event("B", 1)])
        .await
        .unwrap();
    store
        .append("A", 1, &[make_stored_event("A", 2)])
        .await
        .unwrap();

    let tail = store.read_after(0, 100).await.unwrap();

    let order: Vec<(u64, String)> = tail
        .iter()
        .map(|s| (s.position, s.event.stream_id.clone()))
        .collect();
    assert_eq!(
        order,
        vec![
            (1, "A".to_owned()),
            (2, "B".to_owned()),
            (3, "A".to_owned())
        ]
    );
}

#[tokio::test]
async fn test_read_after_skips_past_the_cursor_and_honors_limit() {
    let store = InMemoryEventStore::new();
    store
        .append(
            "A",
            0,
            &[
                make_stored_event("A", 1),
                make_stored_event("A", 2),
                make_stored_event("A", 3),
            ],
        )
        .await
        .unwrap();

    let tail = store.read_after(1, 1).await.unwrap();

    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].position, 2);
}

// --- dispatch cursors ---

#[tokio::test]
async fn test_cursor_load_is_none_before_first_save() {
    let cursors = InMemoryCursorStore::new();

    assert_eq!(cursors.load("dispatcher").await.unwrap(), None);
}

#[tokio::test]
async fn test_cursor_round_trip_and_monotonic_advance() {
    let cursors = InMemoryCursorStore::new();

    cursors.save("dispatcher", 3).await.unwrap();
    assert_eq!(cursors.load("dispatcher").await.unwrap(), Some(3));

    // A stale save never regresses the cursor.
    cursors.save("dispatcher", 2).await.unwrap();
    assert_eq!(cursors.load("dispatcher").await.unwrap(), Some(3));

    cursors.save("dispatcher", 7).await.unwrap();
    assert_eq!(cursors.load("dispatcher").await.unwrap(), Some(7));
}

#[tokio::test]
async fn test_cursors_are_isolated_per_consumer_group() {
    let cursors = InMemoryCursorStore::new();

    cursors.save("group-a", 5).await.unwrap();

    assert_eq!(cursors.load("group-a").await.unwrap(), Some(5));
    assert_eq!(cursors.load("group-b").await.unwrap(), None);
}
