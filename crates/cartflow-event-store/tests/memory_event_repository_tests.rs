//! Integration tests for `InMemoryEventRepository`.

use std::sync::Arc;

use cartflow_core::error::DomainError;
use cartflow_core::repository::{EventRepository, ExpectedVersion, PendingEvent};
use cartflow_event_store::memory::InMemoryEventRepository;
use chrono::Utc;
use uuid::Uuid;

fn make_pending_event(aggregate_id: Uuid) -> PendingEvent {
    PendingEvent {
        event_id: Uuid::new_v4(),
        aggregate_id,
        event_type: "cart.item_added".to_string(),
        payload: serde_json::json!({"cart_id": aggregate_id, "item": "sku-1"}),
        occurred_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_append_then_load_preserves_order_and_numbering() {
    let repo = InMemoryEventRepository::new();
    let aggregate_id = Uuid::new_v4();
    let first = make_pending_event(aggregate_id);
    let second = make_pending_event(aggregate_id);
    let ids = vec![first.event_id, second.event_id];

    repo.append_events(aggregate_id, ExpectedVersion::Exact(0), vec![first, second])
        .await
        .unwrap();
    repo.append_events(aggregate_id, ExpectedVersion::Any, vec![make_pending_event(aggregate_id)])
        .await
        .unwrap();

    let loaded = repo.load_events(aggregate_id).await.unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0].event_id, ids[0]);
    assert_eq!(loaded[1].event_id, ids[1]);
    let sequence: Vec<i64> = loaded.iter().map(|e| e.sequence_number).collect();
    assert_eq!(sequence, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_streams_are_isolated() {
    let repo = InMemoryEventRepository::new();
    let agg_a = Uuid::new_v4();
    let agg_b = Uuid::new_v4();

    repo.append_events(agg_a, ExpectedVersion::Exact(0), vec![make_pending_event(agg_a)])
        .await
        .unwrap();

    assert_eq!(repo.load_events(agg_a).await.unwrap().len(), 1);
    assert!(repo.load_events(agg_b).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stale_expected_version_is_rejected() {
    let repo = InMemoryEventRepository::new();
    let aggregate_id = Uuid::new_v4();
    repo.append_events(aggregate_id, ExpectedVersion::Exact(0), vec![make_pending_event(aggregate_id)])
        .await
        .unwrap();

    let result = repo
        .append_events(aggregate_id, ExpectedVersion::Exact(0), vec![make_pending_event(aggregate_id)])
        .await;

    match result {
        Err(DomainError::VersionConflict { expected, actual, .. }) => {
            assert_eq!(expected, 0);
            assert_eq!(actual, 1);
        }
        other => panic!("expected VersionConflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_appends_at_same_version_admit_exactly_one() {
    let repo = Arc::new(InMemoryEventRepository::new());
    let aggregate_id = Uuid::new_v4();

    let attempts: Vec<_> = (0..16)
        .map(|_| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                repo.append_events(
                    aggregate_id,
                    ExpectedVersion::Exact(0),
                    vec![make_pending_event(aggregate_id)],
                )
                .await
            })
        })
        .collect();

    let mut succeeded = 0;
    for attempt in attempts {
        if attempt.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(repo.load_events(aggregate_id).await.unwrap().len(), 1);
}
