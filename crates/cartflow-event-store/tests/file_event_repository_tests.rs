//! Integration tests for `FileEventRepository`.

use std::sync::Arc;

use cartflow_core::error::DomainError;
use cartflow_core::repository::{EventRepository, ExpectedVersion, PendingEvent};
use cartflow_event_store::file_event_repository::FileEventRepository;
use chrono::Utc;
use uuid::Uuid;

fn make_pending_event(aggregate_id: Uuid, item: &str) -> PendingEvent {
    PendingEvent {
        event_id: Uuid::new_v4(),
        aggregate_id,
        event_type: "cart.item_added".to_string(),
        payload: serde_json::json!({"cart_id": aggregate_id, "item": item}),
        occurred_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_load_events_returns_empty_vec_for_nonexistent_aggregate() {
    let dir = tempfile::tempdir().expect("failed to create tmpdir");
    let repo = FileEventRepository::open(dir.path()).await.unwrap();

    let events = repo.load_events(Uuid::new_v4()).await.unwrap();

    assert!(events.is_empty());
}

#[tokio::test]
async fn test_events_survive_reopening_the_repository() {
    let dir = tempfile::tempdir().expect("failed to create tmpdir");
    let aggregate_id = Uuid::new_v4();
    let stored = {
        let repo = FileEventRepository::open(dir.path()).await.unwrap();
        repo.append_events(
            aggregate_id,
            ExpectedVersion::Exact(0),
            vec![
                make_pending_event(aggregate_id, "a"),
                make_pending_event(aggregate_id, "b"),
            ],
        )
        .await
        .unwrap()
    };

    let reopened = FileEventRepository::open(dir.path()).await.unwrap();
    let loaded = reopened.load_events(aggregate_id).await.unwrap();

    assert_eq!(loaded, stored);
    assert_eq!(loaded[0].sequence_number, 1);
    assert_eq!(loaded[1].sequence_number, 2);
    assert_eq!(loaded[1].payload["item"], "b");
}

#[tokio::test]
async fn test_stale_expected_version_is_rejected() {
    let dir = tempfile::tempdir().expect("failed to create tmpdir");
    let repo = FileEventRepository::open(dir.path()).await.unwrap();
    let aggregate_id = Uuid::new_v4();
    repo.append_events(
        aggregate_id,
        ExpectedVersion::Exact(0),
        vec![make_pending_event(aggregate_id, "a")],
    )
    .await
    .unwrap();

    let result = repo
        .append_events(
            aggregate_id,
            ExpectedVersion::Exact(0),
            vec![make_pending_event(aggregate_id, "b")],
        )
        .await;

    assert!(matches!(
        result,
        Err(DomainError::VersionConflict { expected: 0, actual: 1, .. })
    ));
    assert_eq!(repo.load_events(aggregate_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_torn_tail_is_ignored_and_overwritten() {
    let dir = tempfile::tempdir().expect("failed to create tmpdir");
    let repo = FileEventRepository::open(dir.path()).await.unwrap();
    let aggregate_id = Uuid::new_v4();
    repo.append_events(
        aggregate_id,
        ExpectedVersion::Exact(0),
        vec![make_pending_event(aggregate_id, "a")],
    )
    .await
    .unwrap();

    // Simulate a crash halfway through writing a second line.
    let path = repo.stream_path(aggregate_id);
    let mut contents = std::fs::read_to_string(&path).unwrap();
    contents.push_str("{\"event_id\":\"");
    std::fs::write(&path, contents).unwrap();

    assert_eq!(repo.load_events(aggregate_id).await.unwrap().len(), 1);

    repo.append_events(
        aggregate_id,
        ExpectedVersion::Exact(1),
        vec![make_pending_event(aggregate_id, "b")],
    )
    .await
    .unwrap();

    let loaded = repo.load_events(aggregate_id).await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[1].sequence_number, 2);
    assert!(std::fs::read_to_string(&path).unwrap().ends_with('\n'));
}

#[tokio::test]
async fn test_corrupt_complete_line_is_an_infrastructure_error() {
    let dir = tempfile::tempdir().expect("failed to create tmpdir");
    let repo = FileEventRepository::open(dir.path()).await.unwrap();
    let aggregate_id = Uuid::new_v4();
    std::fs::write(repo.stream_path(aggregate_id), "not json\n").unwrap();

    let result = repo.load_events(aggregate_id).await;

    assert!(matches!(result, Err(DomainError::Infrastructure(_))));
}

#[tokio::test]
async fn test_concurrent_appends_at_same_version_admit_exactly_one() {
    let dir = tempfile::tempdir().expect("failed to create tmpdir");
    let repo = Arc::new(FileEventRepository::open(dir.path()).await.unwrap());
    let aggregate_id = Uuid::new_v4();

    let attempts: Vec<_> = (0..8)
        .map(|i| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                repo.append_events(
                    aggregate_id,
                    ExpectedVersion::Exact(0),
                    vec![make_pending_event(aggregate_id, &format!("item-{i}"))],
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

#[tokio::test]
async fn test_batch_cut_short_by_a_crash_is_dropped_whole() {
    // Arrange
    let dir = tempfile::tempdir().expect("failed to create tmpdir");
    let repo = FileEventRepository::open(dir.path()).await.unwrap();
    let aggregate_id = Uuid::new_v4();
    repo.append_events(
        aggregate_id,
        ExpectedVersion::Exact(0),
        vec![make_pending_event(aggregate_id, "a")],
    )
    .await
    .unwrap();
    repo.append_events(
        aggregate_id,
        ExpectedVersion::Exact(1),
        vec![
            make_pending_event(aggregate_id, "b"),
            make_pending_event(aggregate_id, "c"),
        ],
    )
    .await
    .unwrap();

    // Cut the file partway into the second event of the second batch.
    let path = repo.stream_path(aggregate_id);
    let contents = std::fs::read_to_string(&path).unwrap();
    let second_batch = contents.find('\n').unwrap() + 1;
    let second_event = second_batch + contents[second_batch..].find("},{").unwrap() + 2;
    std::fs::write(&path, &contents[..second_event + 20]).unwrap();

    // Act
    let loaded = repo.load_events(aggregate_id).await.unwrap();

    // Assert
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].payload["item"], "a");

    let stored = repo
        .append_events(
            aggregate_id,
            ExpectedVersion::Exact(1),
            vec![make_pending_event(aggregate_id, "d")],
        )
        .await
        .unwrap();
    assert_eq!(stored[0].sequence_number, 2);
    let reloaded = repo.load_events(aggregate_id).await.unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded[1].payload["item"], "d");
}

#[tokio::test]
async fn test_stream_locks_are_released_after_use() {
    let dir = tempfile::tempdir().expect("failed to create tmpdir");
    let repo = FileEventRepository::open(dir.path()).await.unwrap();

    for _ in 0..3 {
        let aggregate_id = Uuid::new_v4();
        repo.append_events(
            aggregate_id,
            ExpectedVersion::Any,
            vec![make_pending_event(aggregate_id, "a")],
        )
        .await
        .unwrap();
        repo.load_events(aggregate_id).await.unwrap();
    }

    assert_eq!(repo.streams_in_use(), 0);
}
