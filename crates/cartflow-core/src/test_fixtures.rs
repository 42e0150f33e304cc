//! In-crate fixtures for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::DomainError;
use crate::event::{DomainEvent, EventKind};
use crate::repository::{
    EventRepository, ExpectedVersion, PendingEvent, StoredEvent, sequence_after,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TestKind {
    Added,
    Removed,
}

impl EventKind for TestKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "test.added",
            Self::Removed => "test.removed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum TestEvent {
    Added(Uuid, u32),
    Removed(Uuid, u32),
}

impl DomainEvent for TestEvent {
    type Kind = TestKind;

    fn aggregate_id(&self) -> Uuid {
        match self {
            Self::Added(id, _) | Self::Removed(id, _) => *id,
        }
    }

    fn kind(&self) -> TestKind {
        match self {
            Self::Added(..) => TestKind::Added,
            Self::Removed(..) => TestKind::Removed,
        }
    }
}

#[derive(Debug)]
struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(crate) fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

#[derive(Debug, Default)]
pub(crate) struct MemoryRepository {
    streams: Mutex<HashMap<Uuid, Vec<StoredEvent>>>,
}

#[async_trait]
impl EventRepository for MemoryRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .streams
            .lock()
            .unwrap()
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: ExpectedVersion,
        events: Vec<PendingEvent>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let mut streams = self.streams.lock().unwrap();
        let stream = streams.entry(aggregate_id).or_default();
        let current = i64::try_from(stream.len()).unwrap();
        expected_version.check(aggregate_id, current)?;
        let stored = sequence_after(current, events);
        stream.extend(stored.iter().cloned());
        Ok(stored)
    }
}

/// A backing that refuses every write.
#[derive(Debug)]
pub(crate) struct RejectingRepository;

#[async_trait]
impl EventRepository for RejectingRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(Vec::new())
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: ExpectedVersion,
        _events: Vec<PendingEvent>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
