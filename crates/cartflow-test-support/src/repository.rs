//! Stand-in event backings for handler and route tests.

use std::sync::Mutex;

use async_trait::async_trait;
use cartflow_core::error::DomainError;
use cartflow_core::repository::{
    EventRepository, ExpectedVersion, PendingEvent, StoredEvent, sequence_after,
};
use uuid::Uuid;

/// Serves a fixed cart history and captures every append, so tests can
/// assert on the expected version and events a handler wrote. Appends are
/// numbered after the history and never conflict.
#[derive(Debug)]
pub struct RecordingEventRepository {
    history: Vec<StoredEvent>,
    appended: Mutex<Vec<(Uuid, ExpectedVersion, Vec<PendingEvent>)>>,
}

impl RecordingEventRepository {
    /// Every aggregate reads back `history`.
    #[must_use]
    pub fn new(history: Vec<StoredEvent>) -> Self {
        Self {
            history,
            appended: Mutex::new(Vec::new()),
        }
    }

    /// The `(aggregate_id, expected_version, events)` of each append, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(Uuid, ExpectedVersion, Vec<PendingEvent>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.history.clone())
    }

    #[allow(clippy::cast_possible_wrap)]
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: ExpectedVersion,
        events: Vec<PendingEvent>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.clone()));
        Ok(sequence_after(self.history.len() as i64, events))
    }
}

/// Every stream is empty and appends are accepted but discarded; stands in
/// for a cart nobody has touched yet.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: ExpectedVersion,
        events: Vec<PendingEvent>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(sequence_after(0, events))
    }
}

/// A backing whose reads and appends both fail as if the database were
/// unreachable; drives the 500 paths of the API.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
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
