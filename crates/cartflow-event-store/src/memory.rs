//! In-memory event and read-model repositories.
//!
//! Used for tests, local development and the default API configuration.
//! Nothing survives a restart.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use cartflow_core::error::DomainError;
use cartflow_core::read_model::ReadModelRepository;
use cartflow_core::repository::{
    EventRepository, ExpectedVersion, PendingEvent, StoredEvent, sequence_after,
};
use tracing::debug;
use uuid::Uuid;

type Stream = Arc<RwLock<Vec<StoredEvent>>>;

fn poisoned<T>(_: PoisonError<T>) -> DomainError {
    DomainError::Infrastructure("in-memory store lock poisoned".into())
}

/// Event repository keeping one locked vector per aggregate.
///
/// The outer map lock is only held to look up or create a stream, so appends
/// to different aggregates do not contend, and the version check plus write
/// run under the stream's own write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventRepository {
    streams: Arc<RwLock<HashMap<Uuid, Stream>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn stream(&self, aggregate_id: Uuid) -> Result<Option<Stream>, DomainError> {
        let streams = self.streams.read().map_err(poisoned)?;
        Ok(streams.get(&aggregate_id).cloned())
    }

    fn stream_or_insert(&self, aggregate_id: Uuid) -> Result<Stream, DomainError> {
        if let Some(stream) = self.stream(aggregate_id)? {
            return Ok(stream);
        }
        let mut streams = self.streams.write().map_err(poisoned)?;
        Ok(Arc::clone(streams.entry(aggregate_id).or_default()))
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let Some(stream) = self.stream(aggregate_id)? else {
            return Ok(Vec::new());
        };
        let events = stream.read().map_err(poisoned)?;
        Ok(events.clone())
    }

    #[allow(clippy::cast_possible_wrap)]
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: ExpectedVersion,
        events: Vec<PendingEvent>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }
        let stream = self.stream_or_insert(aggregate_id)?;
        let mut existing = stream.write().map_err(poisoned)?;
        let current = existing.len() as i64;
        expected_version.check(aggregate_id, current)?;

        let stored = sequence_after(current, events);
        existing.extend(stored.iter().cloned());
        debug!(%aggregate_id, version = existing.len(), "appended to in-memory stream");
        Ok(stored)
    }
}

/// Read-model repository backed by a map; absent keys read as `V::default()`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReadModelRepository<V> {
    values: Arc<RwLock<HashMap<Uuid, V>>>,
}

impl<V> InMemoryReadModelRepository<V> {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl<V> ReadModelRepository<V> for InMemoryReadModelRepository<V>
where
    V: Clone + Default + Send + Sync + 'static,
{
    async fn get(&self, aggregate_id: Uuid) -> Result<V, DomainError> {
        let values = self.values.read().map_err(poisoned)?;
        Ok(values.get(&aggregate_id).cloned().unwrap_or_default())
    }

    async fn set(&self, aggregate_id: Uuid, value: V) -> Result<(), DomainError> {
        let mut values = self.values.write().map_err(poisoned)?;
        values.insert(aggregate_id, value);
        Ok(())
    }
}
