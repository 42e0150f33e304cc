//! Typed event store over a pluggable [`EventRepository`] backing.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::repository::{EventRepository, ExpectedVersion, PendingEvent, StoredEvent};

/// A batch of events for a single aggregate plus the version the stream is
/// expected to be at before the batch is appended.
#[derive(Debug, Clone)]
pub struct AggregateEvents<E> {
    aggregate_id: Option<Uuid>,
    events: Vec<E>,
    expected_version: i64,
}

impl<E: DomainEvent> AggregateEvents<E> {
    /// Builds a batch, checking that every event shares one aggregate id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateIdMismatch` if the events belong to more
    /// than one aggregate.
    pub fn new(events: Vec<E>, expected_version: i64) -> Result<Self, DomainError> {
        let aggregate_id = common_aggregate_id(&events)?;
        Ok(Self {
            aggregate_id,
            events,
            expected_version,
        })
    }

    /// The aggregate the batch belongs to, or `None` for an empty batch.
    #[must_use]
    pub fn aggregate_id(&self) -> Option<Uuid> {
        self.aggregate_id
    }

    /// The events in append order.
    #[must_use]
    pub fn events(&self) -> &[E] {
        &self.events
    }

    /// The stream length the batch was decided against.
    #[must_use]
    pub fn expected_version(&self) -> i64 {
        self.expected_version
    }

    /// Returns `true` if the batch holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn common_aggregate_id<E: DomainEvent>(events: &[E]) -> Result<Option<Uuid>, DomainError> {
    let Some(first) = events.first() else {
        return Ok(None);
    };
    let expected = first.aggregate_id();
    match events
        .iter()
        .map(DomainEvent::aggregate_id)
        .find(|id| *id != expected)
    {
        Some(found) => Err(DomainError::AggregateIdMismatch { expected, found }),
        None => Ok(Some(expected)),
    }
}

/// Append-only, per-aggregate store of typed events.
///
/// Encodes events to JSON on the way in and decodes them on the way out; the
/// backing repository decides where the bytes live.
pub struct EventStore<E> {
    repository: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
    _event: PhantomData<fn() -> E>,
}

impl<E> Clone for EventStore<E> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            _event: PhantomData,
        }
    }
}

impl<E> fmt::Debug for EventStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStore").finish_non_exhaustive()
    }
}

impl<E: DomainEvent> EventStore<E> {
    /// Creates a store over the given backing.
    #[must_use]
    pub fn new(repository: Arc<dyn EventRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            _event: PhantomData,
        }
    }

    /// Appends a batch only if the stream length equals the batch's expected
    /// version. An empty batch is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::VersionConflict` if the stream moved, or the
    /// backing's error if the write fails. Nothing is appended on error.
    pub async fn append(&self, batch: &AggregateEvents<E>) -> Result<Vec<StoredEvent>, DomainError> {
        let Some(aggregate_id) = batch.aggregate_id() else {
            return Ok(Vec::new());
        };
        self.write(
            aggregate_id,
            ExpectedVersion::Exact(batch.expected_version()),
            batch.events(),
        )
        .await
    }

    /// Appends events without a version check. The call is still atomic.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateIdMismatch` if the events span several
    /// aggregates, or the backing's error if the write fails.
    pub async fn append_unchecked(&self, events: &[E]) -> Result<Vec<StoredEvent>, DomainError> {
        let Some(aggregate_id) = common_aggregate_id(events)? else {
            return Ok(Vec::new());
        };
        self.write(aggregate_id, ExpectedVersion::Any, events).await
    }

    #[instrument(skip(self, events), fields(event_count = events.len()))]
    async fn write(
        &self,
        aggregate_id: Uuid,
        expected_version: ExpectedVersion,
        events: &[E],
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let pending = events
            .iter()
            .map(|event| self.encode(event))
            .collect::<Result<Vec<_>, _>>()?;

        match self
            .repository
            .append_events(aggregate_id, expected_version, pending)
            .await
        {
            Ok(stored) => {
                debug!(
                    version = stored.last().map(|e| e.sequence_number),
                    "events appended"
                );
                Ok(stored)
            }
            Err(err @ DomainError::VersionConflict { .. }) => {
                warn!(error = %err, "append rejected");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Returns the full stream for an aggregate in append order. Unknown
    /// aggregates yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if loading or decoding fails.
    pub async fn read(&self, aggregate_id: Uuid) -> Result<Vec<E>, DomainError> {
        self.read_stored(aggregate_id)
            .await?
            .iter()
            .map(Self::decode)
            .collect()
    }

    /// Returns the serialized stream for an aggregate.
    ///
    /// # Errors
    ///
    /// Propagates the backing's error.
    pub async fn read_stored(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        self.repository.load_events(aggregate_id).await
    }

    /// Returns the current stream length.
    ///
    /// # Errors
    ///
    /// Propagates the backing's error.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn version(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        Ok(self.read_stored(aggregate_id).await?.len() as i64)
    }

    fn encode(&self, event: &E) -> Result<PendingEvent, DomainError> {
        let payload = serde_json::to_value(event).map_err(|e| {
            DomainError::Infrastructure(format!("event serialization failed: {e}"))
        })?;
        Ok(PendingEvent {
            event_id: Uuid::new_v4(),
            aggregate_id: event.aggregate_id(),
            event_type: event.event_type().to_owned(),
            payload,
            occurred_at: self.clock.now(),
        })
    }

    /// Decodes a stored event back into its typed form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not match `E`.
    pub fn decode(stored: &StoredEvent) -> Result<E, DomainError> {
        serde_json::from_value(stored.payload.clone()).map_err(|e| {
            DomainError::Infrastructure(format!(
                "event deserialization failed for {} #{}: {e}",
                stored.event_type, stored.sequence_number
            ))
        })
    }
}
