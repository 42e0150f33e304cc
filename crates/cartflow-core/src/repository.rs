//! Event repository abstraction.
//!
//! An [`EventRepository`] is the storage backing behind the typed
//! [`EventStore`](crate::store::EventStore). Backings only see serialized
//! events, so any durable append-only log keyed by aggregate id can implement
//! it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// A serialized event that has not yet been assigned a stream position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl PendingEvent {
    /// Attaches the stream position assigned by the backing.
    #[must_use]
    pub fn into_stored(self, sequence_number: i64) -> StoredEvent {
        StoredEvent {
            event_id: self.event_id,
            aggregate_id: self.aggregate_id,
            event_type: self.event_type,
            payload: self.payload,
            sequence_number,
            occurred_at: self.occurred_at,
        }
    }
}

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// 1-based position within the aggregate stream.
    pub sequence_number: i64,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// The version an append expects the stream to be at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Append regardless of the current stream length.
    Any,
    /// Append only if the stream currently holds exactly this many events.
    Exact(i64),
}

impl ExpectedVersion {
    /// Checks `actual` against this expectation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::VersionConflict` when an exact expectation does
    /// not match.
    pub fn check(self, aggregate_id: Uuid, actual: i64) -> Result<(), DomainError> {
        match self {
            Self::Exact(expected) if expected != actual => Err(DomainError::VersionConflict {
                aggregate_id,
                expected,
                actual,
            }),
            _ => Ok(()),
        }
    }
}

/// Repository trait for loading and appending serialized events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Load all events for a given aggregate, ordered by sequence number.
    /// Unknown aggregates yield an empty list.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Append new events to an aggregate stream.
    ///
    /// The version check and the write are atomic with respect to other
    /// appenders of the same stream: on conflict nothing is written. Returns
    /// the events with their assigned sequence numbers. An empty batch is a
    /// no-op.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: ExpectedVersion,
        events: Vec<PendingEvent>,
    ) -> Result<Vec<StoredEvent>, DomainError>;
}

/// Assigns consecutive sequence numbers following `current_version`.
#[must_use]
pub fn sequence_after(current_version: i64, events: Vec<PendingEvent>) -> Vec<StoredEvent> {
    events
        .into_iter()
        .zip(current_version + 1..)
        .map(|(event, sequence_number)| event.into_stored(sequence_number))
        .collect()
}
