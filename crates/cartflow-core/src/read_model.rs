//! Read-model repository abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;

/// Key/value store backing a projection's derived state.
///
/// There is no transactional link to the event store: projections are
/// updated after events are durable, so the two are eventually consistent.
#[async_trait]
pub trait ReadModelRepository<V>: Send + Sync
where
    V: Default + Send + Sync + 'static,
{
    /// Returns the value for `aggregate_id`, or `V::default()` if absent.
    async fn get(&self, aggregate_id: Uuid) -> Result<V, DomainError>;

    /// Stores `value` for `aggregate_id`, replacing any previous value.
    async fn set(&self, aggregate_id: Uuid, value: V) -> Result<(), DomainError>;
}
