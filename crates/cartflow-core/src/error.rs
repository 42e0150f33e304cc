//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// A batch of events spans more than one aggregate.
    #[error("aggregate id mismatch: batch belongs to {expected} but contains an event for {found}")]
    AggregateIdMismatch {
        /// The aggregate of the first event in the batch.
        expected: Uuid,
        /// The first differing aggregate found in the batch.
        found: Uuid,
    },

    /// Optimistic concurrency conflict.
    #[error("version conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    VersionConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A cart was validated while holding no items.
    #[error("invalid cart {0}: a cart must contain at least one item to be validated")]
    InvalidCart(Uuid),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// A subscriber failed while handling a published event.
    #[error("projection error: {0}")]
    Projection(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
