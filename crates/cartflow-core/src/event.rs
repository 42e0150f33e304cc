//! Domain event abstractions.

use std::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Closed enumeration of the concrete kinds of a context's events.
///
/// Subscribers are registered against a kind, so dispatch is resolved with a
/// plain map lookup instead of runtime type inspection.
pub trait EventKind: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Stable name of this kind (persisted as the event type).
    fn as_str(&self) -> &'static str;
}

/// Trait that all domain events implement.
pub trait DomainEvent:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The closed set of kinds this event can take.
    type Kind: EventKind;

    /// Returns the aggregate/stream this event belongs to.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the concrete kind of this event.
    fn kind(&self) -> Self::Kind;

    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }
}
