//! Domain events for the cart context.

use std::fmt;

use cartflow_core::event::{DomainEvent, EventKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type string for [`ItemAdded`].
pub const ITEM_ADDED_EVENT_TYPE: &str = "cart.item_added";
/// Event type string for [`ItemRemoved`].
pub const ITEM_REMOVED_EVENT_TYPE: &str = "cart.item_removed";
/// Event type string for [`CartValidated`].
pub const CART_VALIDATED_EVENT_TYPE: &str = "cart.cart_validated";

/// An item placed in a cart. Two items are equal when their identifiers are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(String);

impl Item {
    /// Creates an item from its identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The item identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Item {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Item {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Emitted when an item is added to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAdded {
    /// The cart identifier.
    pub cart_id: Uuid,
    /// The item added.
    pub item: Item,
}

/// Emitted when one instance of an item is removed from a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    /// The cart identifier.
    pub cart_id: Uuid,
    /// The item removed.
    pub item: Item,
}

/// Emitted when a non-empty cart is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartValidated {
    /// The cart identifier.
    pub cart_id: Uuid,
}

/// Events of the cart context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartEvent {
    /// An item has been added to the cart.
    ItemAdded(ItemAdded),
    /// An item has been removed from the cart.
    ItemRemoved(ItemRemoved),
    /// The cart has been validated.
    CartValidated(CartValidated),
}

/// The closed set of cart event kinds, used to key subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartEventKind {
    /// See [`ItemAdded`].
    ItemAdded,
    /// See [`ItemRemoved`].
    ItemRemoved,
    /// See [`CartValidated`].
    CartValidated,
}

impl CartEventKind {
    /// Every cart event kind.
    pub const ALL: [Self; 3] = [Self::ItemAdded, Self::ItemRemoved, Self::CartValidated];

    /// Resolves a persisted event type string, if it names a cart event.
    #[must_use]
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == event_type)
    }
}

impl EventKind for CartEventKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::ItemAdded => ITEM_ADDED_EVENT_TYPE,
            Self::ItemRemoved => ITEM_REMOVED_EVENT_TYPE,
            Self::CartValidated => CART_VALIDATED_EVENT_TYPE,
        }
    }
}

impl DomainEvent for CartEvent {
    type Kind = CartEventKind;

    fn aggregate_id(&self) -> Uuid {
        match self {
            Self::ItemAdded(e) => e.cart_id,
            Self::ItemRemoved(e) => e.cart_id,
            Self::CartValidated(e) => e.cart_id,
        }
    }

    fn kind(&self) -> CartEventKind {
        match self {
            Self::ItemAdded(_) => CartEventKind::ItemAdded,
            Self::ItemRemoved(_) => CartEventKind::ItemRemoved,
            Self::CartValidated(_) => CartEventKind::CartValidated,
        }
    }
}
