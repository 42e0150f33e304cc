//! Query handlers for the cart context.
//!
//! Queries replay the event stream and return read-only view DTOs.

use cartflow_core::aggregate::Aggregate;
use cartflow_core::error::DomainError;
use cartflow_core::store::EventStore;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::application::command_handlers::decode_history;
use crate::domain::aggregates::Cart;
use crate::domain::events::{CartEvent, Item};

/// Read-only view of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    /// The cart identifier.
    pub cart_id: Uuid,
    /// Items currently held, in the order they were added.
    pub items: Vec<Item>,
    /// Whether the cart has been validated.
    pub validated: bool,
    /// Current version (stream length).
    pub version: i64,
}

/// Retrieves a cart by replaying its stream.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::Infrastructure` if loading or decoding fails.
#[allow(clippy::cast_possible_wrap)]
#[instrument(skip(store))]
pub async fn get_cart_by_id(
    cart_id: Uuid,
    store: &EventStore<CartEvent>,
) -> Result<CartView, DomainError> {
    let stored = store.read_stored(cart_id).await?;
    if stored.is_empty() {
        return Err(DomainError::AggregateNotFound(cart_id));
    }
    let state = Cart::replay(&decode_history(&stored)?);
    Ok(CartView {
        cart_id,
        items: state.items,
        validated: state.validated,
        version: stored.len() as i64,
    })
}
