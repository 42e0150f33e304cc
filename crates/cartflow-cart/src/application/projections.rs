//! Read-model projections for the cart context.

use std::fmt;
use std::sync::Arc;

use cartflow_core::error::DomainError;
use cartflow_core::event::DomainEvent;
use cartflow_core::lock::AggregateLocks;
use cartflow_core::publisher::EventPublisher;
use cartflow_core::read_model::ReadModelRepository;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::events::{CartEvent, CartEventKind};

/// Name the cart summary read model is stored under.
pub const CART_SUMMARY_PROJECTION: &str = "cart_summary";

/// Number of items held by a cart, maintained from published events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    /// Items added minus items removed.
    pub item_count: i64,
}

/// Keeps [`CartSummary`] in step with `ItemAdded` and `ItemRemoved`.
///
/// Updates to one cart are serialized so concurrent commands on the same
/// cart cannot lose an increment between `get` and `set`.
pub struct CartSummaryProjection {
    repository: Arc<dyn ReadModelRepository<CartSummary>>,
    locks: AggregateLocks,
}

impl fmt::Debug for CartSummaryProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartSummaryProjection").finish_non_exhaustive()
    }
}

impl CartSummaryProjection {
    /// Creates a projection writing to `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn ReadModelRepository<CartSummary>>) -> Self {
        Self {
            repository,
            locks: AggregateLocks::new(),
        }
    }

    /// Subscribes the projection to the event kinds it folds.
    pub fn register(self: Arc<Self>, publisher: &mut EventPublisher<CartEvent>) {
        for kind in [CartEventKind::ItemAdded, CartEventKind::ItemRemoved] {
            let projection = Arc::clone(&self);
            publisher.subscribe(kind, move |event: CartEvent| {
                let projection = Arc::clone(&projection);
                async move { projection.on_event(&event).await }
            });
        }
    }

    /// Applies one event to the stored summary.
    ///
    /// # Errors
    ///
    /// Propagates the read-model repository's error.
    #[instrument(skip_all, fields(event_type = event.event_type(), cart_id = %event.aggregate_id()))]
    pub async fn on_event(&self, event: &CartEvent) -> Result<(), DomainError> {
        let delta = match event {
            CartEvent::ItemAdded(_) => 1,
            CartEvent::ItemRemoved(_) => -1,
            CartEvent::CartValidated(_) => return Ok(()),
        };
        let cart_id = event.aggregate_id();
        let _guard = self.locks.lock(cart_id).await?;
        let mut summary = self.repository.get(cart_id).await?;
        summary.item_count += delta;
        debug!(item_count = summary.item_count, "cart summary updated");
        self.repository.set(cart_id, summary).await
    }

    /// Returns the summary for a cart; unknown carts read as zero items.
    ///
    /// # Errors
    ///
    /// Propagates the read-model repository's error.
    pub async fn get_cart_summary(&self, cart_id: Uuid) -> Result<CartSummary, DomainError> {
        self.repository.get(cart_id).await
    }
}
