//! Event publisher: persist, then notify subscribers.
//!
//! Subscriptions are registered through `&mut self` while the application is
//! being wired. Once wiring is done the publisher is shared (typically in an
//! `Arc`) and only read during publishing.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, error, instrument};

use crate::error::DomainError;
use crate::event::{DomainEvent, EventKind};
use crate::repository::StoredEvent;
use crate::store::{AggregateEvents, EventStore};

/// Future returned by a subscribed handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send>>;

type Handler<E> = Arc<dyn Fn(E) -> HandlerFuture + Send + Sync>;

/// Persists events through an [`EventStore`] and fans them out to the
/// handlers subscribed to each event's kind.
pub struct EventPublisher<E: DomainEvent> {
    store: EventStore<E>,
    handlers: HashMap<E::Kind, Vec<Handler<E>>>,
}

impl<E: DomainEvent> fmt::Debug for EventPublisher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscriptions: HashMap<_, _> = self
            .handlers
            .iter()
            .map(|(kind, handlers)| (kind.as_str(), handlers.len()))
            .collect();
        f.debug_struct("EventPublisher")
            .field("store", &self.store)
            .field("subscriptions", &subscriptions)
            .finish()
    }
}

impl<E: DomainEvent> EventPublisher<E> {
    /// Creates a publisher with no subscribers.
    #[must_use]
    pub fn new(store: EventStore<E>) -> Self {
        Self {
            store,
            handlers: HashMap::new(),
        }
    }

    /// The store events are persisted to.
    #[must_use]
    pub fn store(&self) -> &EventStore<E> {
        &self.store
    }

    /// Registers `handler` for every future event of exactly `kind`.
    ///
    /// Registration is additive: handlers for the same kind run in the order
    /// they were subscribed.
    pub fn subscribe<F, Fut>(&mut self, kind: E::Kind, handler: F)
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DomainError>> + Send + 'static,
    {
        let handler: Handler<E> = Arc::new(move |event| Box::pin(handler(event)));
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Number of handlers subscribed to `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: E::Kind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Appends `events` without a version check, then notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the append fails, in which case no
    /// handler runs. Returns `DomainError::Projection` if a handler fails;
    /// the events are already persisted at that point.
    #[instrument(skip_all, fields(event_count = events.len()))]
    pub async fn publish(&self, events: Vec<E>) -> Result<Vec<StoredEvent>, DomainError> {
        let stored = self.store.append_unchecked(&events).await?;
        self.dispatch(&events).await?;
        Ok(stored)
    }

    /// Appends `batch` with an optimistic version check, then notifies
    /// subscribers.
    ///
    /// # Errors
    ///
    /// Same as [`EventPublisher::publish`], plus `DomainError::VersionConflict`
    /// when the stream moved past the batch's expected version.
    #[instrument(skip_all, fields(aggregate_id = ?batch.aggregate_id(), expected_version = batch.expected_version()))]
    pub async fn publish_versioned(
        &self,
        batch: AggregateEvents<E>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let stored = self.store.append(&batch).await?;
        self.dispatch(batch.events()).await?;
        Ok(stored)
    }

    async fn dispatch(&self, events: &[E]) -> Result<(), DomainError> {
        for event in events {
            let Some(handlers) = self.handlers.get(&event.kind()) else {
                continue;
            };
            debug!(
                event_type = event.event_type(),
                handler_count = handlers.len(),
                "dispatching event"
            );
            for handler in handlers {
                if let Err(err) = handler(event.clone()).await {
                    error!(event_type = event.event_type(), error = %err, "subscriber failed");
                    return Err(match err {
                        DomainError::Projection(_) => err,
                        other => DomainError::Projection(other.to_string()),
                    });
                }
            }
        }
        Ok(())
    }
}
