//! Shared application state.

use std::sync::Arc;

use cartflow_cart::application::projections::{
    CART_SUMMARY_PROJECTION, CartSummary, CartSummaryProjection,
};
use cartflow_cart::domain::events::CartEvent;
use cartflow_core::clock::{Clock, SystemClock};
use cartflow_core::publisher::EventPublisher;
use cartflow_core::read_model::ReadModelRepository;
use cartflow_core::repository::EventRepository;
use cartflow_core::store::EventStore;
use cartflow_event_store::file_event_repository::FileEventRepository;
use cartflow_event_store::memory::{InMemoryEventRepository, InMemoryReadModelRepository};
use cartflow_event_store::pg_event_repository::PgEventRepository;
use cartflow_event_store::pg_read_model::PgReadModelRepository;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::{AppConfig, StoreBackend};
use crate::error::AppError;

/// Application state shared across all request handlers.
///
/// The publisher is fully wired before it is shared; handlers only publish.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Persists cart events and notifies projections.
    pub publisher: Arc<EventPublisher<CartEvent>>,
    /// The cart summary read model.
    pub cart_summary: Arc<CartSummaryProjection>,
}

impl AppState {
    /// Wires the publisher and projections over the given backings.
    #[must_use]
    pub fn new(
        event_repository: Arc<dyn EventRepository>,
        summary_repository: Arc<dyn ReadModelRepository<CartSummary>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut publisher = EventPublisher::new(EventStore::new(event_repository, clock));
        let cart_summary = Arc::new(CartSummaryProjection::new(summary_repository));
        Arc::clone(&cart_summary).register(&mut publisher);
        Self {
            publisher: Arc::new(publisher),
            cart_summary,
        }
    }

    /// State backed entirely by process memory.
    #[must_use]
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(InMemoryEventRepository::new()),
            Arc::new(InMemoryReadModelRepository::<CartSummary>::new()),
            clock,
        )
    }

    /// Builds state for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the backing store cannot be opened or prepared.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        match &config.backend {
            StoreBackend::Memory => Ok(Self::in_memory(clock)),
            StoreBackend::File { dir } => {
                let repository = FileEventRepository::open(dir.clone()).await?;
                info!(dir = %dir.display(), "using file event store");
                Ok(Self::new(
                    Arc::new(repository),
                    Arc::new(InMemoryReadModelRepository::<CartSummary>::new()),
                    clock,
                ))
            }
            StoreBackend::Postgres {
                url,
                max_connections,
            } => {
                let pool = PgPoolOptions::new()
                    .max_connections(*max_connections)
                    .connect(url)
                    .await?;
                let repository = PgEventRepository::new(pool.clone());
                repository.ensure_schema().await?;
                info!(max_connections, "using postgres event store");
                Ok(Self::new(
                    Arc::new(repository),
                    Arc::new(PgReadModelRepository::<CartSummary>::new(
                        pool,
                        CART_SUMMARY_PROJECTION,
                    )),
                    clock,
                ))
            }
        }
    }

    /// The event store behind the publisher.
    #[must_use]
    pub fn store(&self) -> &EventStore<CartEvent> {
        self.publisher.store()
    }
}
