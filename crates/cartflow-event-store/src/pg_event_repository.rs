//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use cartflow_core::error::DomainError;
use cartflow_core::repository::{
    EventRepository, ExpectedVersion, PendingEvent, StoredEvent, sequence_after,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::schema::{CREATE_EVENTS_TABLE, CREATE_READ_MODELS_TABLE};

const LOAD_EVENTS: &str = r"
SELECT event_id, aggregate_id, event_type, payload, sequence_number, occurred_at
FROM domain_events
WHERE aggregate_id = $1
ORDER BY sequence_number ASC
";

const LOCK_STREAM: &str = "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))";

const STREAM_VERSION: &str = "SELECT COUNT(*) FROM domain_events WHERE aggregate_id = $1";

const INSERT_EVENT: &str = r"
INSERT INTO domain_events
    (event_id, aggregate_id, event_type, payload, sequence_number, occurred_at)
VALUES ($1, $2, $3, $4, $5, $6)
";

pub(crate) fn db_error(err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

fn row_to_stored_event(row: &PgRow) -> Result<StoredEvent, sqlx::Error> {
    Ok(StoredEvent {
        event_id: row.try_get("event_id")?,
        aggregate_id: row.try_get("aggregate_id")?,
        event_type: row.try_get("event_type")?,
        payload: row.try_get("payload")?,
        sequence_number: row.try_get("sequence_number")?,
        occurred_at: row.try_get("occurred_at")?,
    })
}

/// PostgreSQL-backed event repository.
///
/// Appends run in one transaction holding a transaction-scoped advisory lock
/// keyed on the aggregate, so the version check and the inserts are atomic
/// with respect to other appenders of the same stream. The unique
/// `(aggregate_id, sequence_number)` constraint backs this up against writers
/// that bypass the lock.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the event and read-model tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::raw_sql(CREATE_EVENTS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(&e))?;
        sqlx::raw_sql(CREATE_READ_MODELS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(&e))?;
        Ok(())
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    #[instrument(skip(self))]
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query(LOAD_EVENTS)
            .bind(aggregate_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(&e))?;
        rows.iter()
            .map(row_to_stored_event)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| db_error(&e))
    }

    #[instrument(skip(self, events), fields(event_count = events.len()))]
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: ExpectedVersion,
        events: Vec<PendingEvent>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }
        let mut tx = self.pool.begin().await.map_err(|e| db_error(&e))?;

        sqlx::query(LOCK_STREAM)
            .bind(aggregate_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error(&e))?;

        let current: i64 = sqlx::query_scalar(STREAM_VERSION)
            .bind(aggregate_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error(&e))?;
        expected_version.check(aggregate_id, current)?;

        let stored = sequence_after(current, events);
        for event in &stored {
            sqlx::query(INSERT_EVENT)
                .bind(event.event_id)
                .bind(event.aggregate_id)
                .bind(&event.event_type)
                .bind(&event.payload)
                .bind(event.sequence_number)
                .bind(event.occurred_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| match &e {
                    sqlx::Error::Database(db) if db.is_unique_violation() => {
                        DomainError::VersionConflict {
                            aggregate_id,
                            expected: match expected_version {
                                ExpectedVersion::Exact(expected) => expected,
                                ExpectedVersion::Any => current,
                            },
                            actual: event.sequence_number,
                        }
                    }
                    _ => db_error(&e),
                })?;
        }

        tx.commit().await.map_err(|e| db_error(&e))?;
        debug!(%aggregate_id, version = stored.last().map(|e| e.sequence_number), "appended to postgres stream");
        Ok(stored)
    }
}
