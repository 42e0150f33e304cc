//! `PostgreSQL` read-model repository.
//!
//! Every projection shares the `read_models` table and is told apart by its
//! projection name. Values are stored as JSONB.

use std::marker::PhantomData;

use async_trait::async_trait;
use cartflow_core::error::DomainError;
use cartflow_core::read_model::ReadModelRepository;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::pg_event_repository::db_error;

const SELECT_STATE: &str =
    "SELECT state FROM read_models WHERE projection = $1 AND aggregate_id = $2";

const UPSERT_STATE: &str = r"
INSERT INTO read_models (projection, aggregate_id, state, updated_at)
VALUES ($1, $2, $3, NOW())
ON CONFLICT (projection, aggregate_id)
DO UPDATE SET state = EXCLUDED.state, updated_at = EXCLUDED.updated_at
";

/// Read-model repository for one named projection.
#[derive(Debug)]
pub struct PgReadModelRepository<V> {
    pool: PgPool,
    projection: String,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for PgReadModelRepository<V> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            projection: self.projection.clone(),
            _value: PhantomData,
        }
    }
}

impl<V> PgReadModelRepository<V> {
    /// Creates a repository storing values under `projection`.
    #[must_use]
    pub fn new(pool: PgPool, projection: impl Into<String>) -> Self {
        Self {
            pool,
            projection: projection.into(),
            _value: PhantomData,
        }
    }

    /// The projection name rows are keyed by.
    #[must_use]
    pub fn projection(&self) -> &str {
        &self.projection
    }
}

#[async_trait]
impl<V> ReadModelRepository<V> for PgReadModelRepository<V>
where
    V: Serialize + DeserializeOwned + Default + Send + Sync + 'static,
{
    #[instrument(skip(self), fields(projection = %self.projection))]
    async fn get(&self, aggregate_id: Uuid) -> Result<V, DomainError> {
        let state: Option<serde_json::Value> = sqlx::query_scalar(SELECT_STATE)
            .bind(&self.projection)
            .bind(aggregate_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(&e))?;
        match state {
            Some(state) => serde_json::from_value(state).map_err(|e| {
                DomainError::Infrastructure(format!(
                    "corrupt read model {}/{aggregate_id}: {e}",
                    self.projection
                ))
            }),
            None => Ok(V::default()),
        }
    }

    #[instrument(skip(self, value), fields(projection = %self.projection))]
    async fn set(&self, aggregate_id: Uuid, value: V) -> Result<(), DomainError> {
        let state = serde_json::to_value(&value).map_err(|e| {
            DomainError::Infrastructure(format!("read model serialization failed: {e}"))
        })?;
        sqlx::query(UPSERT_STATE)
            .bind(&self.projection)
            .bind(aggregate_id)
            .bind(state)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(&e))?;
        Ok(())
    }
}
