//! Per-aggregate async locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::DomainError;

type Slot = Arc<AsyncMutex<()>>;

/// Async mutexes keyed by aggregate id.
///
/// A slot lives only while some task holds or awaits it; the last guard to
/// release a slot removes it, so the table never outgrows the set of
/// aggregates currently being worked on.
#[derive(Debug, Default)]
pub struct AggregateLocks {
    slots: Mutex<HashMap<Uuid, Slot>>,
}

/// Exclusive access to one aggregate, released on drop.
#[derive(Debug)]
pub struct AggregateGuard<'a> {
    locks: &'a AggregateLocks,
    aggregate_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

fn poisoned() -> DomainError {
    DomainError::Infrastructure("aggregate lock table poisoned".into())
}

impl AggregateLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `aggregate_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the lock table is poisoned.
    pub async fn lock(&self, aggregate_id: Uuid) -> Result<AggregateGuard<'_>, DomainError> {
        let slot = {
            let mut slots = self.slots.lock().map_err(|_| poisoned())?;
            Arc::clone(slots.entry(aggregate_id).or_default())
        };
        let guard = slot.lock_owned().await;
        Ok(AggregateGuard {
            locks: self,
            aggregate_id,
            guard: Some(guard),
        })
    }

    /// Number of aggregates currently held or awaited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().map_or(0, |slots| slots.len())
    }

    /// Whether no aggregate is currently held or awaited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for AggregateGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let Ok(mut slots) = self.locks.slots.lock() else {
            return;
        };
        // Only the table's own reference left: nobody is waiting.
        if slots
            .get(&self.aggregate_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.aggregate_id);
        }
    }
}
