//! Append-only JSON-lines file backing.
//!
//! Layout:
//! ```text
//! <base_dir>/
//!     <aggregate_id>.jsonl    -- one appended batch per line: a JSON array
//!                                of `StoredEvent`, in sequence order
//! ```
//!
//! Each stream has its own async mutex; reads and appends of the same stream
//! are serialized, different streams proceed independently. A batch is one
//! line written with a single `write_all` followed by `sync_data`, so a crash
//! mid-write leaves at most one torn final line. That line is ignored on read
//! and truncated away by the next append, dropping the whole batch.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cartflow_core::error::DomainError;
use cartflow_core::lock::AggregateLocks;
use cartflow_core::repository::{
    EventRepository, ExpectedVersion, PendingEvent, StoredEvent, sequence_after,
};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

fn io_error(context: &str, err: &std::io::Error) -> DomainError {
    DomainError::Infrastructure(format!("{context}: {err}"))
}

/// Contents of a stream file.
struct StreamFile {
    events: Vec<StoredEvent>,
    /// Byte length of the complete, newline-terminated lines.
    valid_len: u64,
    /// Whether trailing bytes after `valid_len` exist.
    torn: bool,
}

/// Event repository writing one JSON-lines file per aggregate.
#[derive(Debug)]
pub struct FileEventRepository {
    base_dir: PathBuf,
    locks: AggregateLocks,
}

impl FileEventRepository {
    /// Opens (creating if needed) a repository rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the directory cannot be
    /// created.
    pub async fn open(base_dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| io_error("creating event log directory", &e))?;
        Ok(Self {
            base_dir,
            locks: AggregateLocks::new(),
        })
    }

    /// Returns the root directory of this repository.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the path of an aggregate's stream file.
    #[must_use]
    pub fn stream_path(&self, aggregate_id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{aggregate_id}.jsonl"))
    }

    /// Number of streams with an append or load in flight.
    #[must_use]
    pub fn streams_in_use(&self) -> usize {
        self.locks.len()
    }

    async fn read_stream(path: &Path) -> Result<StreamFile, DomainError> {
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(StreamFile {
                    events: Vec::new(),
                    valid_len: 0,
                    torn: false,
                });
            }
            Err(e) => return Err(io_error("reading event log", &e)),
        };

        let complete = contents.rfind('\n').map_or(0, |i| i + 1);
        let mut events = Vec::new();
        for line in contents[..complete].lines().filter(|l| !l.trim().is_empty()) {
            let batch: Vec<StoredEvent> = serde_json::from_str(line).map_err(|e| {
                DomainError::Infrastructure(format!("corrupt event log {}: {e}", path.display()))
            })?;
            events.extend(batch);
        }

        Ok(StreamFile {
            events,
            valid_len: complete as u64,
            torn: complete < contents.len(),
        })
    }
}

#[async_trait]
impl EventRepository for FileEventRepository {
    #[instrument(skip(self))]
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let _guard = self.locks.lock(aggregate_id).await?;
        let stream = Self::read_stream(&self.stream_path(aggregate_id)).await?;
        if stream.torn {
            warn!(%aggregate_id, "ignoring torn tail of event log");
        }
        Ok(stream.events)
    }

    #[allow(clippy::cast_possible_wrap)]
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
        let _guard = self.locks.lock(aggregate_id).await?;

        let path = self.stream_path(aggregate_id);
        let existing = Self::read_stream(&path).await?;
        let current = existing.events.len() as i64;
        expected_version.check(aggregate_id, current)?;

        let stored = sequence_after(current, events);
        let mut line = serde_json::to_string(&stored)
            .map_err(|e| DomainError::Infrastructure(format!("event serialization failed: {e}")))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| io_error("opening event log", &e))?;
        if existing.torn {
            warn!(%aggregate_id, "truncating torn tail of event log");
            file.set_len(existing.valid_len)
                .await
                .map_err(|e| io_error("truncating event log", &e))?;
        }
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| io_error("writing event log", &e))?;
        file.sync_data()
            .await
            .map_err(|e| io_error("syncing event log", &e))?;

        debug!(version = current + stored.len() as i64, "appended to event log");
        Ok(stored)
    }
}
