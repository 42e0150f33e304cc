//! Cartflow event store backings.
//!
//! Every backing implements [`EventRepository`](cartflow_core::repository::EventRepository)
//! with the same contract: per-aggregate append-only streams, atomic
//! check-and-append, and empty reads for unknown aggregates.

pub mod file_event_repository;
pub mod memory;
pub mod pg_event_repository;
pub mod pg_read_model;
pub mod schema;
