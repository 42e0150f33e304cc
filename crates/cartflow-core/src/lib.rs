//! Cartflow Core — shared event-sourcing abstractions.
//!
//! This crate defines the traits and types every bounded context depends on:
//! events, commands, the decision function, the event store contract, the
//! publisher, and read-model repositories. Storage backings live in
//! `cartflow-event-store`.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod lock;
pub mod publisher;
pub mod read_model;
pub mod repository;
pub mod store;

#[cfg(test)]
mod test_fixtures;
