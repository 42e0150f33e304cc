//! Shared test mocks and utilities for the Cartflow runtime.

mod clock;
mod repository;

pub use clock::{FixedClock, fixed_now};
pub use repository::{EmptyEventRepository, FailingEventRepository, RecordingEventRepository};
