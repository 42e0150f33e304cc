//! Domain layer: events, commands, and the cart decision function.

pub mod aggregates;
pub mod commands;
pub mod events;
