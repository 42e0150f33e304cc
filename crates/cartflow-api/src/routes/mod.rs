//! Route modules organized by bounded context.

pub mod carts;
pub mod health;
