//! Cartflow Cart — the shopping cart bounded context.
//!
//! A cart is a multiset of items that can be validated once it holds at
//! least one item. All state is derived by replaying the cart's event stream.

pub mod application;
pub mod domain;
