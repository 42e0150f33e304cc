//! Commands for the cart context.

use cartflow_core::command::Command;
use uuid::Uuid;

use super::events::Item;

/// Command to add an item to a cart.
#[derive(Debug, Clone)]
pub struct AddItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The cart identifier.
    pub cart_id: Uuid,
    /// The item to add.
    pub item: Item,
}

/// Command to remove one instance of an item from a cart.
#[derive(Debug, Clone)]
pub struct RemoveItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The cart identifier.
    pub cart_id: Uuid,
    /// The item to remove.
    pub item: Item,
}

/// Command to validate a cart.
#[derive(Debug, Clone)]
pub struct ValidateCart {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The cart identifier.
    pub cart_id: Uuid,
}

/// Any cart command.
#[derive(Debug, Clone)]
pub enum CartCommand {
    /// See [`AddItem`].
    AddItem(AddItem),
    /// See [`RemoveItem`].
    RemoveItem(RemoveItem),
    /// See [`ValidateCart`].
    ValidateCart(ValidateCart),
}

impl From<AddItem> for CartCommand {
    fn from(command: AddItem) -> Self {
        Self::AddItem(command)
    }
}

impl From<RemoveItem> for CartCommand {
    fn from(command: RemoveItem) -> Self {
        Self::RemoveItem(command)
    }
}

impl From<ValidateCart> for CartCommand {
    fn from(command: ValidateCart) -> Self {
        Self::ValidateCart(command)
    }
}

impl Command for CartCommand {
    fn command_type(&self) -> &'static str {
        match self {
            Self::AddItem(_) => "cart.add_item",
            Self::RemoveItem(_) => "cart.remove_item",
            Self::ValidateCart(_) => "cart.validate_cart",
        }
    }

    fn correlation_id(&self) -> Uuid {
        match self {
            Self::AddItem(c) => c.correlation_id,
            Self::RemoveItem(c) => c.correlation_id,
            Self::ValidateCart(c) => c.correlation_id,
        }
    }

    fn aggregate_id(&self) -> Uuid {
        match self {
            Self::AddItem(c) => c.cart_id,
            Self::RemoveItem(c) => c.cart_id,
            Self::ValidateCart(c) => c.cart_id,
        }
    }
}
