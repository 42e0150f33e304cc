//! The cart decision function.

use cartflow_core::aggregate::Aggregate;
use cartflow_core::error::DomainError;

use super::commands::CartCommand;
use super::events::{CartEvent, CartValidated, Item, ItemAdded, ItemRemoved};

/// Snapshot of a cart derived from its history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// Items currently held, in the order they were added. Duplicates are
    /// kept: a cart is a multiset.
    pub items: Vec<Item>,
    /// Whether a `CartValidated` event has been recorded.
    pub validated: bool,
}

impl CartState {
    /// Returns `true` if at least one instance of `item` is held.
    #[must_use]
    pub fn contains(&self, item: &Item) -> bool {
        self.items.contains(item)
    }

    /// Returns `true` if the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn remove_first(&mut self, item: &Item) {
        if let Some(index) = self.items.iter().position(|held| held == item) {
            self.items.remove(index);
        }
    }
}

/// The shopping cart aggregate.
#[derive(Debug, Clone, Copy)]
pub struct Cart;

impl Aggregate for Cart {
    type Command = CartCommand;
    type Event = CartEvent;
    type State = CartState;

    fn apply(mut state: CartState, event: &CartEvent) -> CartState {
        match event {
            CartEvent::ItemAdded(e) => state.items.push(e.item.clone()),
            CartEvent::ItemRemoved(e) => state.remove_first(&e.item),
            CartEvent::CartValidated(_) => state.validated = true,
        }
        state
    }

    fn decide(command: &CartCommand, state: &CartState) -> Result<Vec<CartEvent>, DomainError> {
        match command {
            CartCommand::AddItem(c) => Ok(vec![CartEvent::ItemAdded(ItemAdded {
                cart_id: c.cart_id,
                item: c.item.clone(),
            })]),
            // Removing an absent item is a no-op, not a rejection.
            CartCommand::RemoveItem(c) if !state.contains(&c.item) => Ok(Vec::new()),
            CartCommand::RemoveItem(c) => Ok(vec![CartEvent::ItemRemoved(ItemRemoved {
                cart_id: c.cart_id,
                item: c.item.clone(),
            })]),
            CartCommand::ValidateCart(c) if state.is_empty() => {
                Err(DomainError::InvalidCart(c.cart_id))
            }
            CartCommand::ValidateCart(c) => Ok(vec![CartEvent::CartValidated(CartValidated {
                cart_id: c.cart_id,
            })]),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::commands::{AddItem, RemoveItem, ValidateCart};

    fn added(cart_id: Uuid, item: &str) -> CartEvent {
        CartEvent::ItemAdded(ItemAdded {
            cart_id,
            item: Item::new(item),
        })
    }

    fn removed(cart_id: Uuid, item: &str) -> CartEvent {
        CartEvent::ItemRemoved(ItemRemoved {
            cart_id,
            item: Item::new(item),
        })
    }

    fn validated(cart_id: Uuid) -> CartEvent {
        CartEvent::CartValidated(CartValidated { cart_id })
    }

    fn add(cart_id: Uuid, item: &str) -> CartCommand {
        CartCommand::AddItem(AddItem {
            correlation_id: Uuid::new_v4(),
            cart_id,
            item: Item::new(item),
        })
    }

    fn remove(cart_id: Uuid, item: &str) -> CartCommand {
        CartCommand::RemoveItem(RemoveItem {
            correlation_id: Uuid::new_v4(),
            cart_id,
            item: Item::new(item),
        })
    }

    fn validate(cart_id: Uuid) -> CartCommand {
        CartCommand::ValidateCart(ValidateCart {
            correlation_id: Uuid::new_v4(),
            cart_id,
        })
    }

    #[test]
    fn test_add_item_on_empty_history_emits_item_added() {
        let cart_id = Uuid::new_v4();

        let events = Cart::handle(&add(cart_id, "A"), &[]).unwrap();

        assert_eq!(events, vec![added(cart_id, "A")]);
    }

    #[test]
    fn test_add_item_ignores_history() {
        let cart_id = Uuid::new_v4();
        let history = vec![added(cart_id, "A"), validated(cart_id)];

        let events = Cart::handle(&add(cart_id, "A"), &history).unwrap();

        assert_eq!(events, vec![added(cart_id, "A")]);
    }

    #[test]
    fn test_remove_absent_item_is_noop() {
        let cart_id = Uuid::new_v4();
        let history = vec![added(cart_id, "A")];

        let events = Cart::handle(&remove(cart_id, "B"), &history).unwrap();

        assert!(events.is_empty());
    }

    #[test]
    fn test_remove_present_item_emits_item_removed() {
        let cart_id = Uuid::new_v4();
        let history = vec![added(cart_id, "A"), added(cart_id, "B")];

        let events = Cart::handle(&remove(cart_id, "B"), &history).unwrap();

        assert_eq!(events, vec![removed(cart_id, "B")]);
    }

    #[test]
    fn test_second_removal_of_same_item_is_noop() {
        let cart_id = Uuid::new_v4();
        let mut history = vec![added(cart_id, "A")];
        let first = Cart::handle(&remove(cart_id, "A"), &history).unwrap();
        history.extend(first);

        let second = Cart::handle(&remove(cart_id, "A"), &history).unwrap();

        assert!(second.is_empty());
    }

    #[test]
    fn test_removal_takes_one_instance_of_duplicated_item() {
        let cart_id = Uuid::new_v4();
        let history = vec![
            added(cart_id, "A"),
            added(cart_id, "B"),
            added(cart_id, "A"),
            removed(cart_id, "A"),
        ];

        let state = Cart::replay(&history);

        assert_eq!(state.items, vec![Item::new("B"), Item::new("A")]);
        assert_eq!(
            Cart::handle(&remove(cart_id, "A"), &history).unwrap(),
            vec![removed(cart_id, "A")]
        );
    }

    #[test]
    fn test_validate_non_empty_cart_emits_cart_validated() {
        let cart_id = Uuid::new_v4();
        let history = vec![added(cart_id, "A")];

        let events = Cart::handle(&validate(cart_id), &history).unwrap();

        assert_eq!(events, vec![validated(cart_id)]);
    }

    #[test]
    fn test_validate_empty_cart_is_rejected() {
        let cart_id = Uuid::new_v4();

        let result = Cart::handle(&validate(cart_id), &[]);

        assert!(matches!(result, Err(DomainError::InvalidCart(id)) if id == cart_id));
    }

    #[test]
    fn test_validate_cart_emptied_by_removals_is_rejected() {
        let cart_id = Uuid::new_v4();
        let history = vec![added(cart_id, "A"), removed(cart_id, "A")];

        let result = Cart::handle(&validate(cart_id), &history);

        assert!(matches!(result, Err(DomainError::InvalidCart(_))));
    }

    #[test]
    fn test_validation_does_not_change_items() {
        let cart_id = Uuid::new_v4();
        let history = vec![added(cart_id, "A"), validated(cart_id)];

        let state = Cart::replay(&history);

        assert_eq!(state.items, vec![Item::new("A")]);
        assert!(state.validated);
    }

    #[test]
    fn test_decision_leaves_history_untouched() {
        let cart_id = Uuid::new_v4();
        let history = vec![added(cart_id, "A")];
        let snapshot = history.clone();

        Cart::handle(&remove(cart_id, "A"), &history).unwrap();

        assert_eq!(history, snapshot);
    }
}
