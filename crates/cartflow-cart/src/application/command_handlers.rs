//! Command handlers for the cart context.
//!
//! Each handler reads the cart's full history, runs the decision function,
//! and publishes the resulting events with the history length as the
//! expected version. Conflicts are returned to the caller; nothing retries.

use cartflow_core::aggregate::Aggregate;
use cartflow_core::command::Command;
use cartflow_core::error::DomainError;
use cartflow_core::publisher::EventPublisher;
use cartflow_core::repository::StoredEvent;
use cartflow_core::store::{AggregateEvents, EventStore};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::aggregates::Cart;
use crate::domain::commands::{AddItem, CartCommand, RemoveItem, ValidateCart};
use crate::domain::events::{CartEvent, CartEventKind};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct CartCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted. Empty for a no-op.
    pub stored_events: Vec<StoredEvent>,
}

/// Decodes the cart events of a stored stream.
///
/// Event types this context does not know are skipped, so streams written by
/// newer code still replay.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if a known event fails to decode.
pub(crate) fn decode_history(stored: &[StoredEvent]) -> Result<Vec<CartEvent>, DomainError> {
    stored
        .iter()
        .filter(|event| {
            let known = CartEventKind::from_event_type(&event.event_type).is_some();
            if !known {
                debug!(
                    event_type = %event.event_type,
                    sequence_number = event.sequence_number,
                    "skipping unknown event type"
                );
            }
            known
        })
        .map(EventStore::<CartEvent>::decode)
        .collect()
}

/// Handles any cart command.
///
/// # Errors
///
/// Returns `DomainError::InvalidCart` if the decision rejects the command,
/// `DomainError::VersionConflict` if the stream moved after it was read,
/// `DomainError::Projection` if a subscriber failed after the append, or the
/// store's error if loading or appending fails.
#[allow(clippy::cast_possible_wrap)]
#[instrument(
    skip_all,
    fields(
        command_type = command.command_type(),
        cart_id = %command.aggregate_id(),
        correlation_id = %command.correlation_id(),
    )
)]
pub async fn handle_command(
    command: &CartCommand,
    publisher: &EventPublisher<CartEvent>,
) -> Result<CartCommandResult, DomainError> {
    let aggregate_id = command.aggregate_id();
    let stored = publisher.store().read_stored(aggregate_id).await?;
    let history = decode_history(&stored)?;

    let events = Cart::handle(command, &history)?;
    if events.is_empty() {
        debug!("command produced no events");
        return Ok(CartCommandResult {
            aggregate_id,
            stored_events: Vec::new(),
        });
    }

    let batch = AggregateEvents::new(events, stored.len() as i64)?;
    let stored_events = publisher.publish_versioned(batch).await?;

    Ok(CartCommandResult {
        aggregate_id,
        stored_events,
    })
}

/// Handles the `AddItem` command.
///
/// # Errors
///
/// See [`handle_command`].
pub async fn handle_add_item(
    command: &AddItem,
    publisher: &EventPublisher<CartEvent>,
) -> Result<CartCommandResult, DomainError> {
    handle_command(&CartCommand::AddItem(command.clone()), publisher).await
}

/// Handles the `RemoveItem` command. Removing an item the cart does not hold
/// succeeds with no events.
///
/// # Errors
///
/// See [`handle_command`].
pub async fn handle_remove_item(
    command: &RemoveItem,
    publisher: &EventPublisher<CartEvent>,
) -> Result<CartCommandResult, DomainError> {
    handle_command(&CartCommand::RemoveItem(command.clone()), publisher).await
}

/// Handles the `ValidateCart` command.
///
/// # Errors
///
/// Returns `DomainError::InvalidCart` for an empty cart; otherwise see
/// [`handle_command`].
pub async fn handle_validate_cart(
    command: &ValidateCart,
    publisher: &EventPublisher<CartEvent>,
) -> Result<CartCommandResult, DomainError> {
    handle_command(&CartCommand::ValidateCart(command.clone()), publisher).await
}
