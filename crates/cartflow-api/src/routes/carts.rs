//! Routes for the cart bounded context.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use cartflow_cart::application::command_handlers::{self, CartCommandResult};
use cartflow_cart::application::projections::CartSummary;
use cartflow_cart::application::query_handlers::{self, CartView};
use cartflow_cart::domain::commands;
use cartflow_cart::domain::events::Item;
use cartflow_core::error::DomainError;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{cart_id}/items.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Identifier of the item to add.
    pub item_id: String,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The cart the command was addressed to.
    pub aggregate_id: Uuid,
    /// IDs of the domain events produced and persisted. Empty for a no-op.
    pub event_ids: Vec<Uuid>,
}

impl From<CartCommandResult> for CommandResponse {
    fn from(result: CartCommandResult) -> Self {
        Self {
            aggregate_id: result.aggregate_id,
            event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
        }
    }
}

fn parse_item(item_id: String) -> Result<Item, ApiError> {
    if item_id.trim().is_empty() {
        return Err(DomainError::Validation("item_id must not be empty".into()).into());
    }
    Ok(Item::from(item_id))
}

/// POST /{cart_id}/items
#[instrument(skip(state, request), fields(item_id = %request.item_id))]
async fn add_item(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::AddItem {
        correlation_id: Uuid::new_v4(),
        cart_id,
        item: parse_item(request.item_id)?,
    };

    info!(correlation_id = %command.correlation_id, "handling add_item command");

    let result = command_handlers::handle_add_item(&command, &state.publisher).await?;
    Ok(Json(result.into()))
}

/// DELETE /{cart_id}/items/{item_id}
#[instrument(skip(state))]
async fn remove_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(Uuid, String)>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RemoveItem {
        correlation_id: Uuid::new_v4(),
        cart_id,
        item: parse_item(item_id)?,
    };

    info!(correlation_id = %command.correlation_id, "handling remove_item command");

    let result = command_handlers::handle_remove_item(&command, &state.publisher).await?;
    Ok(Json(result.into()))
}

/// POST /{cart_id}/validate
#[instrument(skip(state))]
async fn validate_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ValidateCart {
        correlation_id: Uuid::new_v4(),
        cart_id,
    };

    info!(correlation_id = %command.correlation_id, "handling validate_cart command");

    let result = command_handlers::handle_validate_cart(&command, &state.publisher).await?;
    Ok(Json(result.into()))
}

/// GET /{cart_id}
#[instrument(skip(state))]
async fn get_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> Result<Json<CartView>, ApiError> {
    let view = query_handlers::get_cart_by_id(cart_id, state.store()).await?;
    Ok(Json(view))
}

/// GET /{cart_id}/summary
#[instrument(skip(state))]
async fn get_cart_summary(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> Result<Json<CartSummary>, ApiError> {
    let summary = state.cart_summary.get_cart_summary(cart_id).await?;
    Ok(Json(summary))
}

/// Returns the router for the cart context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{cart_id}", get(get_cart))
        .route("/{cart_id}/items", post(add_item))
        .route("/{cart_id}/items/{item_id}", delete(remove_item))
        .route("/{cart_id}/validate", post(validate_cart))
        .route("/{cart_id}/summary", get(get_cart_summary))
}
