//! Cart endpoints. Each handler is one engine call.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Number};

use cartledger_core::CartView;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:customer_id", get(get_cart).delete(clear_cart))
        .route("/:customer_id/items", post(add_item))
        .route(
            "/:customer_id/items/:product_id",
            delete(remove_item).put(update_item_quantity),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: Number,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub quantity: Number,
}

/// Quantities arrive as any JSON number; fractions are an `invalid_quantity`
/// error rather than a malformed body.
fn whole_quantity(raw: &Number) -> ApiResult<i64> {
    raw.as_i64().ok_or_else(|| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_quantity",
            format!("Invalid quantity {raw}: quantity must be an integer"),
        )
        .with_details(json!({ "quantity": raw }))
    })
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    body: Result<Json<AddItemRequest>, JsonRejection>,
) -> ApiResult<Json<CartView>> {
    let Json(body) = body?;
    let quantity = whole_quantity(&body.quantity)?;

    let cart = state
        .engine
        .add_item(&customer_id, &body.product_id, quantity)
        .await?;

    Ok(Json(cart))
}

pub async fn get_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<CartView>> {
    Ok(Json(state.engine.get_cart(&customer_id).await?))
}

pub async fn update_item_quantity(
    State(state): State<AppState>,
    Path((customer_id, product_id)): Path<(String, String)>,
    body: Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> ApiResult<Json<CartView>> {
    let Json(body) = body?;
    let quantity = whole_quantity(&body.quantity)?;

    let cart = state
        .engine
        .update_item_quantity(&customer_id, &product_id, quantity)
        .await?;

    Ok(Json(cart))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path((customer_id, product_id)): Path<(String, String)>,
) -> ApiResult<Json<CartView>> {
    Ok(Json(state.engine.remove_item(&customer_id, &product_id).await?))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<CartView>> {
    Ok(Json(state.engine.clear_cart(&customer_id).await?))
}
