//! Catalog endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use cartledger_core::Product;
use cartledger_db::{generate_product_id, DbError};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

const DEFAULT_LIST_LIMIT: u32 = 100;
const MAX_LIST_LIMIT: u32 = 1000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", get(get_product))
        .route("/:id/stock", post(adjust_stock))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    /// Generated when absent.
    pub id: Option<String>,
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub stock_quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(body) = body?;

    let id = body.id.unwrap_or_else(generate_product_id);
    let product = Product::new(id, body.name, body.price_cents, body.stock_quantity);

    let created = state.db.products().insert(&product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Product>>> {
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .min(MAX_LIST_LIMIT);

    Ok(Json(state.db.products().list(limit).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::from(DbError::not_found("Product", &id)))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AdjustStockRequest>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(body) = body?;
    Ok(Json(state.db.products().adjust_stock(&id, body.delta).await?))
}
