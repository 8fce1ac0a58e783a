//! HTTP error mapping.
//!
//! Every failure leaves the server as `{ "code", "message", "details" }`:
//!
//! ```text
//! CartError::InsufficientStock ──► 409 {"code":"insufficient_stock",
//!                                       "details":{"productId":"P",
//!                                                  "available":5,
//!                                                  "requested":6}}
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use cartledger_core::CartError;
use cartledger_db::DbError;

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "code": self.code,
                "message": self.message,
                "details": self.details,
            })),
        )
            .into_response()
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        let message = err.to_string();

        if !err.is_client_error() {
            error!(error = %message, "Cart operation failed");
        }

        match err {
            CartError::ProductNotFound(product_id) => {
                ApiError::new(StatusCode::NOT_FOUND, "product_not_found", message)
                    .with_details(json!({ "productId": product_id }))
            }
            CartError::CartNotFound(customer_id) => {
                ApiError::new(StatusCode::NOT_FOUND, "cart_not_found", message)
                    .with_details(json!({ "customerId": customer_id }))
            }
            CartError::CartItemNotFound {
                customer_id,
                product_id,
            } => ApiError::new(StatusCode::NOT_FOUND, "cart_item_not_found", message)
                .with_details(json!({ "customerId": customer_id, "productId": product_id })),
            CartError::InsufficientStock {
                product_id,
                available,
                requested,
            } => ApiError::new(StatusCode::CONFLICT, "insufficient_stock", message).with_details(
                json!({
                    "productId": product_id,
                    "available": available,
                    "requested": requested,
                }),
            ),
            CartError::InvalidQuantity { quantity, .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_quantity", message)
                    .with_details(json!({ "quantity": quantity }))
            }
            CartError::CartTooLarge { max } => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "cart_too_large", message)
                    .with_details(json!({ "maxItems": max }))
            }
            CartError::ConcurrencyConflict(_) => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "concurrency_conflict", message)
                    .with_details(json!({ "retryable": true }))
            }
            CartError::StorageFailure(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_failure",
                "storage failure",
            ),
            CartError::Validation(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "validation_error", message)
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ApiError::new(StatusCode::NOT_FOUND, "not_found", format!("{entity} not found: {id}"))
                    .with_details(json!({ "entity": entity, "id": id }))
            }
            DbError::UniqueViolation { field, value } => {
                ApiError::new(StatusCode::CONFLICT, "duplicate", format!("{value} already exists"))
                    .with_details(json!({ "field": field, "value": value }))
            }
            DbError::StockUnderflow {
                product_id,
                available,
                delta,
            } => ApiError::new(
                StatusCode::CONFLICT,
                "insufficient_stock",
                format!("stock for {product_id} would go negative"),
            )
            .with_details(json!({
                "productId": product_id,
                "available": available,
                "delta": delta,
            })),
            // Busy, stale version and validation follow the cart taxonomy.
            other => CartError::from(other).into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), "invalid_body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "bad_request", rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CartError::ProductNotFound("P".into()), StatusCode::NOT_FOUND),
            (CartError::CartNotFound("c".into()), StatusCode::NOT_FOUND),
            (
                CartError::InsufficientStock {
                    product_id: "P".into(),
                    available: 5,
                    requested: 6,
                },
                StatusCode::CONFLICT,
            ),
            (CartError::invalid_quantity(0, "zero"), StatusCode::BAD_REQUEST),
            (CartError::CartTooLarge { max: 100 }, StatusCode::UNPROCESSABLE_ENTITY),
            (
                CartError::ConcurrencyConflict("busy".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CartError::StorageFailure("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_storage_detail_is_not_leaked() {
        let err = ApiError::from(CartError::StorageFailure("/var/db: disk I/O error".into()));
        assert!(!err.message.contains("/var/db"));
    }

    #[test]
    fn test_db_conflict_maps_to_unavailable() {
        let err = ApiError::from(DbError::Busy("database is locked".into()));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code, "concurrency_conflict");
    }
}
