//! # Error Types
//!
//! The error taxonomy shared by the stores, the consistency engine and the
//! HTTP binding.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cartledger-core errors (this file)                                    │
//! │  ├── CartError        - Everything the engine can return               │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  cartledger-db errors (separate crate)                                 │
//! │  └── DbError          - Storage failures, mapped into CartError        │
//! │                                                                         │
//! │  cart-api errors (in app)                                              │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CartError ← DbError ; CartError → ApiError    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Carry identifiers and quantities, so callers never re-derive them
//! 3. Errors are enum variants, never String
//! 4. Only `ConcurrencyConflict` is retryable

use thiserror::Error;

// =============================================================================
// Cart Error
// =============================================================================

/// Errors returned by cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The referenced product does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The customer has no cart.
    #[error("Cart not found for customer {0}")]
    CartNotFound(String),

    /// The customer's cart does not contain the product.
    #[error("Product {product_id} is not in the cart of customer {customer_id}")]
    CartItemNotFound {
        customer_id: String,
        product_id: String,
    },

    /// The requested total quantity exceeds current stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart holds 5 × P, stock is 5
    ///      │
    ///      ▼
    /// add_item(P, 1) → requested total 6
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "P", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// UI shows: "Only 5 left in stock"
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Quantity is not a positive integer, or its totals overflow.
    #[error("Invalid quantity {quantity}: {reason}")]
    InvalidQuantity { quantity: i64, reason: String },

    /// Adding another distinct product would exceed the cart size limit.
    #[error("Cart cannot have more than {max} distinct items")]
    CartTooLarge { max: usize },

    /// A concurrent mutation on the same cart won the race.
    ///
    /// The engine retries these internally; callers only see one once the
    /// retry budget is spent, and may retry again.
    #[error("Concurrent modification, please retry: {0}")]
    ConcurrencyConflict(String),

    /// Unexpected storage failure (I/O, connectivity). Not retried.
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// Malformed identifier, name or price.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CartError {
    /// Creates an `InvalidQuantity` error.
    pub fn invalid_quantity(quantity: i64, reason: impl Into<String>) -> Self {
        CartError::InvalidQuantity {
            quantity,
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CartError::ConcurrencyConflict(_))
    }

    /// Whether the failure was caused by the request rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            CartError::ConcurrencyConflict(_) | CartError::StorageFailure(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CartError.
pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CartError::InsufficientStock {
            product_id: "P-1".to_string(),
            available: 5,
            requested: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for P-1: available 5, requested 6"
        );
    }

    #[test]
    fn test_validation_converts_to_cart_error() {
        let validation_err = ValidationError::Required {
            field: "customer_id".to_string(),
        };
        let err: CartError = validation_err.into();
        assert!(matches!(err, CartError::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: customer_id is required");
    }

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(CartError::ConcurrencyConflict("cart v3".into()).is_retryable());
        assert!(!CartError::StorageFailure("disk".into()).is_retryable());
        assert!(!CartError::ProductNotFound("999".into()).is_retryable());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(CartError::CartNotFound("1".into()).is_client_error());
        assert!(CartError::invalid_quantity(0, "must be positive").is_client_error());
        assert!(!CartError::StorageFailure("io".into()).is_client_error());
        assert!(!CartError::ConcurrencyConflict("x".into()).is_client_error());
    }
}
