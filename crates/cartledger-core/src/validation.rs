//! # Validation Module
//!
//! Input validation for cart and catalog operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP binding (cart-api)                                      │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine / repositories                                        │
//! │  └── THIS MODULE: identifiers, names, prices, quantities               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity > 0), CHECK (stock_quantity >= 0)                 │
//! │  └── UNIQUE (customer_id), UNIQUE (cart_id, product_id)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CartError, ValidationError};
use crate::MAX_CART_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum identifier length for customers and products.
pub const MAX_ID_LEN: usize = 64;

// =============================================================================
// Identifier Validators
// =============================================================================

fn validate_identifier(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer identifier.
///
/// ```rust
/// use cartledger_core::validation::validate_customer_id;
///
/// assert!(validate_customer_id("1").is_ok());
/// assert!(validate_customer_id("").is_err());
/// assert!(validate_customer_id("a b").is_err());
/// ```
pub fn validate_customer_id(id: &str) -> ValidationResult<()> {
    validate_identifier("customer_id", id)
}

/// Validates a product identifier.
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    validate_identifier("product_id", id)
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a product name (1 to 200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
///
/// ```rust
/// use cartledger_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an absolute stock level.
pub fn validate_stock_quantity(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock_quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Cart Validators
// =============================================================================

/// Validates a quantity to be placed in a cart.
///
/// The only upper bound on a quantity is the product's stock, checked by
/// the engine against the live catalog.
///
/// Unlike the other validators this yields `CartError::InvalidQuantity`
/// directly, since quantity errors are their own kind in the taxonomy.
pub fn validate_quantity(qty: i64) -> Result<(), CartError> {
    if qty <= 0 {
        return Err(CartError::invalid_quantity(qty, "quantity must be positive"));
    }

    Ok(())
}

/// Validates cart size before adding a new distinct item.
pub fn validate_cart_size(current_items: usize) -> Result<(), CartError> {
    if current_items >= MAX_CART_ITEMS {
        return Err(CartError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
