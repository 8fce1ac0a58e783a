//! # Domain Types
//!
//! The three persisted entities: catalog products, carts and cart items.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────────┐  │
//! │  │    Product      │   │      Cart       │   │      CartItem        │  │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────────  │  │
//! │  │  id             │   │  id (UUID)      │◄──│  cart_id (FK)        │  │
//! │  │  name           │   │  customer_id    │   │  product_id (FK)     │  │
//! │  │  price_cents    │   │  total_cents    │   │  product_name  ❄     │  │
//! │  │  stock_quantity │   │  version        │   │  product_price ❄     │  │
//! │  └─────────────────┘   └─────────────────┘   │  quantity, subtotal  │  │
//! │                                              └──────────────────────┘  │
//! │  ❄ = snapshot frozen at first add                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// Owned by the catalog store. The cart engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Stable identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Price in cents.
    pub price_cents: i64,

    /// Units currently available for sale.
    pub stock_quantity: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price_cents: i64,
        stock_quantity: i64,
    ) -> Self {
        let now = Utc::now();
        Product {
            id: id.into(),
            name: name.into(),
            price_cents,
            stock_quantity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether `quantity` units can be admitted into a cart right now.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        quantity <= self.stock_quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A customer's cart row.
///
/// At most one per customer. `total_cents` is derived and always equals the
/// sum of the item subtotals after any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    pub id: String,
    pub customer_id: String,
    pub total_cents: i64,
    /// Bumped on every committed mutation; writes compare-and-swap on it.
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a customer.
    pub fn new(customer_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Cart {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            total_cents: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// One product line in a cart.
///
/// ## Snapshot Pattern
/// `product_name` and `product_price_cents` are copied from the catalog when
/// the line is first created. Later catalog price changes do not reach an
/// existing line; merging more units into it keeps the original snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    /// Product name at time of first add (frozen).
    pub product_name: String,
    /// Unit price in cents at time of first add (frozen).
    pub product_price_cents: i64,
    /// Always > 0 while persisted.
    pub quantity: i64,
    /// product_price_cents × quantity.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a cart line from a product, freezing its name and price.
    pub fn from_product(cart_id: &str, product: &Product, quantity: i64) -> Self {
        let now = Utc::now();
        CartItem {
            id: Uuid::new_v4().to_string(),
            cart_id: cart_id.to_string(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            product_price_cents: product.price_cents,
            quantity,
            subtotal_cents: product.price().multiply_quantity(quantity).cents(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the quantity and recomputes the subtotal from the snapshot price.
    pub fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.subtotal_cents = self.line_total().cents();
        self.updated_at = Utc::now();
    }

    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.product_price_cents)
    }

    /// Computes the subtotal fresh from price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    /// Returns the stored subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
