//! # Cart Consistency Engine
//!
//! The only component that mutates carts and cart items.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    add_item("c1", "P", 3)                               │
//! │                                                                         │
//! │  validate ids + quantity          (no I/O, fails fast)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─── attempt ─────────────────────────────────────────────────────┐   │
//! │  │ BEGIN                                                           │   │
//! │  │ claim_customer("c1")        ← write lock taken here             │   │
//! │  │ fetch_product("P")          ← stock read under the lock         │   │
//! │  │ fetch_cart / fetch_items                                        │   │
//! │  │ validate: existing + 3 <= stock, distinct items <= 100          │   │
//! │  │ insert_cart? insert_item | update_item                          │   │
//! │  │ save_totals(Σ line totals)      ← version compare-and-swap      │   │
//! │  │ COMMIT                                                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ├── Ok                    ──► CartView                           │
//! │       ├── ConcurrencyConflict   ──► yield, attempt again (bounded)     │
//! │       └── any other error       ──► rolled back, returned as-is        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An error at any step drops the transaction, which rolls it back: failed
//! operations leave no partial state behind.
//!
//! ## Stock Policy
//! Stock is validated when an item is admitted or resized and never reserved.
//! Catalog stock can drop below what carts already hold; that is resolved at
//! checkout, outside this engine.

use std::future::Future;

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbError;
use crate::repository::cart::{self as cart_store, CartRepository};
use crate::repository::product::fetch_product;
use cartledger_core::cart::{cart_total, check_invariants, checked_cart_total};
use cartledger_core::validation::{
    validate_cart_size, validate_customer_id, validate_product_id, validate_quantity,
};
use cartledger_core::{Cart, CartError, CartItem, CartResult, CartView, Money};

// =============================================================================
// Configuration
// =============================================================================

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Extra attempts after a `ConcurrencyConflict` before surfacing it.
    /// Default: 3
    pub max_conflict_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_conflict_retries: 3,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the conflict retry budget.
    pub fn max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Applies cart operations atomically against the catalog.
///
/// ## Usage
/// ```rust,ignore
/// let engine = db.engine(EngineConfig::default());
///
/// let cart = engine.add_item("customer-1", "P1", 2).await?;
/// let cart = engine.update_item_quantity("customer-1", "P1", 5).await?;
/// let cart = engine.remove_item("customer-1", "P1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CartEngine {
    pool: SqlitePool,
    config: EngineConfig,
}

impl CartEngine {
    /// Creates an engine over a pool.
    pub fn new(pool: SqlitePool, config: EngineConfig) -> Self {
        CartEngine { pool, config }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Adds `quantity` units of a product, creating the cart if needed.
    ///
    /// ## Returns
    /// * `Ok(CartView)` - The cart after the add
    /// * `Err(ProductNotFound)` - Unknown product; nothing is created
    /// * `Err(InsufficientStock)` - Existing + requested exceeds stock
    /// * `Err(InvalidQuantity)` - Quantity ≤ 0, or the line or cart total
    ///   would overflow i64 cents
    /// * `Err(CartTooLarge)` - Would exceed `MAX_CART_ITEMS` distinct lines
    pub async fn add_item(
        &self,
        customer_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> CartResult<CartView> {
        validate_customer_id(customer_id)?;
        validate_product_id(product_id)?;
        validate_quantity(quantity)?;

        debug!(customer_id = %customer_id, product_id = %product_id, quantity, "add_item");

        self.with_retry("add_item", customer_id, move || {
            self.try_add_item(customer_id, product_id, quantity)
        })
        .await
    }

    /// Sets the quantity of an existing line. A quantity ≤ 0 removes it.
    ///
    /// ## Returns
    /// * `Err(CartNotFound)` / `Err(CartItemNotFound)` - Nothing to update
    /// * `Err(ProductNotFound)` - The product left the catalog
    /// * `Err(InsufficientStock)` - New quantity exceeds current stock
    pub async fn update_item_quantity(
        &self,
        customer_id: &str,
        product_id: &str,
        new_quantity: i64,
    ) -> CartResult<CartView> {
        validate_customer_id(customer_id)?;
        validate_product_id(product_id)?;

        debug!(
            customer_id = %customer_id,
            product_id = %product_id,
            new_quantity,
            "update_item_quantity"
        );

        self.with_retry("update_item_quantity", customer_id, move || {
            self.try_update_item_quantity(customer_id, product_id, new_quantity)
        })
        .await
    }

    /// Removes a line from the cart.
    ///
    /// Removing a product that is not in the cart is an error, never a
    /// silent success.
    pub async fn remove_item(&self, customer_id: &str, product_id: &str) -> CartResult<CartView> {
        validate_customer_id(customer_id)?;
        validate_product_id(product_id)?;

        debug!(customer_id = %customer_id, product_id = %product_id, "remove_item");

        self.with_retry("remove_item", customer_id, move || {
            self.try_remove_item(customer_id, product_id)
        })
        .await
    }

    /// Returns the customer's cart, or the empty-cart value if none exists.
    ///
    /// Read-only: never creates a cart row.
    pub async fn get_cart(&self, customer_id: &str) -> CartResult<CartView> {
        validate_customer_id(customer_id)?;

        self.with_retry("get_cart", customer_id, move || self.try_get_cart(customer_id))
            .await
    }

    /// Deletes the cart and all its items.
    ///
    /// Clearing a customer without a cart succeeds and changes nothing.
    pub async fn clear_cart(&self, customer_id: &str) -> CartResult<CartView> {
        validate_customer_id(customer_id)?;

        debug!(customer_id = %customer_id, "clear_cart");

        self.with_retry("clear_cart", customer_id, move || {
            self.try_clear_cart(customer_id)
        })
        .await
    }

    // =========================================================================
    // Attempts
    // =========================================================================

    async fn try_add_item(
        &self,
        customer_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> CartResult<CartView> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let has_cart = cart_store::claim_customer(&mut tx, customer_id).await?;

        let product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| CartError::ProductNotFound(product_id.to_string()))?;

        let existing = if has_cart {
            cart_store::fetch_cart(&mut tx, customer_id).await?
        } else {
            None
        };

        let mut items = match &existing {
            Some(cart) => cart_store::fetch_items(&mut tx, &cart.id).await?,
            None => Vec::new(),
        };

        let position = items.iter().position(|i| i.product_id == product_id);
        let already_in_cart = position.map_or(0, |idx| items[idx].quantity);
        let requested = already_in_cart.checked_add(quantity).ok_or_else(|| {
            CartError::invalid_quantity(quantity, "line quantity overflows")
        })?;

        if !product.has_stock_for(requested) {
            return Err(CartError::InsufficientStock {
                product_id: product_id.to_string(),
                available: product.stock_quantity,
                requested,
            });
        }

        check_line_total(product_id, product.price(), requested)?;

        if position.is_none() {
            validate_cart_size(items.len())?;
        }

        let cart = match existing {
            Some(cart) => cart,
            None => {
                let cart = Cart::new(customer_id);
                cart_store::insert_cart(&mut tx, &cart).await?;
                cart
            }
        };

        match position {
            // Merge keeps the snapshot taken when the line was first added.
            Some(idx) => {
                items[idx].set_quantity(requested);
                cart_store::update_item(&mut tx, &items[idx]).await?;
            }
            None => {
                let item = CartItem::from_product(&cart.id, &product, quantity);
                cart_store::insert_item(&mut tx, &item).await?;
                items.push(item);
            }
        }

        let total = checked_total(&items, quantity)?;
        let saved = cart_store::save_totals(&mut tx, &cart, total).await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(finish(saved, items))
    }

    async fn try_update_item_quantity(
        &self,
        customer_id: &str,
        product_id: &str,
        new_quantity: i64,
    ) -> CartResult<CartView> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let (cart, mut items, idx) = load_line(&mut tx, customer_id, product_id).await?;

        if new_quantity <= 0 {
            let removed = items.remove(idx);
            cart_store::delete_item(&mut tx, &removed.id).await?;
        } else {
            let product = fetch_product(&mut tx, product_id)
                .await?
                .ok_or_else(|| CartError::ProductNotFound(product_id.to_string()))?;

            if !product.has_stock_for(new_quantity) {
                return Err(CartError::InsufficientStock {
                    product_id: product_id.to_string(),
                    available: product.stock_quantity,
                    requested: new_quantity,
                });
            }

            // The line keeps its snapshot price.
            check_line_total(product_id, items[idx].unit_price(), new_quantity)?;

            items[idx].set_quantity(new_quantity);
            cart_store::update_item(&mut tx, &items[idx]).await?;
        }

        let total = checked_total(&items, new_quantity)?;
        let saved = cart_store::save_totals(&mut tx, &cart, total).await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(finish(saved, items))
    }

    async fn try_remove_item(&self, customer_id: &str, product_id: &str) -> CartResult<CartView> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let (cart, mut items, idx) = load_line(&mut tx, customer_id, product_id).await?;

        let removed = items.remove(idx);
        cart_store::delete_item(&mut tx, &removed.id).await?;

        let saved = cart_store::save_totals(&mut tx, &cart, cart_total(&items)).await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(finish(saved, items))
    }

    async fn try_get_cart(&self, customer_id: &str) -> CartResult<CartView> {
        let found = CartRepository::new(self.pool.clone())
            .find_by_customer(customer_id)
            .await?;

        Ok(match found {
            Some((cart, items)) => CartView::from_parts(cart, items),
            None => CartView::empty(customer_id),
        })
    }

    async fn try_clear_cart(&self, customer_id: &str) -> CartResult<CartView> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        if cart_store::claim_customer(&mut tx, customer_id).await? {
            cart_store::delete_cart(&mut tx, customer_id).await?;
            tx.commit().await.map_err(DbError::from)?;
        } else {
            tx.rollback().await.map_err(DbError::from)?;
        }

        Ok(CartView::empty(customer_id))
    }

    /// Runs `attempt` until it succeeds, fails for a non-conflict reason, or
    /// the retry budget is spent.
    async fn with_retry<F, Fut>(
        &self,
        operation: &'static str,
        customer_id: &str,
        mut attempt: F,
    ) -> CartResult<CartView>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CartResult<CartView>>,
    {
        let mut retries = 0u32;

        loop {
            match attempt().await {
                Err(err) if err.is_retryable() && retries < self.config.max_conflict_retries => {
                    retries += 1;
                    warn!(
                        operation,
                        customer_id = %customer_id,
                        retry = retries,
                        error = %err,
                        "Conflicting cart write, retrying"
                    );
                    tokio::task::yield_now().await;
                }
                result => return result,
            }
        }
    }
}

/// Locks the customer's cart and locates one of its lines.
async fn load_line(
    conn: &mut sqlx::SqliteConnection,
    customer_id: &str,
    product_id: &str,
) -> CartResult<(Cart, Vec<CartItem>, usize)> {
    let not_found = || CartError::CartNotFound(customer_id.to_string());

    if !cart_store::claim_customer(conn, customer_id).await? {
        return Err(not_found());
    }

    let cart = cart_store::fetch_cart(conn, customer_id)
        .await?
        .ok_or_else(not_found)?;

    let items = cart_store::fetch_items(conn, &cart.id).await?;

    let idx = items
        .iter()
        .position(|i| i.product_id == product_id)
        .ok_or_else(|| CartError::CartItemNotFound {
            customer_id: customer_id.to_string(),
            product_id: product_id.to_string(),
        })?;

    Ok((cart, items, idx))
}

/// Rejects quantities whose line total does not fit in i64 cents.
fn check_line_total(product_id: &str, unit_price: Money, quantity: i64) -> CartResult<()> {
    match unit_price.checked_multiply_quantity(quantity) {
        Some(_) => Ok(()),
        None => Err(CartError::invalid_quantity(
            quantity,
            format!("line total for {product_id} overflows"),
        )),
    }
}

/// Sums the cart, rejecting a mutation whose total leaves the i64 cents range.
fn checked_total(items: &[CartItem], quantity: i64) -> CartResult<Money> {
    checked_cart_total(items)
        .ok_or_else(|| CartError::invalid_quantity(quantity, "cart total overflows"))
}

fn finish(cart: Cart, items: Vec<CartItem>) -> CartView {
    debug_assert!(
        check_invariants(cart.total(), &items).is_ok(),
        "cart {} failed invariant check",
        cart.id
    );

    debug!(
        cart_id = %cart.id,
        version = cart.version,
        total_cents = cart.total_cents,
        items = items.len(),
        "Cart committed"
    );

    CartView::from_parts(cart, items)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use cartledger_core::{Product, ValidationError};

    async fn setup() -> (Database, CartEngine) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&Product::new("P1", "Widget", 1000, 5))
            .await
            .unwrap();
        let engine = db.engine(EngineConfig::default());
        (db, engine)
    }

    #[test]
    fn test_config_default() {
        assert_eq!(EngineConfig::default().max_conflict_retries, 3);
        assert_eq!(EngineConfig::new().max_conflict_retries(7).max_conflict_retries, 7);
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let (_db, engine) = setup().await;

        let cart = engine.add_item("c1", "P1", 2).await.unwrap();
        assert_eq!(cart.total_cents, 2000);
        assert_eq!(cart.items.len(), 1);

        let fetched = engine.get_cart("c1").await.unwrap();
        assert_eq!(fetched.id, cart.id);
        assert_eq!(fetched.total_cents, 2000);
        assert_eq!(fetched.item("P1").map(|i| i.quantity), Some(2));
    }

    #[tokio::test]
    async fn test_rejects_malformed_input_before_io() {
        let (_db, engine) = setup().await;

        assert!(matches!(
            engine.add_item("", "P1", 1).await,
            Err(CartError::Validation(ValidationError::Required { .. }))
        ));
        assert!(matches!(
            engine.add_item("c1", "P1", 0).await,
            Err(CartError::InvalidQuantity { quantity: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_large_quantities_are_bounded_by_stock_only() {
        let (db, engine) = setup().await;
        db.products().adjust_stock("P1", 4995).await.unwrap();

        let cart = engine.add_item("c1", "P1", 1000).await.unwrap();
        assert_eq!(cart.total_cents, 1_000_000);

        let cart = engine.add_item("c1", "P1", 600).await.unwrap();
        assert_eq!(cart.item("P1").map(|i| i.quantity), Some(1600));

        let cart = engine.update_item_quantity("c1", "P1", 5000).await.unwrap();
        assert_eq!(cart.total_cents, 5_000_000);

        assert!(matches!(
            engine.update_item_quantity("c1", "P1", 5001).await,
            Err(CartError::InsufficientStock { available: 5000, requested: 5001, .. })
        ));
    }

    #[tokio::test]
    async fn test_update_without_cart_reports_missing_cart_first() {
        let (_db, engine) = setup().await;

        assert_eq!(
            engine.update_item_quantity("nocart", "P1", 1000).await,
            Err(CartError::CartNotFound("nocart".into()))
        );
    }

    #[tokio::test]
    async fn test_cart_total_overflow_is_a_typed_error() {
        let (db, engine) = setup().await;
        let big = i64::MAX / 2 + 1;
        db.products().insert(&Product::new("A", "Gold bar", big, 10)).await.unwrap();
        db.products().insert(&Product::new("B", "Platinum bar", big, 10)).await.unwrap();

        engine.add_item("c1", "A", 1).await.unwrap();
        let err = engine.add_item("c1", "B", 1).await.unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity { quantity: 1, .. }));

        // The rejected add rolled back.
        let cart = engine.get_cart("c1").await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_cents, big);
    }

    #[tokio::test]
    async fn test_clear_without_cart_is_noop() {
        let (_db, engine) = setup().await;

        let cleared = engine.clear_cart("c1").await.unwrap();
        assert!(cleared.is_empty_value());
        assert!(engine.get_cart("c1").await.unwrap().is_empty_value());
    }
}
