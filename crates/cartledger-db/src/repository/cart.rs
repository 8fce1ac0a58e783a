//! # Cart Repository
//!
//! Storage for carts and cart items.
//!
//! Reads go through [`CartRepository`]. Writes are free functions over a
//! `&mut SqliteConnection` so the engine can run them inside its transaction:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Engine Transaction                               │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   ├── claim_customer()   UPDATE carts SET version = version ...        │
//! │   │                      (takes the write lock before any read)        │
//! │   ├── fetch_cart() / insert_cart()                                     │
//! │   ├── fetch_items()                                                    │
//! │   ├── insert_item() | update_item() | delete_item()                    │
//! │   └── save_totals()      UPDATE ... WHERE id = ? AND version = ?       │
//! │  COMMIT                  (zero rows → StaleVersion → retried)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use cartledger_core::{Cart, CartItem, Money};

const CART_COLUMNS: &str = "id, customer_id, total_cents, version, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, cart_id, product_id, product_name, product_price_cents, \
                            quantity, subtotal_cents, created_at, updated_at";

/// Read-only access to carts.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Loads a customer's cart and its items from one consistent snapshot.
    ///
    /// Returns `None` when the customer has no cart. Never writes.
    pub async fn find_by_customer(
        &self,
        customer_id: &str,
    ) -> DbResult<Option<(Cart, Vec<CartItem>)>> {
        // A read transaction keeps the cart row and the item rows in step
        // with each other while a writer commits.
        let mut tx = self.pool.begin().await?;

        let Some(cart) = fetch_cart(&mut tx, customer_id).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let items = fetch_items(&mut tx, &cart.id).await?;
        tx.commit().await?;

        Ok(Some((cart, items)))
    }

    /// Counts carts (for health and seeding output).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-scoped Operations
// =============================================================================

/// Touches the customer's cart row so the transaction holds the write lock.
///
/// Returns whether a cart row exists. Must be the first statement of a
/// mutating transaction.
pub async fn claim_customer(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE carts SET version = version WHERE customer_id = ?1")
        .bind(customer_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Fetches the cart row for a customer.
pub async fn fetch_cart(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<Option<Cart>> {
    let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE customer_id = ?1");

    let cart = sqlx::query_as::<_, Cart>(&sql)
        .bind(customer_id)
        .fetch_optional(conn)
        .await?;

    Ok(cart)
}

/// Inserts a new, empty cart.
///
/// A concurrent creator for the same customer surfaces as a
/// `UniqueViolation` on `carts.customer_id`, which callers treat as a
/// conflict.
pub async fn insert_cart(conn: &mut SqliteConnection, cart: &Cart) -> DbResult<()> {
    debug!(cart_id = %cart.id, customer_id = %cart.customer_id, "Creating cart");

    sqlx::query(
        r#"
        INSERT INTO carts (id, customer_id, total_cents, version, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&cart.id)
    .bind(&cart.customer_id)
    .bind(cart.total_cents)
    .bind(cart.version)
    .bind(cart.created_at)
    .bind(cart.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetches a cart's items in insertion order.
pub async fn fetch_items(conn: &mut SqliteConnection, cart_id: &str) -> DbResult<Vec<CartItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = ?1 ORDER BY created_at, id"
    );

    let items = sqlx::query_as::<_, CartItem>(&sql)
        .bind(cart_id)
        .fetch_all(conn)
        .await?;

    Ok(items)
}

/// Inserts a new cart line.
pub async fn insert_item(conn: &mut SqliteConnection, item: &CartItem) -> DbResult<()> {
    debug!(
        cart_id = %item.cart_id,
        product_id = %item.product_id,
        quantity = item.quantity,
        "Inserting cart item"
    );

    sqlx::query(
        r#"
        INSERT INTO cart_items (
            id, cart_id, product_id, product_name, product_price_cents,
            quantity, subtotal_cents, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item.id)
    .bind(&item.cart_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(item.product_price_cents)
    .bind(item.quantity)
    .bind(item.subtotal_cents)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Writes a line's quantity and subtotal. The snapshot columns are untouched.
pub async fn update_item(conn: &mut SqliteConnection, item: &CartItem) -> DbResult<()> {
    debug!(
        item_id = %item.id,
        quantity = item.quantity,
        subtotal_cents = item.subtotal_cents,
        "Updating cart item"
    );

    let result = sqlx::query(
        "UPDATE cart_items SET quantity = ?2, subtotal_cents = ?3, updated_at = ?4 WHERE id = ?1",
    )
    .bind(&item.id)
    .bind(item.quantity)
    .bind(item.subtotal_cents)
    .bind(item.updated_at)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("CartItem", &item.id));
    }

    Ok(())
}

/// Deletes one cart line.
pub async fn delete_item(conn: &mut SqliteConnection, item_id: &str) -> DbResult<()> {
    debug!(item_id = %item_id, "Deleting cart item");

    let result = sqlx::query("DELETE FROM cart_items WHERE id = ?1")
        .bind(item_id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("CartItem", item_id));
    }

    Ok(())
}

/// Stores a recomputed total with a compare-and-swap on `version`.
///
/// ## Returns
/// * `Ok(Cart)` - The cart row as committed (version bumped)
/// * `Err(DbError::StaleVersion)` - Another writer got there first
pub async fn save_totals(conn: &mut SqliteConnection, cart: &Cart, total: Money) -> DbResult<Cart> {
    debug!(
        cart_id = %cart.id,
        version = cart.version,
        total_cents = total.cents(),
        "Saving cart totals"
    );

    let sql = format!(
        "UPDATE carts SET total_cents = ?3, version = version + 1, updated_at = ?4 \
         WHERE id = ?1 AND version = ?2 RETURNING {CART_COLUMNS}"
    );

    sqlx::query_as::<_, Cart>(&sql)
        .bind(&cart.id)
        .bind(cart.version)
        .bind(total.cents())
        .bind(Utc::now())
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::StaleVersion {
            entity: "Cart".to_string(),
            id: cart.id.clone(),
            expected: cart.version,
        })
}

/// Deletes a cart and all of its items. Returns whether a cart existed.
pub async fn delete_cart(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<bool> {
    debug!(customer_id = %customer_id, "Deleting cart");

    sqlx::query(
        "DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE customer_id = ?1)",
    )
    .bind(customer_id)
    .execute(&mut *conn)
    .await?;

    let result = sqlx::query("DELETE FROM carts WHERE customer_id = ?1")
        .bind(customer_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use cartledger_core::Product;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&Product::new("P1", "Widget", 1000, 10))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_find_missing_cart_is_none() {
        let db = setup().await;
        assert!(db.carts().find_by_customer("c1").await.unwrap().is_none());
        assert_eq!(db.carts().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cart_lifecycle_in_transaction() {
        let db = setup().await;
        let product = db.products().get_by_id("P1").await.unwrap().unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert!(!claim_customer(&mut tx, "c1").await.unwrap());

        let cart = Cart::new("c1");
        insert_cart(&mut tx, &cart).await.unwrap();
        assert!(claim_customer(&mut tx, "c1").await.unwrap());

        let item = CartItem::from_product(&cart.id, &product, 2);
        insert_item(&mut tx, &item).await.unwrap();

        let saved = save_totals(&mut tx, &cart, Money::from_cents(2000))
            .await
            .unwrap();
        assert_eq!(saved.version, 1);
        assert_eq!(saved.total_cents, 2000);
        tx.commit().await.unwrap();

        let (stored, items) = db.carts().find_by_customer("c1").await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 2000);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, item.id);
        assert_eq!(items[0].product_name, "Widget");
        assert_eq!(items[0].subtotal_cents, 2000);
    }

    #[tokio::test]
    async fn test_save_totals_rejects_stale_version() {
        let db = setup().await;

        let mut tx = db.pool().begin().await.unwrap();
        let cart = Cart::new("c1");
        insert_cart(&mut tx, &cart).await.unwrap();
        save_totals(&mut tx, &cart, Money::zero()).await.unwrap();

        // `cart` still carries version 0.
        let err = save_totals(&mut tx, &cart, Money::zero()).await.unwrap_err();
        assert!(matches!(err, DbError::StaleVersion { expected: 0, .. }));
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_duplicate_cart_is_conflict() {
        let db = setup().await;

        let mut tx = db.pool().begin().await.unwrap();
        insert_cart(&mut tx, &Cart::new("c1")).await.unwrap();
        let err = insert_cart(&mut tx, &Cart::new("c1")).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_duplicate_item_is_rejected() {
        let db = setup().await;
        let product = db.products().get_by_id("P1").await.unwrap().unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let cart = Cart::new("c1");
        insert_cart(&mut tx, &cart).await.unwrap();
        insert_item(&mut tx, &CartItem::from_product(&cart.id, &product, 1))
            .await
            .unwrap();

        let err = insert_item(&mut tx, &CartItem::from_product(&cart.id, &product, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_cart_removes_items() {
        let db = setup().await;
        let product = db.products().get_by_id("P1").await.unwrap().unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let cart = Cart::new("c1");
        insert_cart(&mut tx, &cart).await.unwrap();
        insert_item(&mut tx, &CartItem::from_product(&cart.id, &product, 1))
            .await
            .unwrap();

        assert!(delete_cart(&mut tx, "c1").await.unwrap());
        assert!(fetch_items(&mut tx, &cart.id).await.unwrap().is_empty());
        assert!(!delete_cart(&mut tx, "c1").await.unwrap());
        tx.commit().await.unwrap();

        assert!(db.carts().find_by_customer("c1").await.unwrap().is_none());
    }
}
