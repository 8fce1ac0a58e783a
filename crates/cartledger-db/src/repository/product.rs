//! # Product Repository
//!
//! The catalog store: product rows and their stock level.
//!
//! ## Key Operations
//! - Catalog admin (insert, update, list, count)
//! - Point lookups, also usable inside an engine transaction
//! - Atomic conditional stock adjustment
//!
//! ## Stock Adjustment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    adjust_stock(id, delta)                              │
//! │                                                                         │
//! │  UPDATE products                                                       │
//! │     SET stock_quantity = stock_quantity + delta                        │
//! │   WHERE id = ? AND stock_quantity + delta >= 0                         │
//! │  RETURNING *                                                           │
//! │       │                                                                 │
//! │       ├── row returned ──► Ok(updated product)                         │
//! │       │                                                                 │
//! │       └── no row ──► get_by_id(id)                                     │
//! │                        ├── None      ──► DbError::NotFound             │
//! │                        └── Some(p)   ──► DbError::StockUnderflow       │
//! │                                                                         │
//! │  One statement: two concurrent callers can never both pass the check  │
//! │  against the same stale value.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use cartledger_core::validation::{
    validate_price_cents, validate_product_id, validate_product_name, validate_stock_quantity,
};
use cartledger_core::Product;

const PRODUCT_COLUMNS: &str = "id, name, price_cents, stock_quantity, created_at, updated_at";

/// Generates a fresh product id.
pub fn generate_product_id() -> String {
    format!("prod_{}", Uuid::new_v4().simple())
}

/// Reads a product on an existing connection or transaction.
///
/// The engine calls this inside its transaction so that stock is validated
/// against the same snapshot the cart writes commit on.
pub async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(product)
}

/// Repository for catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.get_by_id("P1").await?;
/// let restocked = repo.adjust_stock("P1", 10).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products ordered by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id LIMIT ?1");

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The inserted product
    /// * `Err(DbError::Invalid)` - Bad id, name, price or stock
    /// * `Err(DbError::UniqueViolation)` - Id already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        validate_product_id(&product.id)?;
        validate_product_name(&product.name)?;
        validate_price_cents(product.price_cents)?;
        validate_stock_quantity(product.stock_quantity)?;

        debug!(id = %product.id, name = %product.name, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock_quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(product.clone()),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => Err(DbError::duplicate(field, &product.id)),
                other => Err(other),
            },
        }
    }

    /// Updates name, price and stock of an existing product.
    ///
    /// Existing cart lines keep the name and price they were created with.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product after the update
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        validate_product_name(&product.name)?;
        validate_price_cents(product.price_cents)?;
        validate_stock_quantity(product.stock_quantity)?;

        debug!(id = %product.id, "Updating product");

        let sql = format!(
            "UPDATE products SET name = ?2, price_cents = ?3, stock_quantity = ?4, updated_at = ?5 \
             WHERE id = ?1 RETURNING {PRODUCT_COLUMNS}"
        );

        sqlx::query_as::<_, Product>(&sql)
            .bind(&product.id)
            .bind(&product.name)
            .bind(product.price_cents)
            .bind(product.stock_quantity)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &product.id))
    }

    /// Atomically adds `delta` to the stock level if the result stays ≥ 0.
    ///
    /// ## Arguments
    /// * `id` - Product ID
    /// * `delta` - Change in stock (negative to consume, positive to restock)
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product with the new stock level
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::StockUnderflow)` - Would go negative; nothing written
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        debug!(product_id = %id, delta, "Adjusting stock");

        let sql = format!(
            "UPDATE products SET stock_quantity = stock_quantity + ?2, updated_at = ?3 \
             WHERE id = ?1 AND stock_quantity + ?2 >= 0 RETURNING {PRODUCT_COLUMNS}"
        );

        let updated = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(delta)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(product) = updated {
            debug!(product_id = %id, stock = product.stock_quantity, "Stock adjusted");
            return Ok(product);
        }

        match self.get_by_id(id).await? {
            None => Err(DbError::not_found("Product", id)),
            Some(current) => {
                debug!(
                    product_id = %id,
                    available = current.stock_quantity,
                    delta,
                    "Stock adjustment rejected"
                );
                Err(DbError::StockUnderflow {
                    product_id: id.to_string(),
                    available: current.stock_quantity,
                    delta,
                })
            }
        }
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> ProductRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = setup().await;
        let product = Product::new("P1", "Widget", 1000, 5);

        repo.insert(&product).await.unwrap();

        let fetched = repo.get_by_id("P1").await.unwrap().unwrap();
        assert_eq!(fetched.name, "Widget");
        assert_eq!(fetched.price_cents, 1000);
        assert_eq!(fetched.stock_quantity, 5);
        assert_eq!(repo.count().await.unwrap(), 1);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_and_duplicate() {
        let repo = setup().await;

        let negative = Product::new("P1", "Widget", -1, 5);
        assert!(matches!(repo.insert(&negative).await, Err(DbError::Invalid(_))));

        let product = Product::new("P1", "Widget", 100, 5);
        repo.insert(&product).await.unwrap();
        let err = repo.insert(&product).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(!err.is_conflict());
    }

    #[tokio::test]
    async fn test_update() {
        let repo = setup().await;
        let mut product = Product::new("P1", "Widget", 1000, 5);
        repo.insert(&product).await.unwrap();

        product.price_cents = 1200;
        product.name = "Widget v2".into();
        let stored = repo.update(&product).await.unwrap();
        assert_eq!(stored.price_cents, 1200);
        assert_eq!(stored.name, "Widget v2");

        let ghost = Product::new("nope", "Ghost", 1, 1);
        assert!(matches!(
            repo.update(&ghost).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let repo = setup().await;
        repo.insert(&Product::new("P1", "Widget", 1000, 5)).await.unwrap();

        let p = repo.adjust_stock("P1", -3).await.unwrap();
        assert_eq!(p.stock_quantity, 2);

        let p = repo.adjust_stock("P1", 10).await.unwrap();
        assert_eq!(p.stock_quantity, 12);

        let p = repo.adjust_stock("P1", -12).await.unwrap();
        assert_eq!(p.stock_quantity, 0);
    }

    #[tokio::test]
    async fn test_adjust_stock_underflow_leaves_stock_unchanged() {
        let repo = setup().await;
        repo.insert(&Product::new("P1", "Widget", 1000, 2)).await.unwrap();

        let err = repo.adjust_stock("P1", -3).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::StockUnderflow {
                available: 2,
                delta: -3,
                ..
            }
        ));

        let p = repo.get_by_id("P1").await.unwrap().unwrap();
        assert_eq!(p.stock_quantity, 2);

        assert!(matches!(
            repo.adjust_stock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_orders_by_name() {
        let repo = setup().await;
        repo.insert(&Product::new("B", "Banana", 50, 1)).await.unwrap();
        repo.insert(&Product::new("A", "Apple", 40, 1)).await.unwrap();

        let products = repo.list(10).await.unwrap();
        let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Banana"]);

        assert_eq!(repo.list(1).await.unwrap().len(), 1);
    }

    #[test]
    fn test_generated_ids_are_valid() {
        let id = generate_product_id();
        assert!(validate_product_id(&id).is_ok());
        assert_ne!(id, generate_product_id());
    }
}
