//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CartError (engine boundary)                                           │
//! │   ├── Busy / StaleVersion / cart UniqueViolation → ConcurrencyConflict │
//! │   └── everything else                          → StorageFailure        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use cartledger_core::CartError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Two writers racing to create the same customer's cart
    /// - Inserting a duplicate product id
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Check constraint violation (negative stock, non-positive quantity).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// SQLite could not take a lock within the busy timeout.
    #[error("Database busy: {0}")]
    Busy(String),

    /// A compare-and-swap on a versioned row lost the race.
    #[error("{entity} {id} was modified concurrently (expected version {expected})")]
    StaleVersion {
        entity: String,
        id: String,
        expected: i64,
    },

    /// `adjust_stock` would drive stock below zero; nothing was written.
    #[error("Stock for {product_id} would underflow: available {available}, delta {delta}")]
    StockUnderflow {
        product_id: String,
        available: i64,
        delta: i64,
    },

    /// Input rejected before reaching SQL.
    #[error("Invalid input: {0}")]
    Invalid(#[from] cartledger_core::ValidationError),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether retrying the whole unit of work could succeed.
    pub fn is_conflict(&self) -> bool {
        match self {
            DbError::Busy(_) | DbError::StaleVersion { .. } => true,
            DbError::UniqueViolation { field, .. } => {
                field.starts_with("carts.") || field.starts_with("cart_items.")
            }
            _ => false,
        }
    }
}

/// SQLite primary result codes that mean "someone else holds the lock".
/// 5 = SQLITE_BUSY, 6 = SQLITE_LOCKED; extended codes keep the primary
/// code in the low byte (517 = SQLITE_BUSY_SNAPSHOT, 262 = LOCKED_SHAREDCACHE).
fn is_lock_code(code: &str) -> bool {
    code.parse::<i32>()
        .map(|c| matches!(c & 0xff, 5 | 6))
        .unwrap_or(false)
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze code/message for constraint or lock
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>[, <table>.<column>]"
                // "FOREIGN KEY constraint failed"
                // "CHECK constraint failed: <expr>"
                if db_err.code().as_deref().is_some_and(is_lock_code)
                    || msg.contains("database is locked")
                {
                    DbError::Busy(msg.to_string())
                } else if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Maps storage errors onto the cart error taxonomy at the engine boundary.
impl From<DbError> for CartError {
    fn from(err: DbError) -> Self {
        if err.is_conflict() {
            return CartError::ConcurrencyConflict(err.to_string());
        }

        match err {
            DbError::StockUnderflow {
                product_id,
                available,
                delta,
            } => CartError::InsufficientStock {
                product_id,
                available,
                requested: delta.saturating_neg(),
            },
            DbError::Invalid(e) => CartError::Validation(e),
            other => CartError::StorageFailure(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_codes() {
        assert!(is_lock_code("5"));
        assert!(is_lock_code("6"));
        assert!(is_lock_code("517"));
        assert!(is_lock_code("262"));
        assert!(!is_lock_code("19"));
        assert!(!is_lock_code("2067"));
        assert!(!is_lock_code("not-a-code"));
    }

    #[test]
    fn test_conflict_classification() {
        assert!(DbError::Busy("locked".into()).is_conflict());
        assert!(DbError::duplicate("carts.customer_id", "1").is_conflict());
        assert!(DbError::duplicate("cart_items.cart_id, cart_items.product_id", "x").is_conflict());
        assert!(!DbError::duplicate("products.id", "P").is_conflict());
        assert!(!DbError::PoolExhausted.is_conflict());
    }

    #[test]
    fn test_maps_into_cart_error() {
        let err: CartError = DbError::StaleVersion {
            entity: "Cart".into(),
            id: "c".into(),
            expected: 2,
        }
        .into();
        assert!(err.is_retryable());

        let err: CartError = DbError::QueryFailed("syntax".into()).into();
        assert!(matches!(err, CartError::StorageFailure(_)));

        let err: CartError = DbError::StockUnderflow {
            product_id: "P".into(),
            available: 2,
            delta: -3,
        }
        .into();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                product_id: "P".into(),
                available: 2,
                requested: 3,
            }
        );
    }
}
