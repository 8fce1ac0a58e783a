//! # cartledger-db: Stores and Consistency Engine
//!
//! This crate owns the SQLite database behind Cartledger: the catalog store,
//! the cart store, and the engine that keeps carts consistent with the
//! catalog under concurrent requests.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cartledger Data Flow                             │
//! │                                                                         │
//! │  HTTP handler (POST /cart/{customer_id}/items)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  cartledger-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  CartEngine   │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (engine.rs)  │───►│ ProductRepo   │    │  (embedded)  │  │   │
//! │  │   │ transactions  │    │ CartRepo      │    │ 001_init.sql │  │   │
//! │  │   │ conflict retry│    └───────┬───────┘    └──────────────┘  │   │
//! │  │   └───────────────┘            │                              │   │
//! │  │   ┌───────────────┐            │                              │   │
//! │  │   │   Database    │◄───────────┘                              │   │
//! │  │   │   (pool.rs)   │                                           │   │
//! │  │   └───────────────┘                                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL) ./cartledger.db                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and their mapping to `CartError`
//! - [`repository`] - Catalog and cart stores
//! - [`engine`] - The cart consistency engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cartledger_db::{Database, DbConfig, EngineConfig};
//!
//! let db = Database::new(DbConfig::new("cartledger.db")).await?;
//! let engine = db.engine(EngineConfig::default());
//!
//! let cart = engine.add_item("customer-1", "P1", 2).await?;
//! assert_eq!(cart.items.len(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{CartEngine, EngineConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::cart::CartRepository;
pub use repository::product::{generate_product_id, ProductRepository};
