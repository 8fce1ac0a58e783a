//! # Repository Module
//!
//! Database repository implementations for Cartledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Touches Which Table                              │
//! │                                                                         │
//! │  HTTP handler / seed binary                                            │
//! │       │                                                                 │
//! │       ├── db.products()  ──► ProductRepository ──► products            │
//! │       │                      (catalog admin, atomic adjust_stock)      │
//! │       │                                                                 │
//! │       ├── db.carts()     ──► CartRepository    ──► carts, cart_items   │
//! │       │                      (reads only)                              │
//! │       │                                                                 │
//! │       └── db.engine(..)  ──► CartEngine                                │
//! │                               │  one transaction per mutation          │
//! │                               ├── product::fetch_product(&mut tx)      │
//! │                               └── cart::{claim_customer, insert_item,  │
//! │                                          save_totals, ...}(&mut tx)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The free functions taking `&mut SqliteConnection` let the engine compose
//! several statements inside a single transaction. Nothing outside the engine
//! writes cart state.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Catalog CRUD and stock adjustment
//! - [`CartRepository`] - Cart reads

pub mod cart;
pub mod product;

pub use cart::CartRepository;
pub use product::ProductRepository;
