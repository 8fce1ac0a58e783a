//! # cartledger-core: Pure Cart Logic
//!
//! This crate holds the rules that keep a customer's cart consistent with
//! itself: money arithmetic, line subtotals, cart totals, input validation
//! and the error taxonomy shared by every layer above it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cartledger Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    cart-api (axum)                              │   │
//! │  │    POST /cart/{id}/items ──► GET /cart/{id} ──► DELETE ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                cartledger-db (engine + stores)                  │   │
//! │  │         CartEngine ──► CartRepository / ProductRepository       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ cartledger-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ CartView  │  │   rules   │  │   │
//! │  │   │ Cart/Item │  │           │  │  totals   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Cart, CartItem)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart math and the read model returned to callers
//! - [`error`] - Error taxonomy
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use cartledger_core::money::Money;
//!
//! let price = Money::from_cents(1000); // $10.00
//! let subtotal = price.multiply_quantity(3);
//! assert_eq!(subtotal.cents(), 3000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::CartView;
pub use error::{CartError, CartResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps full total recomputation cheap.
pub const MAX_CART_ITEMS: usize = 100;
