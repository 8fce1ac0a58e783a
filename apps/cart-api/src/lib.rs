//! # cart-api
//!
//! HTTP binding for the Cartledger engine.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PUT /cart/42/items/P1 {"quantity": 3}                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  routes::cart::update_item_quantity   (decode path + JSON body)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppState.engine.update_item_quantity("42", "P1", 3)                   │
//! │       │                                                                 │
//! │       ├── Ok(CartView)  ──► 200 JSON (camelCase, integer cents)        │
//! │       └── Err(CartError) ──► ApiError ──► {code, message, details}     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;

use axum::routing::get;
use axum::Router;

use cartledger_db::{CartEngine, Database, EngineConfig};

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};

/// Shared application state. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: CartEngine,
}

impl AppState {
    pub fn new(db: Database, engine_config: EngineConfig) -> Self {
        let engine = db.engine(engine_config);
        AppState { db, engine }
    }
}

/// Builds the full router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/cart", routes::cart::router())
        .nest("/products", routes::products::router())
        .with_state(state)
}
