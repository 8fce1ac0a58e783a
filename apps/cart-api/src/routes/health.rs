use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use cartledger_db::migrations::migration_status;

use crate::AppState;

/// Liveness plus a database round trip.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database = state.db.health_check().await;

    let migrations = match migration_status(state.db.pool()).await {
        Ok((total, applied)) => json!({ "total": total, "applied": applied }),
        Err(e) => {
            warn!(error = %e, "Could not read migration status");
            Value::Null
        }
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if database { "ok" } else { "degraded" },
            "database": database,
            "migrations": migrations,
        })),
    )
}
