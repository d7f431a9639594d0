//! Liveness check.

use crate::{api::AppState, errors::Result};
use axum::{Json, extract::State};
use serde_json::{Value, json};

/// `GET /health` - pings the database.
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>> {
    state.db.ping().await?;
    Ok(Json(json!({ "status": "ok", "db": "connected" })))
}
