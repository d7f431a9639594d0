//! HTTP API - axum router, shared state, and the per-request deadline.
//!
//! Every route except `/health` requires a bearer token (see [`auth`]). Handlers
//! are thin: they decode input, call into [`crate::core`], and let
//! [`crate::errors::Error`] render itself as a JSON error body.

pub mod accounts;
pub mod auth;
pub mod categories;
pub mod error;
pub mod health;
pub mod transactions;

use crate::core::TransactionService;
use auth::TokenSigner;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use error::ErrorBody;
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tracing::warn;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Process-wide connection pool
    pub db: DatabaseConnection,
    /// Posting and listing of ledger entries
    pub ledger: TransactionService,
    /// Bearer token verification
    pub tokens: Arc<TokenSigner>,
}

impl AppState {
    /// Wires the services around one connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, tokens: TokenSigner) -> Self {
        Self {
            ledger: TransactionService::new(db.clone()),
            db,
            tokens: Arc::new(tokens),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/auth/me", get(auth::me))
        .route(
            "/accounts",
            post(accounts::create_account).get(accounts::list_accounts),
        )
        .route("/accounts/{account_id}", get(accounts::get_account))
        .route(
            "/accounts/{account_id}/transactions",
            get(transactions::list_transactions),
        )
        .route(
            "/categories",
            post(categories::create_category).get(categories::list_categories),
        )
        .route(
            "/categories/{category_id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/transactions", post(transactions::create_transaction))
        .layer(middleware::from_fn_with_state(request_timeout, enforce_deadline))
        .with_state(state)
}

/// Drops the handler future when the deadline passes.
///
/// Dropping the future drops any open `DatabaseTransaction`, which rolls back.
async fn enforce_deadline(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(%method, %path, timeout_ms = limit.as_millis(), "Request deadline exceeded");
            let body = ErrorBody {
                kind: "timeout",
                message: "Request timed out".to_string(),
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}
