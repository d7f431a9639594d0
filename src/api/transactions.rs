//! Ledger endpoints backed by [`crate::core::TransactionService`].

use crate::{
    api::{AppState, auth::AuthUser},
    core::{NewPosting, ledger::LedgerEntry},
    errors::Result,
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use uuid::Uuid;

/// `POST /transactions`
pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: std::result::Result<Json<NewPosting>, JsonRejection>,
) -> Result<(StatusCode, Json<LedgerEntry>)> {
    let Json(posting) = payload?;
    let entry = state.ledger.post_transaction(posting, user_id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `GET /accounts/{account_id}/transactions`
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    account_id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<LedgerEntry>>> {
    let Path(account_id) = account_id?;
    let entries = state
        .ledger
        .list_transactions_by_account(account_id, user_id)
        .await?;
    Ok(Json(entries))
}
