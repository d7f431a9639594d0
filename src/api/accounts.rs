//! Account endpoints.

use crate::{
    api::{AppState, auth::AuthUser},
    core::account::{self, NewAccount},
    entities::AccountModel,
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

/// `POST /accounts`
pub async fn create_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: std::result::Result<Json<NewAccount>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountModel>)> {
    let Json(new_account) = payload?;
    let created = account::create_account(&state.db, user_id, new_account).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /accounts`
pub async fn list_accounts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<AccountModel>>> {
    let accounts = account::list_accounts_for_user(&state.db, user_id).await?;
    Ok(Json(accounts))
}

/// `GET /accounts/{account_id}`
pub async fn get_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    account_id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AccountModel>> {
    let Path(account_id) = account_id?;
    let found = account::get_owned_account(&state.db, account_id, user_id).await?;
    Ok(Json(found))
}
