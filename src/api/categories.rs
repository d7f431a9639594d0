//! Category endpoints. Create and update share the `{"name": ...}` body.

use crate::{
    api::{AppState, auth::AuthUser},
    core::category,
    entities::CategoryModel,
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
use serde::Deserialize;
use uuid::Uuid;

/// Request body for creating or renaming a category.
#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    /// Category name, 1..=100 characters after trimming
    pub name: String,
}

/// `POST /categories`
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: std::result::Result<Json<CategoryPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CategoryModel>)> {
    let Json(payload) = payload?;
    let created = category::create_category(&state.db, user_id, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /categories`
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<CategoryModel>>> {
    Ok(Json(category::list_categories_for_user(&state.db, user_id).await?))
}

/// `GET /categories/{category_id}`
pub async fn get_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    category_id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CategoryModel>> {
    let Path(category_id) = category_id?;
    Ok(Json(
        category::get_owned_category(&state.db, category_id, user_id).await?,
    ))
}

/// `PUT /categories/{category_id}`
pub async fn update_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    category_id: std::result::Result<Path<Uuid>, PathRejection>,
    payload: std::result::Result<Json<CategoryPayload>, JsonRejection>,
) -> Result<Json<CategoryModel>> {
    let Path(category_id) = category_id?;
    let Json(payload) = payload?;
    let renamed =
        category::rename_category(&state.db, category_id, user_id, &payload.name).await?;
    Ok(Json(renamed))
}

/// `DELETE /categories/{category_id}`
pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    category_id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode> {
    let Path(category_id) = category_id?;
    category::delete_category(&state.db, category_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
