//! Category store - CRUD over the `categories` table with ownership checks.
//!
//! Names are trimmed and must be unique per owner; the unique index on
//! `(user_id, name)` is the source of truth and its violation maps to
//! [`Error::Conflict`].

use crate::{
    core::ensure_owner,
    entities::{Category, category},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};
use tracing::{info, instrument};

const MAX_NAME_LEN: usize = 100;

fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Category name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "Category name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn map_unique_violation(err: DbErr, name: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::Conflict {
            message: format!("Category '{name}' already exists"),
        },
        _ => Error::Database(err),
    }
}

/// Creates a category for `user_id`.
#[instrument(skip(db))]
pub async fn create_category<C>(db: &C, user_id: Uuid, name: &str) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let name = normalize_name(name)?;
    let now = chrono::Utc::now();
    let model = category::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(name.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = model
        .insert(db)
        .await
        .map_err(|e| map_unique_violation(e, &name))?;
    info!(category_id = %created.id, "Category created");
    Ok(created)
}

/// Finds a category by id. `Ok(None)` means no such row.
pub async fn get_category_by_id<C>(db: &C, category_id: Uuid) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a category and checks that `user_id` owns it.
pub async fn get_owned_category<C>(
    db: &C,
    category_id: Uuid,
    user_id: Uuid,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let found = get_category_by_id(db, category_id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;
    ensure_owner(found.user_id, user_id, "category")?;
    Ok(found)
}

/// Lists the categories owned by `user_id`, alphabetically.
pub async fn list_categories_for_user<C>(db: &C, user_id: Uuid) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .filter(category::Column::UserId.eq(user_id))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Renames a category owned by `user_id`.
#[instrument(skip(db))]
pub async fn rename_category<C>(
    db: &C,
    category_id: Uuid,
    user_id: Uuid,
    new_name: &str,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let name = normalize_name(new_name)?;
    let existing = get_owned_category(db, category_id, user_id).await?;

    let mut model: category::ActiveModel = existing.into();
    model.name = Set(name.clone());
    model.updated_at = Set(chrono::Utc::now());

    model
        .update(db)
        .await
        .map_err(|e| map_unique_violation(e, &name))
}

/// Deletes a category owned by `user_id`.
///
/// Ledger entries that referenced it keep their `category_id` and simply list
/// without a category name afterwards.
#[instrument(skip(db))]
pub async fn delete_category<C>(db: &C, category_id: Uuid, user_id: Uuid) -> Result<()>
where
    C: ConnectionTrait,
{
    get_owned_category(db, category_id, user_id).await?;

    let result = Category::delete_by_id(category_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::CategoryNotFound { id: category_id });
    }
    info!("Category deleted");
    Ok(())
}
