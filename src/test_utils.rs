//! Shared test utilities for `fincore`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::{
        database::{create_connection, create_tables},
        settings::DatabaseSettings,
    },
    core::{
        account::{self, NewAccount},
        category,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        acquire_timeout_secs: 5,
    };
    let db = create_connection(&settings).await?;
    create_tables(&db).await?;
    Ok(db)
}

/// Creates a test account with sensible defaults.
///
/// # Defaults
/// * `name`: "Main Checking"
/// * `type`: "checking"
/// * `currency`: "USD"
pub async fn create_test_account(
    db: &DatabaseConnection,
    user_id: Uuid,
    balance: i64,
) -> Result<entities::account::Model> {
    account::create_account(
        db,
        user_id,
        NewAccount {
            name: "Main Checking".to_string(),
            kind: "checking".to_string(),
            currency: "USD".to_string(),
            initial_balance: balance,
        },
    )
    .await
}

/// Creates a category owned by `user_id`.
pub async fn create_test_category(
    db: &DatabaseConnection,
    user_id: Uuid,
    name: &str,
) -> Result<entities::category::Model> {
    category::create_category(db, user_id, name).await
}

/// Sets up a database with one user owning one account.
/// Returns (db, `user_id`, account).
pub async fn setup_with_account(
    balance: i64,
) -> Result<(DatabaseConnection, Uuid, entities::account::Model)> {
    let db = setup_test_db().await?;
    let user_id = Uuid::new_v4();
    let account = create_test_account(&db, user_id, balance).await?;
    Ok((db, user_id, account))
}

/// Sets up a database with one user owning an account and a "Groceries" category.
pub async fn setup_with_account_and_category(
    balance: i64,
) -> Result<(
    DatabaseConnection,
    Uuid,
    entities::account::Model,
    entities::category::Model,
)> {
    let (db, user_id, account) = setup_with_account(balance).await?;
    let category = create_test_category(&db, user_id, "Groceries").await?;
    Ok((db, user_id, account, category))
}
