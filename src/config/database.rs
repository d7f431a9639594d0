//! Database configuration module.
//!
//! This module handles database connection setup and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust models.
//! Both `SQLite` and `PostgreSQL` URLs are accepted; `SQLite` pools are capped at a
//! single connection because `SQLite` has no row-level locks.

use crate::config::settings::DatabaseSettings;
use crate::entities::{Account, Category, CategoryColumn, Transaction, TransactionColumn};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Fallback URL used when `DATABASE_URL` is not configured.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/fincore.sqlite?mode=rwc";

/// Returns true when the URL points at a `SQLite` database.
#[must_use]
pub fn is_sqlite_url(url: &str) -> bool {
    url.starts_with("sqlite:")
}

/// Creates the parent directory of a file-backed `SQLite` URL, if any.
pub fn ensure_sqlite_dir(url: &str) -> Result<()> {
    let Some(rest) = url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
        debug!(dir = %parent.display(), "Ensured database directory");
    }
    Ok(())
}

/// Opens the process-wide connection pool.
///
/// The pool is created once at startup, cloned into every service that needs it
/// and closed once at shutdown.
#[instrument(skip(settings), fields(url = %redact(&settings.url)))]
pub async fn create_connection(settings: &DatabaseSettings) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(settings.url.clone());
    let max_connections = if is_sqlite_url(&settings.url) {
        1
    } else {
        settings.max_connections
    };
    options
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .sqlx_logging(false);

    debug!(max_connections, "Opening database pool");
    let db = Database::connect(options).await?;
    info!("Database pool ready");
    Ok(db)
}

/// Creates all tables and indexes if they do not exist yet.
///
/// Accounts are created before transactions because ledger rows carry a foreign
/// key to their account. Categories are referenced softly, without a constraint.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut account_table = schema.create_table_from_entity(Account);
    let mut category_table = schema.create_table_from_entity(Category);
    let mut transaction_table = schema.create_table_from_entity(Transaction);

    db.execute(builder.build(account_table.if_not_exists())).await?;
    db.execute(builder.build(category_table.if_not_exists())).await?;
    db.execute(builder.build(transaction_table.if_not_exists())).await?;

    let category_name_per_owner = Index::create()
        .name("idx_categories_user_name")
        .table(Category)
        .col(CategoryColumn::UserId)
        .col(CategoryColumn::Name)
        .unique()
        .if_not_exists()
        .to_owned();
    let ledger_by_account = Index::create()
        .name("idx_transactions_account_date")
        .table(Transaction)
        .col(TransactionColumn::AccountId)
        .col(TransactionColumn::TransactionDate)
        .if_not_exists()
        .to_owned();

    db.execute(builder.build(&category_name_per_owner)).await?;
    db.execute(builder.build(&ledger_by_account)).await?;

    info!("Database tables ensured");
    Ok(())
}

/// Strips credentials from a connection URL before it is logged.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
