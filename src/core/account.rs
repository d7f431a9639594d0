//! Account store - Reads and writes rows of the `accounts` table.
//!
//! Plain reads and creation take any connection. The row-locking read and the
//! balance write take a `&DatabaseTransaction`, so they can only run inside a
//! unit of work opened by [`crate::core::unit_of_work::UnitOfWork`].

use crate::{
    core::ensure_owner,
    entities::{Account, account},
    errors::{Error, Result},
};
use sea_orm::sea_query::Expr;
use sea_orm::{DatabaseTransaction, QueryOrder, QuerySelect, Select, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for creating an account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    /// Display name
    pub name: String,
    /// Free-form type tag
    #[serde(rename = "type")]
    pub kind: String,
    /// ISO 4217 currency code
    pub currency: String,
    /// Opening balance in minor units
    #[serde(default)]
    pub initial_balance: i64,
}

impl NewAccount {
    /// Checks required fields, currency format and opening balance.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Account name cannot be empty"));
        }
        if self.kind.trim().is_empty() {
            return Err(Error::validation("Account type cannot be empty"));
        }
        if !is_iso_4217_code(&self.currency) {
            return Err(Error::validation(format!(
                "Currency '{}' is not an ISO 4217 code",
                self.currency
            )));
        }
        if self.initial_balance < 0 {
            return Err(Error::validation("Initial balance cannot be negative"));
        }
        Ok(())
    }
}

/// Three uppercase ASCII letters, e.g. `USD`, `BRL`.
#[must_use]
pub fn is_iso_4217_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// Creates an account owned by `user_id` after validating the input.
#[instrument(skip(db, new_account), fields(name = %new_account.name))]
pub async fn create_account<C>(db: &C, user_id: Uuid, new_account: NewAccount) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    new_account.validate()?;

    let now = chrono::Utc::now();
    let model = account::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(new_account.name.trim().to_string()),
        kind: Set(new_account.kind.trim().to_string()),
        balance: Set(new_account.initial_balance),
        currency: Set(new_account.currency),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = model.insert(db).await?;
    info!(account_id = %created.id, "Account created");
    Ok(created)
}

/// Finds an account by id. `Ok(None)` means no such row.
pub async fn get_account_by_id<C>(db: &C, account_id: Uuid) -> Result<Option<account::Model>>
where
    C: ConnectionTrait,
{
    Account::find_by_id(account_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an account and checks that `user_id` owns it.
pub async fn get_owned_account<C>(db: &C, account_id: Uuid, user_id: Uuid) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    let account = get_account_by_id(db, account_id)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;
    ensure_owner(account.user_id, user_id, "account")?;
    Ok(account)
}

/// Lists the accounts owned by `user_id`, newest first.
pub async fn list_accounts_for_user<C>(db: &C, user_id: Uuid) -> Result<Vec<account::Model>>
where
    C: ConnectionTrait,
{
    Account::find()
        .filter(account::Column::UserId.eq(user_id))
        .order_by_desc(account::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Reads an account with an exclusive row lock held until `txn` ends.
///
/// Any other unit of work locking the same row blocks here until this one
/// commits or rolls back, then observes the updated balance.
pub async fn get_account_for_update(
    txn: &DatabaseTransaction,
    account_id: Uuid,
) -> Result<Option<account::Model>> {
    select_for_update(account_id)
        .one(txn)
        .await
        .map_err(Into::into)
}

/// `SELECT … FOR UPDATE` on one account. `SQLite` drops the lock clause.
fn select_for_update(account_id: Uuid) -> Select<Account> {
    Account::find_by_id(account_id).lock_exclusive()
}

/// Overwrites the balance of a locked account.
///
/// Exactly one row must change; anything else is an [`Error::Integrity`].
pub async fn update_account_balance(
    txn: &DatabaseTransaction,
    account_id: Uuid,
    new_balance: i64,
) -> Result<()> {
    let result = Account::update_many()
        .col_expr(account::Column::Balance, Expr::value(new_balance))
        .col_expr(account::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(account::Column::Id.eq(account_id))
        .exec(txn)
        .await?;

    if result.rows_affected != 1 {
        return Err(Error::Integrity {
            message: format!(
                "Balance update for account {account_id} affected {} rows",
                result.rows_affected
            ),
        });
    }
    Ok(())
}
