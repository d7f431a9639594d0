//! Ledger store - Append-only access to the `transactions` table.
//!
//! Entries are inserted inside a unit of work and never updated or deleted.
//! Listing joins the category name with a LEFT JOIN, so entries whose category
//! was deleted still appear, just without a name.

use crate::{
    entities::{Category, Transaction, TransactionKind, category, transaction},
    errors::Result,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    DatabaseTransaction, FromQueryResult, JoinType, QueryOrder, QuerySelect, Set, prelude::*,
};
use serde::Serialize;

/// A ledger entry as returned to callers, enriched with its category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct LedgerEntry {
    /// Entry id
    pub id: Uuid,
    /// Account the posting was applied to
    pub account_id: Uuid,
    /// Income or expense
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Amount in minor units
    pub amount: i64,
    /// Description supplied when posting
    pub description: String,
    /// Category reference, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    /// Name of the referenced category, if it still exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// Calendar date of the posting
    pub transaction_date: NaiveDate,
    /// When the entry was recorded
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Builds the caller-facing view of a freshly inserted row.
    #[must_use]
    pub fn from_model(model: transaction::Model, category_name: Option<String>) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            kind: model.kind,
            amount: model.amount,
            description: model.description,
            category_id: model.category_id,
            category_name,
            transaction_date: model.transaction_date,
            created_at: model.created_at,
        }
    }
}

/// Values for one new ledger row.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    /// Target account
    pub account_id: Uuid,
    /// Income or expense
    pub kind: TransactionKind,
    /// Amount in minor units, > 0
    pub amount: i64,
    /// Description
    pub description: String,
    /// Category reference
    pub category_id: Option<Uuid>,
    /// Calendar date
    pub transaction_date: NaiveDate,
}

/// Inserts an immutable ledger row with a fresh id and `created_at = now`.
pub async fn insert_entry(
    txn: &DatabaseTransaction,
    entry: NewLedgerEntry,
) -> Result<transaction::Model> {
    let model = transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        account_id: Set(entry.account_id),
        kind: Set(entry.kind),
        amount: Set(entry.amount),
        description: Set(entry.description),
        category_id: Set(entry.category_id),
        transaction_date: Set(entry.transaction_date),
        created_at: Set(Utc::now()),
    };

    model.insert(txn).await.map_err(Into::into)
}

/// Lists an account's entries, most recent activity first.
///
/// Ordered by `transaction_date` descending, ties broken by `created_at`
/// descending.
pub async fn list_entries_by_account<C>(db: &C, account_id: Uuid) -> Result<Vec<LedgerEntry>>
where
    C: ConnectionTrait,
{
    let category_join: RelationDef = Transaction::belongs_to(Category)
        .from(transaction::Column::CategoryId)
        .to(category::Column::Id)
        .into();

    Transaction::find()
        .column_as(category::Column::Name, "category_name")
        .join(JoinType::LeftJoin, category_join)
        .filter(transaction::Column::AccountId.eq(account_id))
        .order_by_desc(transaction::Column::TransactionDate)
        .order_by_desc(transaction::Column::CreatedAt)
        .into_model::<LedgerEntry>()
        .all(db)
        .await
        .map_err(Into::into)
}
