//! Transaction entity - The immutable ledger of income and expense postings.
//!
//! Each row records one posting against exactly one account: its `kind`
//! (income/expense), a strictly positive `amount` in minor units, a description,
//! an optional `category_id` and the calendar `transaction_date`. Rows are only
//! ever inserted; there is no update or delete path.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a posting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming into the account
    #[sea_orm(string_value = "income")]
    Income,
    /// Money leaving the account
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the ledger entry
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Account the posting was applied to
    pub account_id: Uuid,
    /// Income or expense
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Amount in minor units, always > 0
    pub amount: i64,
    /// Human-readable description of the transaction
    pub description: String,
    /// Category the posting was tagged with (soft reference)
    pub category_id: Option<Uuid>,
    /// Calendar date the money moved
    pub transaction_date: Date,
    /// When the entry was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
