//! Account entity - Represents a user's money container (checking, savings, wallet).
//!
//! Each account has an owner (`user_id`), a free-form type tag, a balance in minor
//! currency units and an ISO 4217 currency code. The balance is only ever changed
//! by the transaction posting workflow.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owner of the account
    pub user_id: Uuid,
    /// Display name (e.g., "Main checking")
    pub name: String,
    /// Free-form type tag (e.g., "checking", "savings")
    #[serde(rename = "type")]
    pub kind: String,
    /// Current balance in minor units (cents)
    pub balance: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// When the balance or metadata last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One account has many ledger entries
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
