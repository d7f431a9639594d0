//! Category entity - User-defined labels for transactions ("Groceries", "Salary").
//!
//! Names are unique per owner, not globally. Transactions point at categories
//! through a soft reference, so deleting a category never touches the ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owner of the category
    pub user_id: Uuid,
    /// Display name, unique per owner
    pub name: String,
    /// When the category was created
    pub created_at: DateTimeUtc,
    /// When the category was last renamed
    pub updated_at: DateTimeUtc,
}

/// Categories have no owned relations; ledger entries reference them softly.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
