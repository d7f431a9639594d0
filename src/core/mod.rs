//! Core bookkeeping logic, independent of the HTTP layer.
//!
//! The stores (`account`, `category`, `ledger`) are thin query wrappers. The
//! posting service in `posting` composes them inside a unit of work.

pub mod account;
pub mod category;
pub mod ledger;
pub mod posting;
pub mod unit_of_work;

pub use posting::{NewPosting, TransactionService};
pub use unit_of_work::UnitOfWork;

use crate::errors::{Error, Result};
use uuid::Uuid;

/// Fails with [`Error::Forbidden`] unless `requester` owns the resource.
pub fn ensure_owner(owner: Uuid, requester: Uuid, resource: &'static str) -> Result<()> {
    if owner == requester {
        return Ok(());
    }
    tracing::warn!(
        user_id = %requester,
        owner_id = %owner,
        resource,
        "Forbidden access attempt"
    );
    Err(Error::Forbidden { resource })
}
