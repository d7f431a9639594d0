//! Unit-of-work coordinator - runs a piece of async work inside one database transaction.
//!
//! `run_atomic` commits when the work returns `Ok` and rolls back when it returns
//! `Err`. If the work panics, or the surrounding future is dropped because a
//! deadline fired, the `DatabaseTransaction` is dropped unfinished and `SeaORM`
//! rolls it back, so no partial write survives.
//!
//! Nesting is impossible by construction: the coordinator wraps the pool handle,
//! and the work only ever receives a `&DatabaseTransaction`.

use crate::errors::Result;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

/// Boxed future returned by work passed to [`UnitOfWork::run_atomic`].
pub type AtomicFuture<'c, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'c>>;

/// Opens atomic units of work against the shared connection pool.
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    db: DatabaseConnection,
}

impl UnitOfWork {
    /// Wraps the process-wide connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Begins a transaction, runs `work` against it, then commits or rolls back.
    ///
    /// The error returned by `work` is propagated unchanged. Failures to begin or
    /// commit surface as [`crate::errors::Error::Database`].
    pub async fn run_atomic<T, F>(&self, work: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> AtomicFuture<'c, T> + Send,
    {
        let txn = self.db.begin().await?;
        debug!("Unit of work started");

        match work(&txn).await {
            Ok(value) => {
                txn.commit().await?;
                debug!("Unit of work committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed after unit of work error");
                } else {
                    debug!(error = %err, "Unit of work rolled back");
                }
                Err(err)
            }
        }
    }
}
