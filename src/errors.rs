//! Unified error type for the bookkeeping core and the HTTP layer.
//!
//! Business-rule failures (not found, forbidden, insufficient funds) are ordinary
//! values that callers match on. Infrastructure failures inside the posting
//! workflow are collapsed into [`Error::PostingFailed`] before they leave the
//! posting service.

use thiserror::Error;
use uuid::Uuid;

/// Every failure the crate can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input, rejected before any store access.
    #[error("Validation failed: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// Missing, malformed, or expired bearer token.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Why the credentials were rejected
        message: String,
    },

    /// The referenced account does not exist.
    #[error("Account {id} not found")]
    AccountNotFound {
        /// Requested account id
        id: Uuid,
    },

    /// The referenced category does not exist.
    #[error("Category {id} not found")]
    CategoryNotFound {
        /// Requested category id
        id: Uuid,
    },

    /// The resource exists but belongs to another user.
    #[error("You do not have permission for this {resource}")]
    Forbidden {
        /// Kind of resource that was denied ("account", "category")
        resource: &'static str,
    },

    /// An expense would take the balance below zero.
    #[error("Insufficient funds: balance is {current}, expense requires {required}")]
    InsufficientFunds {
        /// Balance at the time of the attempt, in minor units
        current: i64,
        /// Amount of the rejected expense, in minor units
        required: i64,
    },

    /// A uniqueness rule was violated (e.g. duplicate category name per owner).
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting value
        message: String,
    },

    /// Opaque infrastructure failure during the atomic posting workflow.
    #[error("Failed to post transaction")]
    PostingFailed,

    /// Data that should be impossible given the surrounding locks.
    #[error("Data integrity error: {message}")]
    Integrity {
        /// Description of the broken expectation
        message: String,
    },

    /// Invalid or missing configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Raw storage error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (binding sockets, reading files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Machine-readable kind reported to API clients.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Unauthorized { .. } => "unauthorized",
            Self::AccountNotFound { .. } => "account_not_found",
            Self::CategoryNotFound { .. } => "category_not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Conflict { .. } => "conflict",
            Self::PostingFailed => "posting_failed",
            Self::Integrity { .. } | Self::Config { .. } | Self::Database(_) | Self::Io(_) => {
                "internal"
            }
        }
    }

    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
