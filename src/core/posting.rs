//! Transaction posting service - the atomic income/expense workflow.
//!
//! A posting locks the account row, checks ownership of the account and the
//! category, checks funds for expenses, inserts the immutable ledger entry and
//! writes the new balance, all inside one unit of work. Concurrent postings on the
//! same account queue up behind the row lock; postings on different accounts do
//! not contend.
//!
//! Business-rule failures come back unchanged. Storage failures are logged with
//! the stage that failed and surface to callers only as [`Error::PostingFailed`].

use crate::{
    core::{
        account, category, ensure_owner,
        ledger::{self, LedgerEntry, NewLedgerEntry},
        unit_of_work::UnitOfWork,
    },
    entities::TransactionKind,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::fmt;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Longest description accepted, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// A request to post one income or expense.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPosting {
    /// Account to post against
    pub account_id: Uuid,
    /// Income or expense
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Amount in minor units, must be > 0
    pub amount: i64,
    /// Free-text description
    pub description: String,
    /// Category to tag the entry with
    pub category_id: Uuid,
    /// Calendar date; today (UTC) when absent
    #[serde(default)]
    pub transaction_date: Option<NaiveDate>,
}

impl NewPosting {
    /// Input checks that need no store access.
    pub fn validate(&self) -> Result<()> {
        if self.amount <= 0 {
            return Err(Error::validation("Amount must be greater than zero"));
        }
        if self.description.trim().is_empty() {
            return Err(Error::validation("Description cannot be empty"));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(Error::validation(format!(
                "Description cannot exceed {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Step of the posting workflow, recorded when storage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingStage {
    /// Opening or committing the database transaction
    Boundary,
    /// `SELECT … FOR UPDATE` on the account
    LockAccount,
    /// Reading the category
    ReadCategory,
    /// Inserting the ledger row
    InsertEntry,
    /// Writing the new balance
    UpdateBalance,
}

impl fmt::Display for PostingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boundary => "begin_or_commit",
            Self::LockAccount => "lock_account",
            Self::ReadCategory => "read_category",
            Self::InsertEntry => "insert_entry",
            Self::UpdateBalance => "update_balance",
        };
        f.write_str(name)
    }
}

/// Computes the balance after applying a posting.
///
/// Expenses larger than the balance fail with [`Error::InsufficientFunds`].
pub fn apply_posting(balance: i64, kind: TransactionKind, amount: i64) -> Result<i64> {
    match kind {
        TransactionKind::Income => balance
            .checked_add(amount)
            .ok_or_else(|| Error::validation("Amount would overflow the account balance")),
        TransactionKind::Expense => {
            if balance < amount {
                return Err(Error::InsufficientFunds {
                    current: balance,
                    required: amount,
                });
            }
            Ok(balance - amount)
        }
    }
}

fn posting_failed(
    stage: PostingStage,
    account_id: Uuid,
    kind: TransactionKind,
    amount: i64,
    err: &Error,
) -> Error {
    error!(
        %stage,
        %account_id,
        ?kind,
        amount,
        error = %err,
        "Posting failed"
    );
    Error::PostingFailed
}

/// Posts and lists ledger entries on behalf of a user.
#[derive(Debug, Clone)]
pub struct TransactionService {
    db: DatabaseConnection,
    unit_of_work: UnitOfWork,
}

impl TransactionService {
    /// Builds the service on top of the shared pool.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            unit_of_work: UnitOfWork::new(db.clone()),
            db,
        }
    }

    /// Posts an income or expense atomically.
    ///
    /// Returns the new ledger entry with its category name. Fails with
    /// `Validation`, `AccountNotFound`, `CategoryNotFound`, `Forbidden`,
    /// `InsufficientFunds` or the opaque `PostingFailed`.
    #[instrument(
        skip(self, posting),
        fields(account_id = %posting.account_id, kind = ?posting.kind, amount = posting.amount)
    )]
    pub async fn post_transaction(&self, posting: NewPosting, user_id: Uuid) -> Result<LedgerEntry> {
        posting.validate()?;

        let account_id = posting.account_id;
        let kind = posting.kind;
        let amount = posting.amount;
        let transaction_date = posting
            .transaction_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());

        let outcome = self
            .unit_of_work
            .run_atomic(move |txn| {
                Box::pin(async move {
                    let failed = |stage: PostingStage, err: Error| {
                        posting_failed(stage, account_id, kind, amount, &err)
                    };

                    let locked = account::get_account_for_update(txn, account_id)
                        .await
                        .map_err(|e| failed(PostingStage::LockAccount, e))?
                        .ok_or(Error::AccountNotFound { id: account_id })?;
                    ensure_owner(locked.user_id, user_id, "account")?;

                    let tagged = category::get_category_by_id(txn, posting.category_id)
                        .await
                        .map_err(|e| failed(PostingStage::ReadCategory, e))?
                        .ok_or(Error::CategoryNotFound {
                            id: posting.category_id,
                        })?;
                    ensure_owner(tagged.user_id, user_id, "category")?;

                    let new_balance = apply_posting(locked.balance, kind, amount)?;

                    let inserted = ledger::insert_entry(
                        txn,
                        NewLedgerEntry {
                            account_id,
                            kind,
                            amount,
                            description: posting.description,
                            category_id: Some(tagged.id),
                            transaction_date,
                        },
                    )
                    .await
                    .map_err(|e| failed(PostingStage::InsertEntry, e))?;

                    account::update_account_balance(txn, account_id, new_balance)
                        .await
                        .map_err(|e| failed(PostingStage::UpdateBalance, e))?;

                    let entry = LedgerEntry::from_model(inserted, Some(tagged.name));
                    Ok::<_, Error>((entry, new_balance))
                })
            })
            .await;

        match outcome {
            Ok((entry, new_balance)) => {
                info!(entry_id = %entry.id, new_balance, "Transaction posted");
                Ok(entry)
            }
            // Begin/commit failures arrive here as raw storage errors.
            Err(err @ Error::Database(_)) => Err(posting_failed(
                PostingStage::Boundary,
                account_id,
                kind,
                amount,
                &err,
            )),
            Err(err) => Err(err),
        }
    }

    /// Lists an account's ledger, most recent first, after an ownership check.
    ///
    /// The account read takes no lock, so listing never waits on postings.
    #[instrument(skip(self))]
    pub async fn list_transactions_by_account(
        &self,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<LedgerEntry>> {
        account::get_owned_account(&self.db, account_id, user_id).await?;
        ledger::list_entries_by_account(&self.db, account_id)
            .await
            .inspect_err(|e| error!(%account_id, error = %e, "Failed to list transactions"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::account::get_account_by_id;
    use crate::core::category::create_category;
    use crate::entities::Transaction;
    use crate::test_utils::*;
    use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, TransactionTrait};
    use std::time::Duration;

    fn posting(account_id: Uuid, category_id: Uuid, kind: TransactionKind, amount: i64) -> NewPosting {
        NewPosting {
            account_id,
            kind,
            amount,
            description: "Test transaction".to_string(),
            category_id,
            transaction_date: None,
        }
    }

    async fn balance_of(db: &DatabaseConnection, account_id: Uuid) -> Result<i64> {
        Ok(get_account_by_id(db, account_id).await?.unwrap().balance)
    }

    #[test]
    fn test_apply_posting() {
        assert_eq!(apply_posting(5000, TransactionKind::Income, 2000).unwrap(), 7000);
        assert_eq!(apply_posting(5000, TransactionKind::Expense, 5000).unwrap(), 0);
        assert!(matches!(
            apply_posting(4000, TransactionKind::Expense, 10000),
            Err(Error::InsufficientFunds {
                current: 4000,
                required: 10000
            })
        ));
        assert!(matches!(
            apply_posting(i64::MAX, TransactionKind::Income, 1),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_posting_validation() {
        let base = posting(Uuid::new_v4(), Uuid::new_v4(), TransactionKind::Expense, 100);
        assert!(base.validate().is_ok());

        let mut zero = base.clone();
        zero.amount = 0;
        assert!(matches!(zero.validate(), Err(Error::Validation { .. })));

        let mut negative = base.clone();
        negative.amount = -5;
        assert!(negative.validate().is_err());

        let mut blank = base.clone();
        blank.description = "  ".to_string();
        assert!(blank.validate().is_err());

        let mut long = base.clone();
        long.description = "a".repeat(MAX_DESCRIPTION_LEN);
        assert!(long.validate().is_ok());
        long.description.push('a');
        assert!(long.validate().is_err());
    }

    #[tokio::test]
    async fn test_documented_scenario() -> Result<()> {
        let (db, user_id, account, groceries) = setup_with_account_and_category(5000).await?;
        let service = TransactionService::new(db.clone());

        let spent = service
            .post_transaction(
                posting(account.id, groceries.id, TransactionKind::Expense, 1000),
                user_id,
            )
            .await?;
        assert_eq!(spent.category_name.as_deref(), Some("Groceries"));
        assert_eq!(balance_of(&db, account.id).await?, 4000);

        let listed = service.list_transactions_by_account(account.id, user_id).await?;
        assert_eq!(listed.first().map(|e| e.id), Some(spent.id));

        let too_much = service
            .post_transaction(
                posting(account.id, groceries.id, TransactionKind::Expense, 10000),
                user_id,
            )
            .await;
        assert!(matches!(
            too_much,
            Err(Error::InsufficientFunds {
                current: 4000,
                required: 10000
            })
        ));
        assert_eq!(balance_of(&db, account.id).await?, 4000);

        let stranger_category = create_category(&db, Uuid::new_v4(), "Not yours").await?;
        let forbidden = service
            .post_transaction(
                posting(account.id, stranger_category.id, TransactionKind::Income, 2000),
                user_id,
            )
            .await;
        assert!(matches!(forbidden, Err(Error::Forbidden { resource: "category" })));
        assert_eq!(balance_of(&db, account.id).await?, 4000);
        assert_eq!(Transaction::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_income_increases_balance_and_defaults_date() -> Result<()> {
        let (db, user_id, account, category) = setup_with_account_and_category(0).await?;
        let service = TransactionService::new(db.clone());

        let entry = service
            .post_transaction(posting(account.id, category.id, TransactionKind::Income, 2500), user_id)
            .await?;

        assert_eq!(entry.kind, TransactionKind::Income);
        assert_eq!(entry.amount, 2500);
        assert_eq!(entry.account_id, account.id);
        assert_eq!(entry.category_id, Some(category.id));
        assert_eq!(entry.transaction_date, chrono::Utc::now().date_naive());
        assert_eq!(balance_of(&db, account.id).await?, 2500);
        Ok(())
    }

    #[tokio::test]
    async fn test_explicit_transaction_date_is_kept() -> Result<()> {
        let (db, user_id, account, category) = setup_with_account_and_category(0).await?;
        let service = TransactionService::new(db);
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

        let mut request = posting(account.id, category.id, TransactionKind::Income, 10);
        request.transaction_date = Some(date);
        let entry = service.post_transaction(request, user_id).await?;

        assert_eq!(entry.transaction_date, date);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_account_and_category() -> Result<()> {
        let (db, user_id, account, category) = setup_with_account_and_category(100).await?;
        let service = TransactionService::new(db.clone());

        let missing_account = Uuid::new_v4();
        let result = service
            .post_transaction(posting(missing_account, category.id, TransactionKind::Income, 1), user_id)
            .await;
        assert!(matches!(result, Err(Error::AccountNotFound { id }) if id == missing_account));

        let missing_category = Uuid::new_v4();
        let result = service
            .post_transaction(posting(account.id, missing_category, TransactionKind::Income, 1), user_id)
            .await;
        assert!(matches!(result, Err(Error::CategoryNotFound { id }) if id == missing_category));

        assert_eq!(balance_of(&db, account.id).await?, 100);
        assert_eq!(Transaction::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_account_is_forbidden() -> Result<()> {
        let (db, owner, account, _category) = setup_with_account_and_category(100).await?;
        let intruder = Uuid::new_v4();
        let intruder_category = create_category(&db, intruder, "Mine").await?;
        let service = TransactionService::new(db.clone());

        let result = service
            .post_transaction(
                posting(account.id, intruder_category.id, TransactionKind::Expense, 50),
                intruder,
            )
            .await;
        assert!(matches!(result, Err(Error::Forbidden { resource: "account" })));

        let listing = service.list_transactions_by_account(account.id, intruder).await;
        assert!(matches!(listing, Err(Error::Forbidden { .. })));

        assert_eq!(balance_of(&db, account.id).await?, 100);
        assert!(service.list_transactions_by_account(account.id, owner).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_happens_before_store_access() -> Result<()> {
        let db = setup_test_db().await?;
        // Any store access would now fail with PostingFailed.
        for table in ["transactions", "accounts", "categories"] {
            db.execute_unprepared(&format!("DROP TABLE {table}")).await?;
        }
        let service = TransactionService::new(db);

        let result = service
            .post_transaction(
                posting(Uuid::new_v4(), Uuid::new_v4(), TransactionKind::Expense, 0),
                Uuid::new_v4(),
            )
            .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_balance_conservation() -> Result<()> {
        let (db, user_id, account, category) = setup_with_account_and_category(1000).await?;
        let service = TransactionService::new(db.clone());

        let moves = [
            (TransactionKind::Income, 500),
            (TransactionKind::Expense, 300),
            (TransactionKind::Expense, 5000), // rejected
            (TransactionKind::Income, 42),
            (TransactionKind::Expense, 1242),
        ];
        for (kind, amount) in moves {
            let _ = service
                .post_transaction(posting(account.id, category.id, kind, amount), user_id)
                .await;
        }

        let ledger = service.list_transactions_by_account(account.id, user_id).await?;
        let net: i64 = ledger
            .iter()
            .map(|e| match e.kind {
                TransactionKind::Income => e.amount,
                TransactionKind::Expense => -e.amount,
            })
            .sum();
        assert_eq!(ledger.len(), 4);
        assert_eq!(balance_of(&db, account.id).await?, 1000 + net);
        assert_eq!(balance_of(&db, account.id).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_is_idempotent() -> Result<()> {
        let (db, user_id, account, category) = setup_with_account_and_category(100).await?;
        let service = TransactionService::new(db);

        for amount in [10, 20, 30] {
            service
                .post_transaction(posting(account.id, category.id, TransactionKind::Expense, amount), user_id)
                .await?;
        }

        let first = service.list_transactions_by_account(account.id, user_id).await?;
        let second = service.list_transactions_by_account(account.id, user_id).await?;
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_expenses_never_overdraw() -> Result<()> {
        let (db, user_id, account, category) = setup_with_account_and_category(10_000).await?;
        let service = TransactionService::new(db.clone());

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..5 {
            let service = service.clone();
            let request = posting(account.id, category.id, TransactionKind::Expense, 3000);
            tasks.spawn(async move { service.post_transaction(request, user_id).await });
        }

        let mut succeeded = 0;
        let mut insufficient = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(_) => succeeded += 1,
                Err(Error::InsufficientFunds { .. }) => insufficient += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(insufficient, 2);
        assert_eq!(balance_of(&db, account.id).await?, 1000);
        assert_eq!(Transaction::find().count(&db).await?, 3);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_posting_leaves_no_trace() -> Result<()> {
        let (db, user_id, account, category) = setup_with_account_and_category(500).await?;
        let service = TransactionService::new(db.clone());

        // Occupy the only pooled connection so the posting has to wait.
        let blocker = db.begin().await?;
        account::get_account_for_update(&blocker, account.id).await?;

        let attempt = tokio::time::timeout(
            Duration::from_millis(100),
            service.post_transaction(posting(account.id, category.id, TransactionKind::Expense, 200), user_id),
        )
        .await;
        assert!(attempt.is_err(), "posting should still be waiting for a connection");

        blocker.rollback().await?;
        assert_eq!(balance_of(&db, account.id).await?, 500);
        assert_eq!(Transaction::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_lock_failure_is_opaque() -> Result<()> {
        let db = setup_test_db().await?;
        db.execute_unprepared("DROP TABLE accounts").await?;
        let service = TransactionService::new(db);

        let result = service
            .post_transaction(
                posting(Uuid::new_v4(), Uuid::new_v4(), TransactionKind::Income, 10),
                Uuid::new_v4(),
            )
            .await;
        assert!(matches!(result, Err(Error::PostingFailed)));
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_failure_is_opaque_and_leaves_balance() -> Result<()> {
        let (db, user_id, account, category) = setup_with_account_and_category(100).await?;
        db.execute_unprepared("DROP TABLE transactions").await?;
        let service = TransactionService::new(db.clone());

        let result = service
            .post_transaction(posting(account.id, category.id, TransactionKind::Expense, 10), user_id)
            .await;
        assert!(matches!(result, Err(Error::PostingFailed)));
        assert_eq!(balance_of(&db, account.id).await?, 100);
        Ok(())
    }

    #[tokio::test]
    async fn test_balance_write_failure_rolls_back_ledger_insert() -> Result<()> {
        let (db, user_id, account, category) = setup_with_account_and_category(100).await?;
        db.execute_unprepared(
            "CREATE TRIGGER freeze_balances BEFORE UPDATE ON accounts \
             BEGIN SELECT RAISE(ABORT, 'balances are frozen'); END;",
        )
        .await?;
        let service = TransactionService::new(db.clone());

        let result = service
            .post_transaction(posting(account.id, category.id, TransactionKind::Expense, 10), user_id)
            .await;
        assert!(matches!(result, Err(Error::PostingFailed)));
        assert_eq!(balance_of(&db, account.id).await?, 100);
        assert_eq!(Transaction::find().count(&db).await?, 0);
        Ok(())
    }
}
