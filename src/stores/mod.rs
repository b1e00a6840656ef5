//! Contains the traits for the data the aggregation engine reads and their
//! SQLite implementation.
//!
//! The engine only depends on the traits, so the store can be swapped for a
//! hosted backend.

mod sqlite;

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    Error,
    category::{Category, SubCategory},
    period::DateRange,
    transaction::{Transaction, TransactionKind},
    user::UserId,
};

pub use sqlite::SqliteStore;

/// Read access to income and expense records.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Get the user's records of `kind` dated within `date_range`, inclusive.
    ///
    /// # Errors
    ///
    /// Implementations should return [Error::DataFetchError] when the backend
    /// fails. Other errors are converted to [Error::DataFetchError] by the
    /// aggregations.
    async fn list_transactions(
        &self,
        user_id: &UserId,
        kind: TransactionKind,
        date_range: DateRange,
    ) -> Result<Vec<Transaction>, Error>;
}

/// Read access to the global categories and per-user sub-categories.
#[async_trait]
pub trait CategoryDirectory: Send + Sync {
    /// Get the global categories of `kind`.
    async fn list_categories(&self, kind: TransactionKind) -> Result<Vec<Category>, Error>;

    /// Get the sub-categories defined by `user_id`.
    async fn list_sub_categories(&self, user_id: &UserId) -> Result<Vec<SubCategory>, Error>;
}

/// Read the user's records with a time limit.
///
/// Any failure, including the time limit expiring, is reported as
/// [Error::DataFetchError]. Records owned by other users are dropped.
pub(crate) async fn fetch_transactions<S>(
    store: &S,
    user_id: &UserId,
    kind: TransactionKind,
    date_range: DateRange,
    timeout: Duration,
) -> Result<Vec<Transaction>, Error>
where
    S: TransactionStore + ?Sized,
{
    let transactions =
        tokio::time::timeout(timeout, store.list_transactions(user_id, kind, date_range))
            .await
            .map_err(|_| {
                Error::DataFetchError(format!(
                    "reading {kind} records for {date_range} timed out after {timeout:?}"
                ))
            })
            .and_then(|result| result.map_err(Error::into_fetch_error))
            .inspect_err(|error| {
                tracing::error!("could not read {kind} records for {date_range}: {error}")
            })?;

    let fetched = transactions.len();
    let transactions: Vec<Transaction> = transactions
        .into_iter()
        .filter(|transaction| &transaction.user_id == user_id)
        .collect();

    if transactions.len() != fetched {
        tracing::error!(
            "store returned {} {kind} records that belong to other users, they were dropped",
            fetched - transactions.len()
        );
    }

    tracing::debug!(
        "read {} {kind} records for {date_range}",
        transactions.len()
    );

    Ok(transactions)
}
