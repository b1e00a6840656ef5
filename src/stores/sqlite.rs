//! Implements the stores on top of a SQLite database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use crate::{
    Error,
    analysis::{AnalysisHistory, AnalysisResult, StoredAnalysis, get_analyses, insert_analysis},
    category::{Category, SubCategory, get_categories, get_sub_categories},
    db::initialize,
    period::DateRange,
    stores::{CategoryDirectory, TransactionStore},
    transaction::{
        Transaction, TransactionBuilder, TransactionKind, create_transaction, delete_transaction,
        list_recent_transactions, list_transactions, set_expense_paid, update_transaction,
    },
    user::UserId,
};

/// Stores incomes, expenses, categories and analyses in a SQLite database.
///
/// Queries run on the blocking thread pool so they do not stall the async
/// runtime. The connection is shared behind a mutex, so queries from
/// concurrent tasks are serialised.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Create a store for `connection`, creating the tables if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        initialize(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Create an income or expense for `user_id`.
    pub async fn create_transaction(
        &self,
        user_id: &UserId,
        builder: TransactionBuilder,
    ) -> Result<Transaction, Error> {
        let user_id = user_id.clone();
        self.run(move |connection| create_transaction(builder, &user_id, connection))
            .await
    }

    /// Replace the fields of one of the user's transactions.
    pub async fn update_transaction(
        &self,
        user_id: &UserId,
        id: &str,
        builder: TransactionBuilder,
    ) -> Result<Transaction, Error> {
        let user_id = user_id.clone();
        let id = id.to_owned();
        self.run(move |connection| update_transaction(&id, builder, &user_id, connection))
            .await
    }

    /// Mark one of the user's expenses as paid or unpaid.
    pub async fn set_expense_paid(
        &self,
        user_id: &UserId,
        id: &str,
        paid: bool,
    ) -> Result<(), Error> {
        let user_id = user_id.clone();
        let id = id.to_owned();
        self.run(move |connection| set_expense_paid(&id, paid, &user_id, connection))
            .await
    }

    /// Delete one of the user's transactions.
    pub async fn delete_transaction(
        &self,
        user_id: &UserId,
        kind: TransactionKind,
        id: &str,
    ) -> Result<(), Error> {
        let user_id = user_id.clone();
        let id = id.to_owned();
        self.run(move |connection| delete_transaction(kind, &id, &user_id, connection))
            .await
    }

    /// Get the user's latest `limit` incomes or expenses, newest first.
    pub async fn list_recent_transactions(
        &self,
        user_id: &UserId,
        kind: TransactionKind,
        limit: usize,
    ) -> Result<Vec<Transaction>, Error> {
        let user_id = user_id.clone();
        self.run(move |connection| list_recent_transactions(kind, &user_id, limit, connection))
            .await
    }

    async fn run<T, F>(&self, query: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
    {
        let connection = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let connection = connection
                .lock()
                .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
                .map_err(|_| Error::DatabaseLockError)?;

            query(&connection)
        })
        .await
        .map_err(|error| Error::BackgroundTaskError(error.to_string()))?
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn list_transactions(
        &self,
        user_id: &UserId,
        kind: TransactionKind,
        date_range: DateRange,
    ) -> Result<Vec<Transaction>, Error> {
        let user_id = user_id.clone();
        self.run(move |connection| list_transactions(kind, &user_id, date_range, connection))
            .await
            .map_err(Error::into_fetch_error)
    }
}

#[async_trait]
impl CategoryDirectory for SqliteStore {
    async fn list_categories(&self, kind: TransactionKind) -> Result<Vec<Category>, Error> {
        self.run(move |connection| get_categories(kind, connection))
            .await
    }

    async fn list_sub_categories(&self, user_id: &UserId) -> Result<Vec<SubCategory>, Error> {
        let user_id = user_id.clone();
        self.run(move |connection| get_sub_categories(&user_id, connection))
            .await
    }
}

#[async_trait]
impl AnalysisHistory for SqliteStore {
    async fn save_analysis(
        &self,
        user_id: &UserId,
        result: &AnalysisResult,
    ) -> Result<StoredAnalysis, Error> {
        let user_id = user_id.clone();
        let result = result.clone();
        self.run(move |connection| insert_analysis(&user_id, &result, connection))
            .await
    }

    async fn list_analyses(&self, user_id: &UserId) -> Result<Vec<StoredAnalysis>, Error> {
        let user_id = user_id.clone();
        self.run(move |connection| get_analyses(&user_id, connection))
            .await
    }
}
