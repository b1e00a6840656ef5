//! Defines the core data models for incomes and expenses.

use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    database_id::{CategoryId, SubCategoryId, TransactionId},
    user::UserId,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
///
/// Also used as the type of a category, since categories are either income
/// or expense categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionKind {
    /// The value stored in the database and used in JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// The table that records of this kind are stored in.
    pub(crate) fn table_name(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown transaction kind \"{other}\"").into(),
            )),
        }
    }
}

/// An income or expense record.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserId,
    /// Whether this is an income or an expense.
    pub kind: TransactionKind,
    /// A short description of what the transaction was for.
    pub title: String,
    /// The amount in yen. Never negative.
    pub amount: i64,
    /// When the transaction happened.
    pub date: Date,
    /// The category the transaction is filed under.
    pub category_id: CategoryId,
    /// The category's display name, when joined by the store.
    pub category_name: Option<String>,
    /// The user's sub-category, if any.
    pub sub_category_id: Option<SubCategoryId>,
    /// The sub-category's display name, when joined by the store.
    pub sub_category_name: Option<String>,
    /// Free-form notes.
    pub memo: Option<String>,
    /// Whether an expense has been paid. Always `None` for incomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid: Option<bool>,
    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the record was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        kind: TransactionKind,
        amount: i64,
        date: Date,
        category_id: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            title: String::new(),
            amount,
            date,
            category_id: category_id.to_owned(),
            sub_category_id: None,
            memo: None,
            paid: false,
        }
    }
}

/// A builder for creating and updating [Transaction] records.
///
/// # Examples
///
/// ```
/// use kakeibo_rs::{Transaction, TransactionKind};
/// use time::macros::date;
///
/// let rent = Transaction::build(TransactionKind::Expense, 85_000, date!(2025 - 01 - 15), "rent")
///     .title("January rent")
///     .paid(true);
///
/// assert!(rent.validate().is_ok());
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Whether to create an income or an expense.
    pub kind: TransactionKind,
    /// A short description of what the transaction was for.
    pub title: String,
    /// The amount in yen.
    pub amount: i64,
    /// When the transaction happened.
    pub date: Date,
    /// The category to file the transaction under.
    ///
    /// Must be a category of the same kind as the transaction.
    pub category_id: CategoryId,
    /// One of the user's sub-categories under `category_id`.
    pub sub_category_id: Option<SubCategoryId>,
    /// Free-form notes.
    pub memo: Option<String>,
    /// Whether the expense has been paid. Ignored for incomes.
    pub paid: bool,
}

impl TransactionBuilder {
    /// Set the title for the transaction.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    /// Set the sub-category for the transaction.
    pub fn sub_category_id(mut self, sub_category_id: Option<&str>) -> Self {
        self.sub_category_id = sub_category_id.map(ToOwned::to_owned);
        self
    }

    /// Set the memo for the transaction.
    pub fn memo(mut self, memo: Option<&str>) -> Self {
        self.memo = memo.map(ToOwned::to_owned);
        self
    }

    /// Set whether the expense has been paid.
    pub fn paid(mut self, paid: bool) -> Self {
        self.paid = paid;
        self
    }

    /// Check the invariants that do not need the database.
    ///
    /// # Errors
    ///
    /// Returns [Error::NegativeAmount] if the amount is below zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.amount < 0 {
            return Err(Error::NegativeAmount(self.amount));
        }

        Ok(())
    }
}
