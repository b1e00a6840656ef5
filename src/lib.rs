//! Kakeibo is a household-finance ledger: users record incomes and expenses
//! against categories and sub-categories and review a monthly dashboard.
//!
//! This library provides the dashboard aggregation engine (monthly summaries,
//! category breakdowns and trend series), the SQLite-backed transaction store
//! it reads from, and the data preparation behind the spending analysis.

#![warn(missing_docs)]

mod analysis;
mod category;
mod config;
mod dashboard;
mod database_id;
mod db;
mod period;
mod rate_limit;
mod stores;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use analysis::{
    AnalysisGenerator, AnalysisHistory, AnalysisRequest, AnalysisResult, AnalysisService,
    Comparison, Comparisons, DataSufficiency, MonthlyFigures, StoredAnalysis, Suggestion,
    monthly_figures,
};
pub use category::{
    CachedCategoryDirectory, Category, CategoryLookup, OTHER_SUB_CATEGORY_LABEL, SubCategory,
    UNCATEGORIZED_LABEL, create_sub_category, get_categories, get_category_by_name,
    get_sub_categories, seed_default_categories,
};
pub use config::{
    AnalysisConfig, DEFAULT_FETCH_TIMEOUT, DEFAULT_TREND_WINDOW, DashboardConfig,
    PreviousPeriodPolicy, RateLimitConfig,
};
pub use dashboard::{
    CategoryBreakdown, CategoryBreakdowns, MonthlyData, MonthlyTrend, PeriodTotals,
    SubCategoryTotal, Summary, TrendPoint, compute_breakdown, compute_summary, compute_trend,
    get_monthly_dashboard_data,
};
pub use database_id::{AnalysisId, CategoryId, SubCategoryId, TransactionId};
pub use db::initialize as initialize_db;
pub use period::{DateRange, MonthKey, Period};
pub use rate_limit::{FixedWindowRateLimiter, RateLimiter};
pub use stores::{CategoryDirectory, SqliteStore, TransactionStore};
pub use timezone::{current_period, get_local_offset};
pub use transaction::{
    RECENT_TRANSACTIONS_LIMIT, Transaction, TransactionBuilder, TransactionKind, create_transaction,
    delete_transaction, get_transaction, list_recent_transactions, list_transactions,
    set_expense_paid, update_transaction,
};
pub use user::{UserId, require_user};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// There is no authenticated user for the request.
    ///
    /// Raised before any computation is attempted.
    #[error("not authenticated")]
    Unauthenticated,

    /// A read from the transaction store failed, including reads that timed
    /// out.
    ///
    /// Aggregations never return partial results alongside this error.
    #[error("could not fetch data: {0}")]
    DataFetchError(String),

    /// A feature needs more months of data than the user has recorded.
    #[error("at least {required} months of data are required, found {months}")]
    InsufficientData {
        /// The number of distinct months that contain data.
        months: usize,
        /// The minimum number of months the feature needs.
        required: usize,
    },

    /// The caller has exceeded the request limit for the current window.
    #[error("too many requests")]
    RateLimited,

    /// A month number outside of 1-12.
    #[error("{0} is not a valid month, expected a number from 1 to 12")]
    InvalidMonth(u8),

    /// A year and month that cannot be represented as a calendar date.
    #[error("{year}-{month:02} is not a supported calendar month")]
    InvalidPeriod {
        /// The requested year.
        year: i32,
        /// The requested month number.
        month: u8,
    },

    /// Transaction amounts are recorded as non-negative integers.
    #[error("{0} is a negative amount, which is not allowed")]
    NegativeAmount(i64),

    /// A trend window must contain at least one month.
    #[error("invalid trend window size {0}, the window must contain at least one month")]
    InvalidTrendWindow(usize),

    /// The category ID does not refer to a valid category.
    #[error("the category ID \"{0}\" does not refer to a valid category")]
    InvalidCategory(String),

    /// The sub-category ID does not refer to one of the user's sub-categories
    /// under the transaction's category.
    #[error("the sub-category ID \"{0}\" does not refer to a valid sub-category")]
    InvalidSubCategory(String),

    /// An income was filed under an expense category or vice versa.
    #[error("the category type does not match the transaction type")]
    CategoryTypeMismatch,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist or belongs to
    /// another user.
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist or belongs to
    /// another user.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A blocking database task panicked or was cancelled.
    #[error("background task failed: {0}")]
    BackgroundTaskError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The text-generation collaborator failed to produce an analysis.
    #[error("analysis failed: {0}")]
    AnalysisError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// Convert a store error into the error reported by aggregations.
    ///
    /// Every store failure surfaces as [Error::DataFetchError] so callers
    /// only need to handle one kind of read failure.
    pub(crate) fn into_fetch_error(self) -> Self {
        match self {
            Error::DataFetchError(_) => self,
            error => Error::DataFetchError(error.to_string()),
        }
    }
}
