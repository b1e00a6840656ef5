//! Monthly income and expense totals over a window of recent months.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    Error,
    config::DashboardConfig,
    period::{MonthKey, Period, window_range},
    stores::{TransactionStore, fetch_transactions},
    transaction::{Transaction, TransactionKind},
    user::UserId,
};

/// The total for one month of the trend window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// The display label, e.g. "2025年1月".
    pub month: String,
    /// The month the point belongs to.
    pub key: MonthKey,
    /// The sum of the month's amounts, 0 for months without records.
    pub amount: i64,
}

/// The income and expense series, oldest month first.
///
/// Both series have one point per month of the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTrend {
    /// Income per month.
    pub income: Vec<TrendPoint>,
    /// Expenses per month.
    pub expense: Vec<TrendPoint>,
}

impl MonthlyTrend {
    /// The number of months with a non-zero income or expense.
    pub fn months_with_activity(&self) -> usize {
        self.income
            .iter()
            .zip(&self.expense)
            .filter(|(income, expense)| income.amount != 0 || expense.amount != 0)
            .count()
    }
}

/// Sum `transactions` into one bucket per month of `window`.
///
/// Every month starts at zero so months without records still appear.
/// Records dated outside the window are skipped.
fn fold_series(window: &[Period], transactions: &[Transaction]) -> Vec<TrendPoint> {
    let mut totals: HashMap<MonthKey, i64> =
        window.iter().map(|period| (period.key(), 0)).collect();

    for transaction in transactions {
        match totals.get_mut(&MonthKey::of(transaction.date)) {
            Some(total) => *total += transaction.amount,
            None => tracing::debug!(
                "skipping {} {} dated {}, outside of the trend window",
                transaction.kind,
                transaction.id,
                transaction.date
            ),
        }
    }

    window
        .iter()
        .map(|period| TrendPoint {
            month: period.label(),
            key: period.key(),
            amount: totals.get(&period.key()).copied().unwrap_or_default(),
        })
        .collect()
}

pub(super) fn fold_trend(
    window: &[Period],
    incomes: &[Transaction],
    expenses: &[Transaction],
) -> MonthlyTrend {
    MonthlyTrend {
        income: fold_series(window, incomes),
        expense: fold_series(window, expenses),
    }
}

/// Read the records for the trend window, one read per kind for the whole window.
pub(super) async fn fetch_trend_transactions<S>(
    store: &S,
    user_id: &UserId,
    window: &[Period],
    config: &DashboardConfig,
) -> Result<(Vec<Transaction>, Vec<Transaction>), Error>
where
    S: TransactionStore + ?Sized,
{
    let Some(range) = window_range(window) else {
        return Err(Error::InvalidTrendWindow(window.len()));
    };

    tracing::debug!("reading trend window {range}");

    let timeout = config.fetch_timeout;

    tokio::try_join!(
        fetch_transactions(store, user_id, TransactionKind::Income, range, timeout),
        fetch_transactions(store, user_id, TransactionKind::Expense, range, timeout),
    )
}

/// Compute the trend for the `config.trend_window` months ending at and
/// including `month` of `year`.
///
/// # Errors
///
/// Returns [Error::InvalidMonth] for a month outside 1-12,
/// [Error::InvalidTrendWindow] for an empty window and
/// [Error::DataFetchError] if a read fails or times out.
pub async fn compute_trend<S>(
    store: &S,
    user_id: &UserId,
    year: i32,
    month: u8,
    config: &DashboardConfig,
) -> Result<MonthlyTrend, Error>
where
    S: TransactionStore + ?Sized,
{
    let window = Period::new(year, month)?.window_ending_here(config.trend_window)?;
    let (incomes, expenses) = fetch_trend_transactions(store, user_id, &window, config).await?;

    Ok(fold_trend(&window, &incomes, &expenses))
}
