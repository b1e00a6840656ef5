//! Monthly totals and the month-over-month differences.

use serde::Serialize;

use crate::{
    Error,
    config::DashboardConfig,
    period::Period,
    stores::{TransactionStore, fetch_transactions},
    transaction::{Transaction, TransactionKind},
    user::UserId,
};

/// The income, expense and balance totals for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    /// The sum of all incomes.
    pub income: i64,
    /// The sum of all expenses.
    pub expense: i64,
    /// Income minus expense, may be negative.
    pub balance: i64,
}

impl PeriodTotals {
    /// Sum the amounts of a month's incomes and expenses.
    pub fn from_transactions(incomes: &[Transaction], expenses: &[Transaction]) -> Self {
        let income = incomes.iter().map(|income| income.amount).sum();
        let expense = expenses.iter().map(|expense| expense.amount).sum();

        Self {
            income,
            expense,
            balance: income - expense,
        }
    }
}

/// The totals for the selected month compared with the month before.
///
/// Diffs are absolute amounts, current minus previous. When the previous
/// month could not be read the previous totals and the diffs are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The sum of the month's incomes.
    pub total_income: i64,
    /// The sum of the month's expenses.
    pub total_expense: i64,
    /// `total_income - total_expense`.
    pub balance: i64,
    /// The previous month's income.
    pub last_month_total_income: Option<i64>,
    /// The previous month's expenses.
    pub last_month_total_expense: Option<i64>,
    /// The previous month's balance.
    pub last_month_balance: Option<i64>,
    /// `total_income - last_month_total_income`.
    pub income_diff: Option<i64>,
    /// `total_expense - last_month_total_expense`.
    pub expense_diff: Option<i64>,
    /// `balance - last_month_balance`.
    pub balance_diff: Option<i64>,
    /// Whether the previous month was read successfully.
    pub previous_period_available: bool,
}

impl Summary {
    /// Build a summary from the current totals and, if known, the previous ones.
    pub fn new(current: PeriodTotals, previous: Option<PeriodTotals>) -> Self {
        Self {
            total_income: current.income,
            total_expense: current.expense,
            balance: current.balance,
            last_month_total_income: previous.map(|previous| previous.income),
            last_month_total_expense: previous.map(|previous| previous.expense),
            last_month_balance: previous.map(|previous| previous.balance),
            income_diff: previous.map(|previous| current.income - previous.income),
            expense_diff: previous.map(|previous| current.expense - previous.expense),
            balance_diff: previous.map(|previous| current.balance - previous.balance),
            previous_period_available: previous.is_some(),
        }
    }
}

/// Compute the summary for `month` of `year` for one user.
///
/// The four reads (income and expense for this month and the month before)
/// run concurrently. Any failed read fails the whole computation.
///
/// # Errors
///
/// Returns [Error::InvalidMonth] for a month outside 1-12 and
/// [Error::DataFetchError] if a read fails or times out.
pub async fn compute_summary<S>(
    store: &S,
    user_id: &UserId,
    year: i32,
    month: u8,
    config: &DashboardConfig,
) -> Result<Summary, Error>
where
    S: TransactionStore + ?Sized,
{
    let current = Period::new(year, month)?;
    let previous = current.previous()?;
    let timeout = config.fetch_timeout;

    let this_month = current.date_range();
    let last_month = previous.date_range();

    let read = |kind, range| fetch_transactions(store, user_id, kind, range, timeout);

    let (incomes, expenses, last_incomes, last_expenses) = tokio::try_join!(
        read(TransactionKind::Income, this_month),
        read(TransactionKind::Expense, this_month),
        read(TransactionKind::Income, last_month),
        read(TransactionKind::Expense, last_month),
    )?;

    Ok(Summary::new(
        PeriodTotals::from_transactions(&incomes, &expenses),
        Some(PeriodTotals::from_transactions(&last_incomes, &last_expenses)),
    ))
}
