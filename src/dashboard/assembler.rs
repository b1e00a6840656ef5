//! Builds the complete dashboard for one month.

use serde::Serialize;

use crate::{
    Error,
    category::CategoryLookup,
    config::{DashboardConfig, PreviousPeriodPolicy},
    dashboard::{
        breakdown::{CategoryBreakdown, compute_breakdown},
        summary::{PeriodTotals, Summary},
        trend::{MonthlyTrend, fetch_trend_transactions, fold_trend},
    },
    period::{MonthKey, Period},
    stores::{CategoryDirectory, TransactionStore, fetch_transactions},
    transaction::{Transaction, TransactionKind},
    user::UserId,
};

/// The income and expense breakdowns for the month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdowns {
    /// Incomes grouped by category.
    pub income: Vec<CategoryBreakdown>,
    /// Expenses grouped by category.
    pub expense: Vec<CategoryBreakdown>,
}

/// Everything the dashboard shows for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyData {
    /// The selected month.
    pub period: MonthKey,
    /// Totals and differences from the previous month.
    pub summary: Summary,
    /// The month's incomes.
    pub incomes: Vec<Transaction>,
    /// The month's expenses.
    pub expenses: Vec<Transaction>,
    /// The month's incomes and expenses grouped by category.
    pub category_breakdown: CategoryBreakdowns,
    /// Totals for the months leading up to and including the selected month.
    pub monthly_trend: MonthlyTrend,
}

impl MonthlyData {
    /// The number of incomes and expenses recorded in the month.
    ///
    /// Lets callers apply their own minimum-data rules.
    pub fn transaction_count(&self) -> usize {
        self.incomes.len() + self.expenses.len()
    }

    /// The number of months in the trend window with any income or expense.
    pub fn months_with_activity(&self) -> usize {
        self.monthly_trend.months_with_activity()
    }
}

fn needs_lookup(transactions: &[Transaction]) -> bool {
    transactions.iter().any(|transaction| {
        transaction.category_name.is_none()
            || (transaction.sub_category_id.is_some() && transaction.sub_category_name.is_none())
    })
}

/// Load the category names for `transactions` if any of them lack names.
async fn lookup_for<D>(
    directory: &D,
    user_id: &UserId,
    kind: TransactionKind,
    transactions: &[Transaction],
    config: &DashboardConfig,
) -> Result<CategoryLookup, Error>
where
    D: CategoryDirectory + ?Sized,
{
    if !needs_lookup(transactions) {
        return Ok(CategoryLookup::empty());
    }

    tokio::time::timeout(
        config.fetch_timeout,
        CategoryLookup::load(directory, user_id, kind),
    )
    .await
    .map_err(|_| Error::DataFetchError(format!("reading {kind} categories timed out")))?
    .map_err(Error::into_fetch_error)
    .inspect_err(|error| tracing::error!("could not read {kind} categories: {error}"))
}

/// Build the dashboard for `month` of `year` for one user.
///
/// Six reads run concurrently: income and expense for the selected month, for
/// the previous month and for the trend window. The breakdowns reuse the
/// selected month's records.
///
/// A failed read of the selected month or the trend window fails the call.
/// A failed read of the previous month is handled by
/// `config.previous_period_policy`: with [PreviousPeriodPolicy::Degrade] the
/// summary is returned without previous totals or diffs.
///
/// # Errors
///
/// Returns [Error::InvalidMonth] for a month outside 1-12,
/// [Error::InvalidTrendWindow] for an empty trend window and
/// [Error::DataFetchError] if a required read fails or times out.
pub async fn get_monthly_dashboard_data<S, D>(
    store: &S,
    directory: &D,
    user_id: &UserId,
    year: i32,
    month: u8,
    config: &DashboardConfig,
) -> Result<MonthlyData, Error>
where
    S: TransactionStore + ?Sized,
    D: CategoryDirectory + ?Sized,
{
    let current = Period::new(year, month)?;
    let previous = current.previous()?;
    let window = current.window_ending_here(config.trend_window)?;
    let timeout = config.fetch_timeout;

    let this_month = current.date_range();
    let last_month = previous.date_range();
    let read = |kind, range| fetch_transactions(store, user_id, kind, range, timeout);

    let (incomes, expenses, last_incomes, last_expenses, trend) = tokio::join!(
        read(TransactionKind::Income, this_month),
        read(TransactionKind::Expense, this_month),
        read(TransactionKind::Income, last_month),
        read(TransactionKind::Expense, last_month),
        fetch_trend_transactions(store, user_id, &window, config),
    );

    let incomes = incomes?;
    let expenses = expenses?;
    let (trend_incomes, trend_expenses) = trend?;

    let previous_totals = match (last_incomes, last_expenses) {
        (Ok(incomes), Ok(expenses)) => Some(PeriodTotals::from_transactions(&incomes, &expenses)),
        (Err(error), _) | (_, Err(error)) => match config.previous_period_policy {
            PreviousPeriodPolicy::Fail => return Err(error),
            PreviousPeriodPolicy::Degrade => {
                tracing::warn!(
                    "could not read {previous}, showing {current} without comparisons: {error}"
                );
                None
            }
        },
    };

    let (income_lookup, expense_lookup) = tokio::try_join!(
        lookup_for(
            directory,
            user_id,
            TransactionKind::Income,
            &incomes,
            config,
        ),
        lookup_for(
            directory,
            user_id,
            TransactionKind::Expense,
            &expenses,
            config,
        ),
    )?;

    let summary = Summary::new(
        PeriodTotals::from_transactions(&incomes, &expenses),
        previous_totals,
    );
    let category_breakdown = CategoryBreakdowns {
        income: compute_breakdown(&incomes, &income_lookup),
        expense: compute_breakdown(&expenses, &expense_lookup),
    };
    let monthly_trend = fold_trend(&window, &trend_incomes, &trend_expenses);

    tracing::debug!(
        "built dashboard for {current}: {} incomes, {} expenses",
        incomes.len(),
        expenses.len()
    );

    Ok(MonthlyData {
        period: current.key(),
        summary,
        incomes,
        expenses,
        category_breakdown,
        monthly_trend,
    })
}
