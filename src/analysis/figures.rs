//! Monthly figures and percentage comparisons fed to the spending analysis.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{period::MonthKey, transaction::Transaction};

/// The income, expense and balance for one month with data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyFigures {
    /// The month.
    pub month: MonthKey,
    /// The sum of the month's incomes.
    pub income: i64,
    /// The sum of the month's expenses.
    pub expense: i64,
    /// `income - expense`.
    pub balance: i64,
}

/// Total `incomes` and `expenses` per month, oldest first.
///
/// Only months with at least one record are included.
pub fn monthly_figures(incomes: &[Transaction], expenses: &[Transaction]) -> Vec<MonthlyFigures> {
    let mut totals: BTreeMap<MonthKey, (i64, i64)> = BTreeMap::new();

    for income in incomes {
        totals.entry(MonthKey::of(income.date)).or_default().0 += income.amount;
    }

    for expense in expenses {
        totals.entry(MonthKey::of(expense.date)).or_default().1 += expense.amount;
    }

    totals
        .into_iter()
        .map(|(month, (income, expense))| MonthlyFigures {
            month,
            income,
            expense,
            balance: income - expense,
        })
        .collect()
}

/// One figure compared between two months.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// The value for the later month.
    pub current: i64,
    /// The value for the earlier month.
    pub previous: i64,
    /// The change as a percentage of `previous`.
    ///
    /// `None` when `previous` is zero.
    pub diff: Option<f64>,
}

impl Comparison {
    /// Compare `current` with `previous`.
    pub fn between(current: i64, previous: i64) -> Self {
        let diff = if previous == 0 {
            None
        } else {
            Some((current - previous) as f64 / previous as f64 * 100.0)
        };

        Self {
            current,
            previous,
            diff,
        }
    }
}

/// Income and expense compared between two months.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparisons {
    /// The income comparison.
    pub income: Comparison,
    /// The expense comparison.
    pub expense: Comparison,
}

impl Comparisons {
    /// Compare the figures of `current` with those of `previous`.
    pub fn between(current: &MonthlyFigures, previous: &MonthlyFigures) -> Self {
        Self {
            income: Comparison::between(current.income, previous.income),
            expense: Comparison::between(current.expense, previous.expense),
        }
    }
}

/// Whether a user has recorded enough months for an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSufficiency {
    /// The number of distinct months with at least one income.
    pub months: usize,
    /// Whether `months` meets the minimum.
    pub has_enough: bool,
}
