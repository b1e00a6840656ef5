//! The monthly dashboard.
//!
//! Computes a month's totals compared with the previous month, breaks the
//! month's incomes and expenses down by category, and builds a trend series
//! over the months leading up to it.

mod assembler;
mod breakdown;
mod summary;
mod trend;

pub use assembler::{CategoryBreakdowns, MonthlyData, get_monthly_dashboard_data};
pub use breakdown::{CategoryBreakdown, SubCategoryTotal, compute_breakdown};
pub use summary::{PeriodTotals, Summary, compute_summary};
pub use trend::{MonthlyTrend, TrendPoint, compute_trend};
