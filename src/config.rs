//! Settings for the dashboard, analysis and rate limiting.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The number of months shown in the trend series by default.
pub const DEFAULT_TREND_WINDOW: usize = 6;

/// The time limit applied to each store read by default.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// What the dashboard does when the previous month cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PreviousPeriodPolicy {
    /// Show the current month without comparisons. The previous-month totals
    /// and the diffs are left empty rather than reported as zero.
    #[default]
    Degrade,
    /// Fail the whole request.
    Fail,
}

/// The config for building the monthly dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// The number of months in the trend series, including the selected month.
    pub trend_window: usize,
    /// The time limit for each store read.
    pub fetch_timeout: Duration,
    /// How to handle a failed read of the previous month.
    pub previous_period_policy: PreviousPeriodPolicy,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            trend_window: DEFAULT_TREND_WINDOW,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            previous_period_policy: PreviousPeriodPolicy::default(),
        }
    }
}

impl DashboardConfig {
    /// Set the number of months in the trend series.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTrendWindow] if `months` is zero.
    pub fn with_trend_window(mut self, months: usize) -> Result<Self, Error> {
        if months == 0 {
            return Err(Error::InvalidTrendWindow(months));
        }

        self.trend_window = months;
        Ok(self)
    }

    /// Set the time limit for each store read.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set how to handle a failed read of the previous month.
    pub fn with_previous_period_policy(mut self, policy: PreviousPeriodPolicy) -> Self {
        self.previous_period_policy = policy;
        self
    }
}

/// The config for the fixed-window rate limiter.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// The length of a window.
    pub window: Duration,
    /// The number of requests allowed per key in a window.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: 5,
        }
    }
}

/// The config for preparing spending analyses.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// The number of months, including the selected month, to analyse.
    pub lookback_months: usize,
    /// The minimum number of months with data needed for an analysis.
    pub min_months: usize,
    /// The time limit for each store read.
    pub fetch_timeout: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookback_months: 3,
            min_months: 2,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::Error;

    use super::{DashboardConfig, PreviousPeriodPolicy};

    #[test]
    fn defaults_match_the_dashboard() {
        let config = DashboardConfig::default();

        assert_eq!(config.trend_window, 6);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.previous_period_policy, PreviousPeriodPolicy::Degrade);
    }

    #[test]
    fn rejects_empty_trend_window() {
        let result = DashboardConfig::default().with_trend_window(0);

        assert_eq!(result, Err(Error::InvalidTrendWindow(0)));
    }

    #[test]
    fn policy_deserializes_from_kebab_case() {
        let policy: PreviousPeriodPolicy = serde_json::from_str("\"fail\"").unwrap();

        assert_eq!(policy, PreviousPeriodPolicy::Fail);
    }
}
