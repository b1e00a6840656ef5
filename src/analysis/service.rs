//! Prepares a user's monthly figures for the text-generation collaborator
//! and records the analyses it produces.

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    analysis::figures::{Comparisons, DataSufficiency, MonthlyFigures, monthly_figures},
    config::AnalysisConfig,
    database_id::AnalysisId,
    period::{DateRange, MonthKey, Period, window_range},
    rate_limit::RateLimiter,
    stores::{TransactionStore, fetch_transactions},
    transaction::TransactionKind,
    user::UserId,
};

/// A titled piece of advice in an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// A short heading.
    pub title: String,
    /// The advice.
    pub content: String,
}

/// A generated analysis of a user's spending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Observations about the user's recent months.
    pub trends: Vec<String>,
    /// Income and expense compared with the previous month.
    pub comparisons: Comparisons,
    /// Advice for the user.
    pub suggestions: Vec<Suggestion>,
}

/// The figures sent to the text-generation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// The latest month with data.
    pub current_month: MonthlyFigures,
    /// The month with data before `current_month`.
    pub previous_month: MonthlyFigures,
    /// Percentage changes from `previous_month` to `current_month`.
    pub comparisons: Comparisons,
}

/// An analysis saved to a user's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalysis {
    /// The ID of the saved analysis.
    pub id: AnalysisId,
    /// The user the analysis is for.
    pub user_id: UserId,
    /// The kind of analysis, currently always "monthly".
    #[serde(rename = "type")]
    pub kind: String,
    /// The analysis itself.
    pub insights: AnalysisResult,
    /// When the analysis was saved.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Writes the narrative analysis, e.g. by calling a language model.
#[async_trait]
pub trait AnalysisGenerator: Send + Sync {
    /// Produce an analysis of `request`.
    ///
    /// # Errors
    ///
    /// Implementations should return [Error::AnalysisError] on failure.
    async fn generate(&self, request: &AnalysisRequest) -> Result<AnalysisResult, Error>;
}

/// Persists generated analyses.
#[async_trait]
pub trait AnalysisHistory: Send + Sync {
    /// Save `result` to the user's history.
    async fn save_analysis(
        &self,
        user_id: &UserId,
        result: &AnalysisResult,
    ) -> Result<StoredAnalysis, Error>;

    /// Get the user's saved analyses, newest first.
    async fn list_analyses(&self, user_id: &UserId) -> Result<Vec<StoredAnalysis>, Error>;
}

/// Runs spending analyses for users.
///
/// Requests are rate limited per user. An analysis compares the two latest
/// months with data in the lookback window.
#[derive(Clone)]
pub struct AnalysisService {
    store: Arc<dyn TransactionStore>,
    generator: Arc<dyn AnalysisGenerator>,
    history: Arc<dyn AnalysisHistory>,
    rate_limiter: Arc<dyn RateLimiter>,
    config: AnalysisConfig,
}

impl AnalysisService {
    /// Create a service from its collaborators.
    pub fn new(
        store: Arc<dyn TransactionStore>,
        generator: Arc<dyn AnalysisGenerator>,
        history: Arc<dyn AnalysisHistory>,
        rate_limiter: Arc<dyn RateLimiter>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            store,
            generator,
            history,
            rate_limiter,
            config,
        }
    }

    fn lookback_range(&self, anchor: Period) -> Result<DateRange, Error> {
        let window = anchor.window_ending_here(self.config.lookback_months)?;

        window_range(&window).ok_or(Error::InvalidTrendWindow(self.config.lookback_months))
    }

    /// The minimum number of months with data an analysis needs.
    ///
    /// Never below two, since the analysis compares two months.
    fn required_months(&self) -> usize {
        self.config.min_months.max(2)
    }

    /// Count the months in the lookback window ending at `anchor` that
    /// contain an income.
    ///
    /// # Errors
    ///
    /// Returns [Error::DataFetchError] if the read fails or times out.
    pub async fn check_data(
        &self,
        user_id: &UserId,
        anchor: Period,
    ) -> Result<DataSufficiency, Error> {
        let range = self.lookback_range(anchor)?;
        let incomes = fetch_transactions(
            self.store.as_ref(),
            user_id,
            TransactionKind::Income,
            range,
            self.config.fetch_timeout,
        )
        .await?;

        let months = incomes
            .iter()
            .map(|income| MonthKey::of(income.date))
            .collect::<HashSet<_>>()
            .len();

        Ok(DataSufficiency {
            months,
            has_enough: months >= self.required_months(),
        })
    }

    /// Analyse the user's spending over the lookback window ending at `anchor`
    /// and save the result to their history.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::RateLimited] if the user has made too many requests,
    /// - [Error::DataFetchError] if a read fails or times out,
    /// - [Error::InsufficientData] if too few months have data,
    /// - or any error from the generator or the history.
    pub async fn analyze(
        &self,
        user_id: &UserId,
        anchor: Period,
    ) -> Result<AnalysisResult, Error> {
        if !self.rate_limiter.check(user_id.as_str()) {
            return Err(Error::RateLimited);
        }

        let range = self.lookback_range(anchor)?;
        let timeout = self.config.fetch_timeout;
        let store = self.store.as_ref();

        let (incomes, expenses) = tokio::try_join!(
            fetch_transactions(store, user_id, TransactionKind::Income, range, timeout),
            fetch_transactions(store, user_id, TransactionKind::Expense, range, timeout),
        )?;

        let figures = monthly_figures(&incomes, &expenses);
        let required = self.required_months();

        let [.., previous_month, current_month] = figures.as_slice() else {
            return Err(Error::InsufficientData {
                months: figures.len(),
                required,
            });
        };

        if figures.len() < required {
            return Err(Error::InsufficientData {
                months: figures.len(),
                required,
            });
        }

        let request = AnalysisRequest {
            current_month: *current_month,
            previous_month: *previous_month,
            comparisons: Comparisons::between(current_month, previous_month),
        };

        let result = self
            .generator
            .generate(&request)
            .await
            .inspect_err(|error| {
                tracing::error!("could not generate analysis for {range}: {error}")
            })?;

        let stored = self.history.save_analysis(user_id, &result).await?;
        tracing::info!("saved analysis {} for {range}", stored.id);

        Ok(result)
    }

    /// Get the user's saved analyses, newest first.
    pub async fn history(&self, user_id: &UserId) -> Result<Vec<StoredAnalysis>, Error> {
        self.history.list_analyses(user_id).await
    }
}
