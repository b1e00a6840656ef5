//! The spending analysis.
//!
//! The narrative is written by an external collaborator. This module checks
//! whether a user has enough data, prepares the figures it is given, rate
//! limits requests and keeps a history of results.

mod db;
mod figures;
mod service;

pub use db::{create_analysis_table, get_analyses, insert_analysis};
pub use figures::{Comparison, Comparisons, DataSufficiency, MonthlyFigures, monthly_figures};
pub use service::{
    AnalysisGenerator, AnalysisHistory, AnalysisRequest, AnalysisResult, AnalysisService,
    StoredAnalysis, Suggestion,
};
