//! Database ID type definitions.

use uuid::Uuid;

/// The ID of an income or expense record.
pub type TransactionId = String;
/// The ID of a global category.
pub type CategoryId = String;
/// The ID of a user's sub-category.
pub type SubCategoryId = String;
/// The ID of a stored spending analysis.
pub type AnalysisId = String;

/// Generate a new random row ID.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}
