//! Category models and the ID-to-name lookup used by breakdowns.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{CategoryId, SubCategoryId},
    stores::CategoryDirectory,
    transaction::TransactionKind,
    user::UserId,
};

/// The label for transactions whose category cannot be resolved.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// The label for transactions without a resolvable sub-category.
pub const OTHER_SUB_CATEGORY_LABEL: &str = "Other";

/// A global income or expense category, e.g. "給与" or "食費".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name.
    pub name: String,
    /// Whether the category is for incomes or expenses.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

/// A user-defined sub-category under a global category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    /// The ID of the sub-category.
    pub id: SubCategoryId,
    /// The display name.
    pub name: String,
    /// The parent category.
    pub category_id: CategoryId,
    /// The user that defined the sub-category.
    pub user_id: UserId,
}

/// Resolves category and sub-category IDs to display names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryLookup {
    categories: HashMap<CategoryId, String>,
    sub_categories: HashMap<SubCategoryId, String>,
}

impl CategoryLookup {
    /// Create a lookup from category and sub-category lists.
    ///
    /// Sub-categories whose parent is not in `categories` are left out, so a
    /// lookup built from expense categories never resolves a sub-category
    /// filed under an income category.
    pub fn new(categories: &[Category], sub_categories: &[SubCategory]) -> Self {
        let categories: HashMap<CategoryId, String> = categories
            .iter()
            .map(|category| (category.id.clone(), category.name.clone()))
            .collect();

        let sub_categories = sub_categories
            .iter()
            .filter(|sub_category| categories.contains_key(&sub_category.category_id))
            .map(|sub_category| (sub_category.id.clone(), sub_category.name.clone()))
            .collect();

        Self {
            categories,
            sub_categories,
        }
    }

    /// A lookup that resolves nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the categories of `kind` and the user's sub-categories under them.
    ///
    /// Sub-categories of other users are dropped even if the directory
    /// returns them.
    ///
    /// # Errors
    ///
    /// Returns any error from the directory.
    pub async fn load<D>(
        directory: &D,
        user_id: &UserId,
        kind: TransactionKind,
    ) -> Result<Self, Error>
    where
        D: CategoryDirectory + ?Sized,
    {
        let (categories, sub_categories) = tokio::try_join!(
            directory.list_categories(kind),
            directory.list_sub_categories(user_id)
        )?;

        let fetched = sub_categories.len();
        let sub_categories: Vec<SubCategory> = sub_categories
            .into_iter()
            .filter(|sub_category| &sub_category.user_id == user_id)
            .collect();

        if sub_categories.len() != fetched {
            tracing::error!(
                "directory returned {} sub-categories of other users, they were dropped",
                fetched - sub_categories.len()
            );
        }

        Ok(Self::new(&categories, &sub_categories))
    }

    /// The name of the category with `id`.
    pub fn category_name(&self, id: &str) -> Option<&str> {
        self.categories.get(id).map(String::as_str)
    }

    /// The name of the sub-category with `id`.
    pub fn sub_category_name(&self, id: &str) -> Option<&str> {
        self.sub_categories.get(id).map(String::as_str)
    }
}
