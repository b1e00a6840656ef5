//! Groups a month's transactions by category and sub-category.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    category::{CategoryLookup, OTHER_SUB_CATEGORY_LABEL, UNCATEGORIZED_LABEL},
    database_id::{CategoryId, SubCategoryId},
    transaction::Transaction,
};

/// The total for one category and its share of all categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    /// The category name.
    pub category: String,
    /// The sum of the category's transactions.
    pub total_amount: i64,
    /// The share of the total across all categories, 0-100.
    pub percentage: f64,
    /// The totals for each sub-category, in order of first appearance.
    pub sub_categories: Vec<SubCategoryTotal>,
}

/// The total for one sub-category and its share of the parent category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryTotal {
    /// The sub-category name, "Other" for transactions without one.
    pub sub_category: String,
    /// The sum of the sub-category's transactions.
    pub amount: i64,
    /// The share of the parent category's total, 0-100.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SubCategoryKey {
    Assigned(SubCategoryId),
    Unassigned,
}

#[derive(Debug)]
struct SubCategoryAccumulator {
    name: String,
    amount: i64,
}

#[derive(Debug)]
struct CategoryAccumulator {
    name: String,
    total_amount: i64,
    sub_categories: Vec<SubCategoryAccumulator>,
    sub_category_index: HashMap<SubCategoryKey, usize>,
}

impl CategoryAccumulator {
    fn new(name: String) -> Self {
        Self {
            name,
            total_amount: 0,
            sub_categories: Vec::new(),
            sub_category_index: HashMap::new(),
        }
    }

    fn add(&mut self, key: SubCategoryKey, name: impl FnOnce() -> String, amount: i64) {
        self.total_amount += amount;

        let index = match self.sub_category_index.get(&key) {
            Some(&index) => index,
            None => {
                self.sub_categories.push(SubCategoryAccumulator {
                    name: name(),
                    amount: 0,
                });
                let index = self.sub_categories.len() - 1;
                self.sub_category_index.insert(key, index);
                index
            }
        };

        self.sub_categories[index].amount += amount;
    }

    fn finish(self, grand_total: i64) -> CategoryBreakdown {
        let total_amount = self.total_amount;

        CategoryBreakdown {
            category: self.name,
            total_amount,
            percentage: percentage(total_amount, grand_total),
            sub_categories: self
                .sub_categories
                .into_iter()
                .map(|sub_category| SubCategoryTotal {
                    sub_category: sub_category.name,
                    amount: sub_category.amount,
                    percentage: percentage(sub_category.amount, total_amount),
                })
                .collect(),
        }
    }
}

/// `part / whole * 100`, or 0 when `whole` is 0.
fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }

    part as f64 / whole as f64 * 100.0
}

/// Group `transactions` by category, then by sub-category.
///
/// Names embedded in the transactions are used first, then `lookup`.
/// Unresolved categories are labelled "Uncategorized" and unresolved or
/// missing sub-categories are labelled "Other". Categories appear in the
/// order they are first seen in `transactions`, as do the sub-categories
/// within each category.
pub fn compute_breakdown(
    transactions: &[Transaction],
    lookup: &CategoryLookup,
) -> Vec<CategoryBreakdown> {
    let mut categories: Vec<CategoryAccumulator> = Vec::new();
    let mut category_index: HashMap<&CategoryId, usize> = HashMap::new();

    for transaction in transactions {
        let index = *category_index
            .entry(&transaction.category_id)
            .or_insert_with(|| {
                let name = transaction
                    .category_name
                    .as_deref()
                    .or_else(|| lookup.category_name(&transaction.category_id))
                    .unwrap_or(UNCATEGORIZED_LABEL);
                categories.push(CategoryAccumulator::new(name.to_owned()));
                categories.len() - 1
            });

        let key = match &transaction.sub_category_id {
            Some(id) => SubCategoryKey::Assigned(id.clone()),
            None => SubCategoryKey::Unassigned,
        };

        let sub_category_name = || {
            transaction
                .sub_category_id
                .as_deref()
                .and_then(|id| {
                    transaction
                        .sub_category_name
                        .as_deref()
                        .or_else(|| lookup.sub_category_name(id))
                })
                .unwrap_or(OTHER_SUB_CATEGORY_LABEL)
                .to_owned()
        };

        categories[index].add(key, sub_category_name, transaction.amount);
    }

    let grand_total = categories
        .iter()
        .map(|category| category.total_amount)
        .sum();

    categories
        .into_iter()
        .map(|category| category.finish(grand_total))
        .collect()
}
