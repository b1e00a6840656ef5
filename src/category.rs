//! Categories and sub-categories.
//!
//! Categories are global and read-only, each is either an income or an expense
//! category. Sub-categories belong to a single user and sit under one category.

mod cache;
mod db;
mod domain;

pub use cache::CachedCategoryDirectory;
pub use db::{
    create_category_tables, create_sub_category, get_categories, get_category_by_name,
    get_sub_categories, seed_default_categories,
};
pub use domain::{
    Category, CategoryLookup, OTHER_SUB_CATEGORY_LABEL, SubCategory, UNCATEGORIZED_LABEL,
};
