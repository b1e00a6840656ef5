//! A category directory that caches the global categories.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Error,
    category::{Category, SubCategory},
    stores::CategoryDirectory,
    transaction::TransactionKind,
    user::UserId,
};

/// Wraps a [CategoryDirectory] and remembers the global categories after the
/// first read.
///
/// Sub-categories are per user and are always read from the inner directory.
#[derive(Debug)]
pub struct CachedCategoryDirectory<D> {
    inner: D,
    categories: RwLock<HashMap<TransactionKind, Vec<Category>>>,
}

impl<D: CategoryDirectory> CachedCategoryDirectory<D> {
    /// Create a cache in front of `inner`.
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            categories: RwLock::new(HashMap::new()),
        }
    }

    /// Forget the cached categories.
    pub async fn invalidate(&self) {
        self.categories.write().await.clear();
    }
}

#[async_trait]
impl<D: CategoryDirectory> CategoryDirectory for CachedCategoryDirectory<D> {
    async fn list_categories(&self, kind: TransactionKind) -> Result<Vec<Category>, Error> {
        if let Some(categories) = self.categories.read().await.get(&kind) {
            return Ok(categories.clone());
        }

        let categories = self.inner.list_categories(kind).await?;
        tracing::debug!("caching {} {kind} categories", categories.len());
        self.categories
            .write()
            .await
            .insert(kind, categories.clone());

        Ok(categories)
    }

    async fn list_sub_categories(&self, user_id: &UserId) -> Result<Vec<SubCategory>, Error> {
        self.inner.list_sub_categories(user_id).await
    }
}
