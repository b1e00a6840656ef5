#![allow(missing_docs)]

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    category::{Category, SubCategory},
    database_id::new_id,
    period::DateRange,
    stores::{CategoryDirectory, TransactionStore},
    transaction::{Transaction, TransactionKind},
    user::UserId,
};

/// An in-memory transaction store with failure injection.
#[derive(Debug, Default)]
pub(crate) struct FakeStore {
    transactions: Vec<Transaction>,
    ignore_user_filter: bool,
    failures: Vec<(TransactionKind, DateRange)>,
    delay: Option<Duration>,
    reads: AtomicUsize,
}

impl FakeStore {
    pub(crate) fn with(mut self, transaction: Transaction) -> Self {
        self.transactions.push(transaction);
        self
    }

    /// Return every user's records, like a backend with a broken filter.
    pub(crate) fn ignoring_user_filter(mut self) -> Self {
        self.ignore_user_filter = true;
        self
    }

    /// Fail reads of `kind` for exactly `date_range`.
    pub(crate) fn failing_on(mut self, kind: TransactionKind, date_range: DateRange) -> Self {
        self.failures.push((kind, date_range));
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionStore for FakeStore {
    async fn list_transactions(
        &self,
        user_id: &UserId,
        kind: TransactionKind,
        date_range: DateRange,
    ) -> Result<Vec<Transaction>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failures.contains(&(kind, date_range)) {
            return Err(Error::DataFetchError(format!(
                "injected failure for {kind} records in {date_range}"
            )));
        }

        Ok(self
            .transactions
            .iter()
            .filter(|transaction| transaction.kind == kind)
            .filter(|transaction| date_range.contains(transaction.date))
            .filter(|transaction| self.ignore_user_filter || &transaction.user_id == user_id)
            .cloned()
            .collect())
    }
}

fn transaction(
    kind: TransactionKind,
    user_id: &str,
    amount: i64,
    date: Date,
    category_id: &str,
) -> Transaction {
    let now = OffsetDateTime::now_utc();

    Transaction {
        id: new_id(),
        user_id: UserId::new_unchecked(user_id),
        kind,
        title: format!("{kind} {amount}"),
        amount,
        date,
        category_id: category_id.to_owned(),
        category_name: None,
        sub_category_id: None,
        sub_category_name: None,
        memo: None,
        paid: (kind == TransactionKind::Expense).then_some(false),
        created_at: now,
        updated_at: now,
    }
}

/// An income with a bare category ID and no sub-category.
pub(crate) fn income(user_id: &str, amount: i64, date: Date, category_id: &str) -> Transaction {
    transaction(TransactionKind::Income, user_id, amount, date, category_id)
}

/// An expense with a bare category ID and no sub-category.
pub(crate) fn expense(user_id: &str, amount: i64, date: Date, category_id: &str) -> Transaction {
    transaction(TransactionKind::Expense, user_id, amount, date, category_id)
}

/// An in-memory category directory that counts its reads.
///
/// Income categories: "salary" and "side_job". Expense categories: "rent" and
/// "food". Alice has the sub-categories "rent_home" and "food_out", Bob has
/// "bob_food_out".
#[derive(Debug)]
pub(crate) struct FakeCategoryDirectory {
    categories: Vec<Category>,
    sub_categories: Vec<SubCategory>,
    ignore_user_filter: bool,
    category_reads: AtomicUsize,
    sub_category_reads: AtomicUsize,
}

impl Default for FakeCategoryDirectory {
    fn default() -> Self {
        let category = |id: &str, name: &str, kind| Category {
            id: id.to_owned(),
            name: name.to_owned(),
            kind,
        };
        let sub_category = |id: &str, name: &str, category_id: &str, user_id: &str| SubCategory {
            id: id.to_owned(),
            name: name.to_owned(),
            category_id: category_id.to_owned(),
            user_id: UserId::new_unchecked(user_id),
        };

        Self {
            categories: vec![
                category("salary", "給与", TransactionKind::Income),
                category("side_job", "副業", TransactionKind::Income),
                category("rent", "住居費", TransactionKind::Expense),
                category("food", "食費", TransactionKind::Expense),
            ],
            sub_categories: vec![
                sub_category("rent_home", "家賃", "rent", "alice"),
                sub_category("food_out", "外食", "food", "alice"),
                sub_category("bob_food_out", "外食", "food", "bob"),
            ],
            ignore_user_filter: false,
            category_reads: AtomicUsize::new(0),
            sub_category_reads: AtomicUsize::new(0),
        }
    }
}

impl FakeCategoryDirectory {
    /// Return every user's sub-categories, like a backend with a broken filter.
    pub(crate) fn ignoring_user_filter(mut self) -> Self {
        self.ignore_user_filter = true;
        self
    }

    pub(crate) fn category_reads(&self) -> usize {
        self.category_reads.load(Ordering::SeqCst)
    }

    pub(crate) fn sub_category_reads(&self) -> usize {
        self.sub_category_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CategoryDirectory for FakeCategoryDirectory {
    async fn list_categories(&self, kind: TransactionKind) -> Result<Vec<Category>, Error> {
        self.category_reads.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .categories
            .iter()
            .filter(|category| category.kind == kind)
            .cloned()
            .collect())
    }

    async fn list_sub_categories(&self, user_id: &UserId) -> Result<Vec<SubCategory>, Error> {
        self.sub_category_reads.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .sub_categories
            .iter()
            .filter(|sub_category| self.ignore_user_filter || &sub_category.user_id == user_id)
            .cloned()
            .collect())
    }
}
