//! Incomes and expenses.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating and updating records
//! - Database functions for storing, querying, and managing records per user

mod core;
mod db;

pub use core::{Transaction, TransactionBuilder, TransactionKind};
pub use db::{
    RECENT_TRANSACTIONS_LIMIT, create_transaction, create_transaction_tables, delete_transaction,
    get_transaction, list_recent_transactions, list_transactions, set_expense_paid,
    update_transaction,
};
