//! Database queries for incomes and expenses.
//!
//! Every query is scoped by user ID. Updates and deletes match on both the
//! record ID and the owner in a single statement, so ownership is checked in
//! the same step as the mutation.

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::new_id,
    period::DateRange,
    transaction::{Transaction, TransactionBuilder, TransactionKind},
    user::UserId,
};

/// Create an income or expense for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the amount is below zero,
/// - [Error::InvalidCategory] if the category does not exist,
/// - [Error::CategoryTypeMismatch] if the category is not of the transaction's kind,
/// - [Error::InvalidSubCategory] if the sub-category is not the user's or not under the category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: &UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_references(&builder, user_id, connection)?;

    let id = new_id();
    let now = OffsetDateTime::now_utc();
    let table = builder.kind.table_name();

    match builder.kind {
        TransactionKind::Income => connection.execute(
            &format!(
                "INSERT INTO {table}
                    (id, user_id, title, amount, date, category_id, sub_category_id, memo,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)"
            ),
            (
                &id,
                user_id.as_str(),
                &builder.title,
                builder.amount,
                builder.date,
                &builder.category_id,
                &builder.sub_category_id,
                &builder.memo,
                now,
            ),
        )?,
        TransactionKind::Expense => connection.execute(
            &format!(
                "INSERT INTO {table}
                    (id, user_id, title, amount, date, category_id, sub_category_id, memo,
                     paid, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)"
            ),
            (
                &id,
                user_id.as_str(),
                &builder.title,
                builder.amount,
                builder.date,
                &builder.category_id,
                &builder.sub_category_id,
                &builder.memo,
                builder.paid,
                now,
            ),
        )?,
    };

    get_transaction(builder.kind, &id, user_id, connection)
}

/// Retrieve one of the user's transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    kind: TransactionKind,
    id: &str,
    user_id: &UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let query = format!("{} WHERE t.id = ?1 AND t.user_id = ?2", select_clause(kind));

    connection
        .prepare(&query)?
        .query_row((id, user_id.as_str()), |row| map_transaction_row(kind, row))
        .map_err(|error| error.into())
}

/// Get the user's transactions of `kind` dated within `date_range`, oldest first.
///
/// Category and sub-category names are joined in.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn list_transactions(
    kind: TransactionKind,
    user_id: &UserId,
    date_range: DateRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "{} WHERE t.user_id = ?1 AND t.date BETWEEN ?2 AND ?3
         ORDER BY t.date ASC, t.created_at ASC",
        select_clause(kind)
    );

    connection
        .prepare(&query)?
        .query_map(
            (user_id.as_str(), date_range.start, date_range.end),
            |row| map_transaction_row(kind, row),
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// The number of transactions shown in a recent transactions list.
pub const RECENT_TRANSACTIONS_LIMIT: usize = 50;

/// Get the user's latest `limit` transactions of `kind`, newest first.
///
/// Category and sub-category names are joined in. Transactions on the same
/// date are ordered by when they were recorded.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn list_recent_transactions(
    kind: TransactionKind,
    user_id: &UserId,
    limit: usize,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "{} WHERE t.user_id = ?1
         ORDER BY t.date DESC, t.created_at DESC
         LIMIT ?2",
        select_clause(kind)
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    connection
        .prepare(&query)?
        .query_map((user_id.as_str(), limit), |row| {
            map_transaction_row(kind, row)
        })?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Replace the fields of one of the user's transactions.
///
/// The kind of a transaction cannot change, `builder.kind` selects which
/// record is updated.
///
/// # Errors
/// Returns [Error::UpdateMissingTransaction] if `id` does not refer to one of
/// the user's transactions, or any of the validation errors of [create_transaction].
pub fn update_transaction(
    id: &str,
    builder: TransactionBuilder,
    user_id: &UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_references(&builder, user_id, connection)?;

    let table = builder.kind.table_name();
    let now = OffsetDateTime::now_utc();

    let rows_affected = match builder.kind {
        TransactionKind::Income => connection.execute(
            &format!(
                "UPDATE {table}
                 SET title = ?1, amount = ?2, date = ?3, category_id = ?4,
                     sub_category_id = ?5, memo = ?6, updated_at = ?7
                 WHERE id = ?8 AND user_id = ?9"
            ),
            (
                &builder.title,
                builder.amount,
                builder.date,
                &builder.category_id,
                &builder.sub_category_id,
                &builder.memo,
                now,
                id,
                user_id.as_str(),
            ),
        )?,
        TransactionKind::Expense => connection.execute(
            &format!(
                "UPDATE {table}
                 SET title = ?1, amount = ?2, date = ?3, category_id = ?4,
                     sub_category_id = ?5, memo = ?6, paid = ?7, updated_at = ?8
                 WHERE id = ?9 AND user_id = ?10"
            ),
            (
                &builder.title,
                builder.amount,
                builder.date,
                &builder.category_id,
                &builder.sub_category_id,
                &builder.memo,
                builder.paid,
                now,
                id,
                user_id.as_str(),
            ),
        )?,
    };

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    get_transaction(builder.kind, id, user_id, connection)
}

/// Mark one of the user's expenses as paid or unpaid.
///
/// # Errors
/// Returns [Error::UpdateMissingTransaction] if `id` does not refer to one of
/// the user's expenses.
pub fn set_expense_paid(
    id: &str,
    paid: bool,
    user_id: &UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE expense SET paid = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
        (paid, OffsetDateTime::now_utc(), id, user_id.as_str()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete one of the user's transactions.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if `id` does not refer to one of
/// the user's transactions.
pub fn delete_transaction(
    kind: TransactionKind,
    id: &str,
    user_id: &UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        &format!(
            "DELETE FROM {} WHERE id = ?1 AND user_id = ?2",
            kind.table_name()
        ),
        (id, user_id.as_str()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the income and expense tables in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_transaction_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS income (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount >= 0),
            date TEXT NOT NULL,
            category_id TEXT NOT NULL REFERENCES category(id),
            sub_category_id TEXT REFERENCES sub_category(id) ON DELETE SET NULL,
            memo TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_income_user_date ON income(user_id, date);

        CREATE TABLE IF NOT EXISTS expense (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount >= 0),
            date TEXT NOT NULL,
            category_id TEXT NOT NULL REFERENCES category(id),
            sub_category_id TEXT REFERENCES sub_category(id) ON DELETE SET NULL,
            memo TEXT,
            paid INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
    )
}

fn select_clause(kind: TransactionKind) -> String {
    let paid_column = match kind {
        TransactionKind::Income => "NULL",
        TransactionKind::Expense => "t.paid",
    };

    format!(
        "SELECT t.id, t.user_id, t.title, t.amount, t.date, t.category_id, c.name,
                t.sub_category_id, s.name, t.memo, {paid_column}, t.created_at, t.updated_at
         FROM {} t
         LEFT JOIN category c ON c.id = t.category_id
         LEFT JOIN sub_category s ON s.id = t.sub_category_id AND s.user_id = t.user_id",
        kind.table_name()
    )
}

fn validate_references(
    builder: &TransactionBuilder,
    user_id: &UserId,
    connection: &Connection,
) -> Result<(), Error> {
    builder.validate()?;

    let category_kind: TransactionKind = connection
        .query_row(
            "SELECT type FROM category WHERE id = ?1",
            (&builder.category_id,),
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| Error::InvalidCategory(builder.category_id.clone()))?;

    if category_kind != builder.kind {
        return Err(Error::CategoryTypeMismatch);
    }

    if let Some(sub_category_id) = &builder.sub_category_id {
        let parent: Option<String> = connection
            .query_row(
                "SELECT category_id FROM sub_category WHERE id = ?1 AND user_id = ?2",
                (sub_category_id, user_id.as_str()),
                |row| row.get(0),
            )
            .optional()?;

        if parent.as_deref() != Some(builder.category_id.as_str()) {
            return Err(Error::InvalidSubCategory(sub_category_id.clone()));
        }
    }

    Ok(())
}

fn map_transaction_row(kind: TransactionKind, row: &Row) -> Result<Transaction, rusqlite::Error> {
    let user_id: String = row.get(1)?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserId::new_unchecked(&user_id),
        kind,
        title: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        category_id: row.get(5)?,
        category_name: row.get(6)?,
        sub_category_id: row.get(7)?,
        sub_category_name: row.get(8)?,
        memo: row.get(9)?,
        paid: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        category::{create_sub_category, get_category_by_name},
        db::initialize,
        period::DateRange,
        transaction::{Transaction, TransactionKind},
        user::UserId,
    };

    use super::{
        create_transaction, delete_transaction, get_transaction, list_recent_transactions,
        list_transactions, set_expense_paid, update_transaction,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn category_id(name: &str, kind: TransactionKind, conn: &Connection) -> String {
        get_category_by_name(name, kind, conn).unwrap().id
    }

    fn january() -> DateRange {
        DateRange {
            start: date!(2025 - 01 - 01),
            end: date!(2025 - 01 - 31),
        }
    }

    #[test]
    fn create_joins_category_name() {
        let conn = get_test_connection();
        let user = UserId::new_unchecked("alice");
        let salary = category_id("給与", TransactionKind::Income, &conn);

        let payday = date!(2025 - 01 - 01);

        let income = create_transaction(
            Transaction::build(TransactionKind::Income, 280_000, payday, &salary)
                .title("January salary"),
            &user,
            &conn,
        )
        .unwrap();

        assert_eq!(income.amount, 280_000);
        assert_eq!(income.category_name.as_deref(), Some("給与"));
        assert_eq!(income.paid, None);
        assert_eq!(income.user_id, user);
    }

    #[test]
    fn create_rejects_negative_amount() {
        let conn = get_test_connection();
        let user = UserId::new_unchecked("alice");
        let salary = category_id("給与", TransactionKind::Income, &conn);

        let result = create_transaction(
            Transaction::build(TransactionKind::Income, -5, date!(2025 - 01 - 01), &salary),
            &user,
            &conn,
        );

        assert_eq!(result, Err(Error::NegativeAmount(-5)));
    }

    #[test]
    fn create_rejects_unknown_category() {
        let conn = get_test_connection();
        let user = UserId::new_unchecked("alice");

        let result = create_transaction(
            Transaction::build(TransactionKind::Income, 5, date!(2025 - 01 - 01), "nope"),
            &user,
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory("nope".to_owned())));
    }

    #[test]
    fn create_rejects_category_of_other_kind() {
        let conn = get_test_connection();
        let user = UserId::new_unchecked("alice");
        let rent = category_id("住居費", TransactionKind::Expense, &conn);

        let result = create_transaction(
            Transaction::build(TransactionKind::Income, 5, date!(2025 - 01 - 01), &rent),
            &user,
            &conn,
        );

        assert_eq!(result, Err(Error::CategoryTypeMismatch));
    }

    #[test]
    fn create_rejects_another_users_sub_category() {
        let conn = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        let bob = UserId::new_unchecked("bob");
        let food = category_id("食費", TransactionKind::Expense, &conn);
        let bobs_sub_category = create_sub_category(&bob, &food, "外食", &conn).unwrap();

        let date = date!(2025 - 01 - 03);

        let result = create_transaction(
            Transaction::build(TransactionKind::Expense, 1_200, date, &food)
                .sub_category_id(Some(&bobs_sub_category.id)),
            &alice,
            &conn,
        );

        assert_eq!(
            result,
            Err(Error::InvalidSubCategory(bobs_sub_category.id.clone()))
        );
    }

    #[test]
    fn list_is_scoped_by_user_and_date_range() {
        let conn = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        let bob = UserId::new_unchecked("bob");
        let food = category_id("食費", TransactionKind::Expense, &conn);

        for (user, date) in [
            (&alice, date!(2025 - 01 - 01)),
            (&alice, date!(2025 - 01 - 31)),
            (&alice, date!(2024 - 12 - 31)),
            (&alice, date!(2025 - 02 - 01)),
            (&bob, date!(2025 - 01 - 15)),
        ] {
            create_transaction(
                Transaction::build(TransactionKind::Expense, 100, date, &food),
                user,
                &conn,
            )
            .unwrap();
        }

        let expenses = list_transactions(TransactionKind::Expense, &alice, january(), &conn)
            .expect("Could not list expenses");

        assert_eq!(expenses.len(), 2);
        assert!(expenses.iter().all(|expense| expense.user_id == alice));
        assert_eq!(expenses[0].date, date!(2025 - 01 - 01));
        assert_eq!(expenses[0].paid, Some(false));
    }

    #[test]
    fn list_joins_sub_category_name() {
        let conn = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        let food = category_id("食費", TransactionKind::Expense, &conn);
        let eating_out = create_sub_category(&alice, &food, "外食", &conn).unwrap();

        let date = date!(2025 - 01 - 10);

        create_transaction(
            Transaction::build(TransactionKind::Expense, 3_000, date, &food)
                .sub_category_id(Some(&eating_out.id)),
            &alice,
            &conn,
        )
        .unwrap();

        let expenses =
            list_transactions(TransactionKind::Expense, &alice, january(), &conn).unwrap();

        assert_eq!(expenses[0].sub_category_name.as_deref(), Some("外食"));
    }

    #[test]
    fn recent_lists_newest_first_up_to_the_limit() {
        let conn = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        let bob = UserId::new_unchecked("bob");
        let food = category_id("食費", TransactionKind::Expense, &conn);

        for (user, title, date) in [
            (&alice, "oldest", date!(2024 - 11 - 30)),
            (&alice, "newest", date!(2025 - 02 - 14)),
            (&bob, "bob", date!(2025 - 03 - 01)),
            (&alice, "middle", date!(2025 - 01 - 10)),
            (&alice, "later", date!(2025 - 01 - 20)),
        ] {
            create_transaction(
                Transaction::build(TransactionKind::Expense, 100, date, &food).title(title),
                user,
                &conn,
            )
            .unwrap();
        }

        let expenses = list_recent_transactions(TransactionKind::Expense, &alice, 3, &conn)
            .expect("Could not list recent expenses");

        let titles: Vec<&str> = expenses
            .iter()
            .map(|expense| expense.title.as_str())
            .collect();
        assert_eq!(titles, ["newest", "later", "middle"]);
        assert!(expenses.iter().all(|expense| expense.user_id == alice));
        assert_eq!(expenses[0].category_name.as_deref(), Some("食費"));
    }

    #[test]
    fn recent_is_empty_for_a_new_user() {
        let conn = get_test_connection();
        let carol = UserId::new_unchecked("carol");

        let incomes = list_recent_transactions(TransactionKind::Income, &carol, 50, &conn);

        assert_eq!(incomes, Ok(vec![]));
    }

    #[test]
    fn update_changes_fields() {
        let conn = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        let food = category_id("食費", TransactionKind::Expense, &conn);
        let created = create_transaction(
            Transaction::build(TransactionKind::Expense, 500, date!(2025 - 01 - 10), &food),
            &alice,
            &conn,
        )
        .unwrap();

        let updated = update_transaction(
            &created.id,
            Transaction::build(TransactionKind::Expense, 800, date!(2025 - 01 - 11), &food)
                .title("Lunch")
                .paid(true),
            &alice,
            &conn,
        )
        .unwrap();

        assert_eq!(updated.amount, 800);
        assert_eq!(updated.title, "Lunch");
        assert_eq!(updated.paid, Some(true));
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn update_of_another_users_transaction_fails() {
        let conn = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        let mallory = UserId::new_unchecked("mallory");
        let food = category_id("食費", TransactionKind::Expense, &conn);
        let created = create_transaction(
            Transaction::build(TransactionKind::Expense, 500, date!(2025 - 01 - 10), &food),
            &alice,
            &conn,
        )
        .unwrap();

        let result = update_transaction(
            &created.id,
            Transaction::build(TransactionKind::Expense, 1, date!(2025 - 01 - 10), &food),
            &mallory,
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
        let unchanged = get_transaction(TransactionKind::Expense, &created.id, &alice, &conn);
        assert_eq!(unchanged.map(|expense| expense.amount), Ok(500));
    }

    #[test]
    fn set_paid_marks_expense() {
        let conn = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        let food = category_id("食費", TransactionKind::Expense, &conn);
        let created = create_transaction(
            Transaction::build(TransactionKind::Expense, 500, date!(2025 - 01 - 10), &food),
            &alice,
            &conn,
        )
        .unwrap();

        set_expense_paid(&created.id, true, &alice, &conn).unwrap();

        let expense = get_transaction(TransactionKind::Expense, &created.id, &alice, &conn);
        assert_eq!(expense.map(|expense| expense.paid), Ok(Some(true)));
    }

    #[test]
    fn delete_of_another_users_transaction_fails() {
        let conn = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        let mallory = UserId::new_unchecked("mallory");
        let salary = category_id("給与", TransactionKind::Income, &conn);
        let created = create_transaction(
            Transaction::build(TransactionKind::Income, 500, date!(2025 - 01 - 10), &salary),
            &alice,
            &conn,
        )
        .unwrap();

        let result = delete_transaction(TransactionKind::Income, &created.id, &mallory, &conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
        assert!(get_transaction(TransactionKind::Income, &created.id, &alice, &conn).is_ok());
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        let salary = category_id("給与", TransactionKind::Income, &conn);
        let created = create_transaction(
            Transaction::build(TransactionKind::Income, 500, date!(2025 - 01 - 10), &salary),
            &alice,
            &conn,
        )
        .unwrap();

        delete_transaction(TransactionKind::Income, &created.id, &alice, &conn).unwrap();

        assert_eq!(
            get_transaction(TransactionKind::Income, &created.id, &alice, &conn),
            Err(Error::NotFound)
        );
    }
}
