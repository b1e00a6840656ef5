//! Database operations for categories and sub-categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, SubCategory},
    database_id::new_id,
    transaction::TransactionKind,
    user::UserId,
};

const DEFAULT_INCOME_CATEGORIES: [&str; 7] = [
    "給与",
    "賞与",
    "事業収入",
    "副業",
    "投資収入",
    "雑収入",
    "その他",
];

const DEFAULT_EXPENSE_CATEGORIES: [&str; 17] = [
    "食費",
    "住居費",
    "光熱費",
    "交通費",
    "通信費",
    "娯楽費",
    "美容費",
    "医療費",
    "教育費",
    "保険",
    "税金",
    "家具",
    "交際費",
    "ペット費",
    "クレジットカード",
    "借入",
    "その他",
];

/// Insert the default income and expense categories.
///
/// Categories that already exist are left untouched, so this is safe to run
/// on every start-up.
pub fn seed_default_categories(connection: &Connection) -> Result<(), Error> {
    let mut statement =
        connection.prepare("INSERT OR IGNORE INTO category (id, name, type) VALUES (?1, ?2, ?3)")?;

    let defaults = DEFAULT_INCOME_CATEGORIES
        .iter()
        .map(|name| (name, TransactionKind::Income))
        .chain(
            DEFAULT_EXPENSE_CATEGORIES
                .iter()
                .map(|name| (name, TransactionKind::Expense)),
        );

    for (name, kind) in defaults {
        statement.execute((new_id(), name, kind))?;
    }

    Ok(())
}

/// Retrieve all categories of `kind` ordered by name.
pub fn get_categories(
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, type FROM category WHERE type = ?1 ORDER BY name ASC")?
        .query_map((kind,), map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve a category by its name and kind.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such category.
pub fn get_category_by_name(
    name: &str,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, type FROM category WHERE name = ?1 AND type = ?2")?
        .query_row((name, kind), map_category_row)
        .map_err(|error| error.into())
}

/// Create a sub-category for `user_id` under `category_id`.
///
/// # Errors
/// Returns [Error::InvalidCategory] if `category_id` does not refer to a category.
pub fn create_sub_category(
    user_id: &UserId,
    category_id: &str,
    name: &str,
    connection: &Connection,
) -> Result<SubCategory, Error> {
    let id = new_id();

    connection
        .execute(
            "INSERT INTO sub_category (id, name, category_id, user_id) VALUES (?1, ?2, ?3, ?4)",
            (&id, name, category_id, user_id.as_str()),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(category_id.to_owned()),
            error => error.into(),
        })?;

    Ok(SubCategory {
        id,
        name: name.to_owned(),
        category_id: category_id.to_owned(),
        user_id: user_id.clone(),
    })
}

/// Retrieve the sub-categories defined by `user_id`.
///
/// Never returns another user's sub-categories.
pub fn get_sub_categories(
    user_id: &UserId,
    connection: &Connection,
) -> Result<Vec<SubCategory>, Error> {
    connection
        .prepare(
            "SELECT id, name, category_id, user_id FROM sub_category
             WHERE user_id = ?1 ORDER BY name ASC",
        )?
        .query_map((user_id.as_str(),), map_sub_category_row)?
        .map(|maybe_sub_category| maybe_sub_category.map_err(|error| error.into()))
        .collect()
}

/// Create the category and sub-category tables.
pub fn create_category_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            UNIQUE(name, type)
        );

        CREATE TABLE IF NOT EXISTS sub_category (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category_id TEXT NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            UNIQUE(user_id, category_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_sub_category_user ON sub_category(user_id);",
    )
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
    })
}

fn map_sub_category_row(row: &Row) -> Result<SubCategory, rusqlite::Error> {
    let user_id: String = row.get(3)?;

    Ok(SubCategory {
        id: row.get(0)?,
        name: row.get(1)?,
        category_id: row.get(2)?,
        user_id: UserId::new_unchecked(&user_id),
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize, transaction::TransactionKind, user::UserId};

    use super::{
        create_sub_category, get_categories, get_category_by_name, get_sub_categories,
        seed_default_categories,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn seeds_default_categories_once() {
        let conn = get_test_connection();

        seed_default_categories(&conn).expect("Could not reseed categories");

        let incomes = get_categories(TransactionKind::Income, &conn).unwrap();
        let expenses = get_categories(TransactionKind::Expense, &conn).unwrap();
        assert_eq!(incomes.len(), 7);
        assert_eq!(expenses.len(), 17);
        assert!(
            incomes
                .iter()
                .all(|category| category.kind == TransactionKind::Income)
        );
    }

    #[test]
    fn same_name_can_exist_for_both_kinds() {
        let conn = get_test_connection();

        let income_other = get_category_by_name("その他", TransactionKind::Income, &conn).unwrap();
        let expense_other =
            get_category_by_name("その他", TransactionKind::Expense, &conn).unwrap();

        assert_ne!(income_other.id, expense_other.id);
    }

    #[test]
    fn sub_categories_are_scoped_per_user() {
        let conn = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        let bob = UserId::new_unchecked("bob");
        let food = get_category_by_name("食費", TransactionKind::Expense, &conn).unwrap();

        create_sub_category(&alice, &food.id, "外食", &conn).unwrap();
        create_sub_category(&bob, &food.id, "自炊", &conn).unwrap();

        let alices = get_sub_categories(&alice, &conn).unwrap();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].name, "外食");
        assert_eq!(alices[0].user_id, alice);
    }

    #[test]
    fn create_sub_category_with_unknown_parent_fails() {
        let conn = get_test_connection();
        let alice = UserId::new_unchecked("alice");

        let result = create_sub_category(&alice, "missing", "外食", &conn);

        assert_eq!(result, Err(Error::InvalidCategory("missing".to_owned())));
    }
}
