//! Database set-up.

use rusqlite::Connection;

use crate::{
    Error, analysis::create_analysis_table, category::create_category_tables,
    category::seed_default_categories, transaction::create_transaction_tables,
};

/// Create the tables for the domain models and seed the default categories.
///
/// Foreign key enforcement is enabled on `connection`.
///
/// # Errors
/// Returns an error if the tables could not be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    create_category_tables(connection)?;
    create_transaction_tables(connection)?;
    create_analysis_table(connection)?;
    seed_default_categories(connection)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).expect("Could not initialize database");
        initialize(&conn).expect("Could not initialize database twice");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM category", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 24);
    }

    #[test]
    fn enables_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let enabled: bool = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }
}
