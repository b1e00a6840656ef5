//! Stores generated analyses in the `analysis_result` table.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    analysis::service::{AnalysisResult, StoredAnalysis},
    database_id::new_id,
    user::UserId,
};

const MONTHLY_ANALYSIS: &str = "monthly";

/// Create the table for saved analyses.
///
/// # Errors
/// Returns an error if the table cannot be created.
pub fn create_analysis_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS analysis_result (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            type TEXT NOT NULL,
            insights TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_analysis_result_user_id ON analysis_result(user_id)",
        (),
    )?;

    Ok(())
}

/// Save a monthly analysis for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::JSONSerializationError] if the analysis cannot be serialized,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_analysis(
    user_id: &UserId,
    result: &AnalysisResult,
    connection: &Connection,
) -> Result<StoredAnalysis, Error> {
    let insights = serde_json::to_string(result)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;
    let id = new_id();
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO analysis_result (id, user_id, type, insights, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (&id, user_id.as_str(), MONTHLY_ANALYSIS, &insights, created_at),
    )?;

    Ok(StoredAnalysis {
        id,
        user_id: user_id.clone(),
        kind: MONTHLY_ANALYSIS.to_owned(),
        insights: result.clone(),
        created_at,
    })
}

/// Get the analyses saved for `user_id`, newest first.
///
/// # Errors
/// This function will return a:
/// - [Error::JSONSerializationError] if a saved analysis cannot be read back,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_analyses(
    user_id: &UserId,
    connection: &Connection,
) -> Result<Vec<StoredAnalysis>, Error> {
    let mut statement = connection.prepare(
        "SELECT id, user_id, type, insights, created_at
         FROM analysis_result
         WHERE user_id = ?1
         ORDER BY created_at DESC",
    )?;

    statement
        .query_map([user_id.as_str()], map_analysis_row)?
        .map(|row| row.map_err(Error::from).and_then(StoredAnalysis::try_from))
        .collect()
}

struct AnalysisRow {
    id: String,
    user_id: String,
    kind: String,
    insights: String,
    created_at: OffsetDateTime,
}

impl TryFrom<AnalysisRow> for StoredAnalysis {
    type Error = Error;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        let insights = serde_json::from_str(&row.insights).map_err(|error| {
            tracing::error!("could not parse saved analysis {}: {error}", row.id);
            Error::JSONSerializationError(error.to_string())
        })?;

        Ok(Self {
            id: row.id,
            user_id: UserId::new_unchecked(&row.user_id),
            kind: row.kind,
            insights,
            created_at: row.created_at,
        })
    }
}

fn map_analysis_row(row: &Row) -> Result<AnalysisRow, rusqlite::Error> {
    Ok(AnalysisRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        insights: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{
        Error,
        analysis::{
            figures::{Comparison, Comparisons},
            service::{AnalysisResult, Suggestion},
        },
        user::UserId,
    };

    use super::{create_analysis_table, get_analyses, insert_analysis};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_analysis_table(&connection).unwrap();
        connection
    }

    fn analysis(trend: &str) -> AnalysisResult {
        AnalysisResult {
            trends: vec![trend.to_owned()],
            comparisons: Comparisons {
                income: Comparison::between(300_000, 240_000),
                expense: Comparison::between(100_000, 0),
            },
            suggestions: vec![Suggestion {
                title: "固定費".to_owned(),
                content: "通信費を見直しましょう".to_owned(),
            }],
        }
    }

    #[test]
    fn reads_back_saved_analyses() {
        let connection = get_test_connection();
        let alice = UserId::new_unchecked("alice");

        let stored = insert_analysis(&alice, &analysis("収入が増えました"), &connection).unwrap();
        let analyses = get_analyses(&alice, &connection).unwrap();

        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].id, stored.id);
        assert_eq!(analyses[0].insights, stored.insights);
        assert_eq!(analyses[0].kind, "monthly");
        assert_eq!(analyses[0].insights.comparisons.expense.diff, None);
    }

    #[test]
    fn analyses_are_scoped_to_the_user() {
        let connection = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        let bob = UserId::new_unchecked("bob");

        insert_analysis(&alice, &analysis("a"), &connection).unwrap();

        assert!(get_analyses(&bob, &connection).unwrap().is_empty());
    }

    #[test]
    fn corrupt_insights_are_an_error() {
        let connection = get_test_connection();
        let alice = UserId::new_unchecked("alice");
        connection
            .execute(
                "INSERT INTO analysis_result (id, user_id, type, insights, created_at)
                 VALUES ('bad', ?1, 'monthly', 'not json', ?2)",
                (alice.as_str(), OffsetDateTime::now_utc()),
            )
            .unwrap();

        let result = get_analyses(&alice, &connection);

        assert!(matches!(result, Err(Error::JSONSerializationError(_))));
    }
}
