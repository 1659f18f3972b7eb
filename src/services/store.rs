use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::models::{AnalysisReport, ColumnStatistics, DataType};

pub const IN_MEMORY: &str = ":memory:";

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS data_analysis (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        original_data TEXT NOT NULL,
        number_of_rows INTEGER NOT NULL,
        number_of_columns INTEGER NOT NULL,
        total_characters INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS column_statistics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        data_analysis_id INTEGER NOT NULL REFERENCES data_analysis(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        column_name TEXT NOT NULL,
        null_count INTEGER NOT NULL,
        unique_count INTEGER NOT NULL,
        data_type TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_column_statistics_analysis
        ON column_statistics(data_analysis_id);
";

impl ToSql for DataType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for DataType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// SQLite-backed persistence for analysis reports and their column rows.
///
/// Every method holds the connection lock for its whole duration, and writes run
/// inside a transaction, so a report and its columns are stored or removed together.
pub struct AnalysisStore {
    conn: Mutex<Connection>,
}

impl AnalysisStore {
    /// Opens or creates the database at `path`. The special path `:memory:` gives a
    /// private in-memory store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if path == Path::new(IN_MEMORY) {
            return Self::open_in_memory();
        }
        info!("Opening analysis store at {}", path.display());
        let conn = Connection::open(path).map_err(|e| {
            error!("Failed to open database {}: {}", path.display(), e);
            AppError::DatabaseError(e.to_string())
        })?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        debug!("Opening in-memory analysis store");
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch(SCHEMA).map_err(|e| {
            error!("Failed to initialise schema: {}", e);
            AppError::DatabaseError(e.to_string())
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Stores the report and its column rows, returning the assigned id.
    /// Numeric aggregates are not stored; they are recomputed from `raw`.
    pub fn insert(&self, raw: &str, report: &AnalysisReport) -> Result<i64, AppError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO data_analysis
                (original_data, number_of_rows, number_of_columns, total_characters, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                raw,
                report.number_of_rows as i64,
                report.number_of_columns as i64,
                report.total_characters as i64,
                report.created_at,
            ],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO column_statistics
                    (data_analysis_id, position, column_name, null_count, unique_count, data_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, column) in report.column_statistics.iter().enumerate() {
                stmt.execute(params![
                    id,
                    position as i64,
                    column.column_name,
                    column.null_count as i64,
                    column.unique_count as i64,
                    column.data_type,
                ])?;
            }
        }

        tx.commit()?;
        info!(
            "Stored analysis {} ({} rows, {} columns)",
            id, report.number_of_rows, report.number_of_columns
        );
        Ok(id)
    }

    /// Loads a stored report. Column rows come back in header order, without aggregates.
    pub fn find(&self, id: i64) -> Result<Option<AnalysisReport>, AppError> {
        let conn = self.conn.lock();

        let header = conn
            .query_row(
                "SELECT number_of_rows, number_of_columns, total_characters, created_at
                 FROM data_analysis WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, DateTime<Utc>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((rows, columns, characters, created_at)) = header else {
            debug!("Analysis {} not found", id);
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT column_name, null_count, unique_count, data_type
             FROM column_statistics
             WHERE data_analysis_id = ?1
             ORDER BY position",
        )?;
        let column_statistics = stmt
            .query_map(params![id], |row| {
                Ok(ColumnStatistics::base(
                    row.get(0)?,
                    row.get::<_, i64>(1)? as usize,
                    row.get::<_, i64>(2)? as usize,
                    row.get(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(AnalysisReport {
            id: Some(id),
            number_of_rows: rows as usize,
            number_of_columns: columns as usize,
            total_characters: characters as usize,
            column_statistics,
            created_at,
        }))
    }

    /// The CSV text a report was computed from.
    pub fn raw_data(&self, id: i64) -> Result<Option<(String, DateTime<Utc>)>, AppError> {
        let conn = self.conn.lock();
        let found = conn
            .query_row(
                "SELECT original_data, created_at FROM data_analysis WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(found)
    }

    /// Removes a report and, through the cascade, its column rows. Returns `false` if absent.
    pub fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM data_analysis WHERE id = ?1", params![id])?;
        tx.commit()?;

        if removed > 0 {
            info!("Deleted analysis {}", id);
        }
        Ok(removed > 0)
    }

    #[cfg(test)]
    pub fn count_columns(&self, id: i64) -> Result<usize, AppError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM column_statistics WHERE data_analysis_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::csv::CsvAnalyzer;
    use tokio_test::assert_ok;

    fn stored(store: &AnalysisStore, raw: &str) -> (i64, AnalysisReport) {
        let report = assert_ok!(CsvAnalyzer::new().analyze(raw));
        let id = assert_ok!(store.insert(raw, &report));
        (id, report)
    }

    #[test]
    fn test_insert_then_find_round_trip() {
        let store = AnalysisStore::open_in_memory().unwrap();
        let raw = "name,age,active\nAlice,30,true\nBob,,false";
        let (id, report) = stored(&store, raw);

        let found = assert_ok!(store.find(id)).expect("report should exist");
        assert_eq!(found.id, Some(id));
        assert_eq!(found.number_of_rows, report.number_of_rows);
        assert_eq!(found.number_of_columns, report.number_of_columns);
        assert_eq!(found.total_characters, report.total_characters);
        assert_eq!(found.column_statistics, report.clone().without_aggregates().column_statistics);
    }

    #[test]
    fn test_find_is_repeatable() {
        let store = AnalysisStore::open_in_memory().unwrap();
        let (id, _) = stored(&store, "a\n1");

        let first = store.find(id).unwrap();
        let second = store.find(id).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_id() {
        let store = AnalysisStore::open_in_memory().unwrap();
        assert!(store.find(42).unwrap().is_none());
        assert!(store.raw_data(42).unwrap().is_none());
        assert!(!store.delete(42).unwrap());
    }

    #[test]
    fn test_raw_data_is_kept_verbatim() {
        let store = AnalysisStore::open_in_memory().unwrap();
        let raw = "  a,b\n1,2\n\n";
        let (id, report) = stored(&store, raw);

        let (data, created_at) = store.raw_data(id).unwrap().unwrap();
        assert_eq!(data, raw);
        assert_eq!(created_at.timestamp(), report.created_at.timestamp());
    }

    #[test]
    fn test_delete_cascades_and_leaves_others() {
        let store = AnalysisStore::open_in_memory().unwrap();
        let (x, _) = stored(&store, "a,b,c\n1,2,3");
        let (y, _) = stored(&store, "d,e\n4,5");
        assert_eq!(store.count_columns(x).unwrap(), 3);

        assert!(store.delete(x).unwrap());
        assert_eq!(store.count_columns(x).unwrap(), 0);
        assert!(store.find(x).unwrap().is_none());
        assert!(!store.delete(x).unwrap());

        assert_eq!(store.count_columns(y).unwrap(), 2);
        assert!(store.find(y).unwrap().is_some());
    }

    #[test]
    fn test_ids_are_distinct() {
        let store = AnalysisStore::open_in_memory().unwrap();
        let (a, _) = stored(&store, "a\n1");
        let (b, _) = stored(&store, "a\n1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_memory_path_opens_private_store() {
        let first = AnalysisStore::open(IN_MEMORY).unwrap();
        let (id, _) = stored(&first, "a\n1");

        let second = AnalysisStore::open(":memory:").unwrap();
        assert!(first.find(id).unwrap().is_some());
        assert!(second.find(id).unwrap().is_none());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");

        let id = {
            let store = AnalysisStore::open(&path).unwrap();
            stored(&store, "x,y\n1,a\n2,b").0
        };

        let reopened = AnalysisStore::open(&path).unwrap();
        let found = reopened.find(id).unwrap().unwrap();
        assert_eq!(found.number_of_rows, 2);
        assert_eq!(found.column_statistics[1].column_name, "y");
        assert_eq!(found.column_statistics[1].data_type, DataType::String);
    }
}
