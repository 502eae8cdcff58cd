//! Query execution against the refactoring database.
//!
//! [`QueryExecutor`] is the seam between the statistics pipeline and the
//! database; [`SqliteSource`] implements it over `rusqlite`.

use std::path::Path;

use refmine_core::RefmineError;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

/// Tabular, all-numeric result of one query.
///
/// # Examples
///
/// ```
/// use refmine_cooccur::source::ResultSet;
///
/// let rs = ResultSet {
///     columns: vec!["A".into(), "Commit Count".into()],
///     rows: vec![vec![3.0, 4.0]],
/// };
/// assert_eq!(rs.value(0, "Commit Count"), Some(4.0));
/// assert_eq!(rs.value(1, "A"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names as reported by the database.
    pub columns: Vec<String>,
    /// One vector per row, aligned with `columns`.
    pub rows: Vec<Vec<f64>>,
}

impl ResultSet {
    /// Value of the named column in row `row`.
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(idx)).copied()
    }
}

/// Executes SQL and returns numeric rows.
pub trait QueryExecutor {
    /// Run `sql` and collect every row.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::Database`] if the statement fails or yields a
    /// non-numeric value.
    fn execute_query(&self, sql: &str) -> Result<ResultSet, RefmineError>;
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for &T {
    fn execute_query(&self, sql: &str) -> Result<ResultSet, RefmineError> {
        (**self).execute_query(sql)
    }
}

/// SQLite database holding the per-commit and per-window refactoring tables.
///
/// # Examples
///
/// ```
/// use refmine_cooccur::source::{QueryExecutor, SqliteSource};
///
/// let source = SqliteSource::in_memory().unwrap();
/// let rs = source.execute_query("SELECT 1 AS one, 2.5 AS two").unwrap();
/// assert_eq!(rs.rows, vec![vec![1.0, 2.5]]);
/// ```
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// Open an existing database file read-only.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::FileNotFound`] if `path` does not exist and
    /// [`RefmineError::Database`] if SQLite cannot open it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use refmine_cooccur::source::SqliteSource;
    ///
    /// let source = SqliteSource::open(Path::new("refactorings.db")).unwrap();
    /// ```
    pub fn open(path: &Path) -> Result<Self, RefmineError> {
        if !path.exists() {
            return Err(RefmineError::FileNotFound(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            RefmineError::Database(format!("failed to open {}: {e}", path.display()))
        })?;
        Ok(Self { conn })
    }

    /// Create an empty in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::Database`] if SQLite cannot allocate it.
    pub fn in_memory() -> Result<Self, RefmineError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            RefmineError::Database(format!("failed to create in-memory database: {e}"))
        })?;
        Ok(Self { conn })
    }

    /// The underlying connection, e.g. to load fixtures.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl QueryExecutor for SqliteSource {
    fn execute_query(&self, sql: &str) -> Result<ResultSet, RefmineError> {
        debug!(%sql, "executing query");
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| RefmineError::Database(format!("failed to prepare query: {e}")))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Option<f64>>(i).map(|v| v.unwrap_or(0.0)))
                    .collect::<rusqlite::Result<Vec<f64>>>()
            })
            .map_err(|e| RefmineError::Database(format!("failed to run query: {e}")))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| RefmineError::Database(format!("failed to read row: {e}")))?;

        Ok(ResultSet { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_aggregates_read_as_zero() {
        let source = SqliteSource::in_memory().unwrap();
        source
            .connection()
            .execute_batch("CREATE TABLE t (x INTEGER);")
            .unwrap();
        let rs = source
            .execute_query("SELECT SUM(x) AS total, COUNT(*) AS n FROM t")
            .unwrap();
        assert_eq!(rs.columns, vec!["total", "n"]);
        assert_eq!(rs.rows, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn invalid_sql_is_a_database_error() {
        let source = SqliteSource::in_memory().unwrap();
        let err = source.execute_query("SELEC nonsense").unwrap_err();
        assert!(matches!(err, RefmineError::Database(_)));
    }

    #[test]
    fn text_values_are_rejected() {
        let source = SqliteSource::in_memory().unwrap();
        assert!(source.execute_query("SELECT 'abc' AS s").is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.db");
        assert!(matches!(
            SqliteSource::open(&missing),
            Err(RefmineError::FileNotFound(_))
        ));
    }

    #[test]
    fn opens_existing_file_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (7);")
            .unwrap();

        let source = SqliteSource::open(&path).unwrap();
        let rs = source.execute_query("SELECT x FROM t").unwrap();
        assert_eq!(rs.rows, vec![vec![7.0]]);
        assert!(source
            .connection()
            .execute_batch("INSERT INTO t VALUES (8);")
            .is_err());
    }
}
