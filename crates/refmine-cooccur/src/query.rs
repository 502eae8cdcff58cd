//! Co-occurrence aggregation queries and the count table they produce.
//!
//! For every anchor type `T` one query aggregates the rows (commits or
//! windows) in which `T` occurred, yielding one value per catalog type plus
//! the scope's auxiliary totals. Identifiers only ever come from the
//! validated catalog and configuration.

use refmine_core::{
    Catalog, DatabaseConfig, LabeledMatrix, RefactoringType, RefmineError, Scope, Statistic,
    COMMIT_COUNT, WINDOW_COUNT_TOTAL, WINDOW_SIZE_TOTAL,
};
use tracing::debug;

use crate::source::QueryExecutor;

fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}

/// Builds the aggregation query of one scope for any anchor type.
///
/// # Examples
///
/// ```
/// use refmine_core::{Catalog, DatabaseConfig, RefactoringType, Scope};
/// use refmine_cooccur::query::CoOccurrenceQuery;
///
/// let catalog = Catalog::from_names(["A", "B"]).unwrap();
/// let db = DatabaseConfig::default();
/// let query = CoOccurrenceQuery::new(&catalog, &db, Scope::Commit);
/// let sql = query.sql_for(&RefactoringType::new("B").unwrap());
/// assert!(sql.ends_with("FROM \"refactoringspercommit\" WHERE \"B count\" > 0"));
/// ```
pub struct CoOccurrenceQuery<'a> {
    catalog: &'a Catalog,
    database: &'a DatabaseConfig,
    scope: Scope,
}

impl<'a> CoOccurrenceQuery<'a> {
    pub fn new(catalog: &'a Catalog, database: &'a DatabaseConfig, scope: Scope) -> Self {
        Self {
            catalog,
            database,
            scope,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Per-type aggregate expression for column `U`.
    fn type_aggregate(&self, t: &RefactoringType) -> String {
        let alias = quote(t.as_str());
        match self.scope {
            Scope::Commit => format!(
                "COALESCE(SUM(CASE WHEN {} > 0 THEN 1 ELSE 0 END), 0) AS {alias}",
                quote(&t.count_column())
            ),
            Scope::Window {
                statistic: Statistic::Likelihood,
                ..
            } => format!(
                "COALESCE(SUM(CASE WHEN {} > 0 THEN 1 ELSE 0 END), 0) AS {alias}",
                quote(t.as_str())
            ),
            Scope::Window {
                statistic: Statistic::Frequency,
                ..
            } => format!("COALESCE(SUM({}), 0) AS {alias}", quote(t.as_str())),
        }
    }

    fn totals(&self) -> Vec<String> {
        match self.scope {
            Scope::Commit => vec![format!(
                "COUNT({}) AS {}",
                quote(&self.database.commit_id_column),
                quote(COMMIT_COUNT)
            )],
            Scope::Window { .. } => vec![
                format!("COUNT(*) AS {}", quote(WINDOW_COUNT_TOTAL)),
                format!(
                    "COALESCE(SUM({}), 0) AS {}",
                    quote(COMMIT_COUNT),
                    quote(WINDOW_SIZE_TOTAL)
                ),
            ],
        }
    }

    fn anchor_condition(&self, anchor: &RefactoringType) -> String {
        match self.scope {
            Scope::Commit => format!("{} > 0", quote(&anchor.count_column())),
            Scope::Window { .. } => format!("{} > 0", quote(anchor.as_str())),
        }
    }

    /// SQL restricted to the rows in which `anchor` occurred.
    pub fn sql_for(&self, anchor: &RefactoringType) -> String {
        let mut select: Vec<String> = self.catalog.iter().map(|t| self.type_aggregate(t)).collect();
        select.extend(self.totals());
        format!(
            "SELECT {} FROM {} WHERE {}",
            select.join(", "),
            quote(&self.database.table_for(&self.scope)),
            self.anchor_condition(anchor)
        )
    }

    /// Columns of the count table: every catalog type, then the totals.
    pub fn columns(&self) -> Vec<String> {
        self.catalog
            .iter()
            .map(|t| t.as_str().to_string())
            .chain(self.scope.aux_columns().iter().map(|c| (*c).to_string()))
            .collect()
    }
}

/// Run the query once per catalog type and stack the rows in catalog order.
///
/// Every catalog type must occur at least once, otherwise its row would have
/// nothing to be normalized by.
///
/// # Errors
///
/// Returns [`RefmineError::Database`] if a query fails or does not return
/// exactly one row with every expected column, and
/// [`RefmineError::Integrity`] if a type matched no commit or window.
pub fn fetch_counts(
    executor: &dyn QueryExecutor,
    query: &CoOccurrenceQuery<'_>,
) -> Result<LabeledMatrix, RefmineError> {
    let columns = query.columns();
    let match_column = query.scope().match_count_column();
    let mut table = LabeledMatrix::new(columns.clone());

    for anchor in query.catalog.iter() {
        let result = executor.execute_query(&query.sql_for(anchor))?;
        if result.rows.len() != 1 {
            return Err(RefmineError::Database(format!(
                "aggregation for {anchor} returned {} rows, expected 1",
                result.rows.len()
            )));
        }
        let values = columns
            .iter()
            .map(|c| {
                result.value(0, c).ok_or_else(|| {
                    RefmineError::Database(format!(
                        "aggregation for {anchor} is missing column {c:?}"
                    ))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        if result.value(0, match_column).unwrap_or(0.0) <= 0.0 {
            return Err(RefmineError::Integrity {
                label: anchor.to_string(),
                detail: format!("anchor matched no rows in {}", query.scope()),
            });
        }
        table.push_row(anchor.as_str(), values)?;
    }

    debug!(
        scope = %query.scope(),
        rows = table.shape().0,
        "fetched co-occurrence counts"
    );
    Ok(table)
}
