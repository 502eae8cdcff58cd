//! The three cached stages chained together.
//!
//! Each stage asks the cache first and only derives its input from the
//! previous stage when it has to compute. A cached filtered matrix therefore
//! costs no query at all, and a cached probability matrix is never
//! re-validated.

use refmine_core::{Catalog, DatabaseConfig, RefmineError, Scope};
use tracing::info;

use crate::cache::{Artifact, ArtifactCache, ArtifactKey, Stage};
use crate::filter::filter_probability;
use crate::probability::{compute_probability, split_counts, DiagonalCheck};
use crate::query::{fetch_counts, CoOccurrenceQuery};
use crate::source::QueryExecutor;

/// Co-occurrence statistics over one database, memoized through a cache.
///
/// # Examples
///
/// ```
/// use refmine_core::{Catalog, DatabaseConfig, Scope};
/// use refmine_cooccur::cache::NoCache;
/// use refmine_cooccur::pipeline::CoOccurrence;
/// use refmine_cooccur::source::{QueryExecutor, SqliteSource};
///
/// let source = SqliteSource::in_memory().unwrap();
/// source.connection().execute_batch(
///     "CREATE TABLE refactoringspercommit (\"commitMetaData_id\" INTEGER, \"A count\" INTEGER, \"B count\" INTEGER);
///      INSERT INTO refactoringspercommit VALUES (1, 1, 2), (2, 3, 0);",
/// ).unwrap();
///
/// let catalog = Catalog::from_names(["A", "B"]).unwrap();
/// let db = DatabaseConfig::default();
/// let pipeline = CoOccurrence::new(&catalog, &db, &source, &NoCache);
///
/// let p = pipeline.probabilities(Scope::Commit).unwrap().matrix;
/// assert_eq!(p.value("A", "B"), Some(0.5));
/// assert_eq!(p.value("B", "A"), Some(1.0));
/// ```
pub struct CoOccurrence<'a> {
    catalog: &'a Catalog,
    database: &'a DatabaseConfig,
    source: &'a dyn QueryExecutor,
    cache: &'a dyn ArtifactCache,
}

impl<'a> CoOccurrence<'a> {
    pub fn new(
        catalog: &'a Catalog,
        database: &'a DatabaseConfig,
        source: &'a dyn QueryExecutor,
        cache: &'a dyn ArtifactCache,
    ) -> Self {
        Self {
            catalog,
            database,
            source,
            cache,
        }
    }

    /// Raw count table for `scope`, one query per catalog type.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::Database`] on query failure and
    /// [`RefmineError::Artifact`] if a cached table cannot be read.
    pub fn counts(&self, scope: Scope) -> Result<Artifact, RefmineError> {
        let key = ArtifactKey::new(scope, Stage::Counts);
        let artifact = self.cache.get_or_compute(&key, &mut || {
            info!(%scope, types = self.catalog.len(), "querying co-occurrence counts");
            let query = CoOccurrenceQuery::new(self.catalog, self.database, scope);
            fetch_counts(self.source, &query)
        })?;
        info!(%key, provenance = %artifact.provenance, "count table ready");
        Ok(artifact)
    }

    /// Conditional probability matrix with a zeroed diagonal.
    ///
    /// # Errors
    ///
    /// Everything [`counts`](Self::counts) returns, plus
    /// [`RefmineError::Integrity`] if a freshly computed diagonal is invalid.
    pub fn probabilities(&self, scope: Scope) -> Result<Artifact, RefmineError> {
        let key = ArtifactKey::new(scope, Stage::Probability);
        let artifact = self.cache.get_or_compute(&key, &mut || {
            let counts = self.counts(scope)?.matrix;
            let (types, divisor) = split_counts(&counts, &scope)?;
            compute_probability(&types, &divisor, DiagonalCheck::for_scope(&scope))
        })?;
        info!(%key, provenance = %artifact.provenance, "probability matrix ready");
        Ok(artifact)
    }

    /// Probability matrix pruned at `threshold`.
    ///
    /// # Errors
    ///
    /// Everything [`probabilities`](Self::probabilities) returns.
    pub fn filtered(&self, scope: Scope, threshold: f64) -> Result<Artifact, RefmineError> {
        let key = ArtifactKey::new(scope, Stage::Filtered { threshold });
        let artifact = self.cache.get_or_compute(&key, &mut || {
            let probability = self.probabilities(scope)?.matrix;
            Ok(filter_probability(&probability, threshold))
        })?;
        let (rows, cols) = artifact.matrix.shape();
        info!(%key, provenance = %artifact.provenance, rows, cols, "filtered matrix ready");
        Ok(artifact)
    }
}
