//! Filesystem memoization of pipeline stages.
//!
//! Every stage output is identified by an [`ArtifactKey`] that maps to exactly
//! one CSV file. With [`FsCache`], an existing file is loaded verbatim and the
//! stage is not run at all; there is no expiry and no content check. The
//! policy sits behind [`ArtifactCache`] so it can be replaced, e.g. by
//! [`NoCache`] in tests.

use std::fmt;
use std::path::{Path, PathBuf};

use refmine_core::{format_threshold, LabeledMatrix, RefmineError, Scope, LABEL_COLUMN};
use serde::Serialize;
use tracing::debug;

/// Pipeline stage that produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    /// Raw per-type counts with auxiliary totals.
    Counts,
    /// Normalized matrix with zeroed diagonal.
    Probability,
    /// Probability matrix pruned at a threshold.
    Filtered {
        threshold: f64,
    },
}

/// Identity of one artifact: the stage and the parameters it was derived from.
///
/// # Examples
///
/// ```
/// use refmine_core::Scope;
/// use refmine_cooccur::cache::{ArtifactKey, Stage};
///
/// let scope = Scope::window(6, "likelihood").unwrap();
/// let key = ArtifactKey::new(scope, Stage::Filtered { threshold: 0.3 });
/// assert_eq!(key.file_name(), "Refactorings_window_6H_likelihood_0.30.csv");
/// assert_eq!(
///     ArtifactKey::new(scope, Stage::Counts).file_name(),
///     "Refactorings_window_6H_likelihood_statistics.csv"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtifactKey {
    pub scope: Scope,
    pub stage: Stage,
}

impl ArtifactKey {
    pub fn new(scope: Scope, stage: Stage) -> Self {
        Self { scope, stage }
    }

    pub fn file_name(&self) -> String {
        let stem = self.scope.artifact_stem();
        match self.stage {
            Stage::Counts => format!("Refactorings_{stem}_statistics.csv"),
            Stage::Probability => format!("Refactorings_{stem}.csv"),
            Stage::Filtered { threshold } => {
                format!("Refactorings_{stem}_{}.csv", format_threshold(threshold))
            }
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Whether an artifact was produced in this run or read back from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Computed,
    Cached,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Computed => write!(f, "computed"),
            Provenance::Cached => write!(f, "cached"),
        }
    }
}

/// A stage output together with where it came from.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub matrix: LabeledMatrix,
    pub provenance: Provenance,
}

/// Memoization policy for stage outputs.
pub trait ArtifactCache {
    /// Return the artifact for `key`, running `compute` only if the policy
    /// has nothing to reuse.
    ///
    /// # Errors
    ///
    /// Propagates errors from `compute` and from reading or writing storage.
    fn get_or_compute(
        &self,
        key: &ArtifactKey,
        compute: &mut dyn FnMut() -> Result<LabeledMatrix, RefmineError>,
    ) -> Result<Artifact, RefmineError>;
}

/// CSV files in a results directory; presence of the file is the only signal.
///
/// # Examples
///
/// ```
/// use refmine_core::{LabeledMatrix, Scope};
/// use refmine_cooccur::cache::{ArtifactCache, ArtifactKey, FsCache, Provenance, Stage};
///
/// let dir = tempfile::tempdir().unwrap();
/// let cache = FsCache::new(dir.path());
/// let key = ArtifactKey::new(Scope::Commit, Stage::Probability);
///
/// let mut compute = || -> Result<LabeledMatrix, refmine_core::RefmineError> {
///     let mut m = LabeledMatrix::new(vec!["A".into()]);
///     m.push_row("A", vec![0.0])?;
///     Ok(m)
/// };
/// let first = cache.get_or_compute(&key, &mut compute).unwrap();
/// let second = cache.get_or_compute(&key, &mut compute).unwrap();
/// assert_eq!(first.provenance, Provenance::Computed);
/// assert_eq!(second.provenance, Provenance::Cached);
/// assert_eq!(first.matrix, second.matrix);
/// ```
#[derive(Debug, Clone)]
pub struct FsCache {
    dir: PathBuf,
}

impl FsCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl ArtifactCache for FsCache {
    fn get_or_compute(
        &self,
        key: &ArtifactKey,
        compute: &mut dyn FnMut() -> Result<LabeledMatrix, RefmineError>,
    ) -> Result<Artifact, RefmineError> {
        let path = self.path_for(key);
        if path.exists() {
            debug!(path = %path.display(), "reusing cached artifact");
            return Ok(Artifact {
                matrix: read_matrix(&path)?,
                provenance: Provenance::Cached,
            });
        }

        let matrix = compute()?;
        write_matrix(&path, &matrix)?;
        debug!(path = %path.display(), "stored artifact");
        Ok(Artifact {
            matrix,
            provenance: Provenance::Computed,
        })
    }
}

/// Always computes and persists nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ArtifactCache for NoCache {
    fn get_or_compute(
        &self,
        _key: &ArtifactKey,
        compute: &mut dyn FnMut() -> Result<LabeledMatrix, RefmineError>,
    ) -> Result<Artifact, RefmineError> {
        Ok(Artifact {
            matrix: compute()?,
            provenance: Provenance::Computed,
        })
    }
}

fn artifact_error(path: &Path, message: impl fmt::Display) -> RefmineError {
    RefmineError::Artifact {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Write `matrix` as CSV with the row label in the first column.
///
/// The file is written next to `path` and renamed into place, so `path`
/// either holds a complete artifact or does not exist.
///
/// # Errors
///
/// Returns [`RefmineError::Io`] or [`RefmineError::Artifact`] on write failure.
pub fn write_matrix(path: &Path, matrix: &LabeledMatrix) -> Result<(), RefmineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp).map_err(|e| artifact_error(&tmp, e))?;
        let header = std::iter::once(LABEL_COLUMN).chain(matrix.columns().iter().map(String::as_str));
        writer
            .write_record(header)
            .map_err(|e| artifact_error(&tmp, e))?;
        for row in matrix.rows() {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.label.clone());
            record.extend(row.values.iter().map(f64::to_string));
            writer
                .write_record(&record)
                .map_err(|e| artifact_error(&tmp, e))?;
        }
        writer.flush()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a matrix written by [`write_matrix`].
///
/// # Errors
///
/// Returns [`RefmineError::Artifact`] if the header does not start with the
/// label column, a row has the wrong width, or a cell is not a number.
pub fn read_matrix(path: &Path) -> Result<LabeledMatrix, RefmineError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| artifact_error(path, e))?;
    let headers = reader.headers().map_err(|e| artifact_error(path, e))?.clone();
    match headers.get(0) {
        Some(first) if first == LABEL_COLUMN => {}
        other => {
            return Err(artifact_error(
                path,
                format!("expected first column {LABEL_COLUMN:?}, found {other:?}"),
            ))
        }
    }

    let mut matrix = LabeledMatrix::new(headers.iter().skip(1).map(String::from).collect());
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| artifact_error(path, e))?;
        let label = record.get(0).unwrap_or_default().to_string();
        let values = record
            .iter()
            .skip(1)
            .map(|cell| {
                cell.parse::<f64>().map_err(|_| {
                    artifact_error(path, format!("row {}: {cell:?} is not a number", line + 1))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        matrix
            .push_row(label, values)
            .map_err(|e| artifact_error(path, e))?;
    }
    Ok(matrix)
}
