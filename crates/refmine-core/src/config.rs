use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{is_safe_identifier, Catalog};
use crate::error::RefmineError;
use crate::types::{Scope, Statistic};

/// Top-level configuration loaded from `.refmine.toml`.
///
/// Built once at startup and passed by reference to every stage. CLI flags
/// override file values; missing sections fall back to defaults.
///
/// # Examples
///
/// ```
/// use refmine_core::RefmineConfig;
///
/// let config = RefmineConfig::default();
/// assert_eq!(config.sweep.window_hours, vec![6, 12, 24]);
/// assert_eq!(config.catalog().unwrap().len(), 39);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefmineConfig {
    /// Source database and table names.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Where artifacts go and whether existing ones are reused.
    #[serde(default)]
    pub output: OutputConfig,
    /// Thresholds, window sizes and statistics to sweep.
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Heatmap rendering options.
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    /// Log verbosity.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Replaces the built-in refactoring catalog when set.
    #[serde(default)]
    pub refactorings: Option<Vec<String>>,
}

impl RefmineConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::Io`] if the file cannot be read, or
    /// [`RefmineError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use refmine_core::RefmineConfig;
    /// use std::path::Path;
    ///
    /// let config = RefmineConfig::from_file(Path::new(".refmine.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, RefmineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::Toml`] if parsing fails, including an unknown
    /// statistic name in `[sweep] statistics`.
    ///
    /// # Examples
    ///
    /// ```
    /// use refmine_core::RefmineConfig;
    ///
    /// let toml = r#"
    /// [sweep]
    /// thresholds = [0.0, 0.25]
    /// "#;
    /// let config = RefmineConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.sweep.thresholds, vec![0.0, 0.25]);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, RefmineError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// The refactoring catalog: the configured override or the built-in list.
    ///
    /// # Errors
    ///
    /// Returns an error if the override is empty, has duplicates, or contains
    /// a name that is not a safe identifier.
    pub fn catalog(&self) -> Result<Catalog, RefmineError> {
        match &self.refactorings {
            Some(names) => Catalog::from_names(names.iter().cloned()),
            None => Ok(Catalog::default()),
        }
    }

    /// Check everything that would otherwise only fail halfway through a sweep.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::Config`] or [`RefmineError::InvalidIdentifier`]
    /// describing the first problem found.
    pub fn validate(&self) -> Result<(), RefmineError> {
        self.catalog()?;
        for ident in [
            &self.database.commit_table,
            &self.database.commit_id_column,
            &self.database.window_table_prefix,
        ] {
            if !is_safe_identifier(ident) {
                return Err(RefmineError::InvalidIdentifier(ident.clone()));
            }
        }
        if let Some(t) = self.sweep.thresholds.iter().find(|t| !t.is_finite()) {
            return Err(RefmineError::Config(format!(
                "threshold {t} is not a finite number"
            )));
        }
        if self.sweep.window_hours.contains(&0) {
            return Err(RefmineError::Config(
                "window size must be at least one hour".into(),
            ));
        }
        if self.heatmap.cell_size == 0 {
            return Err(RefmineError::Config(
                "heatmap cell_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Source database settings.
///
/// # Examples
///
/// ```
/// use refmine_core::{DatabaseConfig, Scope};
///
/// let db = DatabaseConfig::default();
/// assert_eq!(db.table_for(&Scope::Commit), "refactoringspercommit");
/// assert_eq!(db.table_for(&Scope::window(12, "likelihood").unwrap()), "RefactoringsWindow_12H");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file holding the aggregated refactoring tables.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    /// Per-commit table with one `"<type> count"` column per refactoring type.
    #[serde(default = "default_commit_table")]
    pub commit_table: String,
    /// Commit identifier column of the per-commit table.
    #[serde(default = "default_commit_id_column")]
    pub commit_id_column: String,
    /// Window tables are named `<prefix><hours>H`.
    #[serde(default = "default_window_table_prefix")]
    pub window_table_prefix: String,
}

impl DatabaseConfig {
    /// Source table for a scope.
    pub fn table_for(&self, scope: &Scope) -> String {
        match scope {
            Scope::Commit => self.commit_table.clone(),
            Scope::Window { hours, .. } => format!("{}{hours}H", self.window_table_prefix),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("refactorings.db")
}

fn default_commit_table() -> String {
    "refactoringspercommit".into()
}

fn default_commit_id_column() -> String {
    "commitMetaData_id".into()
}

fn default_window_table_prefix() -> String {
    "RefactoringsWindow_".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            commit_table: default_commit_table(),
            commit_id_column: default_commit_id_column(),
            window_table_prefix: default_window_table_prefix(),
        }
    }
}

/// Artifact output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for CSV and PNG artifacts (default: `results`).
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Reuse existing artifacts instead of recomputing them (default: true).
    #[serde(default = "default_true")]
    pub cache: bool,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            cache: true,
        }
    }
}

/// What the full sweep covers.
///
/// # Examples
///
/// ```
/// use refmine_core::SweepConfig;
///
/// let sweep = SweepConfig::default();
/// assert!(sweep.commit);
/// assert_eq!(sweep.thresholds, vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Run the per-commit analysis.
    #[serde(default = "default_true")]
    pub commit: bool,
    /// Probability thresholds, applied to every scope.
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<f64>,
    /// Window sizes in hours; empty disables window analyses.
    #[serde(default = "default_window_hours")]
    pub window_hours: Vec<u32>,
    /// Statistics computed for each window size, in order.
    #[serde(default = "default_statistics")]
    pub statistics: Vec<Statistic>,
}

/// `0.0, 0.1, …, 0.5`, computed as `i / 10` so no error accumulates.
fn default_thresholds() -> Vec<f64> {
    (0..=5).map(|i| f64::from(i) / 10.0).collect()
}

fn default_window_hours() -> Vec<u32> {
    vec![6, 12, 24]
}

fn default_statistics() -> Vec<Statistic> {
    vec![Statistic::Likelihood, Statistic::Frequency]
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            commit: true,
            thresholds: default_thresholds(),
            window_hours: default_window_hours(),
            statistics: default_statistics(),
        }
    }
}

/// Heatmap rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapConfig {
    /// Render a PNG for every filtered matrix (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Colormap name (default: `YlGn`).
    #[serde(default = "default_colormap")]
    pub colormap: String,
    /// Edge length of one matrix cell in pixels (default: 48).
    #[serde(default = "default_cell_size")]
    pub cell_size: u32,
}

fn default_colormap() -> String {
    "YlGn".into()
}

fn default_cell_size() -> u32 {
    48
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colormap: default_colormap(),
            cell_size: default_cell_size(),
        }
    }
}

/// Logging settings; `RUST_LOG` and `--verbose` take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level for refmine's own targets (default: `warn`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
