use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RefmineError;

/// Label column written in front of every persisted matrix.
pub const LABEL_COLUMN: &str = "Refactoring Type";
/// Number of commits matching the anchor type (commit mode).
pub const COMMIT_COUNT: &str = "Commit Count";
/// Number of windows matching the anchor type (window mode).
pub const WINDOW_COUNT_TOTAL: &str = "Window Count Total";
/// Sum of commit counts over the matching windows (window mode).
pub const WINDOW_SIZE_TOTAL: &str = "Window Size Total";

/// Format a threshold the way it appears in file names and titles.
///
/// # Examples
///
/// ```
/// use refmine_core::format_threshold;
///
/// assert_eq!(format_threshold(0.1), "0.10");
/// assert_eq!(format_threshold(0.30000000000000004), "0.30");
/// ```
pub fn format_threshold(threshold: f64) -> String {
    format!("{threshold:.2}")
}

/// How a window's co-occurrence with a type `U` is aggregated.
///
/// # Examples
///
/// ```
/// use refmine_core::Statistic;
///
/// let s: Statistic = "frequency".parse().unwrap();
/// assert_eq!(s, Statistic::Frequency);
/// assert!("median".parse::<Statistic>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    /// Share of matching windows that also contain `U`.
    Likelihood,
    /// Occurrences of `U` per commit in matching windows.
    Frequency,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Likelihood => "likelihood",
            Statistic::Frequency => "frequency",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = RefmineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "likelihood" => Ok(Statistic::Likelihood),
            "frequency" => Ok(Statistic::Frequency),
            other => Err(RefmineError::InvalidStatistic(other.to_string())),
        }
    }
}

/// The aggregation shape of one co-occurrence analysis.
///
/// # Examples
///
/// ```
/// use refmine_core::{Scope, Statistic};
///
/// let scope = Scope::window(6, "likelihood").unwrap();
/// assert_eq!(scope.artifact_stem(), "window_6H_likelihood");
/// assert_eq!(Scope::Commit.artifact_stem(), "commit");
/// assert_eq!(Scope::Commit.statistic(), Statistic::Likelihood);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Refactorings in the same commit.
    Commit,
    /// Refactorings in the same fixed-duration window of commits.
    Window {
        /// Window length in hours.
        hours: u32,
        /// Aggregation of the per-type values.
        statistic: Statistic,
    },
}

impl Scope {
    /// Build a window scope from a user-supplied statistic name.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::InvalidStatistic`] for an unknown statistic and
    /// [`RefmineError::Config`] for a zero-hour window.
    pub fn window(hours: u32, statistic: &str) -> Result<Self, RefmineError> {
        let statistic = statistic.parse()?;
        if hours == 0 {
            return Err(RefmineError::Config(
                "window size must be at least one hour".into(),
            ));
        }
        Ok(Scope::Window { hours, statistic })
    }

    /// The statistic this scope reports; commits are always a likelihood.
    pub fn statistic(&self) -> Statistic {
        match self {
            Scope::Commit => Statistic::Likelihood,
            Scope::Window { statistic, .. } => *statistic,
        }
    }

    /// Suffix of the window table, e.g. `6H`.
    pub fn window_label(&self) -> Option<String> {
        match self {
            Scope::Commit => None,
            Scope::Window { hours, .. } => Some(format!("{hours}H")),
        }
    }

    /// Scope part of CSV artifact names.
    pub fn artifact_stem(&self) -> String {
        match self {
            Scope::Commit => "commit".into(),
            Scope::Window { hours, statistic } => format!("window_{hours}H_{statistic}"),
        }
    }

    /// Scope part of heatmap image names.
    pub fn image_scope(&self) -> String {
        match self {
            Scope::Commit => "commit".into(),
            Scope::Window { hours, .. } => format!("window_{hours}H"),
        }
    }

    /// Auxiliary count columns emitted next to the per-type columns.
    pub fn aux_columns(&self) -> &'static [&'static str] {
        match self {
            Scope::Commit => &[COMMIT_COUNT],
            Scope::Window { .. } => &[WINDOW_COUNT_TOTAL, WINDOW_SIZE_TOTAL],
        }
    }

    /// Auxiliary column each row is divided by.
    pub fn divisor_column(&self) -> &'static str {
        match self {
            Scope::Commit => COMMIT_COUNT,
            Scope::Window {
                statistic: Statistic::Likelihood,
                ..
            } => WINDOW_COUNT_TOTAL,
            Scope::Window {
                statistic: Statistic::Frequency,
                ..
            } => WINDOW_SIZE_TOTAL,
        }
    }

    /// Auxiliary column holding the number of rows that matched the anchor.
    pub fn match_count_column(&self) -> &'static str {
        match self {
            Scope::Commit => COMMIT_COUNT,
            Scope::Window { .. } => WINDOW_COUNT_TOTAL,
        }
    }

    pub fn colorbar_label(&self) -> String {
        match self {
            Scope::Commit => "Co-occurrence [P/ Commit]".into(),
            Scope::Window { statistic, .. } => format!("Co-occurrence [{statistic}]"),
        }
    }

    pub fn title(&self, threshold: f64) -> String {
        let threshold = format_threshold(threshold);
        match self {
            Scope::Commit => format!(
                "Co-occurrence of refactoring types on the same commit (min[row | col] > {threshold})"
            ),
            Scope::Window { hours, .. } => format!(
                "Co-occurrence of refactoring types in the same commit time window of {hours}H (min[row | col] > {threshold})"
            ),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Commit => write!(f, "commit"),
            Scope::Window { hours, statistic } => write!(f, "window {hours}H ({statistic})"),
        }
    }
}

/// Output format for CLI reports.
///
/// # Examples
///
/// ```
/// use refmine_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistic_round_trips_through_str() {
        for s in [Statistic::Likelihood, Statistic::Frequency] {
            assert_eq!(s.to_string().parse::<Statistic>().unwrap(), s);
        }
    }

    #[test]
    fn unknown_statistic_is_a_validation_error() {
        let err = "median".parse::<Statistic>().unwrap_err();
        assert!(matches!(err, RefmineError::InvalidStatistic(ref s) if s == "median"));
    }

    #[test]
    fn statistic_parsing_is_case_sensitive() {
        assert!("Likelihood".parse::<Statistic>().is_err());
    }

    #[test]
    fn window_scope_rejects_zero_hours() {
        assert!(matches!(
            Scope::window(0, "likelihood"),
            Err(RefmineError::Config(_))
        ));
    }

    #[test]
    fn window_scope_checks_statistic_first() {
        assert!(matches!(
            Scope::window(0, "median"),
            Err(RefmineError::InvalidStatistic(_))
        ));
    }

    #[test]
    fn divisor_follows_statistic() {
        assert_eq!(Scope::Commit.divisor_column(), COMMIT_COUNT);
        let likelihood = Scope::window(12, "likelihood").unwrap();
        assert_eq!(likelihood.divisor_column(), WINDOW_COUNT_TOTAL);
        let frequency = Scope::window(12, "frequency").unwrap();
        assert_eq!(frequency.divisor_column(), WINDOW_SIZE_TOTAL);
        assert_eq!(frequency.match_count_column(), WINDOW_COUNT_TOTAL);
    }

    #[test]
    fn image_scope_includes_window_size() {
        let scope = Scope::window(24, "frequency").unwrap();
        assert_eq!(scope.image_scope(), "window_24H");
        assert_eq!(scope.window_label().as_deref(), Some("24H"));
        assert_eq!(Scope::Commit.window_label(), None);
    }

    #[test]
    fn titles_embed_formatted_threshold() {
        assert!(Scope::Commit.title(0.2).ends_with("(min[row | col] > 0.20)"));
        let scope = Scope::window(6, "likelihood").unwrap();
        assert!(scope.title(0.0).contains("window of 6H"));
        assert_eq!(scope.colorbar_label(), "Co-occurrence [likelihood]");
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "markdown".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_default_is_text() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }
}
