use std::path::PathBuf;

/// Errors that can occur anywhere in refmine.
///
/// Library crates return this type directly; the binary converts it into a
/// `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use refmine_core::RefmineError;
///
/// let err = RefmineError::InvalidStatistic("median".into());
/// assert!(err.to_string().contains("median"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum RefmineError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Query execution or connection failure.
    #[error("database error: {0}")]
    Database(String),

    /// A statistic name outside the closed set of aggregations.
    #[error("{0} is not a valid argument for statistic")]
    #[diagnostic(help("use \"likelihood\" or \"frequency\""))]
    InvalidStatistic(String),

    /// A refactoring name or table name that cannot be used as an SQL identifier.
    #[error("invalid identifier: {0:?}")]
    #[diagnostic(help(
        "identifiers may only contain letters, digits, spaces, '-' and '_'"
    ))]
    InvalidIdentifier(String),

    /// Source data violated a co-occurrence invariant.
    #[error("integrity check failed for {label}: {detail}")]
    Integrity {
        /// Row label of the offending row.
        label: String,
        /// What was expected and what was found.
        detail: String,
    },

    /// Row or vector length does not match the table it belongs to.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// A cached artifact on disk could not be read back.
    #[error("artifact error in {}: {message}", .path.display())]
    Artifact {
        /// The artifact file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Heatmap rendering failure.
    #[error("render error: {0}")]
    Render(String),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RefmineError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn invalid_statistic_names_the_input() {
        let err = RefmineError::InvalidStatistic("median".into());
        assert_eq!(
            err.to_string(),
            "median is not a valid argument for statistic"
        );
    }

    #[test]
    fn integrity_error_shows_label_and_detail() {
        let err = RefmineError::Integrity {
            label: "Extract Method".into(),
            detail: "diagonal is 0.5, expected 1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Extract Method"));
        assert!(msg.contains("0.5"));
    }

    #[test]
    fn artifact_error_shows_path() {
        let err = RefmineError::Artifact {
            path: PathBuf::from("results/Refactorings_commit.csv"),
            message: "bad header".into(),
        };
        assert!(err.to_string().contains("results/Refactorings_commit.csv"));
    }
}
