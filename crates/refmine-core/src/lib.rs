//! Core types, configuration, and error handling for refmine.
//!
//! This crate provides the shared foundation used by the other refmine crates:
//! - [`RefmineError`]: unified error type using `thiserror` and `miette`
//! - [`RefmineConfig`]: configuration loaded from `.refmine.toml`
//! - [`Catalog`] / [`RefactoringType`]: the validated list of refactoring types
//! - [`Scope`] / [`Statistic`]: the two closed aggregation shapes
//! - [`LabeledMatrix`]: a numeric table whose rows carry their own labels

mod catalog;
mod config;
mod error;
mod matrix;
mod types;

pub use catalog::{is_safe_identifier, Catalog, RefactoringType, DEFAULT_REFACTORINGS};
pub use config::{
    DatabaseConfig, HeatmapConfig, LoggingConfig, OutputConfig, RefmineConfig, SweepConfig,
};
pub use error::RefmineError;
pub use matrix::{LabeledMatrix, LabeledRow};
pub use types::{
    format_threshold, OutputFormat, Scope, Statistic, COMMIT_COUNT, LABEL_COLUMN,
    WINDOW_COUNT_TOTAL, WINDOW_SIZE_TOTAL,
};

/// A convenience `Result` type for refmine operations.
pub type Result<T> = std::result::Result<T, RefmineError>;
