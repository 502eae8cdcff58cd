//! Refactoring co-occurrence statistics.
//!
//! Turns per-commit and per-window refactoring counts into conditional
//! probability matrices and prunes them at a threshold:
//!
//! 1. [`query`] aggregates one row of counts per refactoring type through a
//!    [`source::QueryExecutor`].
//! 2. [`probability`] divides each row by its divisor and zeroes the
//!    self co-occurrence after checking it.
//! 3. [`filter`] drops columns, then rows, that never exceed the threshold.
//!
//! Every stage is memoized on disk by [`cache`]; [`pipeline`] chains them and
//! [`sweep`] runs whole threshold and window-size sweeps.

pub mod cache;
pub mod filter;
pub mod pipeline;
pub mod probability;
pub mod query;
pub mod source;
pub mod sweep;

pub use cache::{Artifact, ArtifactCache, ArtifactKey, FsCache, NoCache, Provenance, Stage};
pub use pipeline::CoOccurrence;
pub use source::{QueryExecutor, ResultSet, SqliteSource};
pub use sweep::{HeatmapOutput, Sweep, SweepEntry, SweepJob, SweepPlan, SweepReport};
