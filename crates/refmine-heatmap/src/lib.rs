//! Heatmap rendering for co-occurrence matrices.
//!
//! Maps matrix values onto a sequential colormap and writes PNG images whose
//! file names encode the sweep parameters, so outputs of different thresholds,
//! statistics and window sizes never overwrite each other.
//!
//! Images carry colored cells and a color bar only. Titles and tick labels
//! are not drawn; they are embedded as PNG `tEXt` metadata, see
//! [`PngRenderer`].

pub mod colormap;
pub mod render;

use refmine_core::{format_threshold, Scope};

pub use colormap::Colormap;
pub use render::{HeatmapRenderer, HeatmapRequest, PngRenderer};

/// File name of the heatmap for one sweep entry.
///
/// # Examples
///
/// ```
/// use refmine_core::Scope;
/// use refmine_heatmap::heatmap_file_name;
///
/// assert_eq!(
///     heatmap_file_name(&Scope::Commit, 0.1, (7, 9)),
///     "Refactorings_co-occurrence_commit_0.10_likelihood_7x9.png"
/// );
/// let scope = Scope::window(12, "frequency").unwrap();
/// assert_eq!(
///     heatmap_file_name(&scope, 0.0, (3, 4)),
///     "Refactorings_co-occurrence_window_12H_0.00_frequency_3x4.png"
/// );
/// ```
pub fn heatmap_file_name(scope: &Scope, threshold: f64, shape: (usize, usize)) -> String {
    format!(
        "Refactorings_co-occurrence_{}_{}_{}_{}x{}.png",
        scope.image_scope(),
        format_threshold(threshold),
        scope.statistic(),
        shape.0,
        shape.1
    )
}
