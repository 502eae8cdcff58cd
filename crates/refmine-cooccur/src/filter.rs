//! Threshold pruning of probability matrices.

use refmine_core::LabeledMatrix;

/// Drop low-signal columns, then low-signal rows.
///
/// A column survives if its maximum over all rows is strictly greater than
/// `threshold`. A row survives if its maximum over the surviving columns is
/// strictly greater than `threshold`. Rows keep their own labels, so the
/// result's row labels and column names always line up with its values.
///
/// # Examples
///
/// ```
/// use refmine_core::LabeledMatrix;
/// use refmine_cooccur::filter::filter_probability;
///
/// let mut p = LabeledMatrix::new(vec!["A".into(), "B".into(), "C".into()]);
/// p.push_row("A", vec![0.0, 1.0, 0.0]).unwrap();
/// p.push_row("B", vec![1.0, 0.0, 0.0]).unwrap();
/// p.push_row("C", vec![0.0, 0.0, 0.0]).unwrap();
///
/// let filtered = filter_probability(&p, 0.5);
/// assert_eq!(filtered.columns(), ["A", "B"]);
/// assert_eq!(filtered.row_labels(), vec!["A", "B"]);
/// ```
pub fn filter_probability(matrix: &LabeledMatrix, threshold: f64) -> LabeledMatrix {
    let keep_columns: Vec<usize> = (0..matrix.columns().len())
        .filter(|&i| matrix.column_max(i).is_some_and(|max| max > threshold))
        .collect();

    let mut filtered = matrix.select_columns(&keep_columns);
    filtered.retain_rows(|row| row.max().is_some_and(|max| max > threshold));
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> LabeledMatrix {
        let mut m = LabeledMatrix::new(vec!["A".into(), "B".into(), "C".into(), "D".into()]);
        m.push_row("A", vec![0.0, 0.3, 0.1, 0.0]).unwrap();
        m.push_row("B", vec![0.6, 0.0, 0.2, 0.0]).unwrap();
        m.push_row("C", vec![0.2, 0.1, 0.0, 0.4]).unwrap();
        m
    }

    #[test]
    fn threshold_zero_keeps_anything_positive() {
        let f = filter_probability(&matrix(), 0.0);
        assert_eq!(f.columns(), ["A", "B", "C", "D"]);
        assert_eq!(f.row_labels(), vec!["A", "B", "C"]);
    }

    #[test]
    fn equal_to_threshold_is_dropped() {
        // column B peaks at exactly 0.3
        let f = filter_probability(&matrix(), 0.3);
        assert_eq!(f.columns(), ["A", "D"]);
        // row A only had B above zero, so it goes with the column
        assert_eq!(f.row_labels(), vec!["B", "C"]);
        assert_eq!(f.rows()[1].values, vec![0.2, 0.4]);
    }

    #[test]
    fn row_pass_only_looks_at_kept_columns() {
        let f = filter_probability(&matrix(), 0.35);
        assert_eq!(f.columns(), ["A", "D"]);
        // row C keeps 0.4 in D; row A has nothing left
        assert_eq!(f.row_labels(), vec!["B", "C"]);
    }

    #[test]
    fn threshold_one_or_more_empties_probabilities() {
        let mut m = LabeledMatrix::new(vec!["A".into(), "B".into()]);
        m.push_row("A", vec![0.0, 1.0]).unwrap();
        m.push_row("B", vec![1.0, 0.0]).unwrap();
        let f = filter_probability(&m, 1.0);
        assert!(f.is_empty());
        assert_eq!(f.shape(), (0, 0));
    }

    #[test]
    fn empty_input_stays_empty() {
        let f = filter_probability(&LabeledMatrix::new(vec!["A".into()]), 0.0);
        assert!(f.is_empty());
    }
}
