//! Normalizing count tables into conditional probabilities.

use refmine_core::{LabeledMatrix, RefmineError, Scope, Statistic};

/// What a freshly normalized diagonal cell must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagonalCheck {
    /// A type always co-occurs with itself: the cell is exactly `1.0`.
    ExactlyOne,
    /// The cell is a per-commit rate; it must be finite and positive.
    Positive,
}

impl DiagonalCheck {
    pub fn for_scope(scope: &Scope) -> Self {
        match scope.statistic() {
            Statistic::Likelihood => DiagonalCheck::ExactlyOne,
            Statistic::Frequency => DiagonalCheck::Positive,
        }
    }

    fn holds(&self, value: f64) -> bool {
        match self {
            DiagonalCheck::ExactlyOne => value == 1.0,
            DiagonalCheck::Positive => value.is_finite() && value > 0.0,
        }
    }

    fn expectation(&self) -> &'static str {
        match self {
            DiagonalCheck::ExactlyOne => "expected exactly 1",
            DiagonalCheck::Positive => "expected a positive rate",
        }
    }
}

/// Split a count table into its per-type block and the divisor column.
///
/// # Errors
///
/// Returns [`RefmineError::Shape`] if the scope's divisor column is missing.
pub fn split_counts(
    counts: &LabeledMatrix,
    scope: &Scope,
) -> Result<(LabeledMatrix, Vec<f64>), RefmineError> {
    let divisor = counts.column_values(scope.divisor_column()).ok_or_else(|| {
        RefmineError::Shape(format!(
            "count table has no {:?} column",
            scope.divisor_column()
        ))
    })?;
    Ok((counts.without_columns(scope.aux_columns()), divisor))
}

/// Divide every row by its divisor, verify the diagonal, then zero it.
///
/// The diagonal cell of a row is the column named like the row's label.
///
/// # Errors
///
/// Returns [`RefmineError::Shape`] if `divisor` does not have one entry per
/// row, and [`RefmineError::Integrity`] if a row has no diagonal column or
/// its diagonal fails `check`.
///
/// # Examples
///
/// ```
/// use refmine_core::LabeledMatrix;
/// use refmine_cooccur::probability::{compute_probability, DiagonalCheck};
///
/// let mut counts = LabeledMatrix::new(vec!["A".into(), "B".into()]);
/// counts.push_row("A", vec![4.0, 1.0]).unwrap();
/// counts.push_row("B", vec![1.0, 2.0]).unwrap();
///
/// let p = compute_probability(&counts, &[4.0, 2.0], DiagonalCheck::ExactlyOne).unwrap();
/// assert_eq!(p.rows()[0].values, vec![0.0, 0.25]);
/// assert_eq!(p.rows()[1].values, vec![0.5, 0.0]);
/// ```
pub fn compute_probability(
    counts: &LabeledMatrix,
    divisor: &[f64],
    check: DiagonalCheck,
) -> Result<LabeledMatrix, RefmineError> {
    let (rows, _) = counts.shape();
    if divisor.len() != rows {
        return Err(RefmineError::Shape(format!(
            "{} divisors for {rows} rows",
            divisor.len()
        )));
    }

    let mut probability = LabeledMatrix::new(counts.columns().to_vec());
    for (row, &d) in counts.rows().iter().zip(divisor) {
        let diag = counts
            .column_index(&row.label)
            .ok_or_else(|| RefmineError::Integrity {
                label: row.label.clone(),
                detail: "row has no matching column".into(),
            })?;
        let mut values: Vec<f64> = row.values.iter().map(|v| v / d).collect();
        if !check.holds(values[diag]) {
            return Err(RefmineError::Integrity {
                label: row.label.clone(),
                detail: format!(
                    "self co-occurrence is {}, {}",
                    values[diag],
                    check.expectation()
                ),
            });
        }
        values[diag] = 0.0;
        probability.push_row(row.label.clone(), values)?;
    }
    Ok(probability)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> LabeledMatrix {
        let mut m = LabeledMatrix::new(vec!["A".into(), "B".into(), "C".into()]);
        m.push_row("A", vec![10.0, 5.0, 0.0]).unwrap();
        m.push_row("C", vec![1.0, 0.0, 4.0]).unwrap();
        m
    }

    #[test]
    fn rows_are_divided_by_their_own_divisor() {
        let p = compute_probability(&counts(), &[10.0, 4.0], DiagonalCheck::ExactlyOne).unwrap();
        assert_eq!(p.row_labels(), vec!["A", "C"]);
        assert_eq!(p.rows()[0].values, vec![0.0, 0.5, 0.0]);
        assert_eq!(p.rows()[1].values, vec![0.25, 0.0, 0.0]);
    }

    #[test]
    fn diagonal_not_one_is_an_integrity_error() {
        let err = compute_probability(&counts(), &[10.0, 5.0], DiagonalCheck::ExactlyOne)
            .unwrap_err();
        match err {
            RefmineError::Integrity { label, .. } => assert_eq!(label, "C"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_divisor_fails_the_check() {
        let err =
            compute_probability(&counts(), &[0.0, 4.0], DiagonalCheck::ExactlyOne).unwrap_err();
        assert!(matches!(err, RefmineError::Integrity { .. }));
    }

    #[test]
    fn positive_check_accepts_rates() {
        let p = compute_probability(&counts(), &[20.0, 8.0], DiagonalCheck::Positive).unwrap();
        assert_eq!(p.rows()[0].values, vec![0.0, 0.25, 0.0]);
        assert!(compute_probability(&counts(), &[20.0, f64::INFINITY], DiagonalCheck::Positive)
            .is_err());
    }

    #[test]
    fn divisor_length_must_match_rows() {
        assert!(matches!(
            compute_probability(&counts(), &[1.0], DiagonalCheck::ExactlyOne),
            Err(RefmineError::Shape(_))
        ));
    }

    #[test]
    fn row_without_diagonal_column_is_rejected() {
        let mut m = LabeledMatrix::new(vec!["A".into()]);
        m.push_row("Z", vec![1.0]).unwrap();
        assert!(matches!(
            compute_probability(&m, &[1.0], DiagonalCheck::ExactlyOne),
            Err(RefmineError::Integrity { .. })
        ));
    }

    #[test]
    fn split_counts_strips_aux_columns() {
        let mut m = LabeledMatrix::new(vec![
            "A".into(),
            "Window Count Total".into(),
            "Window Size Total".into(),
        ]);
        m.push_row("A", vec![3.0, 3.0, 12.0]).unwrap();
        let freq = Scope::window(6, "frequency").unwrap();
        let (types, divisor) = split_counts(&m, &freq).unwrap();
        assert_eq!(types.columns(), ["A"]);
        assert_eq!(divisor, vec![12.0]);

        assert!(split_counts(&m, &Scope::Commit).is_err());
    }

    #[test]
    fn check_follows_statistic() {
        assert_eq!(
            DiagonalCheck::for_scope(&Scope::Commit),
            DiagonalCheck::ExactlyOne
        );
        assert_eq!(
            DiagonalCheck::for_scope(&Scope::window(6, "frequency").unwrap()),
            DiagonalCheck::Positive
        );
    }
}
