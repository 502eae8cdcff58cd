use crate::error::RefmineError;

/// One matrix row, tagged with its label at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow {
    /// Refactoring type this row describes.
    pub label: String,
    /// One value per matrix column.
    pub values: Vec<f64>,
}

impl LabeledRow {
    /// Largest value of the row, ignoring NaN; `None` for an empty row.
    pub fn max(&self) -> Option<f64> {
        max_of(self.values.iter().copied())
    }
}

/// A numeric table with named columns and labeled rows.
///
/// Used for count tables, probability matrices and filtered matrices alike.
/// Rows carry their own label, so selecting or dropping rows never requires
/// re-aligning a separate label list.
///
/// # Examples
///
/// ```
/// use refmine_core::LabeledMatrix;
///
/// let mut m = LabeledMatrix::new(vec!["A".into(), "B".into()]);
/// m.push_row("A", vec![1.0, 0.5]).unwrap();
/// m.push_row("B", vec![0.25, 1.0]).unwrap();
///
/// assert_eq!(m.shape(), (2, 2));
/// assert_eq!(m.row_labels(), vec!["A", "B"]);
/// assert_eq!(m.value("A", "B"), Some(0.5));
/// assert!(m.push_row("C", vec![1.0]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabeledMatrix {
    columns: Vec<String>,
    rows: Vec<LabeledRow>,
}

impl LabeledMatrix {
    /// An empty matrix with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::Shape`] if `values` does not have one entry
    /// per column.
    pub fn push_row(
        &mut self,
        label: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), RefmineError> {
        let label = label.into();
        if values.len() != self.columns.len() {
            return Err(RefmineError::Shape(format!(
                "row {label:?} has {} values for {} columns",
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(LabeledRow { label, values });
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    pub fn row_labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// True when there is no cell at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row(&self, label: &str) -> Option<&LabeledRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Cell at (`row` label, `column` name).
    pub fn value(&self, row: &str, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.row(row).map(|r| r.values[idx])
    }

    /// All values of a column, in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Largest value of a column, ignoring NaN; `None` if the column is
    /// unknown or there are no rows.
    pub fn column_max(&self, idx: usize) -> Option<f64> {
        if idx >= self.columns.len() {
            return None;
        }
        max_of(self.rows.iter().map(|r| r.values[idx]))
    }

    /// A copy holding only the columns at `indices`, in that order.
    pub fn select_columns(&self, indices: &[usize]) -> Self {
        Self {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| LabeledRow {
                    label: r.label.clone(),
                    values: indices.iter().map(|&i| r.values[i]).collect(),
                })
                .collect(),
        }
    }

    /// A copy without the named columns; unknown names are ignored.
    pub fn without_columns(&self, names: &[&str]) -> Self {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i].as_str()))
            .collect();
        self.select_columns(&keep)
    }

    /// Keep only the rows for which `keep` returns true.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&LabeledRow) -> bool) {
        self.rows.retain(|r| keep(r));
    }

    /// Smallest and largest finite values, or `None` if there are none.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for v in self.rows.iter().flat_map(|r| r.values.iter().copied()) {
            if !v.is_finite() {
                continue;
            }
            range = Some(match range {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        range
    }
}

fn max_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| match acc {
        None if v.is_nan() => None,
        None => Some(v),
        Some(m) => Some(m.max(v)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LabeledMatrix {
        let mut m = LabeledMatrix::new(vec!["A".into(), "B".into(), "Commit Count".into()]);
        m.push_row("A", vec![4.0, 2.0, 4.0]).unwrap();
        m.push_row("B", vec![2.0, 3.0, 3.0]).unwrap();
        m
    }

    #[test]
    fn without_columns_keeps_row_labels() {
        let m = sample().without_columns(&["Commit Count"]);
        assert_eq!(m.columns(), ["A", "B"]);
        assert_eq!(m.row_labels(), vec!["A", "B"]);
        assert_eq!(m.rows()[1].values, vec![2.0, 3.0]);
    }

    #[test]
    fn column_values_follow_row_order() {
        assert_eq!(sample().column_values("Commit Count"), Some(vec![4.0, 3.0]));
        assert_eq!(sample().column_values("missing"), None);
    }

    #[test]
    fn column_max_over_rows() {
        let m = sample();
        assert_eq!(m.column_max(1), Some(3.0));
        assert_eq!(m.column_max(9), None);
        assert_eq!(LabeledMatrix::new(vec!["A".into()]).column_max(0), None);
    }

    #[test]
    fn max_skips_nan() {
        let row = LabeledRow {
            label: "A".into(),
            values: vec![f64::NAN, 0.2, 0.1],
        };
        assert_eq!(row.max(), Some(0.2));
    }

    #[test]
    fn retain_rows_drops_label_with_row() {
        let mut m = sample();
        m.retain_rows(|r| r.label != "A");
        assert_eq!(m.row_labels(), vec!["B"]);
        assert_eq!(m.shape(), (1, 3));
    }

    #[test]
    fn empty_when_either_axis_is_empty() {
        assert!(LabeledMatrix::new(vec!["A".into()]).is_empty());
        assert!(sample().select_columns(&[]).is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn value_range_ignores_non_finite() {
        let mut m = LabeledMatrix::new(vec!["A".into(), "B".into()]);
        m.push_row("A", vec![f64::NAN, 0.5]).unwrap();
        m.push_row("B", vec![0.1, f64::INFINITY]).unwrap();
        assert_eq!(m.value_range(), Some((0.1, 0.5)));
    }
}
