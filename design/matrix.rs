//! # Labeled Dense Containers
//!
//! Every design matrix in this crate is a dense, row-major `ndarray` block
//! whose columns carry an optional string label. Rows are samples; columns are
//! predictors (an intercept, genotype dosages, covariates).
//!
//! Two representations reach the builder: the fully labeled [`LabeledMatrix`]
//! and a plain `Array2<f64>` with no column metadata. Both are consumed through
//! the [`ColumnSource`] capability trait, and both can receive a single column
//! through [`ColumnSink`], so every construction routine is written once.

use crate::construction::DesignError;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut2};
use serde::{Deserialize, Serialize, Serializer};

/// Read access to a block of predictor columns.
///
/// Rows are samples. `column_label` returns `None` for representations that do
/// not store labels, and for labeled columns that were never named.
pub trait ColumnSource {
    /// A read-only view over the numeric content, shape `[nrows, ncols]`.
    fn values(&self) -> ArrayView2<'_, f64>;

    /// The label attached to column `col`, if any.
    fn column_label(&self, col: usize) -> Option<&str>;

    fn nrows(&self) -> usize {
        self.values().nrows()
    }

    fn ncols(&self) -> usize {
        self.values().ncols()
    }
}

/// Write access to the numeric content of a matrix, used by column writers.
pub trait ColumnSink {
    fn values_mut(&mut self) -> ArrayViewMut2<'_, f64>;
}

/// A dense matrix whose columns carry optional labels.
///
/// The number of labels always equals the number of columns. Construction
/// through [`LabeledMatrix::new`] enforces this; every other constructor
/// derives the labels from the shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawLabeledMatrix")]
pub struct LabeledMatrix {
    values: Array2<f64>,
    labels: Vec<Option<String>>,
}

/// Serde image of one column label. An unlabeled column is an empty table,
/// so the image holds no nulls and fits in TOML artifacts.
#[derive(Serialize, Deserialize)]
struct ColumnLabel<L> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<L>,
}

#[derive(Serialize)]
struct LabeledMatrixImage<'a> {
    values: &'a Array2<f64>,
    labels: Vec<ColumnLabel<&'a str>>,
}

/// Unchecked serde image of [`LabeledMatrix`]; validated on the way in.
#[derive(Deserialize)]
struct RawLabeledMatrix {
    values: Array2<f64>,
    labels: Vec<ColumnLabel<String>>,
}

impl Serialize for LabeledMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LabeledMatrixImage {
            values: &self.values,
            labels: self
                .labels
                .iter()
                .map(|l| ColumnLabel { name: l.as_deref() })
                .collect(),
        }
        .serialize(serializer)
    }
}

impl TryFrom<RawLabeledMatrix> for LabeledMatrix {
    type Error = DesignError;

    fn try_from(raw: RawLabeledMatrix) -> Result<Self, Self::Error> {
        let labels = raw.labels.into_iter().map(|l| l.name).collect();
        LabeledMatrix::new(raw.values, labels)
    }
}

impl LabeledMatrix {
    /// Pairs a value block with one label per column.
    pub fn new(values: Array2<f64>, labels: Vec<Option<String>>) -> Result<Self, DesignError> {
        if labels.len() != values.ncols() {
            return Err(DesignError::LabelCountMismatch {
                labels: labels.len(),
                ncols: values.ncols(),
            });
        }
        Ok(Self { values, labels })
    }

    /// Convenience constructor for fully named columns.
    pub fn with_labels<S: Into<String>>(
        values: Array2<f64>,
        labels: impl IntoIterator<Item = S>,
    ) -> Result<Self, DesignError> {
        let labels = labels.into_iter().map(|l| Some(l.into())).collect();
        Self::new(values, labels)
    }

    /// Wraps a value block with every column unlabeled.
    pub fn unlabeled(values: Array2<f64>) -> Self {
        let labels = vec![None; values.ncols()];
        Self { values, labels }
    }

    /// A zero-filled, unlabeled matrix of the requested shape.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::unlabeled(Array2::zeros((nrows, ncols)))
    }

    /// Assembly path for callers that build labels alongside values and
    /// already guarantee `labels.len() == values.ncols()`.
    pub(crate) fn from_parts(values: Array2<f64>, labels: Vec<Option<String>>) -> Self {
        debug_assert_eq!(labels.len(), values.ncols());
        Self { values, labels }
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn column(&self, col: usize) -> ArrayView1<'_, f64> {
        self.values.column(col)
    }

    pub fn row(&self, row: usize) -> ArrayView1<'_, f64> {
        self.values.row(row)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get((row, col)).copied()
    }

    pub fn column_label(&self, col: usize) -> Option<&str> {
        self.labels.get(col).and_then(|l| l.as_deref())
    }

    pub fn column_labels(&self) -> &[Option<String>] {
        &self.labels
    }

    /// Renames column `col`. Fails if the column does not exist.
    pub fn set_column_label(
        &mut self,
        col: usize,
        label: impl Into<String>,
    ) -> Result<(), DesignError> {
        let ncols = self.ncols();
        let slot = self
            .labels
            .get_mut(col)
            .ok_or(DesignError::ColumnOutOfRange { column: col, ncols })?;
        *slot = Some(label.into());
        Ok(())
    }

    pub fn into_parts(self) -> (Array2<f64>, Vec<Option<String>>) {
        (self.values, self.labels)
    }
}

impl ColumnSource for LabeledMatrix {
    fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    fn column_label(&self, col: usize) -> Option<&str> {
        LabeledMatrix::column_label(self, col)
    }
}

impl ColumnSource for Array2<f64> {
    fn values(&self) -> ArrayView2<'_, f64> {
        self.view()
    }

    fn column_label(&self, _: usize) -> Option<&str> {
        None
    }
}

impl ColumnSource for ArrayView2<'_, f64> {
    fn values(&self) -> ArrayView2<'_, f64> {
        self.view()
    }

    fn column_label(&self, _: usize) -> Option<&str> {
        None
    }
}

impl<T: ColumnSource + ?Sized> ColumnSource for &T {
    fn values(&self) -> ArrayView2<'_, f64> {
        (**self).values()
    }

    fn column_label(&self, col: usize) -> Option<&str> {
        (**self).column_label(col)
    }
}

impl ColumnSink for LabeledMatrix {
    fn values_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.values.view_mut()
    }
}

impl ColumnSink for Array2<f64> {
    fn values_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.view_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn label_count_must_match_columns() {
        let err = LabeledMatrix::new(array![[1.0, 2.0]], vec![Some("a".to_string())]).unwrap_err();
        assert!(matches!(
            err,
            DesignError::LabelCountMismatch { labels: 1, ncols: 2 }
        ));
    }

    #[test]
    fn toml_round_trip_keeps_labeled_and_unlabeled_columns() {
        let m = LabeledMatrix::new(
            array![[1.0, 2.0, 0.5], [1.0, 0.0, -1.5]],
            vec![Some("Intercept".to_string()), None, Some("Age".to_string())],
        )
        .unwrap();
        let text = toml::to_string(&m).unwrap();
        let parsed: LabeledMatrix = toml::from_str(&text).unwrap();
        assert_eq!(parsed, m);
        assert_eq!(parsed.column_label(1), None);

        let plain = LabeledMatrix::zeros(2, 2);
        let text = toml::to_string(&plain).unwrap();
        assert_eq!(toml::from_str::<LabeledMatrix>(&text).unwrap(), plain);
    }

    #[test]
    fn deserialized_label_count_must_match_columns() {
        let text = r#"
            [values]
            v = 1
            dim = [2, 2]
            data = [1.0, 2.0, 3.0, 4.0]

            [[labels]]
            name = "SNP1"
        "#;
        let err = toml::from_str::<LabeledMatrix>(text).unwrap_err();
        assert!(
            err.to_string()
                .contains("Received 1 column labels for a matrix with 2 columns.")
        );
    }

    #[test]
    fn zeros_is_unlabeled_with_requested_shape() {
        let m = LabeledMatrix::zeros(4, 3);
        assert_eq!((m.nrows(), m.ncols()), (4, 3));
        assert_eq!(m.column_labels().len(), 3);
        assert!(m.column_labels().iter().all(Option::is_none));
        assert!(m.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn set_column_label_rejects_missing_column() {
        let mut m = LabeledMatrix::zeros(2, 1);
        m.set_column_label(0, "rs123").unwrap();
        assert_eq!(m.column_label(0), Some("rs123"));

        let err = m.set_column_label(1, "rs456").unwrap_err();
        assert!(matches!(
            err,
            DesignError::ColumnOutOfRange { column: 1, ncols: 1 }
        ));
        assert_eq!(m.column_label(0), Some("rs123"));
    }

    #[test]
    fn plain_arrays_expose_no_labels() {
        let plain = array![[1.0, 2.0], [3.0, 4.0]];
        assert_eq!(ColumnSource::nrows(&plain), 2);
        assert_eq!(ColumnSource::ncols(&plain), 2);
        assert_eq!(ColumnSource::column_label(&plain, 0), None);
        assert_eq!(ColumnSource::column_label(&plain.view(), 1), None);
    }

    #[test]
    fn get_is_bounds_checked() {
        let m = LabeledMatrix::with_labels(array![[1.5], [2.5]], ["Age"]).unwrap();
        assert_eq!(m.get(1, 0), Some(2.5));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.get(0, 1), None);
    }
}
