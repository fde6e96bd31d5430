//! # Design Matrix Construction
//!
//! Assembles an intercept column, genotype columns, and covariate columns into
//! one dense matrix with a fixed column order:
//!
//! ```text
//! [ Intercept | genotype block | covariate block ]
//! ```
//!
//! Downstream regression code addresses coefficients by position, so the
//! column offsets here are a contract. Every column is written together with
//! its label by the same call, and all shape checks run before the output is
//! allocated: a failed build never hands back a partially filled matrix.

use crate::config::{COVARIATE_LABEL_PREFIX, ConfigError, DesignConfig, GENOTYPE_LABEL_PREFIX};
use crate::matrix::{ColumnSink, ColumnSource, LabeledMatrix};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

/// A comprehensive error type for design matrix assembly.
#[derive(Error, Debug)]
pub enum DesignError {
    #[error("Dimension mismatch in {context}: expected {expected} rows, found {found}.")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Column index {column} is out of range for a matrix with {ncols} columns.")]
    ColumnOutOfRange { column: usize, ncols: usize },

    #[error("Received {labels} column labels for a matrix with {ncols} columns.")]
    LabelCountMismatch { labels: usize, ncols: usize },

    #[error("The phenotype matrix has no columns; the outcome is read from column 0.")]
    EmptyPhenotype,

    #[error("The requested design has no columns: no intercept and no predictor columns.")]
    EmptyDesign,

    #[error("Invalid design configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Holds the column layout of an assembled design matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignLayout {
    pub intercept_col: Option<usize>,
    pub genotype_cols: Range<usize>,
    pub covariate_cols: Range<usize>,
    pub total_cols: usize,
}

impl DesignLayout {
    pub fn new(include_intercept: bool, num_genotype: usize, num_covariate: usize) -> Self {
        let mut current_col = 0;

        let intercept_col = include_intercept.then_some(current_col);
        if include_intercept {
            current_col += 1;
        }

        let genotype_cols = current_col..current_col + num_genotype;
        current_col += num_genotype;

        let covariate_cols = current_col..current_col + num_covariate;
        current_col += num_covariate;

        DesignLayout {
            intercept_col,
            genotype_cols,
            covariate_cols,
            total_cols: current_col,
        }
    }
}

/// An assembled design matrix together with the layout that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignMatrix {
    pub matrix: LabeledMatrix,
    pub layout: DesignLayout,
}

impl DesignMatrix {
    pub fn intercept(&self) -> Option<ArrayView1<'_, f64>> {
        self.layout.intercept_col.map(|col| self.matrix.column(col))
    }

    pub fn genotype_block(&self) -> ArrayView2<'_, f64> {
        self.matrix
            .values()
            .slice_move(s![.., self.layout.genotype_cols.clone()])
    }

    pub fn covariate_block(&self) -> ArrayView2<'_, f64> {
        self.matrix
            .values()
            .slice_move(s![.., self.layout.covariate_cols.clone()])
    }

    pub fn into_matrix(self) -> LabeledMatrix {
        self.matrix
    }
}

/// Builds design matrices under a fixed [`DesignConfig`].
///
/// The builder holds no state between calls. Each operation reads its inputs,
/// validates their shapes, and returns a freshly owned matrix.
#[derive(Debug, Clone, Default)]
pub struct DesignMatrixBuilder {
    config: DesignConfig,
}

impl DesignMatrixBuilder {
    pub fn new(config: DesignConfig) -> Result<Self, DesignError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DesignConfig {
        &self.config
    }

    /// `cbind(1, genotype)`.
    pub fn with_intercept<G>(&self, genotype: &G) -> DesignMatrix
    where
        G: ColumnSource + ?Sized,
    {
        let layout = DesignLayout::new(true, genotype.ncols(), 0);
        let mut assembler = ColumnAssembler::new(&self.config, &layout, genotype.nrows());
        assembler.push_intercept();
        assembler.push_block(genotype, GENOTYPE_LABEL_PREFIX);
        assembler.finish(layout)
    }

    /// `cbind(1, genotype, covariate)`. Both blocks must describe the same
    /// samples, so their row counts must agree even when `covariate` has no
    /// columns.
    pub fn with_covariate_and_intercept<G, C>(
        &self,
        genotype: &G,
        covariate: &C,
    ) -> Result<DesignMatrix, DesignError>
    where
        G: ColumnSource + ?Sized,
        C: ColumnSource + ?Sized,
    {
        ensure_rows("covariate block", genotype.nrows(), covariate.nrows())?;

        let layout = DesignLayout::new(true, genotype.ncols(), covariate.ncols());
        let mut assembler = ColumnAssembler::new(&self.config, &layout, genotype.nrows());
        assembler.push_intercept();
        assembler.push_block(genotype, GENOTYPE_LABEL_PREFIX);
        assembler.push_block(covariate, COVARIATE_LABEL_PREFIX);
        Ok(assembler.finish(layout))
    }

    /// `cbind(1, covariate)` over `sample_count` rows.
    ///
    /// A covariate block without columns means "no covariates": the result is
    /// a single intercept column and the block's row count is not consulted.
    pub fn covariate_with_intercept<C>(
        &self,
        sample_count: usize,
        covariate: &C,
    ) -> Result<DesignMatrix, DesignError>
    where
        C: ColumnSource + ?Sized,
    {
        if covariate.ncols() == 0 {
            log::info!("No covariates provided; building intercept-only design.");
        } else {
            ensure_rows("covariate block", sample_count, covariate.nrows())?;
        }

        let layout = DesignLayout::new(true, 0, covariate.ncols());
        let mut assembler = ColumnAssembler::new(&self.config, &layout, sample_count);
        assembler.push_intercept();
        assembler.push_block(covariate, COVARIATE_LABEL_PREFIX);
        Ok(assembler.finish(layout))
    }

    /// General entry point: assembles whichever blocks are supplied, honoring
    /// `include_intercept`.
    ///
    /// A genotype block must always have `sample_count` rows. A covariate block
    /// is checked only when it has columns, matching
    /// [`Self::covariate_with_intercept`].
    pub fn build(
        &self,
        sample_count: usize,
        genotype: Option<&dyn ColumnSource>,
        covariate: Option<&dyn ColumnSource>,
    ) -> Result<DesignMatrix, DesignError> {
        if let Some(g) = genotype {
            ensure_rows("genotype block", sample_count, g.nrows())?;
        }
        if let Some(c) = covariate.filter(|c| c.ncols() > 0) {
            ensure_rows("covariate block", sample_count, c.nrows())?;
        }

        let layout = DesignLayout::new(
            self.config.include_intercept,
            genotype.map_or(0, |g| g.ncols()),
            covariate.map_or(0, |c| c.ncols()),
        );
        if layout.total_cols == 0 {
            log::warn!("Refusing to build a design matrix with zero columns.");
            return Err(DesignError::EmptyDesign);
        }

        let mut assembler = ColumnAssembler::new(&self.config, &layout, sample_count);
        if layout.intercept_col.is_some() {
            assembler.push_intercept();
        }
        if let Some(g) = genotype {
            assembler.push_block(g, GENOTYPE_LABEL_PREFIX);
        }
        if let Some(c) = covariate {
            assembler.push_block(c, COVARIATE_LABEL_PREFIX);
        }
        Ok(assembler.finish(layout))
    }
}

/// Copies a flat sequence into an owned vector, preserving order.
pub fn extract_vector(source: &[f64]) -> Array1<f64> {
    Array1::from(source.to_vec())
}

/// Returns column 0 of a phenotype matrix: `out[i] == phenotype[i][0]`.
///
/// Any columns after the first are ignored.
pub fn extract_phenotype<M>(phenotype: &M) -> Result<Array1<f64>, DesignError>
where
    M: ColumnSource + ?Sized,
{
    let values = phenotype.values();
    if values.ncols() == 0 {
        return Err(DesignError::EmptyPhenotype);
    }
    if values.ncols() > 1 {
        log::debug!(
            "Phenotype matrix has {} columns; only column 0 is used.",
            values.ncols()
        );
    }
    Ok(values.column(0).to_owned())
}

/// Overwrites column `column` of `out` with `v`, leaving every other column
/// and all labels untouched. Nothing is written unless both checks pass.
pub fn write_column<S>(v: ArrayView1<f64>, out: &mut S, column: usize) -> Result<(), DesignError>
where
    S: ColumnSink + ?Sized,
{
    let mut target = out.values_mut();
    ensure_rows("column write", target.nrows(), v.len())?;
    if column >= target.ncols() {
        return Err(DesignError::ColumnOutOfRange {
            column,
            ncols: target.ncols(),
        });
    }
    target.column_mut(column).assign(&v);
    Ok(())
}

/// `cbind(1, genotype)` with the default configuration.
pub fn build_with_intercept<G>(genotype: &G) -> LabeledMatrix
where
    G: ColumnSource + ?Sized,
{
    DesignMatrixBuilder::default()
        .with_intercept(genotype)
        .into_matrix()
}

/// `cbind(1, genotype, covariate)` with the default configuration.
pub fn build_with_covariate_and_intercept<G, C>(
    genotype: &G,
    covariate: &C,
) -> Result<LabeledMatrix, DesignError>
where
    G: ColumnSource + ?Sized,
    C: ColumnSource + ?Sized,
{
    DesignMatrixBuilder::default()
        .with_covariate_and_intercept(genotype, covariate)
        .map(DesignMatrix::into_matrix)
}

/// `cbind(1, covariate)` over `sample_count` rows with the default configuration.
pub fn build_covariate_with_intercept<C>(
    sample_count: usize,
    covariate: &C,
) -> Result<LabeledMatrix, DesignError>
where
    C: ColumnSource + ?Sized,
{
    DesignMatrixBuilder::default()
        .covariate_with_intercept(sample_count, covariate)
        .map(DesignMatrix::into_matrix)
}

fn ensure_rows(context: &'static str, expected: usize, found: usize) -> Result<(), DesignError> {
    if expected != found {
        log::warn!("Dimension mismatch in {context}: expected {expected} rows, found {found}.");
        return Err(DesignError::DimensionMismatch {
            context,
            expected,
            found,
        });
    }
    Ok(())
}

/// Fills a pre-sized output left to right. Values and label of a column are
/// written by the same call, so they always share an offset.
struct ColumnAssembler<'a> {
    config: &'a DesignConfig,
    values: Array2<f64>,
    labels: Vec<Option<String>>,
    next_col: usize,
}

impl<'a> ColumnAssembler<'a> {
    fn new(config: &'a DesignConfig, layout: &DesignLayout, nrows: usize) -> Self {
        Self {
            config,
            values: Array2::zeros((nrows, layout.total_cols)),
            labels: vec![None; layout.total_cols],
            next_col: 0,
        }
    }

    fn push_intercept(&mut self) {
        let col = self.next_col;
        self.values.column_mut(col).fill(1.0);
        self.labels[col] = Some(self.config.intercept_label.clone());
        self.next_col += 1;
    }

    fn push_block<M>(&mut self, block: &M, prefix: &str)
    where
        M: ColumnSource + ?Sized,
    {
        let source = block.values();
        for j in 0..source.ncols() {
            let col = self.next_col;
            let label = match block.column_label(j) {
                Some(name) => Some(name.to_string()),
                None if self.config.fill_missing_labels => Some(format!("{prefix}{}", j + 1)),
                None => None,
            };
            self.values.column_mut(col).assign(&source.column(j));
            self.labels[col] = label;
            self.next_col += 1;
        }
    }

    fn finish(self, layout: DesignLayout) -> DesignMatrix {
        debug_assert_eq!(self.next_col, layout.total_cols);
        log::debug!(
            "Assembled {}x{} design matrix (intercept: {:?}, genotype: {:?}, covariate: {:?})",
            self.values.nrows(),
            self.values.ncols(),
            layout.intercept_col,
            layout.genotype_cols,
            layout.covariate_cols,
        );
        DesignMatrix {
            matrix: LabeledMatrix::from_parts(self.values, self.labels),
            layout,
        }
    }
}
