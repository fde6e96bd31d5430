#![deny(dead_code)]
#![deny(unused_imports)]

//! Design matrix assembly for genetic association models.
//!
//! The crate lays out regression inputs as `[Intercept | genotypes | covariates]`
//! and carries each column's label through to the output. It performs no
//! estimation; see [`construction`] for the operations.

pub mod config;
pub mod construction;
pub mod matrix;

pub use config::{ConfigError, DesignConfig};
pub use construction::{
    DesignError, DesignLayout, DesignMatrix, DesignMatrixBuilder, build_covariate_with_intercept,
    build_with_covariate_and_intercept, build_with_intercept, extract_phenotype, extract_vector,
    write_column,
};
pub use matrix::{ColumnSink, ColumnSource, LabeledMatrix};
