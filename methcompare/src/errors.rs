use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MethCompareError {
    #[error("Missing input: {0}")]
    MissingInput(String),
    #[error("Column '{column}' not found in {table}")]
    Schema { table: String, column: String },
    #[error("{0}")]
    CountMismatch(String),
    #[error("Malformed region: {0}")]
    MalformedRegion(String),
    #[error("Failed to draw plot: {0}")]
    Plot(String),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Regex(#[from] regex::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MethCompareError>;

/// plotters errors are generic over the backend, so they are flattened to text.
pub fn plot_err<E: std::fmt::Display>(e: E) -> MethCompareError {
    MethCompareError::Plot(e.to_string())
}

pub fn schema_err(table: &str, column: &str) -> MethCompareError {
    MethCompareError::Schema {
        table: table.to_string(),
        column: column.to_string(),
    }
}
