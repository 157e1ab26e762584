use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, error};

use crate::errors::Result;
use crate::helper_functions::{cast_columns, read_tsv, require_columns};
use crate::models::Dataset;

/// Columns of `modkit sample-probs` `probabilities.tsv` used for plotting.
pub const SAMPLE_PROBS_COLUMNS: [&str; 5] = ["code", "primary_base", "range_start", "count", "frac"];

pub struct SampleProbs {
    pub path: PathBuf,
}

impl Dataset for SampleProbs {
    fn load(&self) -> Result<DataFrame> {
        let df = read_tsv(&self.path, true).map_err(|e| {
            error!("Failed to read probabilities {}: {}", self.path.display(), e);
            e
        })?;
        require_columns(&df, &self.path.display().to_string(), &SAMPLE_PROBS_COLUMNS)?;

        let df = cast_columns(
            df,
            &[
                ("code", DataType::String),
                ("primary_base", DataType::String),
                ("range_start", DataType::Float64),
                ("count", DataType::Float64),
                ("frac", DataType::Float64),
            ],
        )?;
        debug!("{}: {} probability bins", self.path.display(), df.height());
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MethCompareError;
    use std::fs;

    #[test]
    fn loads_probabilities_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probabilities.tsv");
        fs::write(
            &path,
            "code\tprimary_base\trange_start\trange_end\tcount\tfrac\tpercentile_rank\n\
             -\tC\t0.5\t0.51\t120\t0.02\t1.0\n\
             m\tC\t0.5\t0.51\t80\t0.01\t1.0\n",
        )
        .unwrap();

        let df = SampleProbs { path }.load().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("count").unwrap().dtype(), &DataType::Float64);
        let codes: Vec<&str> = df.column("code").unwrap().str().unwrap().into_no_null_iter().collect();
        assert_eq!(codes, vec!["-", "m"]);
    }

    #[test]
    fn rejects_tables_without_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probabilities.tsv");
        fs::write(&path, "code\tprimary_base\trange_start\n-\tC\t0.5\n").unwrap();

        let err = SampleProbs { path }.load().unwrap_err();
        assert!(matches!(err, MethCompareError::Schema { .. }));
    }
}
