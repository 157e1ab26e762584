use std::path::PathBuf;

use polars::prelude::*;
use tracing::{error, info};

use crate::errors::Result;
use crate::helper_functions::{cast_columns, normalize_coordinates, read_tsv, rename_columns, require_columns};
use crate::models::Dataset;

/// DMRs from DSS/bsseq `callDMR`, smoothed or unsmoothed. Unlike the modkit
/// outputs these files carry a header row.
pub struct DssDmrs {
    pub path: PathBuf,
}

impl Dataset for DssDmrs {
    fn load(&self) -> Result<DataFrame> {
        let df = read_tsv(&self.path, true).map_err(|e| {
            error!("Failed to read DSS DMRs {}: {}", self.path.display(), e);
            e
        })?;
        let df = rename_columns(df, &[("chr", "chrom")])?;

        let table = self.path.display().to_string();
        require_columns(&df, &table, &["length", "diff.Methy"])?;

        // smoothed callDMR output writes coordinates as 1234.0
        let df = normalize_coordinates(df, &table)?;
        let df = cast_columns(df, &[("length", DataType::Int64), ("diff.Methy", DataType::Float64)])?;

        info!("Loaded {} DSS DMRs from {}", df.height(), self.path.display());
        Ok(df)
    }
}
