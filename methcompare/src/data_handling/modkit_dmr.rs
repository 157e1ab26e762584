use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::helper_functions::{cast_columns, normalize_coordinates, read_headerless_tsv};
use crate::models::Dataset;

/// `modkit dmr pair --segment` output.
pub const MODKIT_SEGMENT_COLUMNS: [&str; 16] = [
    "chrom",
    "start",
    "end",
    "state-name",
    "score",
    "N-sites",
    "sample_a_counts",
    "sample_b_counts",
    "sample_a_percents",
    "sample_b_percents",
    "sample_a_fraction_modified",
    "sample_b_fraction_modified",
    "effect_size",
    "cohen_h",
    "cohen_h_low",
    "cohen_h_high",
];

/// Segments called by `modkit dmr pair` for sample 1 vs. sample 2.
pub struct ModkitDmrSegments {
    pub path: PathBuf,
}

impl Dataset for ModkitDmrSegments {
    fn load(&self) -> Result<DataFrame> {
        let df = read_headerless_tsv(&self.path, &MODKIT_SEGMENT_COLUMNS).map_err(|e| {
            error!("Failed to read modkit DMR segments {}: {}", self.path.display(), e);
            e
        })?;
        let df = normalize_coordinates(df, "modkit DMR segments")?;
        let df = cast_columns(
            df,
            &[
                ("state-name", DataType::String),
                ("N-sites", DataType::Int64),
                ("effect_size", DataType::Float64),
            ],
        )?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            let different = df
                .column("state-name")?
                .str()?
                .into_iter()
                .filter(|s| *s == Some("different"))
                .count();
            debug!("{} of {} segments are tagged 'different'", different, df.height());
        }
        info!("Loaded {} modkit DMR segments", df.height());
        Ok(df)
    }
}
