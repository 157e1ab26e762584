use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, error, warn};

use crate::errors::Result;
use crate::helper_functions::{cast_columns, normalize_coordinates, read_headerless_tsv};
use crate::models::{Dataset, Region};

/// `modkit entropy` default output over fixed windows.
pub const BULK_ENTROPY_COLUMNS: [&str; 6] = ["chrom", "start", "end", "entropy", "strand", "num_reads"];

/// `modkit entropy --regions` output, one row per region.
pub const REGION_ENTROPY_COLUMNS: [&str; 14] = [
    "chrom",
    "start",
    "end",
    "region_name",
    "mean_entropy",
    "strand",
    "median_entropy",
    "min_entropy",
    "max_entropy",
    "mean_num_reads",
    "min_num_reads",
    "max_num_reads",
    "successful_window_count",
    "failed_window_count",
];

/// Window-level entropy for one sample.
pub struct BulkEntropy {
    pub path: PathBuf,
}

impl Dataset for BulkEntropy {
    fn load(&self) -> Result<DataFrame> {
        let df = read_headerless_tsv(&self.path, &BULK_ENTROPY_COLUMNS).map_err(|e| {
            error!("Failed to read bulk entropy {}: {}", self.path.display(), e);
            e
        })?;
        let df = normalize_coordinates(df, "bulk entropy")?;
        let df = cast_columns(
            df,
            &[("entropy", DataType::Float64), ("num_reads", DataType::Float64)],
        )?;
        debug!("Bulk entropy: {} windows", df.height());
        Ok(df)
    }
}

/// Per-region entropy aggregated over a DMR set for one sample.
pub struct RegionEntropy {
    pub path: PathBuf,
}

impl Dataset for RegionEntropy {
    fn load(&self) -> Result<DataFrame> {
        let df = read_headerless_tsv(&self.path, &REGION_ENTROPY_COLUMNS).map_err(|e| {
            error!("Failed to read region entropy {}: {}", self.path.display(), e);
            e
        })?;
        let df = normalize_coordinates(df, "region entropy")?;
        let df = cast_columns(
            df,
            &[
                ("region_name", DataType::String),
                ("mean_entropy", DataType::Float64),
                ("median_entropy", DataType::Float64),
                ("min_entropy", DataType::Float64),
                ("max_entropy", DataType::Float64),
                ("mean_num_reads", DataType::Float64),
                ("min_num_reads", DataType::Int64),
                ("max_num_reads", DataType::Int64),
            ],
        )?;

        let unkeyed = df
            .column("region_name")?
            .str()?
            .into_iter()
            .flatten()
            .filter(|name| name.parse::<Region>().is_err())
            .count();
        if unkeyed > 0 {
            warn!(
                "{} of {} region names in {} are not chrom:start-end keys and will not join",
                unkeyed,
                df.height(),
                self.path.display()
            );
        }
        debug!("Region entropy: {} regions", df.height());
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_region_entropy_with_integer_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dmr_entropy.tsv");
        fs::write(
            &path,
            "chr1\t100.0\t200.0\tchr1:100-200\t0.61\t.\t0.6\t0.1\t0.9\t31.5\t20\t40\t8\t0\n\
             chr2\t5\t90\tchr2:5-90\t0.12\t.\t0.1\t0.0\t0.3\t12.0\t9\t15\t3\t1\n",
        )
        .unwrap();

        let df = RegionEntropy { path }.load().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("start").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("mean_entropy").unwrap().dtype(), &DataType::Float64);
        let starts: Vec<i64> = df.column("start").unwrap().i64().unwrap().into_no_null_iter().collect();
        assert_eq!(starts, vec![100, 5]);
    }

    #[test]
    fn bulk_entropy_with_late_sex_chromosomes_and_fractions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bulk.tsv");
        let mut rows = String::new();
        for i in 0..150 {
            rows.push_str(&format!("1\t{}\t{}\t0\t.\t20\n", i * 50, i * 50 + 50));
        }
        rows.push_str("X\t0\t50\t0.5\t.\t7\n");
        fs::write(&path, rows).unwrap();

        let df = BulkEntropy { path }.load().unwrap();
        assert_eq!(df.height(), 151);
        let chroms: Vec<&str> = df.column("chrom").unwrap().str().unwrap().into_no_null_iter().collect();
        assert_eq!(chroms[0], "1");
        assert_eq!(chroms[150], "X");
        let entropy: Vec<f64> = df.column("entropy").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(entropy[150], 0.5);
    }

    #[test]
    fn bulk_entropy_reads_as_float_measures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bulk.tsv");
        fs::write(&path, "chr1\t0\t50\t0.5\t.\t12\nchr1\t50\t100\t0.75\t.\t8\n").unwrap();

        let df = BulkEntropy { path }.load().unwrap();
        assert_eq!(df.column("num_reads").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("chrom").unwrap().dtype(), &DataType::String);
    }
}
