use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, error, info, warn};

use crate::errors::{schema_err, MethCompareError, Result};

/// Reads a tab-delimited file. Files produced by modkit carry no header row,
/// in which case polars names the columns `column_1..column_n`.
///
/// Column types are inferred from every row: genome-wide tables often start
/// with rows that look integral (`1` contigs, `0` entropies) and only turn
/// textual or fractional much further down.
pub fn read_tsv(path: &Path, has_header: bool) -> Result<DataFrame> {
    if !path.exists() {
        error!("Input file {} does not exist", path.display());
        return Err(MethCompareError::MissingInput(path.display().to_string()));
    }

    info!("Reading data from {}", path.display());
    let df = CsvReadOptions::default()
        .with_has_header(has_header)
        .with_infer_schema_length(None)
        .map_parse_options(|mut o| {
            o.separator = b'\t';
            o.truncate_ragged_lines = true;
            o
        })
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()?;
    debug!("Loaded {} rows x {} cols from {}", df.height(), df.width(), path.display());

    Ok(df)
}

/// Reads a header-less TSV and assigns `names` positionally.
pub fn read_headerless_tsv(path: &Path, names: &[&str]) -> Result<DataFrame> {
    let mut df = read_tsv(path, false)?;
    if df.width() < names.len() {
        let table = path.display().to_string();
        return Err(schema_err(&table, names[df.width()]));
    }
    if df.width() > names.len() {
        warn!(
            "{} has {} columns, expected {}; extra columns are dropped",
            path.display(),
            df.width(),
            names.len()
        );
        let keep: Vec<PlSmallStr> = df.get_column_names_owned().into_iter().take(names.len()).collect();
        df = df.select(keep)?;
    }
    df.set_column_names(names.iter().copied())?;
    Ok(df)
}

pub fn write_tsv(df: &mut DataFrame, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut file = fs::File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b'\t')
        .finish(df)?;
    info!("Table written to {}", path.display());
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                error!("Failed to create output directory {}: {}", parent.display(), e);
                e
            })?;
        }
    }
    Ok(())
}

/// `{prefix}_{part}_{part}...` with the given extension.
pub fn output_path(prefix: &str, parts: &[&str], extension: &str) -> PathBuf {
    let mut name = prefix.to_string();
    for part in parts {
        name.push('_');
        name.push_str(part);
    }
    name.push('.');
    name.push_str(extension);
    PathBuf::from(name)
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

pub fn require_columns(df: &DataFrame, table: &str, columns: &[&str]) -> Result<()> {
    match columns.iter().find(|c| !has_column(df, c)) {
        Some(missing) => Err(schema_err(table, missing)),
        None => Ok(()),
    }
}

/// Renames whichever of the `(old, new)` pairs are present.
pub fn rename_columns(mut df: DataFrame, rename_map: &[(&str, &str)]) -> Result<DataFrame> {
    for &(old, new) in rename_map {
        if has_column(&df, old) {
            df.rename(old, PlSmallStr::from(new))?;
        }
    }
    Ok(df)
}

/// Casts whichever of the named columns are present.
pub fn cast_columns(mut df: DataFrame, casts: &[(&str, DataType)]) -> Result<DataFrame> {
    for (name, dtype) in casts {
        if has_column(&df, name) {
            let casted = df.column(name)?.cast(dtype)?;
            df.with_column(casted)?;
        }
    }
    Ok(df)
}

/// Parses the `start`/`end` columns to Int64, truncating float-formatted
/// values toward zero, and makes `chrom` a string column.
pub fn normalize_coordinates(mut df: DataFrame, table: &str) -> Result<DataFrame> {
    require_columns(&df, table, &["chrom", "start", "end"])?;

    let chrom = df.column("chrom")?.cast(&DataType::String)?;
    df.with_column(chrom)?;

    for name in ["start", "end"] {
        let ints = df
            .column(name)?
            .cast(&DataType::Float64)?
            .cast(&DataType::Int64)?;
        if ints.null_count() > 0 {
            error!("{} has {} missing or non-numeric '{}' values", table, ints.null_count(), name);
            return Err(MethCompareError::MalformedRegion(format!(
                "{table}: column '{name}' contains missing or non-numeric values"
            )));
        }
        df.with_column(ints)?;
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use std::io::Write;

    #[test]
    fn output_path_joins_parts_with_underscores() {
        let p = output_path("out/run1", &["s1", "per_sample_entropy_distribution_histogram"], "png");
        assert_eq!(p, PathBuf::from("out/run1_s1_per_sample_entropy_distribution_histogram.png"));
    }

    #[test]
    fn missing_file_is_a_missing_input_error() {
        let err = read_tsv(Path::new("/definitely/not/here.tsv"), false).unwrap_err();
        assert!(matches!(err, MethCompareError::MissingInput(_)));
    }

    #[test]
    fn headerless_tsv_gets_positional_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bulk.tsv");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "chr1\t0\t50\t0.5\t.\t12").unwrap();
        writeln!(f, "chr1\t50\t100\t0.25\t.\t30").unwrap();
        drop(f);

        let df = read_headerless_tsv(&path, &["chrom", "start", "end", "entropy", "strand", "num_reads"]).unwrap();
        assert_eq!(df.height(), 2);
        let names: Vec<&str> = df.get_column_names().iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["chrom", "start", "end", "entropy", "strand", "num_reads"]);

        let short = read_headerless_tsv(&path, &["chrom", "start", "end", "entropy", "strand", "num_reads", "extra"]);
        assert!(matches!(short, Err(MethCompareError::Schema { .. })));
    }

    #[test]
    fn extra_trailing_columns_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.tsv");
        fs::write(&path, "chr1\t0\t50\t0.5\t.\t12\tnew_field\n").unwrap();

        let df = read_headerless_tsv(&path, &["chrom", "start", "end", "entropy", "strand", "num_reads"]).unwrap();
        assert_eq!(df.width(), 6);
        assert!(!has_column(&df, "column_7"));
    }

    #[test]
    fn types_are_inferred_past_the_first_hundred_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bulk.tsv");
        let mut f = fs::File::create(&path).unwrap();
        for i in 0..150 {
            writeln!(f, "1\t{}\t{}\t0\t.\t10", i * 50, i * 50 + 50).unwrap();
        }
        writeln!(f, "X\t0\t50\t0.5\t.\t12").unwrap();
        drop(f);

        let df = read_tsv(&path, false).unwrap();
        assert_eq!(df.height(), 151);
        assert_eq!(df.column("column_1").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("column_4").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn normalize_truncates_float_coordinates() {
        let df = df![
            "chrom" => &["chr1", "chr2"],
            "start" => &[100.0, 5.9],
            "end" => &[200.0, 10.2]
        ]
        .unwrap();
        let df = normalize_coordinates(df, "test").unwrap();
        let start: Vec<i64> = df.column("start").unwrap().i64().unwrap().into_no_null_iter().collect();
        let end: Vec<i64> = df.column("end").unwrap().i64().unwrap().into_no_null_iter().collect();
        assert_eq!(start, vec![100, 5]);
        assert_eq!(end, vec![200, 10]);
    }

    #[test]
    fn normalize_rejects_non_numeric_coordinates() {
        let df = df![
            "chrom" => &["chr1"],
            "start" => &["abc"],
            "end" => &["200"]
        ]
        .unwrap();
        let err = normalize_coordinates(df, "test").unwrap_err();
        assert!(matches!(err, MethCompareError::MalformedRegion(_)));
    }

    #[test]
    fn rename_and_cast_skip_absent_columns() {
        let df = df!["length" => &[10i64, 20]].unwrap();
        let df = rename_columns(df, &[("length", "dmr_length"), ("diff.Methy", "effect_size")]).unwrap();
        let df = cast_columns(df, &[("dmr_length", DataType::Float64), ("effect_size", DataType::Float64)]).unwrap();
        assert!(has_column(&df, "dmr_length"));
        assert!(!has_column(&df, "effect_size"));
        assert_eq!(df.column("dmr_length").unwrap().dtype(), &DataType::Float64);
    }
}
