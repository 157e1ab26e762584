//! Region join & label pipeline.
//!
//! Entropy tables and DMR call tables are joined on their `chrom:start-end`
//! key, tagged with a `name` column describing where each row came from and
//! stacked into one long table per sample. The two per-sample tables are then
//! aligned on raw coordinates for the pairwise comparison.

use polars::prelude::*;
use regex::Regex;
use tracing::{debug, info};

use crate::errors::{MethCompareError, Result};
use crate::helper_functions::{cast_columns, rename_columns, require_columns};
use crate::models::{Label, Region, RegionType};

pub const REGION_KEY: &str = "region_name";
pub const NAME: &str = "name";
pub const COMMON_NAME: &str = "common_name";
pub const ALIGN_KEYS: [&str; 3] = ["chrom", "start", "end"];

/// Columns kept for the per-sample entropy table.
pub const ENTROPY_COLUMNS: [&str; 5] = ["chrom", "start", "end", "mean_entropy", "mean_num_reads"];
/// Columns kept for the per-sample DMR table.
pub const DMR_COLUMNS: [&str; 4] = [REGION_KEY, "mean_entropy", "dmr_length", "effect_size"];

const MODKIT_STATE: &str = "state-name";
const MODKIT_DIFFERENT: &str = "different";

/// Adds a `region_name` column formatted as `{chrom}:{start}-{end}`.
///
/// Coordinates may arrive as floats (`100.0`); they are truncated toward zero
/// before formatting.
pub fn build_region_key(
    table: &DataFrame,
    chrom_col: &str,
    start_col: &str,
    end_col: &str,
) -> Result<DataFrame> {
    let column = |name: &str| {
        table.column(name).map_err(|_| {
            MethCompareError::MalformedRegion(format!("coordinate column '{name}' is missing"))
        })
    };

    let chrom = column(chrom_col)?.cast(&DataType::String)?;
    let chrom = chrom.str()?;
    let start = column(start_col)?.cast(&DataType::Float64)?;
    let start = start.f64()?;
    let end = column(end_col)?.cast(&DataType::Float64)?;
    let end = end.f64()?;

    let keys = chrom
        .into_iter()
        .zip(start.into_iter())
        .zip(end.into_iter())
        .enumerate()
        .map(|(row, ((c, s), e))| match (c, s, e) {
            (Some(c), Some(s), Some(e)) if s.is_finite() && e.is_finite() => {
                // keys are not validated here, two rows with one key are one interval
                let region = Region {
                    chrom: c.to_string(),
                    start: s.trunc() as i64,
                    end: e.trunc() as i64,
                };
                Ok(region.key())
            }
            _ => Err(MethCompareError::MalformedRegion(format!(
                "row {row} has a missing or non-numeric coordinate"
            ))),
        })
        .collect::<Result<Vec<String>>>()?;

    let mut keyed = table.clone();
    keyed.with_column(Series::new(PlSmallStr::from(REGION_KEY), keys))?;
    Ok(keyed)
}

/// Inner join on the region key. Keys found on only one side are dropped,
/// duplicated keys produce every pairing.
pub fn join_entropy_to_regions(entropy_table: &DataFrame, region_table: &DataFrame) -> Result<DataFrame> {
    require_columns(entropy_table, "entropy table", &[REGION_KEY])?;
    require_columns(region_table, "region table", &[REGION_KEY])?;

    let joined = entropy_table.inner_join(region_table, [REGION_KEY], [REGION_KEY])?;
    debug!(
        "Joined {} entropy rows with {} region rows -> {} rows",
        entropy_table.height(),
        region_table.height(),
        joined.height()
    );
    Ok(joined)
}

pub fn filter_significant(joined_table: &DataFrame, predicate_col: &str, predicate_value: &str) -> Result<DataFrame> {
    require_columns(joined_table, "joined table", &[predicate_col])?;

    let subset = joined_table
        .clone()
        .lazy()
        .filter(col(predicate_col).eq(lit(predicate_value)))
        .collect()?;
    debug!(
        "Kept {} of {} rows where {} == {}",
        subset.height(),
        joined_table.height(),
        predicate_col,
        predicate_value
    );
    Ok(subset)
}

/// Projects to `columns` and prepends a `name` column filled with `label`.
pub fn tag_and_select(table: &DataFrame, label: &str, columns: &[&str]) -> Result<DataFrame> {
    require_columns(table, label, columns)?;

    let projected: Vec<&str> = columns.iter().copied().filter(|c| *c != NAME).collect();
    let mut labeled = table.select(projected)?;
    let tag = Series::new(PlSmallStr::from(NAME), vec![label; labeled.height()]);
    labeled.insert_column(0, tag)?;
    Ok(labeled)
}

/// Stacks labeled tables in order. Columns missing from a table are null-filled.
pub fn concat_labeled(tables: &[DataFrame]) -> Result<DataFrame> {
    if tables.is_empty() {
        return Ok(DataFrame::empty());
    }

    let frames: Vec<LazyFrame> = tables.iter().map(|t| t.clone().lazy()).collect();
    let combined = concat_lf_diagonal(
        frames,
        UnionArgs {
            to_supertypes: true,
            ..Default::default()
        },
    )?
    .collect()?;
    Ok(combined)
}

/// Strips the sample-1 token from `name_x` so both samples share a group key.
pub struct CommonNameRewriter {
    sample_prefix: Regex,
}

impl CommonNameRewriter {
    pub fn new(sample_name: &str) -> Result<Self> {
        let sample_prefix = Regex::new(&format!(r"{}\s", regex::escape(sample_name)))?;
        Ok(Self { sample_prefix })
    }

    /// Leaves the name untouched when the sample token is absent.
    pub fn rewrite(&self, name: &str) -> String {
        self.sample_prefix
            .replacen(name, 1, "")
            .replacen("genomic windows", "Genomic windows", 1)
    }
}

fn suffix_non_keys(table: &DataFrame, keys: &[&str], suffix: &str) -> Result<DataFrame> {
    let mut renamed = table.clone();
    for column in table.get_column_names_owned() {
        if !keys.contains(&column.as_str()) {
            renamed.rename(column.as_str(), PlSmallStr::from(format!("{column}{suffix}")))?;
        }
    }
    Ok(renamed)
}

/// Joins two per-sample tables on raw coordinates. Every other column comes
/// out twice, `_x` for sample 1 and `_y` for sample 2, and a `common_name`
/// group key is derived from `name_x`.
pub fn pairwise_align(sample1_combined: &DataFrame, sample2_combined: &DataFrame, sample_name_1: &str) -> Result<DataFrame> {
    require_columns(sample1_combined, "sample 1 table", &ALIGN_KEYS)?;
    require_columns(sample1_combined, "sample 1 table", &[NAME])?;
    require_columns(sample2_combined, "sample 2 table", &ALIGN_KEYS)?;

    let left = suffix_non_keys(sample1_combined, &ALIGN_KEYS, "_x")?;
    let right = suffix_non_keys(sample2_combined, &ALIGN_KEYS, "_y")?;
    let mut aligned = left.inner_join(&right, ALIGN_KEYS, ALIGN_KEYS)?;

    let rewriter = CommonNameRewriter::new(sample_name_1)?;
    let common: Vec<Option<String>> = aligned
        .column("name_x")?
        .str()?
        .into_iter()
        .map(|name| name.map(|n| rewriter.rewrite(n)))
        .collect();
    aligned.with_column(Series::new(PlSmallStr::from(COMMON_NAME), common))?;

    info!(
        "Aligned {} sample 1 rows with {} sample 2 rows -> {} shared regions",
        sample1_combined.height(),
        sample2_combined.height(),
        aligned.height()
    );
    Ok(aligned)
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-sample assembly
// ─────────────────────────────────────────────────────────────────────────────

/// Entropy inputs for one sample, as produced by the loaders.
pub struct SampleEntropy {
    pub bulk: DataFrame,
    pub modkit_dmr: DataFrame,
    pub dss_unsmoothed: DataFrame,
    pub dss_smoothed: DataFrame,
}

/// DMR calls shared by both samples, with region keys attached.
pub struct DmrCalls {
    pub modkit_segments: DataFrame,
    pub dss_unsmoothed: DataFrame,
    pub dss_smoothed: DataFrame,
}

impl DmrCalls {
    pub fn keyed(modkit_segments: DataFrame, dss_unsmoothed: DataFrame, dss_smoothed: DataFrame) -> Result<Self> {
        Ok(Self {
            modkit_segments: build_region_key(&modkit_segments, "chrom", "start", "end")?,
            dss_unsmoothed: build_region_key(&dss_unsmoothed, "chrom", "start", "end")?,
            dss_smoothed: build_region_key(&dss_smoothed, "chrom", "start", "end")?,
        })
    }
}

/// Long-form labeled tables for one sample.
pub struct SampleTables {
    /// Bulk windows plus every DMR type: `ENTROPY_COLUMNS`.
    pub entropy: DataFrame,
    /// DMRs only, with effect size and length: `DMR_COLUMNS`.
    pub dmr: DataFrame,
}

fn normalize_dmr_measures(df: DataFrame) -> Result<DataFrame> {
    let df = rename_columns(
        df,
        &[("N-sites", "dmr_length"), ("length", "dmr_length"), ("diff.Methy", "effect_size")],
    )?;
    cast_columns(
        df,
        &[
            ("dmr_length", DataType::Int64),
            ("effect_size", DataType::Float64),
            ("mean_entropy", DataType::Float64),
            ("mean_num_reads", DataType::Float64),
        ],
    )
}

pub fn assemble_sample(sample: &str, entropy: &SampleEntropy, calls: &DmrCalls) -> Result<SampleTables> {
    info!("Assembling labeled tables for sample {}", sample);

    let modkit = filter_significant(
        &join_entropy_to_regions(&entropy.modkit_dmr, &calls.modkit_segments)?,
        MODKIT_STATE,
        MODKIT_DIFFERENT,
    )?;
    let dss_unsmoothed = join_entropy_to_regions(&entropy.dss_unsmoothed, &calls.dss_unsmoothed)?;
    let dss_smoothed = join_entropy_to_regions(&entropy.dss_smoothed, &calls.dss_smoothed)?;

    let joined: Vec<(RegionType, DataFrame)> = vec![
        (RegionType::ModkitDmrSegments, normalize_dmr_measures(modkit)?),
        (RegionType::DssUnsmoothedDmrs, normalize_dmr_measures(dss_unsmoothed)?),
        (RegionType::DssSmoothedDmrs, normalize_dmr_measures(dss_smoothed)?),
    ];

    let mut dmr_tables = Vec::with_capacity(joined.len());
    for (region_type, df) in &joined {
        let label = Label::new(sample, *region_type).to_string();
        debug!("{}: {} DMRs with entropy", label, df.height());
        dmr_tables.push(tag_and_select(df, &label, &DMR_COLUMNS)?);
    }

    let bulk = cast_columns(
        rename_columns(
            entropy.bulk.clone(),
            &[("entropy", "mean_entropy"), ("num_reads", "mean_num_reads")],
        )?,
        &[("mean_entropy", DataType::Float64), ("mean_num_reads", DataType::Float64)],
    )?;
    let mut entropy_tables = vec![tag_and_select(
        &bulk,
        &Label::new(sample, RegionType::GenomicWindows).to_string(),
        &ENTROPY_COLUMNS,
    )?];
    for (region_type, df) in &joined {
        let label = Label::new(sample, *region_type).to_string();
        entropy_tables.push(tag_and_select(df, &label, &ENTROPY_COLUMNS)?);
    }

    let tables = SampleTables {
        entropy: concat_labeled(&entropy_tables)?,
        dmr: concat_labeled(&dmr_tables)?,
    };
    info!(
        "Sample {}: {} entropy rows, {} DMR rows",
        sample,
        tables.entropy.height(),
        tables.dmr.height()
    );
    Ok(tables)
}
