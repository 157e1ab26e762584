//! Pairwise methylation entropy comparison between two samples.
//!
//! Each sample gets its labeled entropy and DMR tables (see
//! [`crate::pipeline::assemble_sample`]) drawn as dodged histograms and
//! scatterplots, then the two entropy tables are aligned on coordinates for a
//! sample-vs-sample scatterplot.

use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, info};

use crate::analysis::plot_data::{group_points, group_values};
use crate::data_handling::dss_dmr::DssDmrs;
use crate::data_handling::entropy::{BulkEntropy, RegionEntropy};
use crate::data_handling::modkit_dmr::ModkitDmrSegments;
use crate::errors::Result;
use crate::helper_functions::{output_path, write_tsv};
use crate::models::Dataset;
use crate::pipeline::{assemble_sample, pairwise_align, DmrCalls, SampleEntropy, SampleTables, COMMON_NAME, NAME};
use crate::plots::histogram::draw_histogram;
use crate::plots::scatter::draw_scatter;
use crate::plots::{ChartLabels, PlotStyle};

pub const DEFAULT_TITLE: &str = "ONT pairwise entropy comparison";
pub const DEFAULT_READ_COUNT_CUTOFF: f64 = 500.0;
const LEGEND_TITLE: &str = "Region type";

const REGION_ENTROPY: &str = "Methylation entropy per region";
const REGION_PROPORTION: &str = "Proportion of regions";
const READ_COUNT: &str = "Number of reads supporting entropy call";
const DMR_ENTROPY: &str = "Methylation entropy per DMR";
const DMR_CHANGE: &str = "Methylation change per DMR";
const DMR_LENGTH: &str = "DMR length (bp)";
const DMR_PROPORTION: &str = "Proportion of DMRs";

/// Per-sample entropy files.
#[derive(Debug, Clone)]
pub struct SampleInputs {
    pub name: String,
    pub bulk_entropy: PathBuf,
    pub modkit_dmr_entropy: PathBuf,
    pub dss_unsmoothed_dmr_entropy: PathBuf,
    pub dss_smoothed_dmr_entropy: PathBuf,
}

impl SampleInputs {
    pub fn load(&self) -> Result<SampleEntropy> {
        info!("Loading entropy tables for sample {}", self.name);
        Ok(SampleEntropy {
            bulk: BulkEntropy { path: self.bulk_entropy.clone() }.load()?,
            modkit_dmr: RegionEntropy { path: self.modkit_dmr_entropy.clone() }.load()?,
            dss_unsmoothed: RegionEntropy { path: self.dss_unsmoothed_dmr_entropy.clone() }.load()?,
            dss_smoothed: RegionEntropy { path: self.dss_smoothed_dmr_entropy.clone() }.load()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EntropyComparisonConfig {
    pub sample_1: SampleInputs,
    pub sample_2: SampleInputs,
    pub modkit_dmr_segments: PathBuf,
    pub dss_unsmoothed_dmrs: PathBuf,
    pub dss_smoothed_dmrs: PathBuf,
    pub output_prefix: String,
    pub plot_title: String,
    pub read_count_cutoff: f64,
    pub export_tables: bool,
    pub style: PlotStyle,
}

/// Labeled tables for both samples plus their coordinate alignment.
pub struct ComparisonTables {
    pub sample_1: SampleTables,
    pub sample_2: SampleTables,
    pub aligned: DataFrame,
}

/// Loads every input and builds the labeled per-sample tables and the
/// aligned table. No files are written.
pub fn build_comparison_tables(config: &EntropyComparisonConfig) -> Result<ComparisonTables> {
    let calls = DmrCalls::keyed(
        ModkitDmrSegments { path: config.modkit_dmr_segments.clone() }.load()?,
        DssDmrs { path: config.dss_unsmoothed_dmrs.clone() }.load()?,
        DssDmrs { path: config.dss_smoothed_dmrs.clone() }.load()?,
    )?;

    let sample_1 = assemble_sample(&config.sample_1.name, &config.sample_1.load()?, &calls)?;
    let sample_2 = assemble_sample(&config.sample_2.name, &config.sample_2.load()?, &calls)?;
    let aligned = pairwise_align(&sample_1.entropy, &sample_2.entropy, &config.sample_1.name)?;

    Ok(ComparisonTables {
        sample_1,
        sample_2,
        aligned,
    })
}

fn plot_sample(sample: &str, tables: &SampleTables, config: &EntropyComparisonConfig) -> Result<Vec<PathBuf>> {
    let title = config.plot_title.as_str();
    let style = &config.style;
    let path = |kind: &str| output_path(&config.output_prefix, &[sample, kind], "png");
    let mut written = Vec::new();

    let out = path("per_sample_entropy_distribution_histogram");
    if draw_histogram(
        &out,
        &group_values(&tables.entropy, NAME, "mean_entropy")?,
        &ChartLabels::new(title, REGION_ENTROPY, REGION_PROPORTION, LEGEND_TITLE),
        style,
    )? {
        written.push(out);
    }

    let out = path("per_sample_entropy_read_count_scatterplot");
    if draw_scatter(
        &out,
        &group_points(&tables.entropy, NAME, "mean_num_reads", "mean_entropy")?,
        &ChartLabels::new(title, READ_COUNT, REGION_ENTROPY, LEGEND_TITLE),
        style,
        Some((0.0, config.read_count_cutoff)),
    )? {
        written.push(out);
    }

    let dmr_scatters = [
        ("per_sample_entropy_methylation_changes_scatterplot", "mean_entropy", "effect_size", DMR_ENTROPY, DMR_CHANGE),
        ("per_sample_entropy_DMR_length_scatterplot", "dmr_length", "mean_entropy", DMR_LENGTH, DMR_ENTROPY),
        ("per_sample_DMR_change_DMR_length_scatterplot", "dmr_length", "effect_size", DMR_LENGTH, DMR_CHANGE),
    ];
    for (kind, x_col, y_col, x_desc, y_desc) in dmr_scatters {
        let out = path(kind);
        if draw_scatter(
            &out,
            &group_points(&tables.dmr, NAME, x_col, y_col)?,
            &ChartLabels::new(title, x_desc, y_desc, LEGEND_TITLE),
            style,
            None,
        )? {
            written.push(out);
        }
    }

    let dmr_histograms = [
        ("per_sample_DMR_length_distribution_histogram", "dmr_length", DMR_LENGTH),
        ("per_sample_DMR_change_distribution_histogram", "effect_size", DMR_CHANGE),
    ];
    for (kind, value_col, x_desc) in dmr_histograms {
        let out = path(kind);
        if draw_histogram(
            &out,
            &group_values(&tables.dmr, NAME, value_col)?,
            &ChartLabels::new(title, x_desc, DMR_PROPORTION, LEGEND_TITLE),
            style,
        )? {
            written.push(out);
        }
    }

    debug!("Sample {}: {} plots", sample, written.len());
    Ok(written)
}

pub fn export_comparison_tables(tables: &mut ComparisonTables, config: &EntropyComparisonConfig) -> Result<Vec<PathBuf>> {
    let prefix = config.output_prefix.as_str();
    let s1 = config.sample_1.name.as_str();
    let s2 = config.sample_2.name.as_str();
    let pair = format!("{s1}_v_{s2}");

    let targets = [
        (output_path(prefix, &[s1, "entropy_table"], "tsv"), &mut tables.sample_1.entropy),
        (output_path(prefix, &[s1, "DMR_table"], "tsv"), &mut tables.sample_1.dmr),
        (output_path(prefix, &[s2, "entropy_table"], "tsv"), &mut tables.sample_2.entropy),
        (output_path(prefix, &[s2, "DMR_table"], "tsv"), &mut tables.sample_2.dmr),
        (output_path(prefix, &[&pair, "aligned_table"], "tsv"), &mut tables.aligned),
    ];

    let mut written = Vec::with_capacity(targets.len());
    for (path, df) in targets {
        write_tsv(df, &path)?;
        written.push(path);
    }
    Ok(written)
}

/// Runs the full comparison and returns the paths of every file written.
/// Plots without any data are skipped and left out of the list.
pub fn run_entropy_comparison(config: &EntropyComparisonConfig) -> Result<Vec<PathBuf>> {
    info!(
        "Comparing methylation entropy of {} and {}",
        config.sample_1.name, config.sample_2.name
    );
    let mut tables = build_comparison_tables(config)?;

    let mut written = plot_sample(&config.sample_1.name, &tables.sample_1, config)?;
    written.extend(plot_sample(&config.sample_2.name, &tables.sample_2, config)?);

    let s1 = config.sample_1.name.as_str();
    let s2 = config.sample_2.name.as_str();
    let pair = format!("{s1}_v_{s2}");
    let out = output_path(&config.output_prefix, &[&pair, "pairwise_entropy_scatterplot"], "png");
    let drawn = draw_scatter(
        &out,
        &group_points(&tables.aligned, COMMON_NAME, "mean_entropy_x", "mean_entropy_y")?,
        &ChartLabels::new(
            &config.plot_title,
            &format!("{s1} methylation entropy per region"),
            &format!("{s2} methylation entropy per region"),
            LEGEND_TITLE,
        ),
        &config.style,
        None,
    )?;
    if drawn {
        written.push(out);
    }

    if config.export_tables {
        written.extend(export_comparison_tables(&mut tables, config)?);
    }

    info!("Entropy comparison finished, {} files", written.len());
    Ok(written)
}
