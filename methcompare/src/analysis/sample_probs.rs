//! Methylation-likelihood line plots from `modkit sample-probs` tables.

use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, info};

use crate::analysis::plot_data::group_points;
use crate::cli::DependentVariable;
use crate::data_handling::sample_probs::{SampleProbs, SAMPLE_PROBS_COLUMNS};
use crate::errors::{MethCompareError, Result};
use crate::helper_functions::output_path;
use crate::models::Dataset;
use crate::pipeline::{concat_labeled, tag_and_select, NAME};
use crate::plots::lineplot::draw_lineplot;
use crate::plots::{ChartLabels, PlotStyle};

pub const DEFAULT_TITLE: &str = "Modkit sample-probs ML benchmark";
const LEGEND_TITLE: &str = "Input";

impl DependentVariable {
    pub fn column(&self) -> &'static str {
        match self {
            DependentVariable::Counts => "count",
            DependentVariable::Fractions => "frac",
        }
    }

    pub fn axis_label(&self) -> &'static str {
        match self {
            DependentVariable::Counts => "Counts",
            DependentVariable::Fractions => "Fractions",
        }
    }

    /// Counts span orders of magnitude and are drawn on a log axis.
    pub fn log_scale(&self) -> bool {
        matches!(self, DependentVariable::Counts)
    }
}

#[derive(Debug, Clone)]
pub struct SampleProbsConfig {
    pub inputs: Vec<PathBuf>,
    pub names: Vec<String>,
    pub output_prefix: String,
    pub plot_title: String,
    pub dependent_variable: DependentVariable,
    pub min_ml: Option<f64>,
    pub max_ml: Option<f64>,
    pub style: PlotStyle,
}

/// A `(code, primary_base)` pair found in the inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseModCombo {
    pub code: String,
    pub primary_base: String,
    pub label: String,
}

pub fn label_for(code: &str, primary_base: &str) -> String {
    match (code, primary_base) {
        ("-", "A") => "A".to_string(),
        ("a", "A") => "6mA".to_string(),
        ("-", "C") => "C".to_string(),
        ("h", "C") => "5hmC".to_string(),
        ("m", "C") => "5mC".to_string(),
        _ => format!("{primary_base}:{code}"),
    }
}

/// Pairs each input with its display name. Without explicit names a single
/// input is named after its file stem.
pub fn resolve_names(inputs: &[PathBuf], names: &[String]) -> Result<Vec<String>> {
    if inputs.is_empty() {
        return Err(MethCompareError::MissingInput("no probability tables given".to_string()));
    }
    if names.is_empty() {
        if let [single] = inputs {
            let stem = single
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| single.display().to_string());
            return Ok(vec![stem]);
        }
        return Err(MethCompareError::CountMismatch(format!(
            "{} inputs given but no names; pass one name per input",
            inputs.len()
        )));
    }
    if names.len() != inputs.len() {
        return Err(MethCompareError::CountMismatch(format!(
            "{} inputs but {} names",
            inputs.len(),
            names.len()
        )));
    }
    Ok(names.to_vec())
}

/// Loads every table, tags it with its name and stacks them.
pub fn load_probabilities(inputs: &[PathBuf], names: &[String]) -> Result<DataFrame> {
    let mut tables = Vec::with_capacity(inputs.len());
    for (path, name) in inputs.iter().zip(names) {
        let df = SampleProbs { path: path.clone() }.load()?;
        tables.push(tag_and_select(&df, name, &SAMPLE_PROBS_COLUMNS)?);
    }
    concat_labeled(&tables)
}

/// Unique `(code, primary_base)` pairs in order of first appearance.
pub fn base_mod_combos(df: &DataFrame) -> Result<Vec<BaseModCombo>> {
    let codes = df.column("code")?.str()?;
    let bases = df.column("primary_base")?.str()?;

    let mut combos: Vec<BaseModCombo> = Vec::new();
    for (code, base) in codes.into_iter().zip(bases.into_iter()) {
        let (Some(code), Some(base)) = (code, base) else {
            continue;
        };
        if !combos.iter().any(|c| c.code == code && c.primary_base == base) {
            combos.push(BaseModCombo {
                code: code.to_string(),
                primary_base: base.to_string(),
                label: label_for(code, base),
            });
        }
    }
    Ok(combos)
}

fn combo_rows(df: &DataFrame, combo: &BaseModCombo) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .filter(
            col("code")
                .eq(lit(combo.code.clone()))
                .and(col("primary_base").eq(lit(combo.primary_base.clone()))),
        )
        .collect()?)
}

fn plot_path(prefix: &str, label: &str) -> PathBuf {
    let file_label = label.replace(['/', ':'], "_");
    output_path(prefix, &[&file_label, "ML_lineplot"], "png")
}

/// Draws one line plot per base/modification combo and returns the paths
/// written. Combos with nothing to draw are skipped.
pub fn run_sample_probs_comparison(config: &SampleProbsConfig) -> Result<Vec<PathBuf>> {
    let names = resolve_names(&config.inputs, &config.names)?;
    info!("Comparing sample-probs of {}", names.join(", "));

    let combined = load_probabilities(&config.inputs, &names)?;
    let combos = base_mod_combos(&combined)?;
    info!("Found {} base/modification combinations", combos.len());

    let variable = config.dependent_variable;
    let mut written = Vec::with_capacity(combos.len());
    for combo in &combos {
        let rows = combo_rows(&combined, combo)?;
        debug!("{}: {} probability bins", combo.label, rows.height());
        let groups = group_points(&rows, NAME, "range_start", variable.column())?;

        let out = plot_path(&config.output_prefix, &combo.label);
        let drawn = draw_lineplot(
            &out,
            &groups,
            &ChartLabels::new(
                &config.plot_title,
                &format!("{} methylation likelihood", combo.label),
                variable.axis_label(),
                LEGEND_TITLE,
            ),
            &config.style,
            (config.min_ml, config.max_ml),
            variable.log_scale(),
        )?;
        if drawn {
            written.push(out);
        }
    }
    Ok(written)
}
