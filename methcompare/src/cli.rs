use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing_subscriber::EnvFilter;

use crate::analysis::entropy_comparison::{
    EntropyComparisonConfig, SampleInputs, DEFAULT_READ_COUNT_CUTOFF, DEFAULT_TITLE as ENTROPY_TITLE,
};
use crate::analysis::sample_probs::{SampleProbsConfig, DEFAULT_TITLE as SAMPLE_PROBS_TITLE};
use crate::plots::PlotStyle;

/// Compares methylation entropy between two nanopore samples over genomic
/// windows and DMRs called by modkit and DSS.
#[derive(Parser, Debug)]
#[command(name = "entropy-comparison", version, about, long_about = None)]
pub struct EntropyComparisonArgs {
    /// Name of the first sample, used in plot labels and file names.
    #[arg(long = "sample_name_1")]
    pub sample_name_1: String,

    #[arg(long = "sample_name_2")]
    pub sample_name_2: String,

    /// Bulk `modkit entropy` output for sample 1 (no header).
    #[arg(long = "sample_1_bulk_entropy")]
    pub sample_1_bulk_entropy: PathBuf,

    #[arg(long = "sample_2_bulk_entropy")]
    pub sample_2_bulk_entropy: PathBuf,

    /// `modkit entropy --regions` output over modkit DMR segments, sample 1.
    #[arg(long = "sample_1_modkit_dmr_entropy")]
    pub sample_1_modkit_dmr_entropy: PathBuf,

    #[arg(long = "sample_2_modkit_dmr_entropy")]
    pub sample_2_modkit_dmr_entropy: PathBuf,

    #[arg(long = "sample_1_dss_unsmoothed_dmr_entropy")]
    pub sample_1_dss_unsmoothed_dmr_entropy: PathBuf,

    #[arg(long = "sample_2_dss_unsmoothed_dmr_entropy")]
    pub sample_2_dss_unsmoothed_dmr_entropy: PathBuf,

    #[arg(long = "sample_1_dss_smoothed_dmr_entropy")]
    pub sample_1_dss_smoothed_dmr_entropy: PathBuf,

    #[arg(long = "sample_2_dss_smoothed_dmr_entropy")]
    pub sample_2_dss_smoothed_dmr_entropy: PathBuf,

    /// `modkit dmr pair --segment` output (no header).
    #[arg(long = "modkit_dmr_segments")]
    pub modkit_dmr_segments: PathBuf,

    /// DSS `callDMR` output without smoothing (with header).
    #[arg(long = "dss_unsmoothed_dmrs")]
    pub dss_unsmoothed_dmrs: PathBuf,

    /// DSS `callDMR` output with smoothing (with header).
    #[arg(long = "dss_smoothed_dmrs")]
    pub dss_smoothed_dmrs: PathBuf,

    /// Prefix for every output file, may include a directory.
    #[arg(long = "output_prefix")]
    pub output_prefix: String,

    #[arg(long = "plot_title", default_value = ENTROPY_TITLE)]
    pub plot_title: String,

    /// Upper x bound of the read-count scatterplots.
    #[arg(long = "read_count_cutoff", default_value_t = DEFAULT_READ_COUNT_CUTOFF)]
    pub read_count_cutoff: f64,

    /// Also write the labeled and aligned tables as TSV.
    #[arg(long = "export-tables", default_value_t = false)]
    pub export_tables: bool,

    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl From<&EntropyComparisonArgs> for EntropyComparisonConfig {
    fn from(args: &EntropyComparisonArgs) -> Self {
        Self {
            sample_1: SampleInputs {
                name: args.sample_name_1.clone(),
                bulk_entropy: args.sample_1_bulk_entropy.clone(),
                modkit_dmr_entropy: args.sample_1_modkit_dmr_entropy.clone(),
                dss_unsmoothed_dmr_entropy: args.sample_1_dss_unsmoothed_dmr_entropy.clone(),
                dss_smoothed_dmr_entropy: args.sample_1_dss_smoothed_dmr_entropy.clone(),
            },
            sample_2: SampleInputs {
                name: args.sample_name_2.clone(),
                bulk_entropy: args.sample_2_bulk_entropy.clone(),
                modkit_dmr_entropy: args.sample_2_modkit_dmr_entropy.clone(),
                dss_unsmoothed_dmr_entropy: args.sample_2_dss_unsmoothed_dmr_entropy.clone(),
                dss_smoothed_dmr_entropy: args.sample_2_dss_smoothed_dmr_entropy.clone(),
            },
            modkit_dmr_segments: args.modkit_dmr_segments.clone(),
            dss_unsmoothed_dmrs: args.dss_unsmoothed_dmrs.clone(),
            dss_smoothed_dmrs: args.dss_smoothed_dmrs.clone(),
            output_prefix: args.output_prefix.clone(),
            plot_title: args.plot_title.clone(),
            read_count_cutoff: args.read_count_cutoff,
            export_tables: args.export_tables,
            style: PlotStyle::default(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentVariable {
    Counts,
    Fractions,
}

/// Plots methylation-likelihood distributions from one or more
/// `modkit sample-probs` runs, one line plot per base/modification.
#[derive(Parser, Debug)]
#[command(name = "sample-probs-comparison", version, about, long_about = None)]
pub struct SampleProbsArgs {
    /// `probabilities.tsv` files written by `modkit sample-probs --hist`.
    #[arg(long = "input", num_args = 1.., required = true)]
    pub input: Vec<PathBuf>,

    /// One name per input, in the same order.
    #[arg(long = "names", num_args = 1..)]
    pub names: Vec<String>,

    #[arg(long = "output_prefix")]
    pub output_prefix: String,

    #[arg(long = "plot_title", default_value = SAMPLE_PROBS_TITLE)]
    pub plot_title: String,

    #[arg(long = "dependent_variable", value_enum, default_value_t = DependentVariable::Counts)]
    pub dependent_variable: DependentVariable,

    /// Lower x bound; defaults to the data.
    #[arg(long = "min_ml")]
    pub min_ml: Option<f64>,

    #[arg(long = "max_ml")]
    pub max_ml: Option<f64>,

    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl From<&SampleProbsArgs> for SampleProbsConfig {
    fn from(args: &SampleProbsArgs) -> Self {
        Self {
            inputs: args.input.clone(),
            names: args.names.clone(),
            output_prefix: args.output_prefix.clone(),
            plot_title: args.plot_title.clone(),
            dependent_variable: args.dependent_variable,
            min_ml: args.min_ml,
            max_ml: args.max_ml,
            style: PlotStyle::default(),
        }
    }
}

/// `RUST_LOG` wins when set, otherwise the `-v`/`-q` level applies.
pub fn init_logging(verbose: &Verbosity<InfoLevel>) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(verbose.log_level_filter().to_string().to_lowercase()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entropy_argv() -> Vec<String> {
        let mut argv = vec!["entropy-comparison".to_string()];
        for (flag, value) in [
            ("--sample_name_1", "tumour"),
            ("--sample_name_2", "normal"),
            ("--sample_1_bulk_entropy", "t_bulk.bed"),
            ("--sample_2_bulk_entropy", "n_bulk.bed"),
            ("--sample_1_modkit_dmr_entropy", "t_modkit.bed"),
            ("--sample_2_modkit_dmr_entropy", "n_modkit.bed"),
            ("--sample_1_dss_unsmoothed_dmr_entropy", "t_dss_u.bed"),
            ("--sample_2_dss_unsmoothed_dmr_entropy", "n_dss_u.bed"),
            ("--sample_1_dss_smoothed_dmr_entropy", "t_dss_s.bed"),
            ("--sample_2_dss_smoothed_dmr_entropy", "n_dss_s.bed"),
            ("--modkit_dmr_segments", "segments.bed"),
            ("--dss_unsmoothed_dmrs", "dss_u.tsv"),
            ("--dss_smoothed_dmrs", "dss_s.tsv"),
            ("--output_prefix", "out/run"),
        ] {
            argv.push(flag.to_string());
            argv.push(value.to_string());
        }
        argv
    }

    #[test]
    fn entropy_args_apply_defaults() {
        let args = EntropyComparisonArgs::try_parse_from(entropy_argv()).unwrap();
        assert_eq!(args.plot_title, ENTROPY_TITLE);
        assert_eq!(args.read_count_cutoff, 500.0);
        assert!(!args.export_tables);

        let config = EntropyComparisonConfig::from(&args);
        assert_eq!(config.sample_2.name, "normal");
        assert_eq!(config.sample_1.dss_smoothed_dmr_entropy, PathBuf::from("t_dss_s.bed"));
    }

    #[test]
    fn entropy_args_require_every_input() {
        let mut argv = entropy_argv();
        argv.truncate(argv.len() - 2);
        assert!(EntropyComparisonArgs::try_parse_from(argv).is_err());
    }

    #[test]
    fn sample_probs_args_parse_lists_and_variable() {
        let args = SampleProbsArgs::try_parse_from([
            "sample-probs-comparison",
            "--input",
            "a.tsv",
            "b.tsv",
            "--names",
            "dorado",
            "guppy",
            "--output_prefix",
            "out/ml",
            "--dependent_variable",
            "fractions",
            "--max_ml",
            "0.9",
        ])
        .unwrap();
        assert_eq!(args.input.len(), 2);
        assert_eq!(args.names, vec!["dorado", "guppy"]);
        assert_eq!(args.dependent_variable, DependentVariable::Fractions);
        assert_eq!(args.min_ml, None);
        assert_eq!(args.max_ml, Some(0.9));
        assert_eq!(args.plot_title, SAMPLE_PROBS_TITLE);
    }

    #[test]
    fn sample_probs_requires_an_input() {
        assert!(SampleProbsArgs::try_parse_from(["sample-probs-comparison", "--output_prefix", "x"]).is_err());
    }
}
