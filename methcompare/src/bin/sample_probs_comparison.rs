use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use methcompare::analysis::sample_probs::{run_sample_probs_comparison, SampleProbsConfig};
use methcompare::cli::{init_logging, SampleProbsArgs};

fn run(args: &SampleProbsArgs) -> Result<()> {
    let config = SampleProbsConfig::from(args);
    let written = run_sample_probs_comparison(&config).context("sample-probs comparison failed")?;
    info!("Wrote {} line plots with prefix {}", written.len(), args.output_prefix);
    Ok(())
}

fn main() {
    let args = SampleProbsArgs::parse();
    init_logging(&args.verbose);

    if let Err(e) = run(&args) {
        error!("{e:#}");
        std::process::exit(1);
    }
}
