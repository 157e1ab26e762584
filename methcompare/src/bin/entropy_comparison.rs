use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use methcompare::analysis::entropy_comparison::{run_entropy_comparison, EntropyComparisonConfig};
use methcompare::cli::{init_logging, EntropyComparisonArgs};

fn run(args: &EntropyComparisonArgs) -> Result<()> {
    let config = EntropyComparisonConfig::from(args);
    let written = run_entropy_comparison(&config).with_context(|| {
        format!(
            "entropy comparison of {} and {} failed",
            args.sample_name_1, args.sample_name_2
        )
    })?;
    info!("Wrote {} files with prefix {}", written.len(), args.output_prefix);
    Ok(())
}

fn main() {
    let args = EntropyComparisonArgs::parse();
    init_logging(&args.verbose);

    if let Err(e) = run(&args) {
        error!("{e:#}");
        std::process::exit(1);
    }
}
