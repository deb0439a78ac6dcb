mod args;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;

use args::Args;

fn main() {
    if let Err(err) = run(Args::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let verbosity = args.verbose;
    let config = args.into_config()?;
    logging::init(verbosity)?;

    let report = h5db_core::build(&config)
        .with_context(|| format!("Failed to build dataset from {}", config.input.display()))?;

    tracing::info!(
        "Wrote {} samples ({} skipped) to {}",
        report.n_samples,
        report.skipped.len(),
        report.output.display()
    );
    if let Some(folds) = &report.folds {
        tracing::info!("Fold blocks: {}", folds.len());
    }
    if config.write_report {
        tracing::info!("Report: {}", config.report_path().display());
    }

    Ok(())
}
