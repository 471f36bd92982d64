//! wordcount - count word occurrences across text files
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use wordcount_pipeline::config::{CliArgs, PipelineConfig};
use wordcount_pipeline::report::{format_metrics, format_summary, format_table};
use wordcount_pipeline::PipelineBuilder;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = PipelineConfig::from_args(&args).context("Invalid configuration")?;
    let pipeline = PipelineBuilder::new()
        .config(config)
        .build()
        .context("Failed to build pipeline")?;

    println!("Calculating each word occurrence count..");
    let start = Instant::now();
    let outcome = pipeline.run(args.files.as_slice()).context("Word count failed")?;

    if args.print {
        print!("{}", format_table(&outcome.counts));
    }
    println!("{}", format_summary(&outcome.counts, start.elapsed()));
    if args.verbose {
        println!("{}", format_metrics(&outcome.metrics));
    }

    let failed = outcome.metrics.failed_files();
    if failed > 0 {
        warn!(files = failed, "Some files could not be fully counted");
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("wordcount_pipeline=debug,warn")
    } else {
        EnvFilter::new("wordcount_pipeline=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(verbose)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
