//! openmedia-minify CLI
//!
//! Minify a folder of OpenMedia exports and archive the results.

use anyhow::{Context, Result};
use clap::Parser;
use openmedia_minify::{Minifier, MinifyConfig, MissingDatePolicy, WeekPolicy};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "openmedia-minify")]
#[command(version)]
#[command(about = "Minify OpenMedia as-run exports and pack them into weekly archives")]
struct Cli {
    /// The input directory
    #[arg(short = 'i', long, env = "OPENMEDIA_MINIFY_INPUT")]
    input: PathBuf,

    /// The output directory
    #[arg(short = 'o', long, env = "OPENMEDIA_MINIFY_OUTPUT")]
    output: PathBuf,

    /// Parent directory of the scratch workspace (default: system temp dir)
    #[arg(long)]
    workspace_root: Option<PathBuf>,

    /// Only process files whose name contains this marker
    #[arg(long, default_value = "RD")]
    marker: String,

    /// How to pick the week naming the archives: most-common or uniform
    #[arg(long, default_value_t = WeekPolicy::MostCommon)]
    week_policy: WeekPolicy,

    /// Name files without a date field from a zero date instead of failing them
    #[arg(long)]
    allow_missing_date: bool,

    /// Number of files processed in parallel
    #[arg(short = 'j', long, default_value_t = 1)]
    jobs: usize,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();
    tracing::info!("openmedia-minify version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = MinifyConfig::new(&cli.input, &cli.output)
        .with_name_marker(cli.marker)
        .with_week_policy(cli.week_policy)
        .with_jobs(cli.jobs);
    if let Some(root) = cli.workspace_root {
        config = config.with_workspace_root(root);
    }
    if cli.allow_missing_date {
        config = config.with_missing_date(MissingDatePolicy::Degrade);
    }

    let report = Minifier::new(config)
        .run()
        .with_context(|| format!("Error processing folder {}", cli.input.display()))?;

    println!(
        "{} {}",
        report.minified_archive.display(),
        report.original_archive.display()
    );

    Ok(())
}
