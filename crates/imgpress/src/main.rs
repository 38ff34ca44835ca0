//! imgpress CLI - batch image compression driving external tools.
//!
//! Discovers images under the given inputs, runs each through the
//! per-format tool chain (optipng/pngquant, jpegoptim, gifsicle) plus an
//! optional resize, and writes the results either in place or into an
//! output directory.
//!
//! # Usage
//!
//! ```bash
//! # Compress files in place, losslessly where possible
//! imgpress icon.png photo.jpg
//!
//! # Recurse a directory into an output tree, with lossy strength 30
//! imgpress ./images --output ./compressed --lossy 30
//!
//! # Constrain the longest edge to 800px on the way through
//! imgpress ./images --size 800x800
//! ```

use clap::Parser;
use imgpress_core::{BatchOptions, Config, InputSource, Optimizer, SizeSpec};
use std::path::PathBuf;
use std::sync::Arc;

mod logging;
mod report;

use report::ConsoleReporter;

/// Batch image compression via external tools.
#[derive(Parser, Debug)]
#[command(name = "imgpress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files to process, or a single directory to recurse
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (omit to overwrite files in place)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Lossy compression strength, 0-100; bare flag means 20
    #[arg(short, long, num_args = 0..=1, default_missing_value = "20")]
    lossy: Option<u32>,

    /// Resize constraint: WIDTH, xHEIGHT or WIDTHxHEIGHT (never upscales)
    #[arg(short, long)]
    size: Option<String>,

    /// Glob rules a file must match (defaults to *.jpeg *.jpg *.png *.gif)
    #[arg(short = 'm', long = "match")]
    match_rules: Vec<String>,

    /// Overwrite in place without keeping an old-<name> backup
    #[arg(short, long)]
    force: bool,

    /// Print the per-file records as JSON on stdout when done
    #[arg(long)]
    json_report: bool,

    /// Suppress per-file console output
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Failed to load config: {e}\n  Using default configuration.");
            Config::default()
        }
    };
    logging::init(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("imgpress v{}", imgpress_core::VERSION);

    let options = build_options(&cli, &config)?;
    let reporter = Arc::new(ConsoleReporter::new(
        cli.quiet,
        cli.force,
        options.size.is_some(),
    ));
    let optimizer = Optimizer::new(config, options);
    optimizer.run(reporter.clone()).await?;

    if cli.json_report {
        let records = reporter.take_records();
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    Ok(())
}

/// Turn CLI arguments into batch options.
///
/// A single directory input selects tree mode (output paths mirror the
/// input structure); anything else is treated as a flat file list. The
/// decision happens here, once, and never again downstream.
fn build_options(cli: &Cli, config: &Config) -> anyhow::Result<BatchOptions> {
    let input = match cli.inputs.as_slice() {
        [single] if single.is_dir() => InputSource::DirectoryTree(single.clone()),
        paths => InputSource::FileList(paths.to_vec()),
    };

    let mut options = BatchOptions::new(input, config);
    options.output = cli.output.clone();
    if !cli.match_rules.is_empty() {
        options.match_rules = cli.match_rules.clone();
    }
    if let Some(lossy) = cli.lossy {
        options = options.with_lossy(lossy)?;
    }
    if let Some(spec) = &cli.size {
        options.size = Some(SizeSpec::parse(spec)?);
    }
    Ok(options)
}
