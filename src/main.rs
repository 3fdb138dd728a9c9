//! Pagesmith - an asset build pipeline for static front-end projects.

mod asset;
mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod pipeline;
mod reload;
mod transform;
mod utils;
mod watch;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::Config;
use pipeline::{Pipelines, Transforms};
use reload::ReloadServer;

fn main() {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    if let Err(e) = run(&cli) {
        log!("error"; "{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    core::setup_shutdown_handler()?;

    let root = project_root(cli)?;
    let config = Arc::new(config::resolve(Config::default(), &root));

    let transforms = Transforms::standard(&config)?;
    let pipelines = Pipelines::new(
        Arc::clone(&config),
        transforms,
        Arc::new(ReloadServer::new()),
    );

    let name = cli.command.pipeline_name();
    let pipeline = pipelines.get(name).ok_or_else(|| {
        anyhow!(
            "unknown task `{name}`, expected one of: {}",
            pipelines.names().join(", ")
        )
    })?;

    debug!(name; "{}", pipeline.describe());
    let start = Instant::now();
    pipeline.run()?;
    log!(name; "finished in {:.2?}", start.elapsed());
    Ok(())
}

/// `--root`, or the process working directory.
fn project_root(cli: &Cli) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("cannot read the working directory")?;
    Ok(match &cli.root {
        Some(root) => cwd.join(root),
        None => cwd,
    })
}
