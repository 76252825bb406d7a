//! inkwatch - background exporter for vector drawings.
//!
//! Watches a folder of SVG drawings, exports every saved change to the
//! configured formats and serves a live gallery of the results.

mod actor;
mod cli;
mod client;
mod config;
mod core;
mod detect;
mod embed;
mod export;
mod freshness;
mod gallery;
mod logger;
mod scheduler;
mod status;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ExporterConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = ExporterConfig::load(&cli)?;
    if let Some(path) = &config.config_path {
        debug!("config"; "{}", path.display());
    }

    match &cli.command {
        Commands::Watch { .. } => cli::watch::watch(&cli, Arc::new(config)),
        Commands::Export { files, .. } => cli::export::export_sources(&config, files),
        Commands::Gallery { url, .. } => cli::gallery::run_gallery(&config, url.as_deref()),
    }
}
