//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::export::ExportFormat;

/// Watch a directory of SVG drawings and keep their exports up to date
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: inkwatch.toml, searched upward)
    #[arg(short = 'C', long, default_value = "inkwatch.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch a directory, export changed drawings and serve the gallery
    #[command(visible_alias = "w")]
    Watch {
        /// Directory to watch (overrides `[watch] root`)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        export: ExportArgs,

        #[command(flatten)]
        serve: ServeArgs,
    },

    /// Export drawings once and exit
    #[command(visible_alias = "e")]
    Export {
        /// Source files. If omitted, exports every source under the root.
        #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        files: Vec<PathBuf>,

        /// Root directory (overrides `[watch] root`, default: current directory)
        #[arg(short = 'r', long = "root", value_hint = clap::ValueHint::DirPath)]
        dir: Option<PathBuf>,

        /// Write artifacts to this directory instead of next to the sources
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        write_dir: Option<PathBuf>,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Show a running daemon's gallery in the terminal
    #[command(visible_alias = "g")]
    Gallery {
        /// Gallery URL (default: derived from `[serve]`)
        #[arg(value_hint = clap::ValueHint::Url)]
        url: Option<String>,

        /// Poll interval in milliseconds
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },
}

/// Source discovery arguments for `watch`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Write artifacts to this directory instead of next to the sources
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub write_dir: Option<PathBuf>,

    /// Scan interval in milliseconds
    #[arg(short = 'n', long)]
    pub interval_ms: Option<u64>,

    /// Watch subdirectories too
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub recursive: Option<bool>,

    /// Export every source found by the first scan
    #[arg(short = 'a', long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub export_on_start: Option<bool>,

    /// Wake up early on filesystem events
    #[arg(short = 'E', long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub native_events: Option<bool>,
}

/// Export option overrides shared by `watch` and `export`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Formats to produce (comma-separated: pdf,png,emf,eps,plain-svg)
    #[arg(short, long, value_delimiter = ',')]
    pub formats: Option<Vec<ExportFormat>>,

    /// Rasterization DPI
    #[arg(short, long)]
    pub dpi: Option<f32>,

    /// Convert text to paths
    #[arg(short = 't', long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub text_to_path: Option<bool>,

    /// Margin around the drawing in millimetres
    #[arg(short, long)]
    pub margin_mm: Option<f32>,

    /// Inkscape executable (default: found on PATH)
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pub inkscape: Option<PathBuf>,

    /// Parallel export workers
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,
}

/// Gallery server arguments for `watch`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<std::net::IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Serve the gallery
    #[arg(short = 's', long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub serve: Option<bool>,

    /// Open the gallery in a browser once the server is up
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub open: Option<bool>,
}
