//! Exporter configuration management for `inkwatch.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── schedule   # [schedule]
//! │   ├── serve      # [serve]
//! │   ├── transform  # [transform]
//! │   └── watch      # [watch]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── reload.rs      # ConfigReloader (watch mode)
//! └── mod.rs         # ExporterConfig (this file)
//! ```
//!
//! The `[export]` section deserializes straight into [`ExportOptions`].
//!
//! Paths in the file resolve against the file's directory; paths given on
//! the command line resolve against the current directory.

mod reload;
pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use reload::ConfigReloader;
pub use section::{ScheduleConfig, ServeConfig, TransformConfig, WatchConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::cli::{Cli, Commands, ExportArgs, ServeArgs, SourceArgs};
use crate::export::ExportOptions;
use crate::log;
use crate::utils::path::expand_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing inkwatch.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub export: ExportOptions,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub transform: TransformConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl ExporterConfig {
    /// Load configuration for the parsed command line.
    ///
    /// A missing default config file means defaults; a missing file named
    /// with `-C` is an error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let explicit = cli.config != Path::new(DEFAULT_CONFIG_NAME);

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.clone());
                config.normalize_paths(&base);
                config.config_path = Some(crate::utils::path::normalize_path(&path));
                config
            }
            None if explicit => return Err(ConfigError::NotFound(cli.config.clone()).into()),
            None => Self::default(),
        };

        config.apply_command_options(&cli.command, &cwd);
        config.validate(&cli.command)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        log!("warning"; "unknown fields in {} are ignored:", path.display());
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Watched root. Present after a successful `load` for `watch` and `export`.
    pub fn root(&self) -> Option<&Path> {
        self.watch.root.as_deref()
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, command: &Commands, cwd: &Path) {
        match command {
            Commands::Watch {
                dir,
                source,
                export,
                serve,
            } => {
                self.apply_root(dir.as_deref(), cwd);
                self.apply_source_args(source, cwd);
                self.apply_export_args(export, cwd);
                self.apply_serve_args(serve);
            }
            Commands::Export {
                dir,
                write_dir,
                export,
                ..
            } => {
                self.apply_root(dir.as_deref(), cwd);
                if self.watch.root.is_none() {
                    self.watch.root = Some(crate::utils::path::normalize_path(cwd));
                }
                if let Some(write_dir) = write_dir {
                    self.watch.write_dir = Some(expand_path(write_dir, cwd));
                }
                self.apply_export_args(export, cwd);
            }
            Commands::Gallery { interval_ms, .. } => {
                Self::update_option(&mut self.serve.poll_interval_ms, interval_ms.as_ref());
            }
        }
    }

    fn apply_root(&mut self, dir: Option<&Path>, cwd: &Path) {
        if let Some(dir) = dir {
            self.watch.root = Some(expand_path(dir, cwd));
        }
    }

    /// Apply source discovery arguments from CLI.
    fn apply_source_args(&mut self, args: &SourceArgs, cwd: &Path) {
        if let Some(write_dir) = &args.write_dir {
            self.watch.write_dir = Some(expand_path(write_dir, cwd));
        }
        Self::update_option(&mut self.watch.interval_ms, args.interval_ms.as_ref());
        Self::update_option(&mut self.watch.recursive, args.recursive.as_ref());
        Self::update_option(&mut self.watch.export_on_start, args.export_on_start.as_ref());
        Self::update_option(&mut self.watch.native_events, args.native_events.as_ref());
    }

    /// Apply export option overrides from CLI.
    fn apply_export_args(&mut self, args: &ExportArgs, cwd: &Path) {
        Self::update_option(&mut self.export.formats, args.formats.as_ref());
        Self::update_option(&mut self.export.dpi, args.dpi.as_ref());
        Self::update_option(&mut self.export.text_to_path, args.text_to_path.as_ref());
        Self::update_option(&mut self.export.margin_mm, args.margin_mm.as_ref());
        if let Some(inkscape) = &args.inkscape {
            self.transform.inkscape = Some(expand_path(inkscape, cwd));
        }
        if args.workers.is_some() {
            self.schedule.workers = args.workers;
        }
    }

    /// Apply serve-specific options.
    fn apply_serve_args(&mut self, args: &ServeArgs) {
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.serve.enable, args.serve.as_ref());
        Self::update_option(&mut self.serve.open_browser, args.open.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Resolve file paths against the config file's directory.
    fn normalize_paths(&mut self, base: &Path) {
        if let Some(root) = self.watch.root.take() {
            self.watch.root = Some(expand_path(&root, base));
        }
        if let Some(write_dir) = self.watch.write_dir.take() {
            self.watch.write_dir = Some(expand_path(&write_dir, base));
        }
        if let Some(inkscape) = self.transform.inkscape.take() {
            self.transform.inkscape = Some(expand_path(&inkscape, base));
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration for the given command.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self, command: &Commands) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        match command {
            Commands::Watch { .. } => {
                self.watch.validate_root(&mut diag);
                self.validate_pipeline(&mut diag);
                self.serve.validate(&mut diag);
            }
            Commands::Export { .. } => {
                self.watch.validate_root(&mut diag);
                self.validate_pipeline(&mut diag);
            }
            Commands::Gallery { .. } => self.serve.validate(&mut diag),
        }

        diag.print_warnings();

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    fn validate_pipeline(&self, diag: &mut ConfigDiagnostics) {
        self.watch.validate(diag);
        for (field, message) in self.export.problems() {
            diag.error(FieldPath::new(field), message);
        }
        self.schedule.validate(diag);
        self.transform.validate(diag);
    }
}

/// File name searched for when `-C` is not given.
pub const DEFAULT_CONFIG_NAME: &str = "inkwatch.toml";

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ExporterConfig {
    let (parsed, ignored) = ExporterConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
