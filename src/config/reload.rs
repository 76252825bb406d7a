//! Config reload for watch mode.
//!
//! Only the `[export]` section takes effect on reload: the watched root,
//! worker count and server settings are fixed for the life of the daemon.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::ExporterConfig;
use crate::cli::Cli;
use crate::freshness::{ContentHash, compute_file_hash};

/// Re-reads `inkwatch.toml` when its content changes.
pub struct ConfigReloader {
    cli: Cli,
    path: PathBuf,
    hash: Option<ContentHash>,
}

impl ConfigReloader {
    pub fn new(cli: Cli, path: PathBuf) -> Self {
        let hash = compute_file_hash(&path).ok();
        Self { cli, path, hash }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the config if the file content changed.
    ///
    /// Returns `Ok(None)` when unchanged. A file that fails to load, or
    /// goes missing, is reported once; the next attempt waits for another
    /// edit.
    pub fn check(&mut self) -> Result<Option<ExporterConfig>> {
        let hash = match compute_file_hash(&self.path) {
            Ok(hash) => hash,
            Err(_) if self.hash.is_none() => return Ok(None),
            Err(e) => {
                self.hash = None;
                return Err(e.into());
            }
        };
        if self.hash == Some(hash) {
            return Ok(None);
        }
        self.hash = Some(hash);

        ExporterConfig::load(&self.cli).map(Some)
    }
}
