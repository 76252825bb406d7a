//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! root = "~/figures"            # directory to watch (or `inkwatch watch <DIR>`)
//! write_dir = "exports"         # artifacts go here instead of next to sources
//! interval_ms = 1000            # scan interval
//! recursive = false             # include subdirectories
//! export_on_start = false       # export everything found by the first scan
//! native_events = false         # wake up early on filesystem events
//! debounce_ms = 200             # settle time after an event
//! exclude_suffixes = ["_portable.svg"]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::export::PLAIN_SVG_SUFFIX;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub root: Option<PathBuf>,

    /// Output directory; sources under it are never watched.
    pub write_dir: Option<PathBuf>,

    pub interval_ms: u64,

    pub recursive: bool,

    /// Report the first scan's files as additions so they are exported.
    pub export_on_start: bool,

    /// Use filesystem notifications as a wakeup hint.
    pub native_events: bool,

    pub debounce_ms: u64,

    /// File name suffixes never treated as sources.
    pub exclude_suffixes: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: None,
            write_dir: None,
            interval_ms: 1000,
            recursive: false,
            export_on_start: false,
            native_events: false,
            debounce_ms: 200,
            exclude_suffixes: vec![PLAIN_SVG_SUFFIX.to_string()],
        }
    }
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Check the watched directory. Requires normalized paths.
    pub fn validate_root(&self, diag: &mut ConfigDiagnostics) {
        let field = FieldPath::new("watch.root");
        match &self.root {
            None => diag.error_with_hint(
                field,
                "no directory to watch",
                "pass one on the command line: `inkwatch watch <DIR>`",
            ),
            Some(root) if !root.exists() => {
                diag.error(field, format!("`{}` does not exist", root.display()));
            }
            Some(root) if !root.is_dir() => {
                diag.error(field, format!("`{}` is not a directory", root.display()));
            }
            Some(root) => {
                if std::fs::read_dir(root).is_err() {
                    diag.error(field, format!("`{}` is not readable", root.display()));
                }
            }
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.interval_ms == 0 {
            diag.error(FieldPath::new("watch.interval_ms"), "must be greater than 0");
        }
        if let (Some(root), Some(write_dir)) = (&self.root, &self.write_dir)
            && root == write_dir
        {
            diag.error_with_hint(
                FieldPath::new("watch.write_dir"),
                "cannot be the watched directory itself",
                "leave it unset to write artifacts next to their sources",
            );
        }
        if self.exclude_suffixes.iter().any(String::is_empty) {
            diag.error(
                FieldPath::new("watch.exclude_suffixes"),
                "empty suffix would exclude every file",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_watch_config() {
        let config = test_parse_config(
            "[watch]\nroot = \"/figs\"\ninterval_ms = 250\nrecursive = true\nexport_on_start = true",
        );
        assert_eq!(config.watch.root, Some(PathBuf::from("/figs")));
        assert_eq!(config.watch.interval(), Duration::from_millis(250));
        assert!(config.watch.recursive);
        assert!(config.watch.export_on_start);
    }

    #[test]
    fn test_watch_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.watch.root, None);
        assert_eq!(config.watch.interval_ms, 1000);
        assert!(!config.watch.recursive);
        assert!(!config.watch.native_events);
        assert_eq!(config.watch.exclude_suffixes, vec!["_portable.svg"]);
    }

    #[test]
    fn test_validate_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("plot.svg");
        std::fs::write(&file, "<svg/>").unwrap();

        let check = |root: Option<PathBuf>| {
            let mut diag = ConfigDiagnostics::new();
            WatchConfig {
                root,
                ..WatchConfig::default()
            }
            .validate_root(&mut diag);
            diag.len()
        };

        assert_eq!(check(Some(dir.path().to_path_buf())), 0);
        assert_eq!(check(None), 1);
        assert_eq!(check(Some(dir.path().join("missing"))), 1);
        assert_eq!(check(Some(file)), 1);
    }

    #[test]
    fn test_validate_collects_all() {
        let mut diag = ConfigDiagnostics::new();
        WatchConfig {
            root: Some("/w".into()),
            write_dir: Some("/w".into()),
            interval_ms: 0,
            exclude_suffixes: vec![String::new()],
            ..WatchConfig::default()
        }
        .validate(&mut diag);
        assert_eq!(diag.len(), 3);
    }
}
