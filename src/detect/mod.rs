//! Polling change detection over the watched root.
//!
//! Each scan lists candidate sources, takes a stable content fingerprint of
//! every one of them and compares against the table from the previous scan.
//! Reads that are not stable (file mid-write, empty, vanished between listing
//! and reading) count as "no change yet": the previous fingerprint is kept and
//! the file is looked at again on the next scan.

mod filter;

use std::fs;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rustc_hash::{FxHashMap, FxHashSet};

pub use filter::SourceFilter;

use crate::freshness::{Fingerprint, FingerprintError, fingerprint};

/// A change observed by one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Present at the baseline scan.
    Discovered(PathBuf),
    Added(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

impl Change {
    pub fn path(&self) -> &Path {
        match self {
            Self::Discovered(p) | Self::Added(p) | Self::Modified(p) | Self::Removed(p) => p,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Discovered(_) => "discovered",
            Self::Added(_) => "added",
            Self::Modified(_) => "modified",
            Self::Removed(_) => "removed",
        }
    }
}

/// Fingerprint table plus the rules for walking the root.
pub struct ChangeDetector {
    root: PathBuf,
    filter: SourceFilter,
    recursive: bool,
    export_on_start: bool,
    known: FxHashMap<PathBuf, Fingerprint>,
    baselined: bool,
    root_missing: bool,
}

impl ChangeDetector {
    pub fn new(root: PathBuf, filter: SourceFilter) -> Self {
        Self {
            root,
            filter,
            recursive: false,
            export_on_start: false,
            known: FxHashMap::default(),
            baselined: false,
            root_missing: false,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Report baseline files as `Added` instead of `Discovered`.
    pub fn export_on_start(mut self, export_on_start: bool) -> Self {
        self.export_on_start = export_on_start;
        self
    }

    /// Number of sources currently tracked.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Scan the root and return the changes since the previous scan.
    pub fn scan(&mut self) -> Vec<Change> {
        let Some(candidates) = self.list() else {
            if !self.root_missing {
                crate::log!("watch"; "root unavailable, skipping scans: {}", self.root.display());
                self.root_missing = true;
            }
            return Vec::new();
        };
        if self.root_missing {
            crate::log!("watch"; "root available again: {}", self.root.display());
            self.root_missing = false;
        }

        let baseline = !self.baselined;
        self.baselined = true;

        let mut changes = Vec::new();
        let mut seen = FxHashSet::default();

        for path in candidates {
            seen.insert(path.clone());
            let fp = match fingerprint(&path) {
                Ok(fp) => fp,
                Err(e) => {
                    log_transient(&path, &e);
                    continue;
                }
            };

            match self.known.insert(path.clone(), fp) {
                None if baseline && !self.export_on_start => changes.push(Change::Discovered(path)),
                None => changes.push(Change::Added(path)),
                Some(prev) if prev != fp => changes.push(Change::Modified(path)),
                Some(_) => {}
            }
        }

        let removed: Vec<PathBuf> = self
            .known
            .keys()
            .filter(|p| !seen.contains(*p))
            .cloned()
            .collect();
        for path in removed {
            self.known.remove(&path);
            changes.push(Change::Removed(path));
        }

        changes
    }

    /// Candidate sources below the root, or `None` when the root is gone.
    fn list(&self) -> Option<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return None;
        }

        let mut paths: Vec<PathBuf> = if self.recursive {
            WalkDir::new(&self.root)
                .skip_hidden(true)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path())
                .collect()
        } else {
            fs::read_dir(&self.root)
                .ok()?
                .flatten()
                .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
                .map(|e| e.path())
                .collect()
        };

        paths.retain(|p| self.filter.accepts(p));
        paths.sort();
        Some(paths)
    }
}

fn log_transient(path: &Path, error: &FingerprintError) {
    crate::debug!("watch"; "not ready, retry next scan: {} ({error})", path.display());
}
