//! Authoritative pipeline state, published for lock-free readers.
//!
//! Writers serialize on a single lock; every visible mutation bumps the
//! update counter once and publishes a new immutable [`Snapshot`] through
//! `arc-swap`. Groups are `Arc`-shared between snapshots, so a publish only
//! copies the group that changed. Readers load the current snapshot and never
//! wait for a writer.

mod types;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

pub use types::{
    ArtifactOutcome, ExportArtifact, FileRecord, FormatResult, GalleryGroup, SourceStatus,
    WatchedSource,
};

use crate::utils::path::relative_to;

/// Consistent view of the store at one counter value.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub counter: u64,
    /// Ordered by header.
    pub groups: Vec<Arc<GalleryGroup>>,
}

impl Snapshot {
    #[cfg(test)]
    pub fn group(&self, header: &str) -> Option<&Arc<GalleryGroup>> {
        self.groups.iter().find(|g| g.header == header)
    }

    /// Source owning `path`, which may be the source itself or an artifact.
    pub fn source_for(&self, path: &Path) -> Option<&Path> {
        self.groups
            .iter()
            .find(|g| g.owns(path))
            .map(|g| g.source.path.as_path())
    }

    /// Source a gallery action on `path` refers to, including formats that
    /// never produced a file.
    pub fn action_source(&self, path: &Path) -> Option<&Path> {
        self.groups
            .iter()
            .find(|g| g.targets(path))
            .map(|g| g.source.path.as_path())
    }
}

#[derive(Default)]
struct State {
    counter: u64,
    groups: BTreeMap<String, Arc<GalleryGroup>>,
}

pub struct StatusStore {
    root: PathBuf,
    writer: Mutex<State>,
    published: ArcSwap<Snapshot>,
}

impl StatusStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            writer: Mutex::new(State::default()),
            published: ArcSwap::from_pointee(Snapshot::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Gallery header of `source`: its path relative to the watch root.
    pub fn header(&self, source: &Path) -> String {
        relative_to(source, &self.root)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Current snapshot; never blocks.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.published.load_full()
    }

    pub fn counter(&self) -> u64 {
        self.published.load().counter
    }

    pub fn source_for(&self, path: &Path) -> Option<PathBuf> {
        self.published.load().source_for(path).map(Path::to_path_buf)
    }

    pub fn action_source(&self, path: &Path) -> Option<PathBuf> {
        self.published.load().action_source(path).map(Path::to_path_buf)
    }

    /// Whether the server may stream `path`.
    pub fn is_known_file(&self, path: &Path) -> bool {
        self.published.load().source_for(path).is_some()
    }

    /// Register a source found at startup together with artifacts already on disk.
    pub fn record_discovered(&self, source: &Path, existing: Vec<ExportArtifact>) -> bool {
        let header = self.header(source);
        let mut state = self.writer.lock();
        if state.groups.contains_key(&header) {
            return false;
        }

        let mut watched = WatchedSource::new(source.to_path_buf());
        if !existing.is_empty() {
            watched.status = SourceStatus::Done;
        }
        let group = GalleryGroup {
            header: header.clone(),
            source: watched,
            files: existing.into_iter().map(FileRecord::fresh).collect(),
            generation: 0,
        };
        state.groups.insert(header, Arc::new(group));
        self.commit(&mut state);
        true
    }

    pub fn record_queued(&self, source: &Path) -> bool {
        self.update(source, true, |group| {
            set_status(&mut group.source, SourceStatus::Queued, None)
        })
    }

    pub fn record_job_start(&self, source: &Path) -> bool {
        self.update(source, true, |group| {
            set_status(&mut group.source, SourceStatus::Processing, None)
        })
    }

    /// Replace the group's result set with `outcome`.
    ///
    /// Result sets older than the one on display are dropped.
    pub fn record_artifacts(&self, source: &Path, outcome: &ArtifactOutcome) -> bool {
        self.update(source, false, |group| {
            if outcome.generation < group.generation {
                crate::debug!(
                    "status";
                    "drop result set {} < {} for {}",
                    outcome.generation,
                    group.generation,
                    group.header
                );
                return false;
            }

            group.files = merge_results(&group.files, outcome);
            group.generation = outcome.generation;
            if outcome.fingerprint.is_some() {
                group.source.fingerprint = outcome.fingerprint;
            }
            if outcome.succeeded() > 0 {
                set_status(&mut group.source, SourceStatus::Done, None);
            } else {
                let error = outcome.error_summary();
                set_status(&mut group.source, SourceStatus::Failed, Some(error));
            }
            true
        })
    }

    /// Mark the source failed without touching its result set.
    pub fn record_failure(&self, source: &Path, error: &str) -> bool {
        self.update(source, false, |group| {
            set_status(
                &mut group.source,
                SourceStatus::Failed,
                Some(error.to_string()),
            )
        })
    }

    pub fn record_removed(&self, source: &Path) -> bool {
        let header = self.header(source);
        let mut state = self.writer.lock();
        if state.groups.remove(&header).is_none() {
            return false;
        }
        self.commit(&mut state);
        true
    }

    /// Apply `f` to the group of `source`, publishing if anything changed.
    fn update<F>(&self, source: &Path, create: bool, f: F) -> bool
    where
        F: FnOnce(&mut GalleryGroup) -> bool,
    {
        let header = self.header(source);
        let mut state = self.writer.lock();

        let created = !state.groups.contains_key(&header);
        if created && !create {
            return false;
        }
        let entry = state.groups.entry(header.clone()).or_insert_with(|| {
            Arc::new(GalleryGroup {
                header,
                source: WatchedSource::new(source.to_path_buf()),
                files: Vec::new(),
                generation: 0,
            })
        });

        let changed = f(Arc::make_mut(entry));
        if changed || created {
            self.commit(&mut state);
        }
        changed || created
    }

    /// Bump the counter and publish a new snapshot. Caller holds the writer lock.
    fn commit(&self, state: &mut State) {
        state.counter += 1;
        let snapshot = Snapshot {
            counter: state.counter,
            groups: state.groups.values().cloned().collect(),
        };
        self.published.store(Arc::new(snapshot));
    }
}

fn set_status(source: &mut WatchedSource, status: SourceStatus, error: Option<String>) -> bool {
    if source.status == status && source.last_error == error {
        return false;
    }
    source.status = status;
    source.last_error = error;
    true
}

/// New result set: fresh artifacts where the export succeeded, the previous
/// artifact (marked stale) where it failed and an older file still exists,
/// an error-only record otherwise.
pub fn merge_results(previous: &[FileRecord], outcome: &ArtifactOutcome) -> Vec<FileRecord> {
    outcome
        .results
        .iter()
        .map(|r| match &r.result {
            Ok(artifact) => FileRecord::fresh(artifact.clone()),
            Err(e) => {
                let carried = previous
                    .iter()
                    .find(|p| p.format == r.format)
                    .and_then(|p| p.artifact.clone())
                    .filter(|a| a.output_path.is_file());
                FileRecord {
                    format: r.format,
                    output_path: r.output_path.clone(),
                    stale: carried.is_some(),
                    artifact: carried,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}
