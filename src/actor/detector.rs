//! Detector Actor
//!
//! Runs the polling [`ChangeDetector`] on a fixed interval and routes what it
//! finds:
//!
//! ```text
//! Discovered → StatusStore (with artifacts already on disk)
//! Added      → ExportScheduler
//! Modified   → ExportScheduler
//! Removed    → StatusStore + ExportScheduler (drop queued job)
//! ```
//!
//! Filesystem notifications, when enabled, only pull the next scan forward.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::detect::{Change, ChangeDetector};
use crate::scheduler::{ExportScheduler, existing_artifacts};
use crate::status::StatusStore;

/// Change counts of one scan, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub discovered: usize,
    pub exported: usize,
    pub removed: usize,
}

impl ScanSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct DetectorActor {
    /// Scans walk and hash files, so they run on the blocking pool.
    detector: Arc<Mutex<ChangeDetector>>,
    scheduler: Arc<ExportScheduler>,
    store: Arc<StatusStore>,
    interval: Duration,
    debounce: Duration,
    /// Wakeup hints from the filesystem watcher
    hints: Option<mpsc::Receiver<()>>,
}

impl DetectorActor {
    pub fn new(
        detector: ChangeDetector,
        scheduler: Arc<ExportScheduler>,
        store: Arc<StatusStore>,
        interval: Duration,
    ) -> Self {
        Self {
            detector: Arc::new(Mutex::new(detector)),
            scheduler,
            store,
            interval,
            debounce: Duration::ZERO,
            hints: None,
        }
    }

    /// Scan early when a hint arrives, after `debounce` of quiet.
    pub fn with_hints(mut self, hints: mpsc::Receiver<()>, debounce: Duration) -> Self {
        self.hints = Some(hints);
        self.debounce = debounce;
        self
    }

    /// Scan once and route the changes.
    pub async fn tick(&self) -> ScanSummary {
        let detector = Arc::clone(&self.detector);
        let changes = match tokio::task::spawn_blocking(move || detector.lock().scan()).await {
            Ok(changes) => changes,
            Err(e) => {
                crate::log!("watch"; "scan aborted: {}", e);
                return ScanSummary::default();
            }
        };
        let summary = self.route(changes);
        if !summary.is_empty() {
            crate::debug!(
                "watch";
                "scan: {} discovered, {} to export, {} removed",
                summary.discovered, summary.exported, summary.removed
            );
        }
        summary
    }

    fn route(&self, changes: Vec<Change>) -> ScanSummary {
        let mut summary = ScanSummary::default();
        let formats = self.scheduler.options().formats();

        for change in changes {
            crate::debug!("watch"; "{} {}", change.label(), self.store.header(change.path()));
            match change {
                Change::Discovered(path) => {
                    let existing = existing_artifacts(self.scheduler.layout(), &path, &formats);
                    self.store.record_discovered(&path, existing);
                    summary.discovered += 1;
                }
                Change::Added(path) | Change::Modified(path) => {
                    self.scheduler.on_change(&path);
                    summary.exported += 1;
                }
                Change::Removed(path) => {
                    crate::log!("watch"; "removed {}", self.store.header(&path));
                    self.scheduler.forget(&path);
                    self.store.record_removed(&path);
                    summary.removed += 1;
                }
            }
        }
        summary
    }

    /// Run the scan loop until `shutdown` resolves.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut hints = self.hints.take();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                hint = next_hint(&mut hints) => match hint {
                    Some(()) => {
                        tokio::time::sleep(self.debounce).await;
                        if let Some(rx) = hints.as_mut() {
                            while rx.try_recv().is_ok() {}
                        }
                        self.tick().await;
                        ticker.reset();
                    }
                    None => hints = None,
                },
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
        crate::debug!("watch"; "detector stopped");
    }
}

async fn next_hint(hints: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
    match hints {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
