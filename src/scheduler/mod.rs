//! Export scheduler: changes in, jobs out.
//!
//! Every source has at most one job slot:
//! - no slot: a change creates a queued job
//! - queued: the change is absorbed by the queued job
//! - running: the change is remembered, and exactly one follow-up job is
//!   queued when the running one completes
//!
//! Jobs for distinct sources run in parallel on a fixed pool of OS threads
//! (transforms block on subprocesses).

mod job;
mod retry;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::{Condvar, Mutex};

use job::{ExportJob, JobContext, JobResult};

pub use job::existing_artifacts;
pub use retry::RetryPolicy;

use crate::export::{DocumentTransform, ExportOptions, OutputLayout};
use crate::logger;
use crate::status::{ArtifactOutcome, StatusStore};

/// Job slot of one source.
enum Slot {
    Queued(Arc<ExportOptions>),
    Running { rerun: bool },
}

/// What `on_change` did with a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// A new job was queued.
    New,
    /// A queued job already covers the change.
    Absorbed,
    /// A follow-up runs after the current job.
    FollowUp,
}

pub struct ExportScheduler {
    /// Sources waiting for a worker, in arrival order
    queue: Mutex<VecDeque<PathBuf>>,
    /// Worker notification
    notify: Condvar,
    slots: DashMap<PathBuf, Slot>,
    /// Live options; jobs capture a snapshot when enqueued
    options: ArcSwap<ExportOptions>,
    transform: Arc<dyn DocumentTransform>,
    layout: OutputLayout,
    store: Arc<StatusStore>,
    policy: RetryPolicy,
    workers: usize,
    generation: AtomicU64,
    shutdown: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

/// Default worker count: available parallelism, capped at 4.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(4)
}

impl ExportScheduler {
    pub fn new(
        transform: Arc<dyn DocumentTransform>,
        layout: OutputLayout,
        store: Arc<StatusStore>,
        options: ExportOptions,
    ) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Condvar::new(),
            slots: DashMap::new(),
            options: ArcSwap::from_pointee(options),
            transform,
            layout,
            store,
            policy: RetryPolicy::default(),
            workers: default_workers(),
            generation: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Start worker threads.
    pub fn start(self: &Arc<Self>) {
        let mut handles = self.handles.lock();
        if !handles.is_empty() {
            return;
        }
        for i in 0..self.workers {
            let scheduler = Arc::clone(self);
            let handle = std::thread::Builder::new()
                .name(format!("export-{i}"))
                .spawn(move || scheduler.run_worker());
            match handle {
                Ok(handle) => handles.push(handle),
                Err(e) => crate::log!("error"; "failed to start export worker: {e}"),
            }
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        &self.store
    }

    /// Current live options.
    pub fn options(&self) -> Arc<ExportOptions> {
        self.options.load_full()
    }

    /// Replace the live options. Jobs already enqueued keep their snapshot.
    pub fn set_options(&self, options: ExportOptions) {
        self.options.store(Arc::new(options));
    }

    /// Report a change of `source`.
    pub fn on_change(&self, source: &Path) -> Enqueued {
        let enqueued = match self.slots.entry(source.to_path_buf()) {
            Entry::Vacant(e) => {
                e.insert(Slot::Queued(self.options.load_full()));
                Enqueued::New
            }
            Entry::Occupied(mut e) => match e.get_mut() {
                Slot::Queued(_) => Enqueued::Absorbed,
                Slot::Running { rerun } => {
                    *rerun = true;
                    Enqueued::FollowUp
                }
            },
        };

        crate::debug!("export"; "change {}: {:?}", source.display(), enqueued);
        if enqueued == Enqueued::New {
            self.store.record_queued(source);
            self.push(source.to_path_buf());
        }
        enqueued
    }

    /// Drop a queued job for a source that disappeared.
    ///
    /// A running job notices the vanished source by itself.
    pub fn forget(&self, source: &Path) {
        self.slots
            .remove_if(source, |_, slot| matches!(slot, Slot::Queued(_)));
    }

    /// Whether a job for `source` is queued or running.
    #[cfg(test)]
    pub fn is_busy(&self, source: &Path) -> bool {
        self.slots.contains_key(source)
    }

    /// Block until no job is queued or running.
    pub fn wait_idle(&self) {
        while !self.slots.is_empty() && !self.is_shutdown() {
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Stop workers after their current job and join them.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        {
            let _queue = self.queue.lock();
            self.notify.notify_all();
        }
        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn push(&self, source: PathBuf) {
        self.queue.lock().push_back(source);
        self.notify.notify_one();
    }
}

// =============================================================================
// Worker
// =============================================================================

impl ExportScheduler {
    fn run_worker(&self) {
        while let Some(source) = self.dequeue() {
            if let Some(job) = self.claim(source) {
                self.execute(job);
            }
        }
    }

    fn dequeue(&self) -> Option<PathBuf> {
        let mut queue = self.queue.lock();
        loop {
            if self.is_shutdown() {
                return None;
            }
            if let Some(source) = queue.pop_front() {
                return Some(source);
            }
            self.notify.wait(&mut queue);
        }
    }

    /// Turn a queued slot into a running one.
    fn claim(&self, source: PathBuf) -> Option<ExportJob> {
        let mut slot = self.slots.get_mut(&source)?;
        let options = match &*slot {
            Slot::Queued(options) => Arc::clone(options),
            Slot::Running { .. } => return None,
        };
        *slot = Slot::Running { rerun: false };
        drop(slot);

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Some(ExportJob::new(source, options, generation))
    }

    fn execute(&self, mut job: ExportJob) {
        let source = job.source.clone();

        let result = if source.exists() {
            self.store.record_job_start(&source);
            let ctx = JobContext {
                transform: self.transform.as_ref(),
                layout: &self.layout,
                policy: &self.policy,
                cancelled: &self.shutdown,
            };
            job.run(&ctx)
        } else {
            JobResult::Vanished
        };

        match &result {
            JobResult::Completed(outcome) => {
                self.store.record_artifacts(&source, outcome);
                self.report(&source, outcome);
            }
            JobResult::Vanished => {
                crate::debug!("export"; "source vanished: {}", source.display());
                self.store.record_removed(&source);
            }
            JobResult::Unreadable(error) => {
                self.store.record_failure(&source, error);
                logger::status_error(&format!("failed: {}", self.store.header(&source)), error);
            }
        }

        self.finish(source);
    }

    /// Release the slot, or requeue once if changes arrived meanwhile.
    fn finish(&self, source: PathBuf) {
        let rerun = match self.slots.entry(source.clone()) {
            Entry::Occupied(mut e) => {
                if matches!(e.get(), Slot::Running { rerun: true }) {
                    *e.get_mut() = Slot::Queued(self.options.load_full());
                    true
                } else {
                    e.remove();
                    false
                }
            }
            Entry::Vacant(_) => false,
        };

        if rerun {
            self.store.record_queued(&source);
            self.push(source);
        }
    }

    fn report(&self, source: &Path, outcome: &ArtifactOutcome) {
        let header = self.store.header(source);
        let done: Vec<_> = outcome
            .results
            .iter()
            .filter(|r| r.result.is_ok())
            .map(|r| r.format.id())
            .collect();

        if outcome.errors().next().is_none() {
            logger::status_success(&format!("exported {header} → {}", done.join(", ")));
        } else if done.is_empty() {
            logger::status_error(&format!("failed: {header}"), &outcome.error_summary());
        } else {
            logger::status_warning(&format!(
                "exported {header} → {}; {}",
                done.join(", "),
                outcome.error_summary()
            ));
        }
    }
}
