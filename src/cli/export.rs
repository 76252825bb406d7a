//! `inkwatch export`: one-shot export of sources, then exit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::actor::Coordinator;
use crate::config::ExporterConfig;
use crate::detect::{Change, ChangeDetector, SourceFilter};
use crate::export::{OutputLayout, RoutedTransform};
use crate::log;
use crate::scheduler::ExportScheduler;
use crate::status::{SourceStatus, StatusStore};
use crate::utils::path::normalize_path;

/// Store plus started scheduler for the configured root.
pub fn start_pipeline(config: &ExporterConfig) -> Result<(Arc<StatusStore>, Arc<ExportScheduler>)> {
    let root = config
        .root()
        .context("no root directory configured")?
        .to_path_buf();

    let store = Arc::new(StatusStore::new(root.clone()));
    let transform = RoutedTransform::detect(config.transform.inkscape.as_deref());
    let scheduler = ExportScheduler::new(
        Arc::new(transform),
        OutputLayout::new(root, config.watch.write_dir.clone()),
        Arc::clone(&store),
        config.export.clone(),
    )
    .workers(config.schedule.workers())
    .retry(config.schedule.retry_policy());

    let scheduler = Arc::new(scheduler);
    scheduler.start();
    Ok((store, scheduler))
}

/// Export `files` (or every source under the root) and wait for the results.
pub fn export_sources(config: &ExporterConfig, files: &[PathBuf]) -> Result<()> {
    let sources = collect_sources(config, files)?;
    if sources.is_empty() {
        bail!("nothing to export");
    }

    let (store, scheduler) = start_pipeline(config)?;
    log!("export"; "exporting {} source{}", sources.len(), if sources.len() == 1 { "" } else { "s" });
    for source in &sources {
        scheduler.on_change(source);
    }
    scheduler.wait_idle();
    scheduler.shutdown();

    let snapshot = store.snapshot();
    let failed = snapshot
        .groups
        .iter()
        .filter(|g| g.source.status == SourceStatus::Failed)
        .count();
    let partial = snapshot
        .groups
        .iter()
        .filter(|g| g.files.iter().any(|f| f.error.is_some()))
        .count();

    if failed > 0 {
        bail!("{failed} of {} sources failed", sources.len());
    }
    if partial > 0 {
        log!("warning"; "{partial} source(s) exported with format errors");
    }
    Ok(())
}

/// Sources named on the command line, or every source under the root.
fn collect_sources(config: &ExporterConfig, files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let root = config
        .root()
        .context("no root directory configured")?
        .to_path_buf();
    let filter = Coordinator::source_filter(config);

    if files.is_empty() {
        return Ok(scan_all(&root, filter, config.watch.recursive));
    }

    let cwd = std::env::current_dir().context("Failed to get current working directory")?;
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let path = normalize_path(&cwd.join(file));
        if let Some(reason) = rejection(&path, &root, &filter) {
            log!("warning"; "skipping {}: {}", file.display(), reason);
            continue;
        }
        if !sources.contains(&path) {
            sources.push(path);
        }
    }
    Ok(sources)
}

fn scan_all(root: &Path, filter: SourceFilter, recursive: bool) -> Vec<PathBuf> {
    ChangeDetector::new(root.to_path_buf(), filter)
        .recursive(recursive)
        .export_on_start(true)
        .scan()
        .into_iter()
        .filter_map(|change| match change {
            Change::Added(path) => Some(path),
            _ => None,
        })
        .collect()
}

fn rejection(path: &Path, root: &Path, filter: &SourceFilter) -> Option<&'static str> {
    if !path.is_file() {
        Some("not a file")
    } else if !path.starts_with(root) {
        Some("outside the root directory")
    } else if !filter.accepts(path) {
        Some("not an exportable svg")
    } else {
        None
    }
}
