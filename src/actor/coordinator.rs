//! Actor Coordinator - wires up watch mode
//!
//! The Coordinator is a thin orchestrator that:
//! - Builds the detector actor from the config
//! - Attaches filesystem hints when enabled
//! - Adds the config reload actor when a config file is in use
//! - Runs them until the shutdown signal arrives

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use notify::RecommendedWatcher;

use super::detector::DetectorActor;
use super::reload::ReloadActor;
use super::wakeup::Wakeup;
use crate::config::{ConfigReloader, ExporterConfig};
use crate::detect::{ChangeDetector, SourceFilter};
use crate::scheduler::ExportScheduler;
use crate::status::StatusStore;

/// How long the detector gets to finish its current scan on shutdown.
const STOP_GRACE: Duration = Duration::from_millis(500);

/// How often `inkwatch.toml` is checked for edits.
const RELOAD_INTERVAL: Duration = Duration::from_secs(1);

pub struct Coordinator {
    config: Arc<ExporterConfig>,
    scheduler: Arc<ExportScheduler>,
    store: Arc<StatusStore>,
    reloader: Option<ConfigReloader>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(
        config: Arc<ExporterConfig>,
        scheduler: Arc<ExportScheduler>,
        store: Arc<StatusStore>,
    ) -> Self {
        Self {
            config,
            scheduler,
            store,
            reloader: None,
            shutdown_rx: None,
        }
    }

    /// Apply edits of the config file to later exports.
    pub fn with_config_reload(mut self, reloader: ConfigReloader) -> Self {
        self.reloader = Some(reloader);
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Source filter for the configured root.
    pub fn source_filter(config: &ExporterConfig) -> SourceFilter {
        SourceFilter::new(
            config.watch.exclude_suffixes.clone(),
            config.watch.write_dir.clone(),
        )
    }

    fn detector_actor(&self) -> Result<(DetectorActor, Option<RecommendedWatcher>)> {
        let watch = &self.config.watch;
        let root = self
            .config
            .root()
            .ok_or_else(|| anyhow::anyhow!("no watched root configured"))?
            .to_path_buf();

        let detector = ChangeDetector::new(root.clone(), Self::source_filter(&self.config))
            .recursive(watch.recursive)
            .export_on_start(watch.export_on_start);
        let mut actor = DetectorActor::new(
            detector,
            Arc::clone(&self.scheduler),
            Arc::clone(&self.store),
            watch.interval(),
        );

        let mut watcher = None;
        if watch.native_events {
            match Wakeup::watch(&root, watch.recursive, Self::source_filter(&self.config)) {
                Ok(Wakeup { watcher: w, hints }) => {
                    actor = actor.with_hints(hints, watch.debounce());
                    watcher = Some(w);
                }
                Err(e) => {
                    crate::log!("watch"; "filesystem events unavailable, polling only: {}", e);
                }
            }
        }

        Ok((actor, watcher))
    }

    /// Run until the shutdown signal (or forever without one).
    pub async fn run(mut self) -> Result<()> {
        let (actor, watcher) = self.detector_actor()?;

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let detector = tokio::spawn(actor.run(async move {
            let _ = stop_rx.await;
        }));

        let mut reload = None;
        if let Some(reloader) = self.reloader.take() {
            crate::debug!("config"; "watching {}", reloader.path().display());
            let (tx, rx) = tokio::sync::oneshot::channel::<()>();
            let actor = ReloadActor::new(reloader, Arc::clone(&self.scheduler), RELOAD_INTERVAL);
            let handle = tokio::spawn(actor.run(async move {
                let _ = rx.await;
            }));
            reload = Some((tx, handle));
        }

        crate::debug!("actor"; "start");
        if let Some(rx) = self.shutdown_rx.take() {
            loop {
                if rx.try_recv().is_ok() {
                    crate::debug!("actor"; "shutdown signal received");
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        } else {
            std::future::pending::<()>().await;
        }

        let _ = stop_tx.send(());
        let _ = tokio::time::timeout(STOP_GRACE, detector).await;
        if let Some((tx, handle)) = reload {
            let _ = tx.send(());
            let _ = tokio::time::timeout(STOP_GRACE, handle).await;
        }
        drop(watcher);

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::export::transform::NativeTransform;
    use crate::export::OutputLayout;

    #[tokio::test]
    async fn test_runs_until_shutdown_signal() {
        let dir = TempDir::new().unwrap();
        let root = crate::utils::path::normalize_path(dir.path());
        std::fs::write(root.join("plot.svg"), "<svg xmlns=\"http://www.w3.org/2000/svg\"/>")
            .unwrap();

        let mut config = ExporterConfig::default();
        config.watch.root = Some(root.clone());
        config.watch.interval_ms = 10;

        let store = Arc::new(StatusStore::new(root.clone()));
        let scheduler = Arc::new(ExportScheduler::new(
            Arc::new(NativeTransform),
            OutputLayout::new(root, None),
            Arc::clone(&store),
            config.export.clone(),
        ));

        let (tx, rx) = crossbeam::channel::unbounded();
        let coordinator = Coordinator::new(Arc::new(config), scheduler, Arc::clone(&store))
            .with_shutdown_signal(rx);
        let handle = tokio::spawn(coordinator.run());

        tokio::time::sleep(Duration::from_millis(150)).await;
        tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
        assert!(store.snapshot().group("plot.svg").is_some());
    }

    #[tokio::test]
    async fn test_config_edit_reaches_scheduler() {
        use clap::Parser;

        use crate::cli::Cli;
        use crate::export::ExportFormat;

        let dir = TempDir::new().unwrap();
        let root = crate::utils::path::normalize_path(dir.path());
        let path = root.join("inkwatch.toml");
        std::fs::write(&path, "[export]\nformats = [\"plain-svg\"]\n").unwrap();

        let cli = Cli::try_parse_from([
            "inkwatch",
            "-C",
            path.to_str().unwrap(),
            "watch",
            root.to_str().unwrap(),
        ])
        .unwrap();
        let config = ExporterConfig::load(&cli).unwrap();
        let store = Arc::new(StatusStore::new(root.clone()));
        let scheduler = Arc::new(ExportScheduler::new(
            Arc::new(NativeTransform),
            OutputLayout::new(root, None),
            Arc::clone(&store),
            config.export.clone(),
        ));

        let (tx, rx) = crossbeam::channel::unbounded();
        let coordinator = Coordinator::new(Arc::new(config), Arc::clone(&scheduler), store)
            .with_config_reload(ConfigReloader::new(cli, path.clone()))
            .with_shutdown_signal(rx);
        let handle = tokio::spawn(coordinator.run());

        std::fs::write(&path, "[export]\nformats = [\"png\"]\n").unwrap();
        for _ in 0..40 {
            if scheduler.options().formats == vec![ExportFormat::Png] {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(scheduler.options().formats, vec![ExportFormat::Png]);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let config = ExporterConfig::default();
        let store = Arc::new(StatusStore::new("/".into()));
        let scheduler = Arc::new(ExportScheduler::new(
            Arc::new(NativeTransform),
            OutputLayout::new("/".into(), None),
            Arc::clone(&store),
            config.export.clone(),
        ));
        let coordinator = Coordinator::new(Arc::new(config), scheduler, store);
        assert!(coordinator.run().await.is_err());
    }
}
