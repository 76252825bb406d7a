//! Reload Actor
//!
//! Polls `inkwatch.toml` and hands a changed `[export]` section to the
//! scheduler. Jobs enqueued before the swap keep the options they were
//! enqueued with.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::config::ConfigReloader;
use crate::scheduler::ExportScheduler;

pub struct ReloadActor {
    reloader: ConfigReloader,
    scheduler: Arc<ExportScheduler>,
    interval: Duration,
}

impl ReloadActor {
    pub fn new(
        reloader: ConfigReloader,
        scheduler: Arc<ExportScheduler>,
        interval: Duration,
    ) -> Self {
        Self {
            reloader,
            scheduler,
            interval,
        }
    }

    /// Check the file once. Returns whether the export options changed.
    pub fn tick(&mut self) -> bool {
        match self.reloader.check() {
            Ok(Some(config)) => {
                if *self.scheduler.options() == config.export {
                    crate::debug!("config"; "reloaded, export options unchanged");
                    return false;
                }
                let formats: Vec<_> = config.export.formats.iter().map(|f| f.id()).collect();
                crate::log!("config"; "reloaded, exporting {}", formats.join(", "));
                self.scheduler.set_options(config.export);
                true
            }
            Ok(None) => false,
            Err(e) => {
                crate::log!(
                    "config";
                    "{}: {:#}, keeping current options",
                    self.reloader.path().display(),
                    e
                );
                false
            }
        }
    }

    /// Poll until `shutdown` resolves.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
        crate::debug!("config"; "reload stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use clap::Parser;
    use tempfile::TempDir;

    use super::*;
    use crate::cli::Cli;
    use crate::export::transform::NativeTransform;
    use crate::export::{ExportFormat, ExportOptions, OutputLayout};
    use crate::status::StatusStore;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#;

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        config: PathBuf,
        scheduler: Arc<ExportScheduler>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let root = crate::utils::path::normalize_path(&dir.path().join("figs"));
            fs::create_dir_all(&root).unwrap();
            let config = dir.path().join("inkwatch.toml");
            fs::write(&config, "[export]\nformats = [\"plain-svg\"]\n").unwrap();

            let store = Arc::new(StatusStore::new(root.clone()));
            let options = ExportOptions {
                formats: vec![ExportFormat::PlainSvg],
                ..Default::default()
            };
            // Workers are not started: jobs stay queued.
            let scheduler = Arc::new(
                ExportScheduler::new(
                    Arc::new(NativeTransform),
                    OutputLayout::new(root.clone(), None),
                    store,
                    options,
                )
                .workers(1),
            );
            Self {
                _dir: dir,
                root,
                config,
                scheduler,
            }
        }

        fn actor(&self) -> ReloadActor {
            let cli = Cli::try_parse_from([
                "inkwatch",
                "-C",
                self.config.to_str().unwrap(),
                "watch",
                self.root.to_str().unwrap(),
            ])
            .unwrap();
            let reloader = ConfigReloader::new(cli, self.config.clone());
            ReloadActor::new(reloader, Arc::clone(&self.scheduler), Duration::from_millis(10))
        }

        fn source(&self, name: &str) -> PathBuf {
            let path = self.root.join(name);
            fs::write(&path, SVG).unwrap();
            path
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            self.scheduler.shutdown();
        }
    }

    #[test]
    fn test_reload_applies_to_later_jobs_only() {
        let fx = Fixture::new();
        let mut actor = fx.actor();
        let a = fx.source("a.svg");
        let b = fx.source("b.svg");

        fx.scheduler.on_change(&a);
        fs::write(&fx.config, "[export]\nformats = [\"pdf\"]\n").unwrap();
        assert!(actor.tick());
        assert_eq!(fx.scheduler.options().formats, vec![ExportFormat::Pdf]);
        fx.scheduler.on_change(&b);

        fx.scheduler.start();
        fx.scheduler.wait_idle();

        assert!(fx.root.join("a_portable.svg").exists());
        assert!(!fx.root.join("b_portable.svg").exists());
    }

    #[test]
    fn test_unchanged_export_section_keeps_options() {
        let fx = Fixture::new();
        let mut actor = fx.actor();
        let before = fx.scheduler.options();

        fs::write(&fx.config, "[export]\nformats = [\"plain-svg\"]\n\n[serve]\nport = 9000\n")
            .unwrap();
        assert!(!actor.tick());
        assert!(Arc::ptr_eq(&before, &fx.scheduler.options()));
    }

    #[test]
    fn test_invalid_reload_keeps_options() {
        let fx = Fixture::new();
        let mut actor = fx.actor();

        fs::write(&fx.config, "[export]\nformats = []\n").unwrap();
        assert!(!actor.tick());
        assert_eq!(fx.scheduler.options().formats, vec![ExportFormat::PlainSvg]);
    }

    #[tokio::test]
    async fn test_run_picks_up_edit() {
        let fx = Fixture::new();
        let actor = fx.actor();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(actor.run(async move {
            let _ = stop_rx.await;
        }));

        fs::write(&fx.config, "[export]\nformats = [\"png\"]\n").unwrap();
        for _ in 0..100 {
            if fx.scheduler.options().formats == vec![ExportFormat::Png] {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(fx.scheduler.options().formats, vec![ExportFormat::Png]);

        let _ = stop_tx.send(());
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
