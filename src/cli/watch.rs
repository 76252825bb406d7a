//! `inkwatch watch`: the export daemon.
//!
//! ```text
//! main thread:   GalleryServer request loop (or idle wait without a server)
//! actor thread:  tokio runtime running the Coordinator / DetectorActor
//! export-N:      ExportScheduler workers
//! ```
//!
//! Ctrl+C unblocks the server, signals the coordinator and stops the workers
//! after their current job.
//!
//! Edits of the config file reach jobs enqueued after the edit.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::{self, Receiver};

use super::export::start_pipeline;
use crate::actor::Coordinator;
use crate::cli::Cli;
use crate::config::{ConfigReloader, ExporterConfig};
use crate::core::{register_server, register_shutdown_signal};
use crate::embed::gallery::ScriptVars;
use crate::gallery::{GalleryContext, GalleryServer, SystemReveal, open_in_browser};
use crate::scheduler::ExportScheduler;
use crate::status::StatusStore;
use crate::{debug, log};

/// Run the daemon until Ctrl+C.
pub fn watch(cli: &Cli, config: Arc<ExporterConfig>) -> Result<()> {
    let (store, scheduler) = start_pipeline(&config)?;
    let reloader = config
        .config_path
        .clone()
        .map(|path| ConfigReloader::new(cli.clone(), path));

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    register_shutdown_signal(shutdown_tx);

    if let Some(root) = config.root() {
        log!("watch"; "{}", root.display());
    }

    let result = if config.serve.enable {
        serve_and_watch(&config, &store, &scheduler, reloader, shutdown_rx)
    } else {
        let handle = spawn_actors(
            Arc::clone(&config),
            Arc::clone(&scheduler),
            Arc::clone(&store),
            reloader,
            shutdown_rx,
        );
        let _ = handle.join();
        Ok(())
    };

    scheduler.shutdown();
    result
}

fn serve_and_watch(
    config: &Arc<ExporterConfig>,
    store: &Arc<StatusStore>,
    scheduler: &Arc<ExportScheduler>,
    reloader: Option<ConfigReloader>,
    shutdown_rx: Receiver<()>,
) -> Result<()> {
    let server = GalleryServer::bind(config.serve.interface, config.serve.port)?;
    register_server(server.handle());

    let url = server.url();
    log!("serve"; "{}", url);
    if config.serve.open_browser
        && let Err(e) = open_in_browser(&url)
    {
        log!("serve"; "failed to open browser: {}", e);
    }

    let ctx = Arc::new(GalleryContext {
        store: Arc::clone(store),
        scheduler: Arc::clone(scheduler),
        reveal: Arc::new(SystemReveal),
        script: script_vars(config.serve.poll_interval_ms),
        title: gallery_title(config),
    });

    let handle = spawn_actors(
        Arc::clone(config),
        Arc::clone(scheduler),
        Arc::clone(store),
        reloader,
        shutdown_rx,
    );
    server.run(ctx)?;
    wait_for_shutdown(handle);
    Ok(())
}

/// Spawn the actor runtime on its own thread.
fn spawn_actors(
    config: Arc<ExporterConfig>,
    scheduler: Arc<ExportScheduler>,
    store: Arc<StatusStore>,
    reloader: Option<ConfigReloader>,
    shutdown_rx: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                log!("actor"; "failed to create tokio runtime: {}", e);
                crate::core::request_shutdown();
                return;
            }
        };

        rt.block_on(async {
            let mut coordinator =
                Coordinator::new(config, scheduler, store).with_shutdown_signal(shutdown_rx);
            if let Some(reloader) = reloader {
                coordinator = coordinator.with_config_reload(reloader);
            }
            if let Err(e) = coordinator.run().await {
                log!("actor"; "error: {}", e);
                crate::core::request_shutdown();
            }
        });
    })
}

/// Wait for the actor thread to stop (max 2 seconds).
fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
    debug!("actor"; "did not stop in time");
}

/// Client polling settings for a given interval.
fn script_vars(poll_interval_ms: u64) -> ScriptVars {
    ScriptVars {
        poll_interval_ms,
        poll_timeout_ms: poll_interval_ms * 4 / 5,
        ..ScriptVars::default()
    }
}

fn gallery_title(config: &ExporterConfig) -> String {
    let name = config
        .root()
        .and_then(|root| root.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name.is_empty() {
        "inkwatch".to_string()
    } else {
        format!("{name} - inkwatch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_vars_timeout_below_interval() {
        let vars = script_vars(500);
        assert_eq!(vars.poll_interval_ms, 500);
        assert_eq!(vars.poll_timeout_ms, 400);
        assert_eq!(vars.restore_delay_ms, ScriptVars::default().restore_delay_ms);
    }

    #[test]
    fn test_gallery_title() {
        let mut config = ExporterConfig::default();
        assert_eq!(gallery_title(&config), "inkwatch");

        config.watch.root = Some("/home/me/figures".into());
        assert_eq!(gallery_title(&config), "figures - inkwatch");
    }
}
