//! `inkwatch gallery`: terminal client for a running daemon.

use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver};

use crate::client::{GalleryClient, HttpGalleryApi, TerminalRenderer};
use crate::config::ExporterConfig;
use crate::core::{is_shutdown, register_shutdown_signal};
use crate::log;

/// Poll the gallery at `url` (or the configured server) until Ctrl+C.
pub fn run_gallery(config: &ExporterConfig, url: Option<&str>) -> Result<()> {
    let base = url.map_or_else(|| config.serve.url(), str::to_owned);
    let api = HttpGalleryApi::new(base).context("failed to create http client")?;

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    register_shutdown_signal(shutdown_tx);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    log!("gallery"; "polling {}", api.base());
    rt.block_on(async {
        let client =
            GalleryClient::new(api, TerminalRenderer).interval(config.serve.poll_interval());
        client.run(wait_for_signal(shutdown_rx)).await;
    });
    Ok(())
}

async fn wait_for_signal(rx: Receiver<()>) {
    while rx.try_recv().is_err() && !is_shutdown() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
