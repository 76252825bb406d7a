//! Process lifecycle state.
//!
//! `SHUTDOWN` is the only process-wide flag: set by Ctrl+C, read by the
//! gallery server and the command loops. Everything else lives in owned
//! objects passed around by `Arc`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the coordinator
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on what has been registered:
/// - Nothing: exit immediately, there is nothing to wind down
/// - A shutdown channel: notify the coordinator
/// - A server: additionally unblock its request loop
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        let notified = SHUTDOWN_TX.get().is_some_and(|tx| tx.send(()).is_ok());

        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else if !notified {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the shutdown channel the coordinator waits on
pub fn register_shutdown_signal(shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Register the HTTP server for graceful shutdown
///
/// Call this after binding the server, before entering the request loop
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Check if shutdown has been requested
///
/// Uses Relaxed ordering - worst case is processing a few more items
/// before stopping
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Request shutdown without a signal (e.g. a fatal error in a background task)
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);
    if let Some(tx) = SHUTDOWN_TX.get() {
        let _ = tx.send(());
    }
    if let Some(server) = SERVER.get() {
        server.unblock();
    }
}
