//! HTTP listener and request loop.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tiny_http::{Request, Server};

use super::GalleryContext;
use super::response::respond;
use super::routes::{Reply, route};
use crate::log;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Request handler threads; exports never run on them.
const HANDLER_THREADS: usize = 4;

pub struct GalleryServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

impl GalleryServer {
    pub fn bind(interface: IpAddr, port: u16) -> Result<Self> {
        let (server, addr) = bind_with_retry(interface, port)?;
        Ok(Self {
            server: Arc::new(server),
            addr,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Handle used to unblock the request loop on shutdown.
    pub fn handle(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Serve requests until the server is unblocked.
    pub fn run(&self, ctx: Arc<GalleryContext>) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(HANDLER_THREADS)
            .thread_name(|i| format!("gallery-{i}"))
            .build()
            .context("failed to create request thread pool")?;

        for request in self.server.incoming_requests() {
            let ctx = Arc::clone(&ctx);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &ctx) {
                    log!("gallery"; "request error: {e}");
                }
            });
        }
        Ok(())
    }
}

fn handle_request(request: Request, ctx: &GalleryContext) -> Result<()> {
    if crate::core::is_shutdown() {
        return respond(request, Reply::unavailable());
    }
    let reply = route(ctx, request.method(), request.url());
    respond(request, reply)
}

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("gallery"; "port {} in use, using {} instead", base_port, port);
                }
                // Port 0 picks a free port; report the real one.
                let addr = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
