//! Live gallery: a local HTTP dashboard over the status store.
//!
//! Endpoints:
//! - `/`, `/gallery.js`, `/gallery.css`: the dashboard page
//! - `/check_for_refresh`: the store's update counter
//! - `/gallery_data`: every group with its file records
//! - `/process`, `/show_file`: actions on a `file://` URI (`?param=`)
//! - `/thumbnail`: streams a file the store knows about
//!
//! Handlers only read published snapshots or enqueue work, so a running
//! export never delays a response.

mod response;
mod reveal;
mod routes;
mod server;
pub mod uri;
pub mod view;

use std::sync::Arc;

pub use reveal::{Reveal, SystemReveal, open_in_browser};
pub use server::GalleryServer;
pub use view::{FileView, GalleryData, GroupView, RefreshInfo};

use crate::embed::gallery::ScriptVars;
use crate::scheduler::ExportScheduler;
use crate::status::StatusStore;

/// Everything a request handler may touch.
pub struct GalleryContext {
    pub store: Arc<StatusStore>,
    pub scheduler: Arc<ExportScheduler>,
    pub reveal: Arc<dyn Reveal>,
    pub script: ScriptVars,
    /// Page title.
    pub title: String,
}
