//! Request routing, independent of the HTTP transport.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tiny_http::Method;

use super::GalleryContext;
use super::uri::{UriError, file_param, request_path};
use super::view::{GalleryData, RefreshInfo};
use crate::embed::gallery::{GALLERY_CSS, GALLERY_HTML, GALLERY_JS, PageVars};
use crate::utils::mime::{self, types};

#[derive(Debug, PartialEq, Eq)]
pub enum Body {
    Bytes(Vec<u8>),
    /// Streamed from disk.
    File(PathBuf),
}

#[derive(Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Body,
}

impl Reply {
    fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type,
            body: Body::Bytes(body.into()),
        }
    }

    fn text(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            content_type: types::PLAIN,
            body: Body::Bytes(message.into().into_bytes()),
        }
    }

    fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::ok(types::JSON, body),
            Err(e) => Self::text(500, format!("500 Internal Server Error: {e}")),
        }
    }

    fn accepted() -> Self {
        Self::text(202, "202 Accepted")
    }

    fn bad_request(error: &UriError) -> Self {
        Self::text(400, format!("400 Bad Request: {error}"))
    }

    fn not_found() -> Self {
        Self::text(404, "404 Not Found")
    }

    fn unknown_file(path: &Path) -> Self {
        Self::text(404, format!("404 Not Found: {}", path.display()))
    }

    pub fn method_not_allowed() -> Self {
        Self::text(405, "405 Method Not Allowed")
    }

    pub fn unavailable() -> Self {
        Self::text(503, "503 Service Unavailable")
    }
}

/// Answer a request. `HEAD` is routed like `GET` but triggers no action.
pub fn route(ctx: &GalleryContext, method: &Method, target: &str) -> Reply {
    let dispatch = match method {
        Method::Get => true,
        Method::Head => false,
        _ => return Reply::method_not_allowed(),
    };

    match request_path(target).as_str() {
        "/" | "/index.html" => Reply::ok(
            types::HTML,
            GALLERY_HTML.render(&PageVars {
                title: &ctx.title,
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
        "/gallery.js" => Reply::ok(types::JAVASCRIPT, GALLERY_JS.render(&ctx.script)),
        "/gallery.css" => Reply::ok(types::CSS, GALLERY_CSS),
        "/check_for_refresh" => Reply::json(&RefreshInfo {
            lastupdate: ctx.store.counter(),
        }),
        "/gallery_data" => Reply::json(&GalleryData::from_snapshot(&ctx.store.snapshot())),
        "/process" => process(ctx, target, dispatch),
        "/show_file" => show_file(ctx, target, dispatch),
        "/thumbnail" => thumbnail(ctx, target),
        _ => Reply::not_found(),
    }
}

/// Re-export the source owning the referenced file.
fn process(ctx: &GalleryContext, target: &str, dispatch: bool) -> Reply {
    let path = match file_param(target) {
        Ok(path) => path,
        Err(e) => return Reply::bad_request(&e),
    };
    let Some(source) = ctx.store.action_source(&path) else {
        return Reply::unknown_file(&path);
    };

    if dispatch {
        let enqueued = ctx.scheduler.on_change(&source);
        crate::debug!("gallery"; "process {}: {:?}", ctx.store.header(&source), enqueued);
    }
    Reply::accepted()
}

fn show_file(ctx: &GalleryContext, target: &str, dispatch: bool) -> Reply {
    let path = match file_param(target) {
        Ok(path) => path,
        Err(e) => return Reply::bad_request(&e),
    };
    if !ctx.store.is_known_file(&path) {
        return Reply::unknown_file(&path);
    }

    if dispatch && let Err(e) = ctx.reveal.reveal(&path) {
        crate::log!("gallery"; "cannot show {}: {e:#}", path.display());
    }
    Reply::accepted()
}

/// Stream a file the store knows about, and nothing else.
fn thumbnail(ctx: &GalleryContext, target: &str) -> Reply {
    let path = match file_param(target) {
        Ok(path) => path,
        Err(e) => return Reply::bad_request(&e),
    };
    if !ctx.store.is_known_file(&path) || !path.is_file() {
        return Reply::unknown_file(&path);
    }

    Reply {
        status: 200,
        content_type: mime::from_path(&path),
        body: Body::File(path),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
    use tempfile::TempDir;

    use super::*;
    use crate::embed::gallery::ScriptVars;
    use crate::export::transform::NativeTransform;
    use crate::export::{ExportFormat, ExportOptions, OutputLayout};
    use crate::gallery::Reveal;
    use crate::gallery::uri::{action_url, thumbnail_url};
    use crate::scheduler::ExportScheduler;
    use crate::export::TransformError;
    use crate::status::{
        ArtifactOutcome, ExportArtifact, FormatResult, SourceStatus, StatusStore,
    };

    #[derive(Default)]
    struct RecordingReveal {
        revealed: Mutex<Vec<PathBuf>>,
    }

    impl Reveal for RecordingReveal {
        fn reveal(&self, path: &Path) -> anyhow::Result<()> {
            self.revealed.lock().push(path.to_path_buf());
            Ok(())
        }
    }

    struct Fixture {
        dir: TempDir,
        ctx: GalleryContext,
        reveal: Arc<RecordingReveal>,
    }

    impl Fixture {
        /// A store knowing `plot.svg` with a PNG artifact, and a scheduler
        /// without workers so queued jobs stay visible.
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let root = dir.path().to_path_buf();
            let source = root.join("plot.svg");
            let png = root.join("plot.png");
            fs::write(&source, "<svg xmlns='http://www.w3.org/2000/svg'/>").unwrap();
            fs::write(&png, b"\x89PNG").unwrap();
            fs::write(root.join("secret.txt"), "nope").unwrap();

            let store = Arc::new(StatusStore::new(root.clone()));
            store.record_discovered(
                &source,
                vec![ExportArtifact::new(ExportFormat::Png, png, &source)],
            );
            let scheduler = Arc::new(ExportScheduler::new(
                Arc::new(NativeTransform),
                OutputLayout::new(root, None),
                Arc::clone(&store),
                ExportOptions::default(),
            ));
            let reveal = Arc::new(RecordingReveal::default());
            let ctx = GalleryContext {
                store,
                scheduler,
                reveal: Arc::clone(&reveal) as Arc<dyn Reveal>,
                script: ScriptVars::default(),
                title: "inkwatch".into(),
            };
            Self { dir, ctx, reveal }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn get(&self, target: &str) -> Reply {
            route(&self.ctx, &Method::Get, target)
        }
    }

    fn body_json(reply: &Reply) -> serde_json::Value {
        match &reply.body {
            Body::Bytes(bytes) => serde_json::from_slice(bytes).unwrap(),
            Body::File(_) => panic!("expected bytes"),
        }
    }

    #[test]
    fn test_static_routes() {
        let fx = Fixture::new();
        let page = fx.get("/");
        assert_eq!(page.status, 200);
        assert_eq!(page.content_type, types::HTML);

        assert_eq!(fx.get("/gallery.js").content_type, types::JAVASCRIPT);
        assert_eq!(fx.get("/gallery.css").content_type, types::CSS);
        assert_eq!(fx.get("/nope").status, 404);
    }

    #[test]
    fn test_check_for_refresh_and_data() {
        let fx = Fixture::new();
        let refresh = fx.get("/check_for_refresh");
        assert_eq!(body_json(&refresh)["lastupdate"], fx.ctx.store.counter());

        let data = body_json(&fx.get("/gallery_data"));
        let group = &data["gallery_data"][0];
        assert_eq!(group["header"], "plot.svg");
        assert_eq!(group["processing"], false);
        assert_eq!(group["files"][0]["currenttype"], "png");
    }

    #[test]
    fn test_process_artifact_queues_its_source() {
        let fx = Fixture::new();
        let source = fx.path("plot.svg");

        let reply = fx.get(&action_url("process", &fx.path("plot.png")));
        assert_eq!(reply.status, 202);
        assert!(fx.ctx.scheduler.is_busy(&source));
        assert_eq!(
            fx.ctx.store.snapshot().groups[0].source.status,
            SourceStatus::Queued
        );
    }

    #[test]
    fn test_process_failed_format_queues_its_source() {
        let fx = Fixture::new();
        let source = fx.path("plot.svg");
        let outcome = ArtifactOutcome {
            generation: 1,
            fingerprint: None,
            results: vec![FormatResult {
                format: ExportFormat::Pdf,
                output_path: fx.path("plot.pdf"),
                result: Err(TransformError::MalformedSource("unexpected EOF".into())),
            }],
        };
        fx.ctx.store.record_artifacts(&source, &outcome);

        let data = body_json(&fx.get("/gallery_data"));
        let file = &data["gallery_data"][0]["files"][0];
        assert_eq!(file["currenttype"], "pdf");
        let uri = file["file_uri"].as_str().unwrap();

        let reply = fx.get(&format!("/process?param={}", utf8_percent_encode(uri, NON_ALPHANUMERIC)));
        assert_eq!(reply.status, 202);
        assert!(fx.ctx.scheduler.is_busy(&source));

        // Nothing was written, so there is nothing to stream or reveal.
        assert_eq!(fx.get(&thumbnail_url(&fx.path("plot.pdf"), 1)).status, 404);
        assert_eq!(fx.get(&action_url("show_file", &fx.path("plot.pdf"))).status, 404);
    }

    #[test]
    fn test_process_errors() {
        let fx = Fixture::new();
        assert_eq!(fx.get(&action_url("process", &fx.path("other.svg"))).status, 404);
        assert_eq!(fx.get("/process").status, 400);
        assert_eq!(fx.get("/process?param=plot.svg").status, 400);
        assert_eq!(fx.get("/process?param=http%3A%2F%2Fx%2Fa.svg").status, 400);
    }

    #[test]
    fn test_head_does_not_dispatch() {
        let fx = Fixture::new();
        let target = action_url("process", &fx.path("plot.svg"));
        let reply = route(&fx.ctx, &Method::Head, &target);
        assert_eq!(reply.status, 202);
        assert!(!fx.ctx.scheduler.is_busy(&fx.path("plot.svg")));
    }

    #[test]
    fn test_show_file_only_known_files() {
        let fx = Fixture::new();
        assert_eq!(fx.get(&action_url("show_file", &fx.path("plot.png"))).status, 202);
        assert_eq!(fx.get(&action_url("show_file", &fx.path("secret.txt"))).status, 404);
        assert_eq!(*fx.reveal.revealed.lock(), vec![fx.path("plot.png")]);
    }

    #[test]
    fn test_thumbnail_only_known_files() {
        let fx = Fixture::new();
        let png = fx.path("plot.png");
        let reply = fx.get(&thumbnail_url(&png, 0));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, types::PNG);
        assert_eq!(reply.body, Body::File(png));

        let secret = fx.get(&thumbnail_url(&fx.path("secret.txt"), 0));
        assert_eq!(secret.status, 404);
    }

    #[test]
    fn test_other_methods_rejected() {
        let fx = Fixture::new();
        assert_eq!(route(&fx.ctx, &Method::Post, "/process").status, 405);
        assert_eq!(route(&fx.ctx, &Method::Delete, "/").status, 405);
    }
}
