//! MIME type detection utilities.
//!
//! Provides consistent MIME type detection for the gallery server.

use std::path::Path;

/// Common MIME type constants.
pub mod types {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const JSON: &str = "application/json";

    pub const PDF: &str = "application/pdf";
    pub const POSTSCRIPT: &str = "application/postscript";
    pub const EMF: &str = "image/emf";
    pub const OCTET_STREAM: &str = "application/octet-stream";

    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const SVG: &str = "image/svg+xml";
}

/// Get MIME type from file path.
#[inline]
pub fn from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    from_extension(ext.as_deref())
}

/// Get MIME type from a lowercase file extension.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext {
        Some("html" | "htm") => types::HTML,
        Some("css") => types::CSS,
        Some("js") => types::JAVASCRIPT,
        Some("json") => types::JSON,
        Some("txt") => types::PLAIN,

        Some("svg") => types::SVG,
        Some("png") => types::PNG,
        Some("jpg" | "jpeg") => types::JPEG,
        Some("emf") => types::EMF,

        Some("pdf") => types::PDF,
        Some("eps" | "ps") => types::POSTSCRIPT,

        _ => types::OCTET_STREAM,
    }
}

/// Whether a browser can show this MIME type in an `<img>` tag.
pub fn is_displayable_image(mime: &str) -> bool {
    matches!(mime, types::PNG | types::JPEG | types::SVG)
}
