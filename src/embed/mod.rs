//! Embedded static resources of the gallery page.
//!
//! # Usage
//!
//! ```ignore
//! use embed::gallery::{GALLERY_HTML, GALLERY_JS, PageVars, ScriptVars};
//!
//! let html = GALLERY_HTML.render(&PageVars { title: "inkwatch", version: "0.1.0" });
//! let js = GALLERY_JS.render(&ScriptVars::default());
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod gallery {
    use super::{Template, TemplateVars};

    /// Variables for gallery.html.
    pub struct PageVars<'a> {
        pub title: &'a str,
        pub version: &'a str,
    }

    impl TemplateVars for PageVars<'_> {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__TITLE__", &crate::utils::html::escape(self.title))
                .replace("__VERSION__", self.version)
        }
    }

    /// Timing of the browser polling loop.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ScriptVars {
        pub poll_interval_ms: u64,
        /// Bound on a single poll; shorter than the interval.
        pub poll_timeout_ms: u64,
        /// Minimum time an action button stays in its pressed state.
        pub restore_delay_ms: u64,
    }

    impl Default for ScriptVars {
        fn default() -> Self {
            Self {
                poll_interval_ms: 1000,
                poll_timeout_ms: 800,
                restore_delay_ms: 400,
            }
        }
    }

    impl TemplateVars for ScriptVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__POLL_INTERVAL_MS__", &self.poll_interval_ms.to_string())
                .replace("__POLL_TIMEOUT_MS__", &self.poll_timeout_ms.to_string())
                .replace("__RESTORE_DELAY_MS__", &self.restore_delay_ms.to_string())
        }
    }

    /// Dashboard page.
    pub const GALLERY_HTML: Template<PageVars<'static>> =
        Template::new(include_str!("gallery/gallery.html"));

    /// Polling client with timing injection.
    pub const GALLERY_JS: Template<ScriptVars> =
        Template::new(include_str!("gallery/gallery.js"));

    pub const GALLERY_CSS: &str = include_str!("gallery/gallery.css");
}

#[cfg(test)]
mod tests {
    use super::gallery::*;

    #[test]
    fn test_gallery_html() {
        let html = GALLERY_HTML.render(&PageVars {
            title: "figs <draft>",
            version: "1.2.3",
        });
        assert!(html.contains("figs &lt;draft&gt;"));
        assert!(html.contains("1.2.3"));
        assert!(html.contains("/gallery.js"));
        assert!(!html.contains("__TITLE__"));
        assert!(!html.contains("__VERSION__"));
    }

    #[test]
    fn test_gallery_js_with_vars() {
        let vars = ScriptVars {
            poll_interval_ms: 1500,
            poll_timeout_ms: 1200,
            restore_delay_ms: 250,
        };
        let js = GALLERY_JS.render(&vars);
        assert!(js.contains("1500"));
        assert!(js.contains("1200"));
        assert!(js.contains("250"));
        assert!(!js.contains("__POLL_INTERVAL_MS__"));
        assert!(!js.contains("__POLL_TIMEOUT_MS__"));
        assert!(!js.contains("__RESTORE_DELAY_MS__"));
    }

    #[test]
    fn test_gallery_css_has_banner() {
        assert!(GALLERY_CSS.contains(".serverdown"));
    }
}
