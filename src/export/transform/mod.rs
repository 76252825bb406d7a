//! Document transforms: source + format + options → one artifact.
//!
//! Implementations:
//! - [`InkscapeTransform`]: drives the Inkscape command line
//! - [`NativeTransform`]: usvg-based plain-SVG export, no external tools
//! - [`RoutedTransform`]: Inkscape when available, native otherwise

mod inkscape;
mod native;
mod routed;

use std::io;
use std::path::Path;

use thiserror::Error;

use super::{ExportFormat, ExportOptions};

pub use inkscape::InkscapeTransform;
pub use native::NativeTransform;
pub use routed::RoutedTransform;

/// Typed failure of a single (source, format) export.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("unsupported format `{0}`")]
    UnsupportedFormat(ExportFormat),

    #[error("malformed source: {0}")]
    MalformedSource(String),

    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),
}

impl TransformError {
    /// Transient failures are retried; everything else is terminal.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ResourceUnavailable(_))
    }
}

impl From<io::Error> for TransformError {
    fn from(e: io::Error) -> Self {
        Self::ResourceUnavailable(e.to_string())
    }
}

/// Produces one artifact at `output` or a typed failure.
///
/// Implementations must never leave a partially written `output` visible;
/// see [`crate::export::write_atomic`].
pub trait DocumentTransform: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn export(
        &self,
        source: &Path,
        format: ExportFormat,
        options: &ExportOptions,
        output: &Path,
    ) -> Result<(), TransformError>;
}

/// Check that `data` is a well-formed XML document with an `<svg>` root.
pub fn preflight(data: &[u8]) -> Result<(), TransformError> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();
    let mut root_seen = false;
    let mut depth = 0usize;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed(&reader, &e))?;
        if matches!(event, Event::Start(_)) {
            depth += 1;
        } else if matches!(event, Event::End(_)) {
            depth = depth.saturating_sub(1);
        }
        match event {
            Event::Start(e) | Event::Empty(e) if !root_seen => {
                if e.local_name().as_ref() != b"svg" {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    return Err(TransformError::MalformedSource(format!(
                        "root element is <{name}>, expected <svg>"
                    )));
                }
                root_seen = true;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !root_seen {
        return Err(TransformError::MalformedSource("no root element".into()));
    }
    if depth > 0 {
        return Err(TransformError::MalformedSource(
            "unexpected end of document".into(),
        ));
    }
    Ok(())
}

fn malformed(reader: &quick_xml::Reader<&[u8]>, e: &quick_xml::Error) -> TransformError {
    TransformError::MalformedSource(format!(
        "XML error at byte {}: {e}",
        reader.buffer_position()
    ))
}
