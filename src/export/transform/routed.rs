use std::path::Path;

use super::{DocumentTransform, InkscapeTransform, NativeTransform, TransformError};
use crate::export::{ExportFormat, ExportOptions};

/// Inkscape for everything when installed; the native transform otherwise.
pub struct RoutedTransform {
    inkscape: Option<InkscapeTransform>,
    native: NativeTransform,
}

impl RoutedTransform {
    pub fn new(inkscape: Option<InkscapeTransform>) -> Self {
        Self {
            inkscape,
            native: NativeTransform,
        }
    }

    /// Locate Inkscape (see [`InkscapeTransform::locate`]) and route around it.
    pub fn detect(configured: Option<&Path>) -> Self {
        let inkscape = InkscapeTransform::locate(configured);
        match &inkscape {
            Some(ink) => crate::debug!("export"; "using inkscape at {}", ink.binary().display()),
            None => crate::log!(
                "export";
                "inkscape not found, only plain-svg can be exported"
            ),
        }
        Self::new(inkscape)
    }

    pub fn has_inkscape(&self) -> bool {
        self.inkscape.is_some()
    }

    fn route(&self, format: ExportFormat) -> Option<&dyn DocumentTransform> {
        match &self.inkscape {
            Some(ink) => Some(ink as &dyn DocumentTransform),
            None if NativeTransform::supports(format) => Some(&self.native as &dyn DocumentTransform),
            None => None,
        }
    }
}

impl DocumentTransform for RoutedTransform {
    fn name(&self) -> &'static str {
        if self.has_inkscape() { "inkscape" } else { "native" }
    }

    fn export(
        &self,
        source: &Path,
        format: ExportFormat,
        options: &ExportOptions,
        output: &Path,
    ) -> Result<(), TransformError> {
        let transform = self
            .route(format)
            .ok_or(TransformError::UnsupportedFormat(format))?;
        transform.export(source, format, options, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_without_inkscape_routes_plain_svg_natively() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("plot.svg");
        fs::write(&source, r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#)
            .unwrap();

        let routed = RoutedTransform::new(None);
        let options = ExportOptions::default();

        routed
            .export(&source, ExportFormat::PlainSvg, &options, &dir.path().join("plot_portable.svg"))
            .unwrap();
        assert_eq!(
            routed.export(&source, ExportFormat::Png, &options, &dir.path().join("plot.png")),
            Err(TransformError::UnsupportedFormat(ExportFormat::Png))
        );
        assert_eq!(routed.name(), "native");
    }
}
