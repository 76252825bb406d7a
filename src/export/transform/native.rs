use std::fs;
use std::path::Path;

use super::{DocumentTransform, TransformError, preflight};
use crate::export::{ExportFormat, ExportOptions, write_atomic};

/// Plain-SVG export through usvg, no external tools involved.
///
/// Parsing resolves styles, `<use>` references and transforms into a
/// normalized tree which is then re-serialized. Output depends only on the
/// input bytes and options.
#[derive(Debug, Default)]
pub struct NativeTransform;

impl NativeTransform {
    pub fn supports(format: ExportFormat) -> bool {
        format == ExportFormat::PlainSvg
    }

    /// Render `data` to normalized plain SVG.
    pub fn render(data: &[u8], options: &ExportOptions) -> Result<String, TransformError> {
        let usvg_options = usvg::Options {
            dpi: options.dpi,
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(data, &usvg_options)
            .map_err(|e| TransformError::MalformedSource(e.to_string()))?;

        let write_options = usvg::WriteOptions {
            indent: usvg::Indent::None,
            ..Default::default()
        };
        let svg = tree.to_string(&write_options);

        let margin = options.margin_px();
        if margin > 0.0 {
            let size = tree.size();
            return Ok(apply_margin(&svg, size.width(), size.height(), margin));
        }
        Ok(svg)
    }
}

impl DocumentTransform for NativeTransform {
    fn name(&self) -> &'static str {
        "native"
    }

    fn export(
        &self,
        source: &Path,
        format: ExportFormat,
        options: &ExportOptions,
        output: &Path,
    ) -> Result<(), TransformError> {
        if !Self::supports(format) {
            return Err(TransformError::UnsupportedFormat(format));
        }

        let data = fs::read(source)?;
        preflight(&data)?;
        let svg = Self::render(&data, options)?;

        write_atomic(output, |target| {
            fs::write(target, svg.as_bytes())?;
            Ok(())
        })
    }
}

/// Grow the canvas by `margin` on every side.
fn apply_margin(svg: &str, width: f32, height: f32, margin: f32) -> String {
    let (w, h) = (width + 2.0 * margin, height + 2.0 * margin);
    let svg = replace_attr(svg, "width", &w.to_string());
    let svg = replace_attr(&svg, "height", &h.to_string());
    replace_attr(&svg, "viewBox", &format!("{} {} {w} {h}", -margin, -margin))
}

/// Replace (or insert) an attribute on the root `<svg>` element.
fn replace_attr(svg: &str, name: &str, value: &str) -> String {
    let Some(open) = svg.find("<svg") else {
        return svg.to_string();
    };
    let tag_end = svg[open..].find('>').map_or(svg.len(), |i| open + i);
    let tag = &svg[open..tag_end];

    let needle = format!(" {name}=\"");
    if let Some(pos) = tag.find(&needle) {
        let value_start = open + pos + needle.len();
        if let Some(len) = svg[value_start..].find('"') {
            return format!("{}{value}{}", &svg[..value_start], &svg[value_start + len..]);
        }
    }

    let insert = open + 4;
    format!("{} {name}=\"{value}\"{}", &svg[..insert], &svg[insert..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SOURCE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50" viewBox="0 0 100 50">
  <style>rect { fill: red; }</style>
  <rect x="10" y="10" width="20" height="20"/>
</svg>"#;

    #[test]
    fn test_render_is_deterministic() {
        let options = ExportOptions::default();
        let a = NativeTransform::render(SOURCE.as_bytes(), &options).unwrap();
        let b = NativeTransform::render(SOURCE.as_bytes(), &options).unwrap();
        assert_eq!(a, b);
        assert!(!a.contains("<style"));
    }

    #[test]
    fn test_render_with_margin() {
        let options = ExportOptions {
            margin_mm: 25.4,
            ..Default::default()
        };
        let svg = NativeTransform::render(SOURCE.as_bytes(), &options).unwrap();
        let m = options.margin_px();
        let (w, h) = (100.0 + 2.0 * m, 50.0 + 2.0 * m);
        assert!(svg.contains(&format!("viewBox=\"{} {} {w} {h}\"", -m, -m)));
        assert!(svg.contains(&format!(" width=\"{w}\"")));
    }

    #[test]
    fn test_replace_attr_inserts_when_missing() {
        let svg = replace_attr("<svg width=\"1\"><g/></svg>", "viewBox", "0 0 1 1");
        assert_eq!(svg, "<svg viewBox=\"0 0 1 1\" width=\"1\"><g/></svg>");
    }

    #[test]
    fn test_replace_attr_only_touches_root() {
        let svg = replace_attr(
            "<svg width=\"1\"><rect width=\"5\"/></svg>",
            "width",
            "9",
        );
        assert_eq!(svg, "<svg width=\"9\"><rect width=\"5\"/></svg>");
    }

    #[test]
    fn test_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("plot.svg");
        fs::write(&source, SOURCE).unwrap();

        let result = NativeTransform.export(
            &source,
            ExportFormat::Pdf,
            &ExportOptions::default(),
            &dir.path().join("plot.pdf"),
        );
        assert_eq!(result, Err(TransformError::UnsupportedFormat(ExportFormat::Pdf)));
    }

    #[test]
    fn test_export_plain_svg_idempotent() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("plot.svg");
        let output = dir.path().join("plot_portable.svg");
        fs::write(&source, SOURCE).unwrap();
        let options = ExportOptions::default();

        NativeTransform
            .export(&source, ExportFormat::PlainSvg, &options, &output)
            .unwrap();
        let first = fs::read(&output).unwrap();
        NativeTransform
            .export(&source, ExportFormat::PlainSvg, &options, &output)
            .unwrap();
        assert_eq!(fs::read(&output).unwrap(), first);
    }

    #[test]
    fn test_malformed_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("plot.svg");
        fs::write(&source, "<svg><g></svg>").unwrap();

        let result = NativeTransform.export(
            &source,
            ExportFormat::PlainSvg,
            &ExportOptions::default(),
            &dir.path().join("plot_portable.svg"),
        );
        assert!(matches!(result, Err(TransformError::MalformedSource(_))));
        assert!(!dir.path().join("plot_portable.svg").exists());
    }
}
