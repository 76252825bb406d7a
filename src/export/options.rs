//! The declarative options bundle handed to a document transform.
//!
//! Deserialized straight from the `[export]` config section.
//!
//! ```toml
//! [export]
//! formats = ["pdf", "png"]    # pdf | png | emf | eps | plain-svg
//! dpi = 600                   # rasterization DPI
//! resample_images = true      # resample embedded bitmaps
//! resample_dpi = 300          # DPI for resampled bitmaps
//! text_to_path = false
//! stroke_to_path = false
//! prevent_thin_line_enhancement = true
//! margin_mm = 0.0
//! backing_rect = true         # opaque white background
//! omit_text_emit_latex = false
//! ```

use serde::{Deserialize, Serialize};

use super::ExportFormat;

/// Immutable export settings. Jobs hold a snapshot behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub formats: Vec<ExportFormat>,
    pub dpi: f32,
    pub resample_images: bool,
    pub resample_dpi: f32,
    pub text_to_path: bool,
    pub stroke_to_path: bool,
    pub prevent_thin_line_enhancement: bool,
    pub margin_mm: f32,
    pub backing_rect: bool,
    pub omit_text_emit_latex: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            formats: vec![ExportFormat::Pdf, ExportFormat::Png],
            dpi: 600.0,
            resample_images: true,
            resample_dpi: 300.0,
            text_to_path: false,
            stroke_to_path: false,
            prevent_thin_line_enhancement: true,
            margin_mm: 0.0,
            backing_rect: true,
            omit_text_emit_latex: false,
        }
    }
}

impl ExportOptions {
    /// Requested formats in a stable order, duplicates removed.
    pub fn formats(&self) -> Vec<ExportFormat> {
        let mut formats = self.formats.clone();
        formats.sort();
        formats.dedup();
        formats
    }

    /// Problems with these options as `(field, message)` pairs.
    pub fn problems(&self) -> Vec<(&'static str, String)> {
        let mut problems = Vec::new();
        if self.formats.is_empty() {
            problems.push(("export.formats", "at least one format is required".into()));
        }
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            problems.push(("export.dpi", format!("must be > 0, got {}", self.dpi)));
        }
        if !(self.resample_dpi.is_finite() && self.resample_dpi > 0.0) {
            problems.push((
                "export.resample_dpi",
                format!("must be > 0, got {}", self.resample_dpi),
            ));
        }
        if !(self.margin_mm.is_finite() && self.margin_mm >= 0.0) {
            problems.push((
                "export.margin_mm",
                format!("must be >= 0, got {}", self.margin_mm),
            ));
        }
        problems
    }

    /// Margin converted to user units (px at 96 DPI).
    pub fn margin_px(&self) -> f32 {
        self.margin_mm * 96.0 / 25.4
    }
}
