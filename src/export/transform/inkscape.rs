use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::{DocumentTransform, TransformError, preflight};
use crate::export::{ExportFormat, ExportOptions, write_atomic};
use crate::utils::exec::{Cmd, FilterRule, format_error};

/// GTK/GLib chatter Inkscape prints on every run.
const INKSCAPE_FILTER: FilterRule = FilterRule::new(&[
    "Gtk-Message",
    "Gtk-WARNING",
    "(inkscape:",
    "Fontconfig warning",
    "Background RRGGBBAA",
]);

/// stderr fragments that mean the failure is about the environment, not the
/// document: worth retrying.
const TRANSIENT_MARKERS: &[&str] = &[
    "locked",
    "lock file",
    "permission denied",
    "access is denied",
    "read-only",
    "i/o error",
    "input/output error",
    "no space left",
    "resource temporarily unavailable",
    "device or resource busy",
    "could not open",
    "can't open",
    "failed to open",
];

pub struct InkscapeTransform {
    binary: PathBuf,
}

impl InkscapeTransform {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Use `configured` if given, otherwise look `inkscape` up on `PATH`.
    pub fn locate(configured: Option<&Path>) -> Option<Self> {
        match configured {
            Some(path) if path.is_file() => Some(Self::new(path.to_path_buf())),
            Some(path) => which::which(path).ok().map(Self::new),
            None => which::which("inkscape").ok().map(Self::new),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Command-line arguments for one export into `target`.
    fn args(
        source: &Path,
        format: ExportFormat,
        options: &ExportOptions,
        target: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut flag = |s: String| args.push(s.into());

        let export_type = match format {
            ExportFormat::PlainSvg => "svg",
            other => other.extension(),
        };
        flag(format!("--export-type={export_type}"));
        if format == ExportFormat::PlainSvg {
            flag("--export-plain-svg".into());
        }
        flag(format!("--export-dpi={}", options.dpi));
        if options.backing_rect {
            flag("--export-background=#ffffff".into());
            flag("--export-background-opacity=1.0".into());
        }
        if options.text_to_path {
            flag("--export-text-to-path".into());
        }
        if options.stroke_to_path {
            flag("--actions=select-all:all;object-stroke-to-path".into());
        }
        if options.margin_mm > 0.0 {
            flag(format!("--export-margin={}", options.margin_mm));
        }
        if options.omit_text_emit_latex && matches!(format, ExportFormat::Pdf | ExportFormat::Eps)
        {
            flag("--export-latex".into());
        }

        let mut filename = OsString::from("--export-filename=");
        filename.push(target);
        args.push(filename);
        args.push(source.as_os_str().to_owned());
        args
    }
}

impl DocumentTransform for InkscapeTransform {
    fn name(&self) -> &'static str {
        "inkscape"
    }

    fn export(
        &self,
        source: &Path,
        format: ExportFormat,
        options: &ExportOptions,
        output: &Path,
    ) -> Result<(), TransformError> {
        let data = fs::read(source)?;
        preflight(&data)?;

        write_atomic(output, |target| {
            let result = Cmd::new(&self.binary)
                .args(Self::args(source, format, options, target))
                .output();
            let output = match result {
                Ok(output) => output,
                Err(e) => return Err(TransformError::ResourceUnavailable(format!("{e:#}"))),
            };

            if !output.status.success() {
                let message = format_error("inkscape", &output, &INKSCAPE_FILTER);
                return Err(classify_failure(&message));
            }
            if !target.is_file() {
                return Err(TransformError::ResourceUnavailable(format!(
                    "inkscape reported success but wrote no {format} output"
                )));
            }

            let stderr = String::from_utf8_lossy(&output.stderr);
            for line in INKSCAPE_FILTER.keep(&stderr) {
                crate::debug!("inkscape"; "{line}");
            }
            Ok(())
        })
    }
}

/// Map a failed Inkscape run onto the error taxonomy.
fn classify_failure(message: &str) -> TransformError {
    let lower = message.to_ascii_lowercase();
    if TRANSIENT_MARKERS.iter().any(|m| lower.contains(m)) {
        TransformError::ResourceUnavailable(message.to_string())
    } else {
        TransformError::MalformedSource(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_args_pdf_defaults() {
        let args = InkscapeTransform::args(
            Path::new("/w/plot.svg"),
            ExportFormat::Pdf,
            &ExportOptions::default(),
            Path::new("/w/.plot.partial.pdf"),
        );
        let args = arg_strings(&args);
        assert_eq!(args[0], "--export-type=pdf");
        assert!(args.contains(&"--export-dpi=600".to_string()));
        assert!(args.contains(&"--export-background=#ffffff".to_string()));
        assert!(args.contains(&"--export-filename=/w/.plot.partial.pdf".to_string()));
        assert_eq!(args.last().unwrap(), "/w/plot.svg");
        assert!(!args.iter().any(|a| a == "--export-latex"));
    }

    #[test]
    fn test_args_plain_svg() {
        let options = ExportOptions {
            text_to_path: true,
            margin_mm: 2.0,
            backing_rect: false,
            ..Default::default()
        };
        let args = InkscapeTransform::args(
            Path::new("/w/plot.svg"),
            ExportFormat::PlainSvg,
            &options,
            Path::new("/w/.plot_portable.partial.svg"),
        );
        let args = arg_strings(&args);
        assert_eq!(args[0], "--export-type=svg");
        assert!(args.contains(&"--export-plain-svg".to_string()));
        assert!(args.contains(&"--export-text-to-path".to_string()));
        assert!(args.contains(&"--export-margin=2".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--export-background")));
    }

    #[test]
    fn test_args_latex_only_for_vector_print_formats() {
        let options = ExportOptions {
            omit_text_emit_latex: true,
            ..Default::default()
        };
        let pdf = arg_strings(&InkscapeTransform::args(
            Path::new("a.svg"),
            ExportFormat::Pdf,
            &options,
            Path::new("a.pdf"),
        ));
        let png = arg_strings(&InkscapeTransform::args(
            Path::new("a.svg"),
            ExportFormat::Png,
            &options,
            Path::new("a.png"),
        ));
        assert!(pdf.contains(&"--export-latex".to_string()));
        assert!(!png.contains(&"--export-latex".to_string()));
    }

    #[test]
    fn test_classify_failure() {
        assert!(classify_failure("Permission denied: /w/plot.pdf").is_transient());
        assert!(classify_failure("file is locked by another process").is_transient());
        assert!(!classify_failure("parser error : Premature end of data").is_transient());
        assert!(classify_failure("cannot create lock file /w/.plot.pdf.lck").is_transient());
        assert!(!classify_failure("Unknown block element <flowRoot>").is_transient());
        assert!(!classify_failure("invalid clock value in <animate>").is_transient());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_binary_leaves_no_output() {
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let source = dir.path().join("plot.svg");
        let output = dir.path().join("plot.pdf");
        fs::write(&source, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();

        // `false` ignores its arguments and exits 1.
        let transform = InkscapeTransform::new(PathBuf::from("false"));
        let result = transform.export(&source, ExportFormat::Pdf, &ExportOptions::default(), &output);

        assert!(matches!(result, Err(TransformError::MalformedSource(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_malformed_source_skips_process() {
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let source = dir.path().join("plot.svg");
        fs::write(&source, "<svg><g></svg>").unwrap();

        let transform = InkscapeTransform::new(PathBuf::from("/nonexistent/inkscape"));
        let result = transform.export(
            &source,
            ExportFormat::Pdf,
            &ExportOptions::default(),
            &dir.path().join("plot.pdf"),
        );
        assert!(matches!(result, Err(TransformError::MalformedSource(_))));
    }
}
