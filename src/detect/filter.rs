use std::path::{Path, PathBuf};

/// Decides which files under the watched root are source documents.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    exclude_suffixes: Vec<String>,
    write_dir: Option<PathBuf>,
}

impl SourceFilter {
    pub fn new(exclude_suffixes: Vec<String>, write_dir: Option<PathBuf>) -> Self {
        let exclude_suffixes = exclude_suffixes
            .into_iter()
            .map(|s| s.to_ascii_lowercase())
            .collect();
        Self {
            exclude_suffixes,
            write_dir,
        }
    }

    /// Whether `path` is an exportable source.
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let lower = name.to_ascii_lowercase();

        if !lower.ends_with(".svg") || is_temp_file(path) {
            return false;
        }
        if self.exclude_suffixes.iter().any(|s| lower.ends_with(s)) {
            return false;
        }
        !self.is_output_path(path)
    }

    /// Whether `path` lies under the configured write directory.
    pub fn is_output_path(&self, path: &Path) -> bool {
        self.write_dir
            .as_deref()
            .is_some_and(|dir| path.starts_with(dir))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> SourceFilter {
        SourceFilter::new(vec!["_portable.svg".into()], Some(PathBuf::from("/w/out")))
    }

    #[test]
    fn test_accepts_svg() {
        assert!(filter().accepts(Path::new("/w/plot.svg")));
        assert!(filter().accepts(Path::new("/w/PLOT.SVG")));
    }

    #[test]
    fn test_rejects_other_extensions() {
        assert!(!filter().accepts(Path::new("/w/plot.pdf")));
        assert!(!filter().accepts(Path::new("/w/plot.svgz")));
    }

    #[test]
    fn test_rejects_plain_svg_artifact() {
        assert!(!filter().accepts(Path::new("/w/plot_portable.svg")));
    }

    #[test]
    fn test_rejects_editor_artifacts() {
        assert!(!filter().accepts(Path::new("/w/.plot.svg")));
        assert!(!filter().accepts(Path::new("/w/plot.svg~")));
        assert!(!filter().accepts(Path::new("/w/.plot.partial.svg")));
    }

    #[test]
    fn test_rejects_write_dir() {
        assert!(!filter().accepts(Path::new("/w/out/plot.svg")));
        assert!(filter().is_output_path(Path::new("/w/out/sub/a.png")));
    }
}
