//! Where artifacts land on disk.

use std::path::{Path, PathBuf};

use super::ExportFormat;

/// Output-path resolution: beside the source, or mirrored under a write dir.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    write_dir: Option<PathBuf>,
}

impl OutputLayout {
    pub fn new(root: PathBuf, write_dir: Option<PathBuf>) -> Self {
        Self { root, write_dir }
    }

    /// Directory receiving the artifacts of `source`.
    pub fn output_dir(&self, source: &Path) -> PathBuf {
        let parent = source.parent().unwrap_or(&self.root);
        match &self.write_dir {
            None => parent.to_path_buf(),
            Some(dir) => match parent.strip_prefix(&self.root) {
                Ok(sub) => dir.join(sub),
                Err(_) => dir.clone(),
            },
        }
    }

    /// Artifact path for `(source, format)`.
    pub fn output_path(&self, source: &Path, format: ExportFormat) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        self.output_dir(source).join(format.file_name(&stem))
    }
}
