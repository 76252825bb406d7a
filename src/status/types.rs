use std::path::{Path, PathBuf};

use crate::export::{ExportFormat, TransformError};
use crate::freshness::Fingerprint;

/// Pipeline state of one source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Idle,
    Queued,
    Processing,
    Done,
    Failed,
}

impl SourceStatus {
    /// A job is queued or running.
    pub const fn is_processing(self) -> bool {
        matches!(self, Self::Queued | Self::Processing)
    }
}

/// A source document known to the pipeline.
#[derive(Debug, Clone)]
pub struct WatchedSource {
    pub path: PathBuf,
    pub fingerprint: Option<Fingerprint>,
    pub status: SourceStatus,
    /// Present only when `status` is `Failed`.
    pub last_error: Option<String>,
}

impl WatchedSource {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            fingerprint: None,
            status: SourceStatus::Idle,
            last_error: None,
        }
    }
}

/// A file produced by an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub output_path: PathBuf,
    pub source_path: PathBuf,
    /// Raster outputs link back to the vector original.
    pub embedded_original_path: Option<PathBuf>,
}

impl ExportArtifact {
    pub fn new(format: ExportFormat, output_path: PathBuf, source_path: &Path) -> Self {
        let embedded_original_path = format.is_raster().then(|| source_path.to_path_buf());
        Self {
            format,
            output_path,
            source_path: source_path.to_path_buf(),
            embedded_original_path,
        }
    }
}

/// Result of exporting one format within a job.
#[derive(Debug, Clone)]
pub struct FormatResult {
    pub format: ExportFormat,
    pub output_path: PathBuf,
    pub result: Result<ExportArtifact, TransformError>,
}

/// Result set of one completed job.
#[derive(Debug, Clone)]
pub struct ArtifactOutcome {
    pub generation: u64,
    pub fingerprint: Option<Fingerprint>,
    pub results: Vec<FormatResult>,
}

impl ArtifactOutcome {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = (ExportFormat, &TransformError)> {
        self.results
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|e| (r.format, e)))
    }

    /// `pdf: <error>; png: <error>` for every failed format.
    pub fn error_summary(&self) -> String {
        self.errors()
            .map(|(format, e)| format!("{format}: {e}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// One entry in a group's file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub format: ExportFormat,
    /// Where the artifact for this format lives (or would live).
    pub output_path: PathBuf,
    /// The artifact on display; `None` for an error-only record.
    pub artifact: Option<ExportArtifact>,
    pub error: Option<String>,
    /// Carried over from an earlier job because this job's export failed.
    pub stale: bool,
}

impl FileRecord {
    pub fn fresh(artifact: ExportArtifact) -> Self {
        Self {
            format: artifact.format,
            output_path: artifact.output_path.clone(),
            artifact: Some(artifact),
            error: None,
            stale: false,
        }
    }
}

/// What the gallery shows for one source.
#[derive(Debug, Clone)]
pub struct GalleryGroup {
    /// Source path relative to the watch root.
    pub header: String,
    pub source: WatchedSource,
    /// Result set of the most recently completed job.
    pub files: Vec<FileRecord>,
    /// Generation of the job that produced `files`.
    pub generation: u64,
}

impl GalleryGroup {
    pub fn processing(&self) -> bool {
        self.source.status.is_processing()
    }

    /// Whether `path` is this group's source or one of its files.
    pub fn owns(&self, path: &Path) -> bool {
        self.source.path == path
            || self.files.iter().any(|f| {
                (f.output_path == path && f.artifact.is_some())
                    || f.artifact
                        .as_ref()
                        .and_then(|a| a.embedded_original_path.as_deref())
                        == Some(path)
            })
    }

    /// Like [`owns`](Self::owns), but also matches the planned output of an
    /// error-only record.
    pub fn targets(&self, path: &Path) -> bool {
        self.owns(path) || self.files.iter().any(|f| f.output_path == path)
    }
}
