//! One export job: every requested format of one source, with retries.

use std::collections::BTreeMap;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::RetryPolicy;
use crate::export::{DocumentTransform, ExportFormat, ExportOptions, OutputLayout, TransformError};
use crate::freshness::{Fingerprint, FingerprintError, fingerprint};
use crate::status::{ArtifactOutcome, ExportArtifact, FormatResult};

#[derive(Debug, Clone)]
pub struct ExportJob {
    pub source: PathBuf,
    /// Snapshot taken when the job was enqueued.
    pub options: Arc<ExportOptions>,
    pub generation: u64,
    /// Attempts made so far.
    pub attempt: u32,
}

/// How a job ended.
#[derive(Debug)]
pub enum JobResult {
    Completed(ArtifactOutcome),
    /// The source disappeared before or during the run.
    Vanished,
    /// The source never became readable within the retry budget.
    Unreadable(String),
}

/// What a job needs from its scheduler.
pub struct JobContext<'a> {
    pub transform: &'a dyn DocumentTransform,
    pub layout: &'a OutputLayout,
    pub policy: &'a RetryPolicy,
    pub cancelled: &'a AtomicBool,
}

impl JobContext<'_> {
    fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl ExportJob {
    pub fn new(source: PathBuf, options: Arc<ExportOptions>, generation: u64) -> Self {
        Self {
            source,
            options,
            generation,
            attempt: 0,
        }
    }

    pub fn run(&mut self, ctx: &JobContext<'_>) -> JobResult {
        let fingerprint = match self.read_source(ctx) {
            Ok(fp) => fp,
            Err(result) => return result,
        };

        let mut results: BTreeMap<ExportFormat, FormatResult> = BTreeMap::new();
        let mut pending = self.options.formats();
        self.attempt = 0;

        loop {
            self.attempt += 1;
            for &format in &pending {
                results.insert(format, self.export_one(ctx, format));
            }

            pending = results
                .values()
                .filter(|r| r.result.as_ref().is_err_and(TransformError::is_transient))
                .map(|r| r.format)
                .collect();

            if pending.is_empty() || !ctx.policy.should_retry(self.attempt) || ctx.cancelled() {
                break;
            }
            let delay = ctx.policy.backoff_for(self.attempt);
            crate::debug!(
                "export";
                "retry {} in {}ms ({} transient)",
                self.source.display(),
                delay.as_millis(),
                pending.len()
            );
            std::thread::sleep(delay);
        }

        if !self.source.exists() {
            return JobResult::Vanished;
        }

        JobResult::Completed(ArtifactOutcome {
            generation: self.generation,
            fingerprint: Some(fingerprint),
            results: results.into_values().collect(),
        })
    }

    /// Stable fingerprint of the source, retried like a transient export failure.
    fn read_source(&self, ctx: &JobContext<'_>) -> Result<Fingerprint, JobResult> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match fingerprint(&self.source) {
                Ok(fp) => return Ok(fp),
                Err(FingerprintError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(JobResult::Vanished);
                }
                Err(e) if !ctx.policy.should_retry(attempt) || ctx.cancelled() => {
                    return Err(JobResult::Unreadable(format!("source unreadable: {e}")));
                }
                Err(_) => std::thread::sleep(ctx.policy.backoff_for(attempt)),
            }
        }
    }

    fn export_one(&self, ctx: &JobContext<'_>, format: ExportFormat) -> FormatResult {
        let output_path = ctx.layout.output_path(&self.source, format);

        let result = catch_unwind(AssertUnwindSafe(|| {
            ctx.transform
                .export(&self.source, format, &self.options, &output_path)
        }))
        .unwrap_or_else(|panic| {
            Err(TransformError::MalformedSource(format!(
                "transform panicked: {}",
                panic_message(panic.as_ref())
            )))
        })
        .map(|()| ExportArtifact::new(format, output_path.clone(), &self.source));

        if let Err(e) = &result {
            crate::debug!(
                "export";
                "{} {} via {} (attempt {}): {e}",
                format,
                self.source.display(),
                ctx.transform.name(),
                self.attempt
            );
        }

        FormatResult {
            format,
            output_path,
            result,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Artifacts of `source` that already exist on disk for the requested formats.
pub fn existing_artifacts(
    layout: &OutputLayout,
    source: &Path,
    formats: &[ExportFormat],
) -> Vec<ExportArtifact> {
    formats
        .iter()
        .map(|&format| (format, layout.output_path(source, format)))
        .filter(|(_, path)| path.is_file())
        .map(|(format, path)| ExportArtifact::new(format, path, source))
        .collect()
}
