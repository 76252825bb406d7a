//! Temp-then-rename artifact writes.
//!
//! The temp file lives in the destination directory so the rename never
//! crosses filesystems. Its name starts with `.` so the detector ignores it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Temp path next to `output`, keeping the extension for tools that sniff it.
pub fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
        None => (name, String::new()),
    };
    output.with_file_name(format!(".{stem}.partial{ext}"))
}

/// Run `write` against a temp path, then move the result over `output`.
///
/// On any failure the temp file is removed and `output` is left untouched.
pub fn write_atomic<E, F>(output: &Path, write: F) -> Result<(), E>
where
    F: FnOnce(&Path) -> Result<(), E>,
    E: From<io::Error>,
{
    if let Some(dir) = output.parent() {
        fs::create_dir_all(dir)?;
    }

    let temp = partial_path(output);
    if let Err(e) = write(&temp) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp, output) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}
