//! Path normalization utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `expand_path` - tilde expansion, then resolve against a base directory
//! - `relative_to` - display path of a file below a root

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
///
/// # Example
/// ```ignore
/// use crate::utils::path::normalize_path;
/// let abs = normalize_path(Path::new("./drawings/plot.svg"));
/// ```
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Expand `~` and resolve a relative path against `base`.
///
/// Always returns an absolute path when `base` is absolute.
pub fn expand_path(path: &Path, base: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned());
    let joined = if expanded.is_relative() {
        base.join(expanded)
    } else {
        expanded
    };
    normalize_path(&joined)
}

/// Path of `path` relative to `root`, or `path` itself when it is not below `root`.
pub fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
