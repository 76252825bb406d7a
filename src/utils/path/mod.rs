//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `expand_path`, `relative_to`)

pub mod fs;

pub use fs::{expand_path, normalize_path, relative_to};
