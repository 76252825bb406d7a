//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro, only printed with `--verbose`
//! - `WatchStatus` for export result messages in watch mode
//!
//! # Example
//!
//! ```ignore
//! log!("export"; "exporting {} files", count);
//! status_success("exported plot.svg → pdf, png");
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    // Workers and the server loop share stdout; hold the lock for the whole line.
    let _guard = OUTPUT.lock();
    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" | "gallery" => prefix.bright_blue().bold().to_string(),
        "watch" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

static OUTPUT: Mutex<()> = Mutex::new(());

// ============================================================================
// Watch Status
// ============================================================================

/// Get current UTC time formatted as HH:MM:SS
fn now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Status display for watch mode
///
/// Displays export results prefixed with a timestamp and a colored symbol.
///
/// # Example
///
/// ```ignore
/// WatchStatus::success("exported plot.svg → pdf, png");
/// WatchStatus::error("failed: plot.svg", "pdf: output directory is read-only");
/// ```
pub struct WatchStatus;

impl WatchStatus {
    /// Display success message (✓ prefix, green).
    pub fn success(message: &str) {
        Self::display(&format!("{}", "✓".green()), message);
    }

    /// Display error message (✗ prefix, red) with optional detail.
    pub fn error(summary: &str, detail: &str) {
        Self::display(&format!("{}", "✗".red()), &with_detail(summary, detail));
    }

    /// Display warning message (⚠ prefix, yellow) with detail.
    pub fn warning(detail: &str) {
        Self::display(&format!("{}", "⚠".yellow()), detail);
    }

    fn display(symbol: &str, message: &str) {
        let timestamp = format!("[{}]", now()).dimmed().to_string();

        let _guard = OUTPUT.lock();
        let mut stdout = stdout().lock();
        writeln!(stdout, "{timestamp} {symbol} {message}").ok();
        stdout.flush().ok();
    }
}

/// Summary line followed by an indented detail block.
fn with_detail(summary: &str, detail: &str) -> String {
    if detail.is_empty() {
        return summary.to_string();
    }
    let detail = detail
        .lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{summary}\n{detail}")
}

/// Global watch status: success
pub fn status_success(message: &str) {
    WatchStatus::success(message);
}

/// Global watch status: error
pub fn status_error(summary: &str, detail: &str) {
    WatchStatus::error(summary, detail);
}

/// Global watch status: warning
pub fn status_warning(detail: &str) {
    WatchStatus::warning(detail);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_detail_empty() {
        assert_eq!(with_detail("failed: plot.svg", ""), "failed: plot.svg");
    }

    #[test]
    fn test_with_detail_indents_each_line() {
        let message = with_detail("failed: plot.svg", "pdf: permission denied\npng: malformed source");
        assert_eq!(
            message,
            "failed: plot.svg\n  pdf: permission denied\n  png: malformed source"
        );
    }

    #[test]
    fn test_now_format() {
        let t = now();
        assert_eq!(t.len(), 8);
        assert_eq!(t.matches(':').count(), 2);
    }
}
