//! External command execution utilities.
//!
//! Provides a Builder-based API for running external commands with proper
//! output handling.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // Caller inspects exit status and stderr itself
//! let output = Cmd::new("inkscape")
//!     .args(["--export-filename", "out.pdf", "in.svg"])
//!     .output()?;
//!
//! // Detached: fire-and-forget (file manager reveal)
//! Cmd::new("xdg-open").arg(dir).spawn()?;
//! ```

use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    process::{Command, Output, Stdio},
    sync::OnceLock,
};

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Execute the command and return its raw output, whatever the exit status.
    pub fn output(self) -> Result<Output> {
        let name = self.program_name();
        self.command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute `{name}`"))
    }

    /// Start the command without waiting for it.
    pub fn spawn(self) -> Result<()> {
        let name = self.program_name();
        let mut child = self
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))?;

        // Reap in the background so the child never lingers as a zombie.
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for command stderr in error messages.
///
/// Used to reduce noise by skipping known warnings or irrelevant messages.
pub struct FilterRule {
    /// Prefixes of lines to drop.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    /// Create a new filter rule.
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    /// Check if a line should be skipped.
    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Lines of `output` that pass the filter, ANSI codes removed.
    pub fn keep(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .map(|line| strip_ansi(line).trim().to_string())
            .filter(|line| !self.should_skip(line))
            .collect()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Strip ANSI escape codes from string.
fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}

/// Format error message for failed command.
pub fn format_error(name: &str, output: &Output, filter: &FilterRule) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let mut msg = format!("Command `{name}` failed with {}", output.status);
    let kept = filter.keep(&stderr);
    if !kept.is_empty() {
        msg.push('\n');
        msg.push_str(&kept.join("\n"));
    }

    let stdout_trimmed = stdout.trim();
    if !stdout_trimmed.is_empty() {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout_trimmed);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================
