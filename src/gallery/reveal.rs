//! Revealing files in the platform file manager.

use std::path::Path;

use anyhow::Result;

use crate::utils::exec::Cmd;

/// Shows a file to the user. Must not block on the file manager.
pub trait Reveal: Send + Sync {
    fn reveal(&self, path: &Path) -> Result<()>;
}

/// Opens the platform file manager at the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemReveal;

impl Reveal for SystemReveal {
    fn reveal(&self, path: &Path) -> Result<()> {
        crate::debug!("gallery"; "reveal {}", path.display());
        reveal_command(path).spawn()
    }
}

/// Open `url` in the default browser.
pub fn open_in_browser(url: &str) -> Result<()> {
    let cmd = if cfg!(target_os = "macos") {
        Cmd::new("open").arg(url)
    } else if cfg!(windows) {
        Cmd::new("cmd").args(["/C", "start", url])
    } else {
        Cmd::new("xdg-open").arg(url)
    };
    cmd.spawn()
}

fn reveal_command(path: &Path) -> Cmd {
    if cfg!(target_os = "macos") {
        Cmd::new("open").arg("-R").arg(path)
    } else if cfg!(windows) {
        Cmd::new("explorer").arg(format!("/select,{}", path.display()))
    } else {
        // xdg-open cannot select a file; open its directory instead.
        let dir = path.parent().unwrap_or(path);
        Cmd::new("xdg-open").arg(dir)
    }
}
