//! Output side of the client.

use std::io::Write;

use owo_colors::OwoColorize;

use crate::gallery::{FileView, GroupView};

pub trait Renderer {
    fn render_group(&mut self, group: &GroupView);
    fn remove_group(&mut self, header: &str);
    fn server_down(&mut self, down: bool);
}

/// Prints every re-rendered group as a block on stdout.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn render_group(&mut self, group: &GroupView) {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", format_group(group)).ok();
        out.flush().ok();
    }

    fn remove_group(&mut self, header: &str) {
        crate::log!("gallery"; "{} {}", "removed".dimmed(), header);
    }

    fn server_down(&mut self, down: bool) {
        if down {
            crate::log!("error"; "Server is not running, files cannot be opened.");
        } else {
            crate::log!("gallery"; "connected");
        }
    }
}

pub fn format_group(group: &GroupView) -> String {
    let mut block = group.header.bold().to_string();
    if group.processing {
        block.push_str(&format!(" {}", "(exporting…)".yellow()));
    }
    for file in &group.files {
        block.push('\n');
        block.push_str(&format_file(file));
    }
    block
}

fn format_file(file: &FileView) -> String {
    let mut line = format!("  {:<10} {}", file.currenttype, file.label);
    match (&file.error, file.stale) {
        (Some(error), true) => {
            line.push_str(&format!(" {} {}", "stale:".yellow(), error.red()));
        }
        (Some(error), false) => line.push_str(&format!(" {}", error.red())),
        (None, _) => {}
    }
    if let Some(embed) = &file.embed {
        line.push_str(&format!(" {}", format!("← {embed}").dimmed()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_group() {
        let group = GroupView {
            header: "figs/plot.svg".into(),
            processing: true,
            files: vec![FileView {
                file_uri: "file:///w/figs/plot.pdf".into(),
                thumbnail_url: "/thumbnail".into(),
                label: "plot.pdf".into(),
                currenttype: "pdf".into(),
                embed: None,
                error: Some("permission denied".into()),
                stale: true,
            }],
        };
        let text = format_group(&group);
        assert!(text.contains("figs/plot.svg"));
        assert!(text.contains("exporting"));
        assert!(text.contains("plot.pdf"));
        assert!(text.contains("stale:"));
        assert!(text.contains("permission denied"));
    }
}
