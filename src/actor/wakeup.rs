//! Filesystem notifications as scan hints.
//!
//! Events carry no change data here; the detector rescans and decides. A
//! bounded channel of one slot coalesces bursts into a single pending hint.

use std::path::Path;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::detect::SourceFilter;

/// Watcher handle plus the hint receiver. Dropping the watcher stops hints.
pub struct Wakeup {
    pub watcher: RecommendedWatcher,
    pub hints: mpsc::Receiver<()>,
}

impl Wakeup {
    pub fn watch(root: &Path, recursive: bool, filter: SourceFilter) -> notify::Result<Self> {
        let (tx, hints) = mpsc::channel(1);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) if is_relevant(&event, &filter) => {
                    // Full channel: a hint is already pending.
                    let _ = tx.try_send(());
                }
                Ok(_) => {}
                Err(e) => crate::debug!("watch"; "notify error: {}", e),
            }
        })?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(root, mode)?;

        Ok(Self { watcher, hints })
    }
}

/// Content-bearing events on candidate sources.
fn is_relevant(event: &notify::Event, filter: &SourceFilter) -> bool {
    let kind_matters = match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        // mtime/atime/chmod noise
        EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    kind_matters && event.paths.iter().any(|p| filter.accepts(p))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use notify::event::{CreateKind, MetadataKind, ModifyKind};

    use super::*;

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_relevant_events() {
        let filter = SourceFilter::new(vec!["_portable.svg".into()], None);

        assert!(is_relevant(
            &event(EventKind::Create(CreateKind::File), "/w/plot.svg"),
            &filter
        ));
        assert!(is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/w/plot.svg"),
            &filter
        ));
        assert!(!is_relevant(
            &event(
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)),
                "/w/plot.svg"
            ),
            &filter
        ));
        // Our own artifacts never wake the detector.
        assert!(!is_relevant(
            &event(EventKind::Create(CreateKind::File), "/w/plot.pdf"),
            &filter
        ));
        assert!(!is_relevant(
            &event(EventKind::Create(CreateKind::File), "/w/plot_portable.svg"),
            &filter
        ));
    }
}
