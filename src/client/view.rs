//! What the client has rendered, and what it must render next.

use std::collections::{BTreeMap, BTreeSet};

use crate::gallery::{GalleryData, GroupView, RefreshInfo};

/// Work for the renderer after one data fetch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenderPlan {
    /// Groups to (re-)render, in payload order.
    pub render: Vec<GroupView>,
    /// Headers of groups no longer present.
    pub remove: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RenderState {
    /// header -> serialized form last rendered
    rendered: BTreeMap<String, String>,
    /// Groups whose thumbnails failed to load.
    dirty: BTreeSet<String>,
    last_update: Option<u64>,
    server_down: bool,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether full data must be fetched after seeing `info`.
    pub fn needs_data(&self, info: RefreshInfo) -> bool {
        self.last_update != Some(info.lastupdate) || !self.dirty.is_empty()
    }

    /// Diff `data` against what was rendered and record it as rendered.
    ///
    /// Returns `None` for a payload older than one already applied.
    pub fn plan(&mut self, data: GalleryData) -> Option<RenderPlan> {
        if self.last_update.is_some_and(|last| data.lastupdate < last) {
            return None;
        }
        self.last_update = Some(data.lastupdate);

        let present: BTreeSet<&str> = data.gallery_data.iter().map(|g| g.header.as_str()).collect();
        let remove: Vec<String> = self
            .rendered
            .keys()
            .filter(|header| !present.contains(header.as_str()))
            .cloned()
            .collect();
        for header in &remove {
            self.rendered.remove(header);
            self.dirty.remove(header);
        }

        let mut render = Vec::new();
        for group in data.gallery_data {
            let serialized = group.serialized();
            let changed = self.rendered.get(&group.header) != Some(&serialized);
            let was_dirty = self.dirty.remove(&group.header);
            if changed || was_dirty {
                self.rendered.insert(group.header.clone(), serialized);
                render.push(group);
            }
        }

        Some(RenderPlan { render, remove })
    }

    /// A thumbnail of `header` failed to load; re-render it next cycle.
    pub fn on_image_error(&mut self, header: &str) {
        if self.rendered.contains_key(header) {
            self.dirty.insert(header.to_string());
        }
    }

    #[cfg(test)]
    pub fn is_dirty(&self, header: &str) -> bool {
        self.dirty.contains(header)
    }

    /// Returns whether the flag changed.
    pub fn set_server_down(&mut self, down: bool) -> bool {
        std::mem::replace(&mut self.server_down, down) != down
    }

    pub fn server_down(&self) -> bool {
        self.server_down
    }

    #[cfg(test)]
    pub fn last_update(&self) -> Option<u64> {
        self.last_update
    }

    #[cfg(test)]
    pub fn rendered_headers(&self) -> impl Iterator<Item = &str> {
        self.rendered.keys().map(String::as_str)
    }
}
