//! Gallery client: a polling loop over a running daemon.
//!
//! Every interval the client fetches the update counter; when it moved (or a
//! group was marked dirty by a failed thumbnail) it fetches the full data and
//! re-renders only the groups whose serialized form changed. A poll is
//! bounded by a timeout shorter than the interval.

mod api;
mod render;
mod view;

use std::future::Future;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, timeout};

use crate::gallery::GroupView;

pub use api::{ApiError, GalleryApi, HttpGalleryApi};
pub use render::{Renderer, TerminalRenderer};
pub use view::RenderState;

use view::RenderPlan;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(800);

pub struct GalleryClient<A, R> {
    api: A,
    renderer: R,
    state: RenderState,
    interval: Duration,
    timeout: Duration,
}

impl<A: GalleryApi, R: Renderer> GalleryClient<A, R> {
    pub fn new(api: A, renderer: R) -> Self {
        Self {
            api,
            renderer,
            state: RenderState::new(),
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Poll interval; the per-poll timeout is clamped below it.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(10));
        self.timeout = self.timeout.min(self.interval * 4 / 5);
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = limit.min(self.interval * 4 / 5);
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Poll until `shutdown` resolves.
    pub async fn run<F: Future<Output = ()>>(mut self, shutdown: F) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        crate::debug!("gallery"; "poll failed: {e}");
                    }
                }
            }
        }
    }

    /// One poll cycle.
    ///
    /// Only the counter and data fetches decide whether the daemon is down;
    /// each thumbnail load gets its own timeout and a stalled one just marks
    /// its group dirty.
    pub async fn poll_once(&mut self) -> Result<(), ApiError> {
        let fetched = match timeout(self.timeout, self.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout),
        };

        let down = fetched.is_err();
        if self.state.set_server_down(down) {
            self.renderer.server_down(down);
        }

        if let Some(plan) = fetched? {
            for header in &plan.remove {
                self.renderer.remove_group(header);
            }
            for group in &plan.render {
                self.renderer.render_group(group);
                self.load_thumbnails(group).await;
            }
        }
        Ok(())
    }

    async fn fetch(&mut self) -> Result<Option<RenderPlan>, ApiError> {
        let info = self.api.check_for_refresh().await?;
        if !self.state.needs_data(info) {
            return Ok(None);
        }
        let data = self.api.gallery_data().await?;
        Ok(self.state.plan(data))
    }

    /// Load a group's thumbnails; a failure or a stall marks the group dirty.
    async fn load_thumbnails(&mut self, group: &GroupView) {
        for file in &group.files {
            let load = self.api.load_thumbnail(&file.thumbnail_url);
            let result = match timeout(self.timeout, load).await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Timeout),
            };
            if let Err(e) = result {
                crate::debug!("gallery"; "thumbnail of {} failed: {e}", file.label);
                self.state.on_image_error(&group.header);
                break;
            }
        }
    }
}
