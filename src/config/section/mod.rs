//! Configuration section definitions.
//!
//! Each module corresponds to a section in `inkwatch.toml`:
//!
//! | Module      | TOML Section  | Purpose                              |
//! |-------------|---------------|--------------------------------------|
//! | `watch`     | `[watch]`     | Watched directory and detection      |
//! | `schedule`  | `[schedule]`  | Worker pool and retry policy         |
//! | `transform` | `[transform]` | External converter                   |
//! | `serve`     | `[serve]`     | Gallery server                       |
//!
//! `[export]` deserializes straight into [`crate::export::ExportOptions`].

mod schedule;
mod serve;
mod transform;
mod watch;

pub use schedule::ScheduleConfig;
pub use serve::ServeConfig;
pub use transform::TransformConfig;
pub use watch::WatchConfig;
