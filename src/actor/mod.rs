//! Watch-mode actors
//!
//! ```text
//! DetectorActor --> ExportScheduler --> StatusStore
//! (poll + hints)     (worker threads)    (snapshots)
//!                          ^
//! ReloadActor -------------+ (export options)
//! ```
//!
//! - `detector` - Interval scan loop that routes changes
//! - `wakeup` - Optional filesystem notifications as scan hints
//! - `reload` - Re-reads `inkwatch.toml` and swaps the export options
//! - `coordinator` - Wires up and runs the actors until shutdown

mod coordinator;
mod detector;
mod reload;
mod wakeup;

pub use coordinator::Coordinator;
