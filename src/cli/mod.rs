//! Command-line interface module.

mod args;
pub mod export;
pub mod gallery;
pub mod watch;

pub use args::{Cli, Commands, ExportArgs, ServeArgs, SourceArgs};
