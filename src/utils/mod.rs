//! Utility modules shared across the exporter.

pub mod exec;
pub mod html;
pub mod mime;
pub mod path;
