//! Export: formats, options, output layout and the document transforms.

mod atomic;
mod format;
mod layout;
mod options;
pub mod transform;

pub use atomic::write_atomic;
pub use format::{ExportFormat, PLAIN_SVG_SUFFIX};
pub use layout::OutputLayout;
pub use options::ExportOptions;
pub use transform::{DocumentTransform, RoutedTransform, TransformError};
