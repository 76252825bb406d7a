//! Output formats and artifact naming.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A derivative format produced from a source document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    Pdf,
    Png,
    Emf,
    Eps,
    PlainSvg,
}

/// Suffix appended to the stem of plain-SVG artifacts.
pub const PLAIN_SVG_SUFFIX: &str = "_portable.svg";

impl ExportFormat {
    pub const ALL: [Self; 5] = [Self::Pdf, Self::Png, Self::Emf, Self::Eps, Self::PlainSvg];

    /// Identifier used in config files and view records.
    pub const fn id(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Emf => "emf",
            Self::Eps => "eps",
            Self::PlainSvg => "plain-svg",
        }
    }

    /// File extension without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Emf => "emf",
            Self::Eps => "eps",
            Self::PlainSvg => "svg",
        }
    }

    /// Raster outputs keep a link back to their vector original.
    pub const fn is_raster(self) -> bool {
        matches!(self, Self::Png)
    }

    /// Artifact file name for a source with the given stem.
    pub fn file_name(self, stem: &str) -> String {
        match self {
            Self::PlainSvg => format!("{stem}{PLAIN_SVG_SUFFIX}"),
            _ => format!("{stem}.{}", self.extension()),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.id() == lower)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|f| f.id()).collect();
                format!("unknown format `{s}` (expected one of: {})", known.join(", "))
            })
    }
}
