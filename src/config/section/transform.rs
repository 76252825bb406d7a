//! `[transform]` section configuration.
//!
//! ```toml
//! [transform]
//! inkscape = "/opt/inkscape/bin/inkscape"   # default: found on PATH
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub inkscape: Option<PathBuf>,
}

impl TransformConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Some(path) = &self.inkscape
            && !path.is_file()
        {
            diag.error_with_hint(
                FieldPath::new("transform.inkscape"),
                format!("`{}` is not a file", path.display()),
                "remove the setting to look up `inkscape` on PATH",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_transform_config() {
        let config = test_parse_config("[transform]\ninkscape = \"/usr/bin/inkscape\"");
        assert_eq!(
            config.transform.inkscape,
            Some(PathBuf::from("/usr/bin/inkscape"))
        );
        assert_eq!(test_parse_config("").transform.inkscape, None);
    }

    #[test]
    fn test_validate_missing_binary() {
        let mut diag = ConfigDiagnostics::new();
        TransformConfig {
            inkscape: Some("/definitely/not/inkscape".into()),
        }
        .validate(&mut diag);
        assert_eq!(diag.len(), 1);

        let mut diag = ConfigDiagnostics::new();
        TransformConfig::default().validate(&mut diag);
        assert!(diag.is_empty());
    }
}
