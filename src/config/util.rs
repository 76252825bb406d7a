//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/paper/figures/drafts/  ← cwd
/// /home/user/paper/inkwatch.toml    ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_from(&cwd, config_name)
}

fn find_config_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    // Walk up from start looking for config file
    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_upward() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("inkwatch-test.toml"), "").unwrap();

        let found = find_config_from(&nested, Path::new("inkwatch-test.toml")).unwrap();
        assert_eq!(found, dir.path().join("inkwatch-test.toml"));
    }

    #[test]
    fn test_find_config_absolute() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        assert_eq!(find_config_from(dir.path(), &path), None);

        std::fs::write(&path, "").unwrap();
        assert_eq!(find_config_from(Path::new("/"), &path), Some(path));
    }

    #[test]
    fn test_find_config_missing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            find_config_from(dir.path(), Path::new("no-such-inkwatch-config.toml")),
            None
        );
    }
}
