//! `[schedule]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [schedule]
//! workers = 4          # parallel exports (default: CPU count, at most 4)
//! max_attempts = 3     # attempts per job for transient failures
//! backoff_ms = 250     # first retry delay, doubled per attempt
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::scheduler::{RetryPolicy, default_workers};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub workers: Option<usize>,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            workers: None,
            max_attempts: policy.max_attempts,
            backoff_ms: policy.backoff.as_millis() as u64,
        }
    }
}

impl ScheduleConfig {
    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(default_workers)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_ms))
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.workers == Some(0) {
            diag.error(FieldPath::new("schedule.workers"), "must be at least 1");
        }
        if self.max_attempts == 0 {
            diag.error_with_hint(
                FieldPath::new("schedule.max_attempts"),
                "must be at least 1",
                "1 disables retries",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_schedule_config() {
        let config = test_parse_config("[schedule]\nworkers = 2\nmax_attempts = 5\nbackoff_ms = 100");
        assert_eq!(config.schedule.workers(), 2);
        let policy = config.schedule.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff, Duration::from_millis(100));
    }

    #[test]
    fn test_schedule_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.schedule.retry_policy(), RetryPolicy::default());
        assert!(config.schedule.workers() >= 1);
        assert!(config.schedule.workers() <= 4);
    }

    #[test]
    fn test_validate() {
        let mut diag = ConfigDiagnostics::new();
        ScheduleConfig {
            workers: Some(0),
            max_attempts: 0,
            backoff_ms: 0,
        }
        .validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }
}
