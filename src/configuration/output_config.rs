use serde::Deserialize;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DIRECTORY: &str = "/opt/gps/data";
pub const DEFAULT_PREFIX: &str = "gps_log";

/// Where log files go and how often status is reported.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct OutputConfig {
    pub directory: Option<String>,
    pub prefix: Option<String>,
    /// milliseconds
    pub status_interval: Option<u64>,
}

impl OutputConfig {
    pub fn directory(&self) -> PathBuf {
        PathBuf::from(self.directory.as_deref().unwrap_or(DEFAULT_DIRECTORY))
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval.unwrap_or(2_000))
    }
}
