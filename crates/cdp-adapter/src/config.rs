use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detect_chrome_executable;

/// Configuration for launching (or attaching to) Chromium and tuning lookups.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CdpConfig {
    /// Origin the scenario paths are resolved against
    pub base_url: String,
    pub executable: Option<PathBuf>,
    /// Attach to an already running browser instead of launching one
    pub websocket_url: Option<String>,
    pub user_data_dir: Option<PathBuf>,
    pub headless: bool,
    pub window_size: Option<(u32, u32)>,
    pub navigation_timeout_ms: u64,
    pub lookup_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            executable: None,
            websocket_url: None,
            user_data_dir: None,
            headless: true,
            window_size: Some((1280, 800)),
            navigation_timeout_ms: 30_000,
            lookup_timeout_ms: 4_000,
            poll_interval_ms: 100,
        }
    }
}

impl CdpConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Configured executable if it exists, otherwise whatever can be detected.
    pub fn resolve_executable(&self) -> Option<PathBuf> {
        match &self.executable {
            Some(path) if path.exists() => Some(path.clone()),
            _ => detect_chrome_executable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = CdpConfig::default();
        assert!(cfg.headless);
        assert_eq!(cfg.lookup_timeout(), Duration::from_secs(4));
        assert_eq!(cfg.navigation_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let cfg = CdpConfig {
            poll_interval_ms: 0,
            ..CdpConfig::default()
        };
        assert_eq!(cfg.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn missing_executable_falls_back_to_detection() {
        let cfg = CdpConfig {
            executable: Some(PathBuf::from("/definitely/not/chrome")),
            ..CdpConfig::default()
        };
        assert_eq!(cfg.resolve_executable(), detect_chrome_executable());
    }
}
