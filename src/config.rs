//! Configuration management module
//!
//! Configuration is read from YAML (`--config FILE`, else
//! `<config_dir>/flowcheck/config.yaml`), then `FLOWCHECK_*` environment
//! variables are applied on top. Command-line flags win over both and are
//! applied by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use action_flow::VerifierOptions;
use cdp_adapter::CdpConfig;
use flowcheck_privacy::PrivacyPolicyView;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::errors::{FlowcheckError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowcheckConfig {
    /// Origin the scenario paths are resolved against
    pub base_url: String,

    /// Directory fixture paths are relative to
    pub fixtures_dir: PathBuf,

    pub browser: BrowserSettings,
    pub verifier: VerifierSettings,
    pub privacy: PrivacyPolicyView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub websocket_url: Option<String>,
    pub window_size: Option<(u32, u32)>,
    pub navigation_timeout_ms: u64,
    pub lookup_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierSettings {
    pub settle_timeout_ms: u64,
}

impl Default for FlowcheckConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            fixtures_dir: PathBuf::from("fixtures"),
            browser: BrowserSettings::default(),
            verifier: VerifierSettings::default(),
            privacy: PrivacyPolicyView::default(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        let cdp = CdpConfig::default();
        Self {
            headless: cdp.headless,
            executable: None,
            websocket_url: None,
            window_size: cdp.window_size,
            navigation_timeout_ms: cdp.navigation_timeout_ms,
            lookup_timeout_ms: cdp.lookup_timeout_ms,
            poll_interval_ms: cdp.poll_interval_ms,
        }
    }
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            settle_timeout_ms: 4_000,
        }
    }
}

impl FlowcheckConfig {
    /// Default location: `<config_dir>/flowcheck/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flowcheck").join("config.yaml"))
    }

    /// Loads the file at `path` (or the default location), falling back to defaults when absent.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path.is_some();
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match path {
            Some(path) if path.exists() => {
                let content = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|err| FlowcheckError::io(&path, err))?;
                let config = Self::from_yaml(&content, &path)?;
                info!("Loaded configuration from: {}", path.display());
                config
            }
            Some(path) if explicit => {
                return Err(FlowcheckError::io(
                    &path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
                ))
            }
            Some(path) => {
                warn!(
                    "Config file not found, using defaults: {}",
                    path.display()
                );
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|err| FlowcheckError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    /// Applies `FLOWCHECK_*` overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(base_url) = read("FLOWCHECK_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(headless) = read("FLOWCHECK_HEADLESS") {
            self.browser.headless = !matches!(
                headless.to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
        if let Some(chrome) = read("FLOWCHECK_CHROME") {
            self.browser.executable = Some(PathBuf::from(chrome));
        }
        if let Some(fixtures) = read("FLOWCHECK_FIXTURES") {
            self.fixtures_dir = PathBuf::from(fixtures);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| FlowcheckError::Config {
            path: PathBuf::from("<effective configuration>"),
            reason,
        };
        let base = Url::parse(&self.base_url)
            .map_err(|err| invalid(format!("base_url `{}`: {}", self.base_url, err)))?;
        if base.cannot_be_a_base() {
            return Err(invalid(format!(
                "base_url `{}` cannot resolve paths",
                self.base_url
            )));
        }
        let timings = [
            ("browser.navigation_timeout_ms", self.browser.navigation_timeout_ms),
            ("browser.lookup_timeout_ms", self.browser.lookup_timeout_ms),
            ("browser.poll_interval_ms", self.browser.poll_interval_ms),
        ];
        if let Some((key, _)) = timings.iter().find(|(_, ms)| *ms == 0) {
            return Err(invalid(format!("{} must be greater than zero", key)));
        }
        self.privacy
            .validate()
            .map_err(|err| invalid(err.to_string()))
    }

    pub fn cdp_config(&self) -> CdpConfig {
        CdpConfig {
            base_url: self.base_url.clone(),
            executable: self.browser.executable.clone(),
            websocket_url: self.browser.websocket_url.clone(),
            user_data_dir: None,
            headless: self.browser.headless,
            window_size: self.browser.window_size,
            navigation_timeout_ms: self.browser.navigation_timeout_ms,
            lookup_timeout_ms: self.browser.lookup_timeout_ms,
            poll_interval_ms: self.browser.poll_interval_ms,
        }
    }

    pub fn verifier_options(&self) -> VerifierOptions {
        VerifierOptions::default()
            .with_settle_timeout(Duration::from_millis(self.verifier.settle_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.browser.poll_interval_ms))
            .with_privacy(self.privacy.clone())
    }
}
