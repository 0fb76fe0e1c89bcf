/*
[INPUT]:  YAML configuration file, FOCUSFLOW_TOKEN environment variable
[OUTPUT]: Parsed application configuration
[POS]:    Configuration layer - client setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use focusflow_adapter::{ClientConfig, Credentials, EnergyLevel, FocusflowClient};
use serde::{Deserialize, Serialize};

use crate::flow::FlowSessionConfig;

/// Environment variable consulted when the config carries no token
pub const TOKEN_ENV_VAR: &str = "FOCUSFLOW_TOKEN";

/// Top-level configuration for the focusflow client
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote API connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Server root, e.g. "https://api.focusflow.app"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token; falls back to FOCUSFLOW_TOKEN
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Flow mode settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlowConfig {
    /// Status poll cadence while a session is active
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Session length requested when `flow start` is given no duration
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,
    #[serde(default)]
    pub default_energy: Option<EnergyLevel>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Display refresh cadence for elapsed time
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the resumption state
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            default_duration_minutes: default_duration_minutes(),
            default_energy: None,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.focusflow.app".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_duration_minutes() -> u32 {
    60
}

fn default_tick_interval_ms() -> u64 {
    1000
}

impl AppConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        // An empty file means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content).context("parse config yaml")?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api.base_url.trim().is_empty() {
            bail!("api.base_url must not be empty");
        }
        if self.api.timeout_secs == 0 || self.api.connect_timeout_secs == 0 {
            bail!("api timeouts must be greater than zero");
        }
        if self.flow.poll_interval_secs == 0 {
            bail!("flow.poll_interval_secs must be greater than zero");
        }
        if self.flow.default_duration_minutes == 0 {
            bail!("flow.default_duration_minutes must be greater than zero");
        }
        if self.tracker.tick_interval_ms == 0 {
            bail!("tracker.tick_interval_ms must be greater than zero");
        }
        Ok(())
    }

    /// Token from the file, else from the environment
    pub fn access_token(&self) -> Option<String> {
        self.api
            .access_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| {
                std::env::var(TOKEN_ENV_VAR)
                    .ok()
                    .filter(|token| !token.trim().is_empty())
            })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.api.timeout_secs),
            connect_timeout: Duration::from_secs(self.api.connect_timeout_secs),
        }
    }

    /// Authenticated client; a missing token is a configuration error
    pub fn build_client(&self) -> anyhow::Result<FocusflowClient> {
        let mut client =
            FocusflowClient::with_config_and_base_url(self.client_config(), &self.api.base_url)
                .context("create api client")?;
        let access_token = self.access_token().with_context(|| {
            format!("no access token: set api.access_token or {TOKEN_ENV_VAR}")
        })?;
        client.set_credentials(Credentials { access_token });
        Ok(client)
    }

    pub fn flow_session_config(&self) -> FlowSessionConfig {
        FlowSessionConfig {
            poll_interval: Duration::from_secs(self.flow.poll_interval_secs),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tracker.tick_interval_ms)
    }

    /// Configured state directory, else `<data_dir>/focusflow`
    pub fn storage_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.storage.dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir().context("no platform data directory; set storage.dir")?;
        Ok(base.join("focusflow"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
api:
  base_url: http://localhost:8080
  access_token: secret
  timeout_secs: 5
flow:
  poll_interval_secs: 15
  default_duration_minutes: 90
  default_energy: high
tracker:
  tick_interval_ms: 250
storage:
  dir: /tmp/focusflow-state
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.connect_timeout_secs, 10);
        assert_eq!(config.flow.default_energy, Some(EnergyLevel::High));
        assert_eq!(config.flow_session_config().poll_interval, Duration::from_secs(15));
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(
            config.storage_dir().unwrap(),
            PathBuf::from("/tmp/focusflow-state")
        );
        assert_eq!(config.access_token().as_deref(), Some("secret"));
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config.flow.poll_interval_secs, 30);
        assert_eq!(config.flow.default_duration_minutes, 60);
        assert_eq!(config.tracker.tick_interval_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config = AppConfig::from_yaml("flow:\n  default_energy: low\n").unwrap();
        assert_eq!(config.flow.poll_interval_secs, 30);
        assert_eq!(config.flow.default_energy, Some(EnergyLevel::Low));
    }

    #[rstest]
    #[case("api:\n  base_url: \"\"\n")]
    #[case("flow:\n  poll_interval_secs: 0\n")]
    #[case("flow:\n  default_duration_minutes: 0\n")]
    #[case("tracker:\n  tick_interval_ms: 0\n")]
    #[case("api:\n  timeout_secs: 0\n")]
    fn test_validate_rejects(#[case] yaml: &str) {
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_client_with_token() {
        let yaml = "api:\n  base_url: http://127.0.0.1:9\n  access_token: abc\n";
        let client = AppConfig::from_yaml(yaml).unwrap().build_client().unwrap();
        assert_eq!(client.credentials().map(|c| c.access_token.as_str()), Some("abc"));
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9/");
    }

    #[test]
    fn test_build_client_keeps_base_path() {
        let yaml = "api:\n  base_url: https://focus.example.test/v1\n  access_token: abc\n";
        let client = AppConfig::from_yaml(yaml).unwrap().build_client().unwrap();
        assert_eq!(client.base_url().as_str(), "https://focus.example.test/v1/");
    }

    #[test]
    fn test_build_client_rejects_non_http_base() {
        let yaml = "api:\n  base_url: ftp://focus.example.test\n  access_token: abc\n";
        let err = AppConfig::from_yaml(yaml).unwrap().build_client().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<focusflow_adapter::FocusflowError>(),
            Some(focusflow_adapter::FocusflowError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focusflow.yaml");
        std::fs::write(&path, "flow:\n  poll_interval_secs: 45\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.flow.poll_interval_secs, 45);

        assert!(AppConfig::from_file(&dir.path().join("missing.yaml")).is_err());
    }
}
