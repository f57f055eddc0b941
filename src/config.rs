//! Listener configuration, loaded once at startup

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, WebhookError};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";
pub const DEFAULT_ACTION_SCRIPT: &str = "./tools/webhookaction.sh";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerConfig {
    pub host: String,
    pub port: u16,
    pub webhook_path: String,
    pub action_script_path: PathBuf,
    pub webhook_secret: Option<String>,
    /// Run at most one action script at a time.
    pub serialize_actions: bool,
    pub log_dir: Option<PathBuf>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
            action_script_path: PathBuf::from(DEFAULT_ACTION_SCRIPT),
            webhook_secret: None,
            serialize_actions: true,
            log_dir: None,
        }
    }
}

impl ListenerConfig {
    /// Load the configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path).map_err(|e| {
            WebhookError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_toml(&config_str).map_err(|e| match e {
            WebhookError::TomlParse(e) => {
                WebhookError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            }
            other => other,
        })
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let config: ListenerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.webhook_path.starts_with('/') {
            return Err(WebhookError::Config(format!(
                "webhook_path must start with '/', got {:?}",
                self.webhook_path
            )));
        }
        if self.webhook_path.contains(['?', '{', '}', '*'])
            || self.webhook_path.split('/').any(|segment| segment.starts_with(':'))
        {
            return Err(WebhookError::Config(format!(
                "webhook_path must be a literal path without query or wildcards, got {:?}",
                self.webhook_path
            )));
        }
        if self.action_script_path.as_os_str().is_empty() {
            return Err(WebhookError::Config(
                "action_script_path must not be empty".to_string(),
            ));
        }
        if self.webhook_secret.as_deref() == Some("") {
            return Err(WebhookError::Config(
                "webhook_secret is set but empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns true if incoming payloads must carry a valid signature.
    pub fn needs_signature(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Overrides the port from a raw env value, ignoring non-numeric input.
    pub fn with_port_override(mut self, raw: Option<&str>) -> Self {
        if let Some(port) = raw.and_then(|p| p.trim().parse::<u16>().ok()) {
            self.port = port;
        }
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
