//! Configuration loading from switchboard.toml.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Agent identity, card address and enabled tools.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Language-model backend for direct answers.
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Agent identity and serving settings.
#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Host advertised on the agent card.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port advertised on the agent card.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on a single dispatch, tool call included.
    #[serde(default = "default_timeout_secs")]
    pub dispatch_timeout_secs: u64,

    /// Built-in tools to register, in routing priority order.
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: default_description(),
            version: default_version(),
            host: default_host(),
            port: default_port(),
            dispatch_timeout_secs: default_timeout_secs(),
            tools: default_tools(),
        }
    }
}

/// Backend provider configuration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// Anthropic API key. When unset, direct answers use canned replies.
    pub api_key: Option<String>,

    /// Override for the Messages API URL, e.g. a local proxy.
    pub endpoint: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            endpoint: None,
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_name() -> String {
    "switchboard".to_string()
}

fn default_description() -> String {
    "A conversational agent that routes requests to its tools.".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_tools() -> Vec<String> {
    vec!["calculator".to_string(), "echo".to_string(), "data".to_string()]
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(key) = lookup("ANTHROPIC_API_KEY").filter(|k| !k.is_empty()) {
            self.backend.api_key = Some(key);
        }
        if let Some(model) = lookup("SWITCHBOARD_MODEL") {
            self.backend.model = model;
        }
        if let Some(host) = lookup("A2A_HOST") {
            self.agent.host = host;
        }
        if let Some(port) = lookup("A2A_PORT") {
            self.agent.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "A2A_PORT",
                value: port,
            })?;
        }
        Ok(())
    }

    /// Apply command-line overrides, which beat both file and environment.
    pub fn apply_overrides(&mut self, host: Option<String>, port: Option<u16>) {
        if let Some(host) = host {
            self.agent.host = host;
        }
        if let Some(port) = port {
            self.agent.port = port;
        }
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.dispatch_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.dispatch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "agent.dispatch_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.agent.name.trim().is_empty() {
            return Err(ConfigError::Invalid("agent.name must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}
