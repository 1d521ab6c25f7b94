//! Configuration loading, validation, and management for Handback.
//!
//! Loads configuration from `~/.handback/config.toml` with environment
//! variable overrides. Validates all settings at load time.
//!
//! Besides client and loop settings, the file is where agents and action
//! groups are defined:
//!
//! ```toml
//! [agents.assistant]
//! instruction = "Answer briefly."
//! foundation_model = "apac.amazon.nova-micro-v1:0"
//! action_groups = ["clock"]
//!
//! [action_groups.clock]
//! description = "Date and time"
//!
//! [action_groups.clock.functions.getDate]
//! description = "Today's date"
//! ```

use handback_core::definition::{ActionGroupDefinition, AgentDefinition, DefinitionRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.handback/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote agent service connection
    #[serde(default)]
    pub client: ClientConfig,

    /// Orchestration loop settings
    #[serde(default)]
    pub invocation: InvocationConfig,

    /// Agent definitions, keyed by name
    #[serde(default)]
    pub agents: BTreeMap<String, AgentDefinition>,

    /// Action-group definitions, keyed by name
    #[serde(default)]
    pub action_groups: BTreeMap<String, ActionGroupDefinition>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the agent service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token, if the service requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request timeout for the HTTP client
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8787".into()
}
fn default_request_timeout() -> u64 {
    120
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &redact(&self.api_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationConfig {
    /// Model used for agents that do not configure one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// Safety limit on turns per invocation (unlimited when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u32>,

    /// Timeout for a whole invocation (none when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// What to do when a local function fails
    #[serde(default)]
    pub on_function_error: FunctionErrorPolicy,
}

/// How function failures are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionErrorPolicy {
    /// A failing function aborts the invocation
    #[default]
    Abort,
    /// The failure is sent to the agent as an error-shaped result
    Report,
}

impl AppConfig {
    /// Load configuration from the default path (~/.handback/config.toml).
    ///
    /// Environment variables override the file:
    /// - `HANDBACK_ENDPOINT`
    /// - `HANDBACK_API_KEY`
    /// - `HANDBACK_MODEL` (default model)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_overrides(path, |key| std::env::var(key).ok())
    }

    /// Load from `path`, apply overrides from `lookup`, then validate the result.
    pub fn load_with_overrides(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse the file at `path`; a missing file yields defaults.
    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("HANDBACK_ENDPOINT") {
            self.client.endpoint = endpoint;
        }
        if let Some(api_key) = lookup("HANDBACK_API_KEY") {
            self.client.api_key = Some(api_key);
        }
        if let Some(model) = lookup("HANDBACK_MODEL") {
            self.invocation.default_model = Some(model);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".handback")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.client.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "client.endpoint must be an http(s) URL, got '{}'",
                self.client.endpoint
            )));
        }

        if self.invocation.max_turns == Some(0) {
            return Err(ConfigError::ValidationError(
                "invocation.max_turns must be > 0".into(),
            ));
        }

        if self.invocation.timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "invocation.timeout_secs must be > 0".into(),
            ));
        }

        if self
            .invocation
            .default_model
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "invocation.default_model must not be empty".into(),
            ));
        }

        for (name, agent) in &self.agents {
            if agent
                .foundation_model
                .as_deref()
                .is_some_and(|m| m.trim().is_empty())
            {
                return Err(ConfigError::ValidationError(format!(
                    "agents.{name}.foundation_model must not be empty"
                )));
            }
        }

        Ok(())
    }

    /// Build a definition registry from the configured agents and action groups.
    ///
    /// Names come from the table keys. Action-group references are not
    /// checked here; an agent referencing an unknown group fails when invoked.
    pub fn definitions(&self) -> DefinitionRegistry {
        let mut registry = DefinitionRegistry::new();
        for (name, agent) in &self.agents {
            registry.register_agent(AgentDefinition {
                name: name.clone(),
                ..agent.clone()
            });
        }
        for (name, group) in &self.action_groups {
            registry.register_action_group(ActionGroupDefinition {
                name: name.clone(),
                ..group.clone()
            });
        }
        registry
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use handback_core::definition::{DefinitionLookup, ParameterType};

    const SAMPLE: &str = r#"
[client]
endpoint = "https://agents.example.com"
api_key = "secret-key"

[invocation]
default_model = "fallback-model"
max_turns = 8
on_function_error = "report"

[agents.assistant]
instruction = "Answer briefly."
foundation_model = "apac.amazon.nova-micro-v1:0"
action_groups = ["clock"]

[agents.plain]
instruction = "No tools."

[action_groups.clock]
description = "Date and time"

[action_groups.clock.functions.getDate]
description = "Today's date"

[action_groups.clock.functions.getDate.parameters.format]
type = "string"
description = "strftime pattern"
required = false
"#;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.client.endpoint, "http://127.0.0.1:8787");
        assert_eq!(config.invocation.on_function_error, FunctionErrorPolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.client.endpoint, config.client.endpoint);
        assert_eq!(parsed.agents.len(), 2);
    }

    #[test]
    fn parses_agents_and_action_groups() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.invocation.max_turns, Some(8));
        assert_eq!(config.invocation.on_function_error, FunctionErrorPolicy::Report);

        let registry = config.definitions();
        let agent = registry.agent("assistant").unwrap();
        assert_eq!(agent.name, "assistant");
        assert_eq!(
            agent.foundation_model.as_deref(),
            Some("apac.amazon.nova-micro-v1:0")
        );
        assert!(agent.action_groups.contains("clock"));

        let plain = registry.agent("plain").unwrap();
        assert!(plain.foundation_model.is_none());
        assert!(plain.action_groups.is_empty());

        let clock = registry.action_group("clock").unwrap();
        assert_eq!(clock.name, "clock");
        let format = &clock.functions["getDate"].parameters["format"];
        assert_eq!(format.kind, ParameterType::String);
        assert!(!format.required);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.client.endpoint, "https://agents.example.com");
    }

    #[test]
    fn unparseable_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agents.broken]\ninstruction = 5\n").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn overrides_apply_before_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[client]\nendpoint = \"agents.example.com\"\n").unwrap();

        assert!(matches!(
            AppConfig::load_from(&path).unwrap_err(),
            ConfigError::ValidationError(_)
        ));

        let config = AppConfig::load_with_overrides(&path, |key| match key {
            "HANDBACK_ENDPOINT" => Some("https://agents.example.com".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.client.endpoint, "https://agents.example.com");

        let err = AppConfig::load_with_overrides(&path, |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(config.agents.is_empty());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config: AppConfig = toml::from_str(SAMPLE).unwrap();
        config.apply_overrides(|key| match key {
            "HANDBACK_ENDPOINT" => Some("http://localhost:9000".into()),
            "HANDBACK_MODEL" => Some("env-model".into()),
            _ => None,
        });
        assert_eq!(config.client.endpoint, "http://localhost:9000");
        assert_eq!(config.invocation.default_model.as_deref(), Some("env-model"));
        assert_eq!(config.client.api_key.as_deref(), Some("secret-key"));
    }

    #[test]
    fn invalid_values_rejected() {
        let mut config = AppConfig::default();
        config.invocation.max_turns = Some(0);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.client.endpoint = "ftp://nope".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config
            .agents
            .insert("a".into(), AgentDefinition::new("a", "i").with_model(" "));
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let debug = format!("{:?}", config.client);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("127.0.0.1:8787"));
    }
}
