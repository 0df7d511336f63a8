use crate::condition::PluginCondition;
use crate::error::ToriiError;
use crate::hook::HookPoint;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Per-plugin policy controlling how violations and technical errors
/// surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginMode {
    /// Violations and technical errors both stop the pipeline
    #[default]
    Enforce,
    /// Violations stop the pipeline; technical errors are logged
    EnforceIgnoreError,
    /// Violations and technical errors are both logged
    Permissive,
    /// Held in the registry, never dispatched
    Disabled,
}

impl PluginMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginMode::Enforce => "enforce",
            PluginMode::EnforceIgnoreError => "enforce_ignore_error",
            PluginMode::Permissive => "permissive",
            PluginMode::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for PluginMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Global engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Upgrade any technical error in any mode to a hard stop
    #[serde(default)]
    pub fail_on_plugin_error: bool,

    /// Per-plugin call timeout (seconds)
    #[serde(default = "default_plugin_timeout")]
    pub plugin_timeout: u64,

    /// Payload-size guard limit (bytes)
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,
}

impl PluginSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.plugin_timeout)
    }
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            fail_on_plugin_error: false,
            plugin_timeout: default_plugin_timeout(),
            max_payload_size: default_max_payload_size(),
        }
    }
}

/// One configured plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginEntry {
    /// Unique plugin name
    pub name: String,

    /// Factory locator resolved through the factory registry
    pub kind: String,

    /// Lower runs earlier; ties broken by list order
    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub mode: PluginMode,

    /// Hooks this plugin subscribes to
    #[serde(default)]
    pub hooks: Vec<HookPoint>,

    /// Per-plugin timeout override (seconds)
    #[serde(default)]
    pub timeout: Option<u64>,

    /// OR-combined invocation filters
    #[serde(default)]
    pub conditions: Vec<PluginCondition>,

    /// Opaque config passed to the plugin; parsed by the plugin itself
    /// at initialize()
    #[serde(default)]
    pub config: serde_json::Value,
}

impl PluginEntry {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            priority: 0,
            mode: PluginMode::default(),
            hooks: Vec::new(),
            timeout: None,
            conditions: Vec::new(),
            config: serde_json::Value::Null,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// Top-level configuration: global settings plus the ordered plugin list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToriiConfig {
    #[serde(default)]
    pub plugin_settings: PluginSettings,

    /// List order defines the tie-break for equal priority
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,
}

impl ToriiConfig {
    /// Load configuration from a YAML file + `TORII_` environment
    /// overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config: Self = Figment::new()
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("TORII_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string (tests, embedding).
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = Figment::new()
            .merge(Yaml::string(yaml))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot honor.
    pub fn validate(&self) -> Result<(), ToriiError> {
        let mut seen = HashSet::new();
        for entry in &self.plugins {
            if entry.name.is_empty() {
                return Err(ToriiError::Config("plugin name must not be empty".into()));
            }
            if entry.kind.is_empty() {
                return Err(ToriiError::Config(format!(
                    "plugin '{}' has an empty kind",
                    entry.name
                )));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ToriiError::DuplicateName(entry.name.clone()));
            }
        }
        Ok(())
    }
}

// Serde default functions

fn default_plugin_timeout() -> u64 {
    30
}

fn default_max_payload_size() -> usize {
    1024 * 1024 // 1 MiB
}
