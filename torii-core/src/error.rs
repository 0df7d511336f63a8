use crate::hook::HookPoint;
use crate::result::PluginViolation;
use thiserror::Error;

/// Unified error type for Torii.
///
/// Violations are policy blocks raised by plugins; everything else is a
/// technical error. The executor filters technical errors by plugin mode
/// and the global `fail_on_plugin_error` switch, violations by mode only.
#[derive(Error, Debug)]
pub enum ToriiError {
    #[error("Plugin violation: {0}")]
    Violation(PluginViolation),

    #[error("Plugin '{plugin}' timed out in {hook}")]
    PluginTimeout { plugin: String, hook: HookPoint },

    #[error("Plugin '{plugin}' failed: {message}")]
    PluginInternalError { plugin: String, message: String },

    #[error("Payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge {
        /// The modifying plugin, or None for the pre-pipeline check
        plugin: Option<String>,
        size: usize,
        limit: usize,
    },

    #[error("Plugin '{plugin}' returned a malformed payload: {detail}")]
    PayloadShapeMismatch { plugin: String, detail: String },

    #[error("Plugin manager is not initialized")]
    ManagerNotInitialized,

    #[error("Duplicate plugin name: {0}")]
    DuplicateName(String),

    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ToriiError {
    /// Shorthand for raising a violation from a plugin hook.
    pub fn violation(violation: PluginViolation) -> Self {
        ToriiError::Violation(violation)
    }

    /// Shorthand for a plugin-internal technical error.
    pub fn internal(plugin: impl Into<String>, message: impl std::fmt::Display) -> Self {
        ToriiError::PluginInternalError {
            plugin: plugin.into(),
            message: message.to_string(),
        }
    }

    pub fn is_violation(&self) -> bool {
        matches!(self, ToriiError::Violation(_))
    }

    pub fn into_violation(self) -> Option<PluginViolation> {
        match self {
            ToriiError::Violation(v) => Some(v),
            _ => None,
        }
    }

    /// The plugin this error is attributed to, when applicable.
    pub fn plugin_name(&self) -> Option<&str> {
        match self {
            ToriiError::Violation(v) => Some(&v.plugin_name),
            ToriiError::PluginTimeout { plugin, .. } => Some(plugin),
            ToriiError::PluginInternalError { plugin, .. } => Some(plugin),
            ToriiError::PayloadTooLarge { plugin, .. } => plugin.as_deref(),
            ToriiError::PayloadShapeMismatch { plugin, .. } => Some(plugin),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_accessors() {
        let err = ToriiError::violation(PluginViolation::new("r", "d", "c"));
        assert!(err.is_violation());
        let v = err.into_violation().unwrap();
        assert_eq!(v.code, "c");
    }

    #[test]
    fn test_plugin_attribution() {
        let err = ToriiError::PluginTimeout {
            plugin: "slow".into(),
            hook: HookPoint::ToolPreInvoke,
        };
        assert_eq!(err.plugin_name(), Some("slow"));

        let err = ToriiError::PayloadTooLarge {
            plugin: None,
            size: 2048,
            limit: 1024,
        };
        assert_eq!(err.plugin_name(), None);

        let err = ToriiError::ManagerNotInitialized;
        assert_eq!(err.plugin_name(), None);
    }

    #[test]
    fn test_display_messages() {
        let err = ToriiError::PluginTimeout {
            plugin: "pii".into(),
            hook: HookPoint::PromptPreFetch,
        };
        assert_eq!(err.to_string(), "Plugin 'pii' timed out in prompt_pre_fetch");

        let err = ToriiError::DuplicateName("filter".into());
        assert_eq!(err.to_string(), "Duplicate plugin name: filter");

        let err = ToriiError::PayloadTooLarge {
            plugin: Some("expander".into()),
            size: 2048,
            limit: 1024,
        };
        assert_eq!(err.to_string(), "Payload too large: 2048 bytes (limit 1024)");
    }
}
