use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Policy-violation detail reported by a plugin.
///
/// `plugin_name` is stamped by the executor at dispatch time; anything the
/// plugin itself puts there is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginViolation {
    /// Short category, e.g. "Denied word detected"
    pub reason: String,
    /// Human-readable description
    pub description: String,
    /// Machine tag, e.g. "deny"
    pub code: String,
    /// Structured detail for audit logs
    #[serde(default)]
    pub details: serde_json::Map<String, Value>,
    /// Name of the plugin that raised the violation (set by the executor)
    #[serde(default)]
    pub plugin_name: String,
}

impl PluginViolation {
    pub fn new(
        reason: impl Into<String>,
        description: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            reason: reason.into(),
            description: description.into(),
            code: code.into(),
            details: serde_json::Map::new(),
            plugin_name: String::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

impl std::fmt::Display for PluginViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.reason, self.description)
    }
}

/// Outcome of one plugin hook invocation.
///
/// `T` is the hook's payload type, so a replacement payload is guaranteed
/// to have the same shape as the input. The executor merges each result
/// into the pipeline state: a `modified_payload` replaces the payload for
/// all downstream plugins, `metadata` lands in the plugin's context, and
/// `continue_processing = false` stops the chain.
#[derive(Debug, Clone)]
pub struct PluginResult<T> {
    pub continue_processing: bool,
    pub modified_payload: Option<T>,
    pub violation: Option<PluginViolation>,
    pub metadata: HashMap<String, Value>,
}

impl<T> Default for PluginResult<T> {
    fn default() -> Self {
        Self {
            continue_processing: true,
            modified_payload: None,
            violation: None,
            metadata: HashMap::new(),
        }
    }
}

impl<T> PluginResult<T> {
    /// Pass-through: continue, no modification, no violation.
    pub fn pass() -> Self {
        Self::default()
    }

    /// Continue with a replacement payload.
    pub fn modified(payload: T) -> Self {
        Self {
            modified_payload: Some(payload),
            ..Self::default()
        }
    }

    /// Stop the pipeline with a violation.
    pub fn block(violation: PluginViolation) -> Self {
        Self {
            continue_processing: false,
            violation: Some(violation),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// True when the result neither blocks nor carries a violation.
    pub fn is_pass(&self) -> bool {
        self.continue_processing && self.violation.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_defaults() {
        let r: PluginResult<String> = PluginResult::pass();
        assert!(r.continue_processing);
        assert!(r.modified_payload.is_none());
        assert!(r.violation.is_none());
        assert!(r.metadata.is_empty());
        assert!(r.is_pass());
    }

    #[test]
    fn test_block_stops_processing() {
        let r: PluginResult<String> =
            PluginResult::block(PluginViolation::new("reason", "desc", "code"));
        assert!(!r.continue_processing);
        assert!(r.violation.is_some());
        assert!(!r.is_pass());
    }

    #[test]
    fn test_violation_display() {
        let v = PluginViolation::new("Denied word detected", "found 'foo'", "deny");
        assert_eq!(v.to_string(), "[deny] Denied word detected: found 'foo'");
    }

    #[test]
    fn test_violation_details() {
        let v = PluginViolation::new("r", "d", "c")
            .with_detail("word", serde_json::json!("foo"));
        assert_eq!(v.details.get("word"), Some(&serde_json::json!("foo")));
    }
}
