use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use torii_core::context::PluginContext;
use torii_core::error::ToriiError;
use torii_core::payload::{PromptPrehookPayload, ToolPreInvokePayload};
use torii_core::result::{PluginResult, PluginViolation};
use torii_plugin::plugin::{Plugin, PluginBase};

/// Deny-list middleware over prompt and tool input.
///
/// Raises a violation when any configured word appears (case-insensitive
/// substring) in a prompt argument or a tool argument string.
pub struct DenyFilterPlugin {
    base: PluginBase,
    words: OnceLock<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct DenyFilterConfig {
    words: Vec<String>,
}

impl DenyFilterPlugin {
    pub fn new(base: PluginBase) -> Self {
        Self {
            base,
            words: OnceLock::new(),
        }
    }

    fn words(&self) -> &[String] {
        self.words.get().map(Vec::as_slice).unwrap_or(&[])
    }

    fn find_denied(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.words()
            .iter()
            .find(|word| lower.contains(word.as_str()))
            .map(String::as_str)
    }

    fn scan_value<'a>(&'a self, value: &Value) -> Option<&'a str> {
        match value {
            Value::String(s) => self.find_denied(s),
            Value::Array(items) => items.iter().find_map(|item| self.scan_value(item)),
            Value::Object(map) => map.values().find_map(|item| self.scan_value(item)),
            _ => None,
        }
    }

    fn violation(word: &str) -> ToriiError {
        ToriiError::violation(
            PluginViolation::new(
                "Denied word detected",
                format!("found disallowed phrase {word:?}"),
                "deny",
            )
            .with_detail("word", Value::from(word)),
        )
    }
}

#[async_trait]
impl Plugin for DenyFilterPlugin {
    fn base(&self) -> &PluginBase {
        &self.base
    }

    async fn initialize(&self) -> Result<(), ToriiError> {
        let config: DenyFilterConfig = serde_json::from_value(self.base.config().clone())
            .map_err(|e| ToriiError::Config(format!("deny_filter: {e}")))?;
        let words: Vec<String> = config
            .words
            .into_iter()
            .map(|word| word.to_lowercase())
            .collect();
        tracing::debug!(plugin = %self.name(), words = words.len(), "Loaded deny list");
        let _ = self.words.set(words);
        Ok(())
    }

    async fn prompt_pre_fetch(
        &self,
        payload: &PromptPrehookPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<PromptPrehookPayload>, ToriiError> {
        for value in payload.args.values() {
            if let Some(word) = self.find_denied(value) {
                return Err(Self::violation(word));
            }
        }
        Ok(PluginResult::pass())
    }

    async fn tool_pre_invoke(
        &self,
        payload: &ToolPreInvokePayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<ToolPreInvokePayload>, ToriiError> {
        if let Some(word) = self.scan_value(&payload.args) {
            return Err(Self::violation(word));
        }
        Ok(PluginResult::pass())
    }
}
