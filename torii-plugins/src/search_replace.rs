use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use torii_core::context::PluginContext;
use torii_core::error::ToriiError;
use torii_core::payload::{
    PromptPosthookPayload, PromptPrehookPayload, ToolPostInvokePayload, ToolPreInvokePayload,
};
use torii_core::result::PluginResult;
use torii_plugin::plugin::{Plugin, PluginBase};

/// Search-and-replace middleware over prompt and tool text.
///
/// Rewrites string values in prompt arguments, rendered prompt messages,
/// and tool arguments/results. Returns a modified payload only when
/// something actually changed, and records the replacement count in its
/// context metadata.
pub struct SearchReplacePlugin {
    base: PluginBase,
    rules: OnceLock<Vec<(Regex, String)>>,
}

#[derive(Debug, Deserialize)]
struct SearchReplaceConfig {
    words: Vec<SearchReplaceRule>,
}

#[derive(Debug, Deserialize)]
struct SearchReplaceRule {
    search: String,
    replace: String,
}

impl SearchReplacePlugin {
    pub fn new(base: PluginBase) -> Self {
        Self {
            base,
            rules: OnceLock::new(),
        }
    }

    fn rules(&self) -> &[(Regex, String)] {
        self.rules.get().map(Vec::as_slice).unwrap_or(&[])
    }

    fn apply(&self, text: &str) -> (String, usize) {
        let mut out = text.to_string();
        let mut count = 0;
        for (pattern, replacement) in self.rules() {
            let hits = pattern.find_iter(&out).count();
            if hits > 0 {
                out = pattern.replace_all(&out, replacement.as_str()).into_owned();
                count += hits;
            }
        }
        (out, count)
    }

    fn rewrite_value(&self, value: &Value) -> (Value, usize) {
        match value {
            Value::String(s) => {
                let (rewritten, count) = self.apply(s);
                (Value::String(rewritten), count)
            }
            Value::Array(items) => {
                let mut count = 0;
                let rewritten = items
                    .iter()
                    .map(|item| {
                        let (v, c) = self.rewrite_value(item);
                        count += c;
                        v
                    })
                    .collect();
                (Value::Array(rewritten), count)
            }
            Value::Object(map) => {
                let mut count = 0;
                let rewritten = map
                    .iter()
                    .map(|(k, item)| {
                        let (v, c) = self.rewrite_value(item);
                        count += c;
                        (k.clone(), v)
                    })
                    .collect();
                (Value::Object(rewritten), count)
            }
            other => (other.clone(), 0),
        }
    }
}

#[async_trait]
impl Plugin for SearchReplacePlugin {
    fn base(&self) -> &PluginBase {
        &self.base
    }

    async fn initialize(&self) -> Result<(), ToriiError> {
        let config: SearchReplaceConfig = serde_json::from_value(self.base.config().clone())
            .map_err(|e| ToriiError::Config(format!("search_replace: {e}")))?;
        let mut rules = Vec::with_capacity(config.words.len());
        for rule in config.words {
            let pattern = Regex::new(&rule.search).map_err(|e| {
                ToriiError::Config(format!(
                    "search_replace: invalid pattern {:?}: {e}",
                    rule.search
                ))
            })?;
            rules.push((pattern, rule.replace));
        }
        tracing::debug!(plugin = %self.name(), rules = rules.len(), "Compiled rewrite rules");
        let _ = self.rules.set(rules);
        Ok(())
    }

    async fn prompt_pre_fetch(
        &self,
        payload: &PromptPrehookPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<PromptPrehookPayload>, ToriiError> {
        let mut count = 0;
        let mut args = payload.args.clone();
        for value in args.values_mut() {
            let (rewritten, hits) = self.apply(value);
            if hits > 0 {
                *value = rewritten;
                count += hits;
            }
        }
        if count == 0 {
            return Ok(PluginResult::pass());
        }
        let modified = PromptPrehookPayload {
            name: payload.name.clone(),
            args,
        };
        Ok(PluginResult::modified(modified)
            .with_metadata("replacements", Value::from(count)))
    }

    async fn prompt_post_fetch(
        &self,
        payload: &PromptPosthookPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<PromptPosthookPayload>, ToriiError> {
        let mut count = 0;
        let mut messages = payload.messages.clone();
        for message in &mut messages {
            let (rewritten, hits) = self.apply(&message.content);
            if hits > 0 {
                message.content = rewritten;
                count += hits;
            }
        }
        if count == 0 {
            return Ok(PluginResult::pass());
        }
        let modified = PromptPosthookPayload {
            name: payload.name.clone(),
            messages,
        };
        Ok(PluginResult::modified(modified)
            .with_metadata("replacements", Value::from(count)))
    }

    async fn tool_pre_invoke(
        &self,
        payload: &ToolPreInvokePayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<ToolPreInvokePayload>, ToriiError> {
        let (args, count) = self.rewrite_value(&payload.args);
        if count == 0 {
            return Ok(PluginResult::pass());
        }
        let modified = ToolPreInvokePayload {
            name: payload.name.clone(),
            args,
        };
        Ok(PluginResult::modified(modified)
            .with_metadata("replacements", Value::from(count)))
    }

    async fn tool_post_invoke(
        &self,
        payload: &ToolPostInvokePayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<ToolPostInvokePayload>, ToriiError> {
        let (result, count) = self.rewrite_value(&payload.result);
        if count == 0 {
            return Ok(PluginResult::pass());
        }
        let modified = ToolPostInvokePayload {
            name: payload.name.clone(),
            result,
        };
        Ok(PluginResult::modified(modified)
            .with_metadata("replacements", Value::from(count)))
    }
}
