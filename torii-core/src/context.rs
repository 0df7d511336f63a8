use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable per-request metadata, populated by the caller.
///
/// Identifies the logical request and feeds conditional filtering and
/// log attribution. Plugins never mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalContext {
    pub request_id: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub server_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl GlobalContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            user: None,
            tenant_id: None,
            server_id: None,
            timestamp: Utc::now(),
        }
    }

    /// New context with a generated request id.
    pub fn generated() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_server(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }
}

/// Per-plugin, per-request mutable state.
///
/// `state` is the plugin's private scratch space; `metadata` is what the
/// plugin chooses to expose for cross-plugin observability and audit logs.
/// Request-scoped data lives here, never in plugin-owned fields.
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub plugin_name: String,
    pub global: Arc<GlobalContext>,
    pub state: HashMap<String, Value>,
    pub metadata: HashMap<String, Value>,
}

impl PluginContext {
    pub fn new(plugin_name: impl Into<String>, global: Arc<GlobalContext>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            global,
            state: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn set_state(&mut self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
    }

    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }
}

/// Map of plugin name → [`PluginContext`] for one request.
///
/// The manager returns it alongside the hook result; the caller threads it
/// into the paired post-hook so a plugin can correlate its own pre/post
/// state. Entries exist only for plugins actually dispatched.
#[derive(Debug, Clone, Default)]
pub struct PluginContextTable {
    entries: HashMap<String, PluginContext>,
}

impl PluginContextTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, plugin_name: &str) -> Option<&PluginContext> {
        self.entries.get(plugin_name)
    }

    pub fn get_mut(&mut self, plugin_name: &str) -> Option<&mut PluginContext> {
        self.entries.get_mut(plugin_name)
    }

    /// The context slot for a plugin, created on first use.
    pub fn slot(&mut self, plugin_name: &str, global: &Arc<GlobalContext>) -> &mut PluginContext {
        self.entries
            .entry(plugin_name.to_string())
            .or_insert_with(|| PluginContext::new(plugin_name, Arc::clone(global)))
    }

    pub fn contains(&self, plugin_name: &str) -> bool {
        self.entries.contains_key(plugin_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PluginContext)> {
        self.entries.iter()
    }
}
