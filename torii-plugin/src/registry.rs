use crate::plugin::Plugin;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use torii_core::error::ToriiError;
use torii_core::hook::HookPoint;
use tracing::{info, warn};

/// A registered plugin plus its registration sequence number.
///
/// The sequence number is the tie-break for equal priorities, so the
/// dispatch order is total and deterministic.
#[derive(Clone)]
pub struct RegisteredPlugin {
    plugin: Arc<dyn Plugin>,
    seq: u64,
}

impl RegisteredPlugin {
    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn sort_key(&self) -> (i32, u64) {
        (self.plugin.priority(), self.seq)
    }
}

/// Thread-safe plugin registry.
///
/// Name-keyed primary index plus a per-hook secondary index. Reads are
/// lock-free and request-time hot; writes happen at startup and on the
/// rare runtime register/unregister. Disabled plugins are kept in both
/// indices: mode filtering happens in the executor, so toggling a
/// plugin's mode at runtime is observable without re-indexing.
pub struct PluginRegistry {
    plugins: DashMap<String, RegisteredPlugin>,
    by_hook: DashMap<HookPoint, Vec<String>>,
    next_seq: AtomicU64,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: DashMap::new(),
            by_hook: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Insert a plugin under its unique name.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<(), ToriiError> {
        let name = plugin.name().to_string();
        let hooks = plugin.hooks().to_vec();

        match self.plugins.entry(name.clone()) {
            Entry::Occupied(_) => return Err(ToriiError::DuplicateName(name)),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(RegisteredPlugin { plugin, seq });
            }
        }
        for hook in hooks {
            self.by_hook.entry(hook).or_default().push(name.clone());
        }

        info!(plugin = %name, "Registered plugin");
        Ok(())
    }

    /// Remove a plugin from all indices.
    pub fn unregister(&self, name: &str) -> Result<(), ToriiError> {
        let (_, registered) = self
            .plugins
            .remove(name)
            .ok_or_else(|| ToriiError::UnknownPlugin(name.to_string()))?;
        for hook in registered.plugin.hooks() {
            if let Some(mut names) = self.by_hook.get_mut(hook) {
                names.retain(|n| n != name);
            }
        }
        info!(plugin = %name, "Unregistered plugin");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).map(|r| Arc::clone(&r.plugin))
    }

    /// The plugins subscribed to a hook, unordered; the executor sorts.
    pub fn plugins_for_hook(&self, hook: HookPoint) -> Vec<RegisteredPlugin> {
        let names: Vec<String> = match self.by_hook.get(&hook) {
            Some(names) => names.clone(),
            None => return Vec::new(),
        };
        names
            .iter()
            .filter_map(|name| self.plugins.get(name).map(|r| r.clone()))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Shut down all plugins in reverse registration order.
    ///
    /// Failures are logged and swallowed; teardown always completes.
    pub async fn shutdown(&self) {
        let mut all: Vec<RegisteredPlugin> =
            self.plugins.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|r| std::cmp::Reverse(r.seq()));
        for registered in all {
            let plugin = registered.plugin();
            if let Err(e) = plugin.shutdown().await {
                warn!(plugin = %plugin.name(), error = %e, "Plugin shutdown failed");
            }
        }
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginBase;

    struct MockPlugin {
        base: PluginBase,
    }

    impl MockPlugin {
        fn new(name: &str, hooks: Vec<HookPoint>) -> Arc<Self> {
            Arc::new(Self {
                base: PluginBase::new(name).with_hooks(hooks),
            })
        }
    }

    impl Plugin for MockPlugin {
        fn base(&self) -> &PluginBase {
            &self.base
        }
    }

    #[test]
    fn test_empty_registry() {
        let reg = PluginRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.len(), 0);
        assert!(reg.get("nonexistent").is_none());
        assert!(reg.plugins_for_hook(HookPoint::ToolPreInvoke).is_empty());
    }

    #[test]
    fn test_register_and_get() {
        let reg = PluginRegistry::new();
        reg.register(MockPlugin::new("pii", vec![HookPoint::ToolPreInvoke]))
            .unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("pii").unwrap().name(), "pii");
        assert!(reg.get("nonexistent").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let reg = PluginRegistry::new();
        reg.register(MockPlugin::new("pii", vec![])).unwrap();
        let err = reg.register(MockPlugin::new("pii", vec![])).unwrap_err();
        assert!(matches!(err, ToriiError::DuplicateName(name) if name == "pii"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_hook_index() {
        let reg = PluginRegistry::new();
        reg.register(MockPlugin::new(
            "a",
            vec![HookPoint::ToolPreInvoke, HookPoint::ToolPostInvoke],
        ))
        .unwrap();
        reg.register(MockPlugin::new("b", vec![HookPoint::ToolPreInvoke]))
            .unwrap();
        reg.register(MockPlugin::new("c", vec![HookPoint::PromptPreFetch]))
            .unwrap();

        let pre = reg.plugins_for_hook(HookPoint::ToolPreInvoke);
        let names: Vec<&str> = pre.iter().map(|r| r.plugin().name()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a"));
        assert!(names.contains(&"b"));

        assert_eq!(reg.plugins_for_hook(HookPoint::ToolPostInvoke).len(), 1);
        assert_eq!(reg.plugins_for_hook(HookPoint::ResourcePreFetch).len(), 0);
    }

    #[test]
    fn test_unregister_clears_all_indices() {
        let reg = PluginRegistry::new();
        reg.register(MockPlugin::new("a", vec![HookPoint::ToolPreInvoke]))
            .unwrap();
        reg.unregister("a").unwrap();
        assert!(reg.is_empty());
        assert!(reg.plugins_for_hook(HookPoint::ToolPreInvoke).is_empty());

        let err = reg.unregister("a").unwrap_err();
        assert!(matches!(err, ToriiError::UnknownPlugin(_)));
    }

    #[test]
    fn test_sequence_numbers_are_monotonic() {
        let reg = PluginRegistry::new();
        reg.register(MockPlugin::new("a", vec![HookPoint::ToolPreInvoke]))
            .unwrap();
        reg.register(MockPlugin::new("b", vec![HookPoint::ToolPreInvoke]))
            .unwrap();
        let plugins = reg.plugins_for_hook(HookPoint::ToolPreInvoke);
        let seq_a = plugins.iter().find(|r| r.plugin().name() == "a").unwrap().seq();
        let seq_b = plugins.iter().find(|r| r.plugin().name() == "b").unwrap().seq();
        assert!(seq_a < seq_b);
    }
}
