use crate::executor::{ExecutorSettings, HookExecutor};
use crate::plugin::{HookCall, Plugin, PluginBase};
use crate::registry::PluginRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use torii_core::config::{PluginSettings, ToriiConfig};
use torii_core::context::{GlobalContext, PluginContextTable};
use torii_core::error::ToriiError;
use torii_core::payload::{
    HookPayload, HttpAuthCheckPermissionPayload, HttpAuthResolveUserPayload,
    HttpPostRequestPayload, HttpPreRequestPayload, PromptPosthookPayload, PromptPrehookPayload,
    ResourcePostFetchPayload, ResourcePreFetchPayload, ShutdownPayload, StartupPayload,
    ToolPostInvokePayload, ToolPreInvokePayload,
};
use torii_core::result::{PluginResult, PluginViolation};
use tracing::{error, info, warn};

/// Builds a plugin instance from its descriptor.
pub type PluginFactory =
    Arc<dyn Fn(PluginBase) -> Result<Arc<dyn Plugin>, ToriiError> + Send + Sync>;

/// Maps config `kind` locators to plugin factories.
///
/// Built-ins register themselves here; embedders add their own kinds
/// before handing the registry to [`PluginManager::initialize`].
#[derive(Default, Clone)]
pub struct PluginFactoryRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl PluginFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(PluginBase) -> Result<Arc<dyn Plugin>, ToriiError> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
    }

    pub fn get(&self, kind: &str) -> Option<&PluginFactory> {
        self.factories.get(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.factories.keys().map(|k| k.as_str()).collect()
    }
}

/// The engine facade.
///
/// Owns the loaded config, the registry, and the executor; exposes one
/// async method per hook. Instantiated explicitly and passed around;
/// there is no process-global instance.
///
/// Each hook method accepts the context table returned by a paired
/// pre-hook (or `None` for a fresh one) and returns the table alongside
/// the result, so callers can thread per-plugin state from
/// `tool_pre_invoke` into `tool_post_invoke`. Tables from distinct
/// requests never share storage.
pub struct PluginManager {
    config: ToriiConfig,
    registry: PluginRegistry,
    executor: HookExecutor,
    initialized: AtomicBool,
}

impl PluginManager {
    pub fn new(config: ToriiConfig) -> Self {
        let executor = HookExecutor::new(ExecutorSettings::from(&config.plugin_settings));
        Self {
            config,
            registry: PluginRegistry::new(),
            executor,
            initialized: AtomicBool::new(false),
        }
    }

    /// Load configuration from a YAML file and build a manager.
    /// `initialize` must still be called before dispatching hooks.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let config = ToriiConfig::load(path)?;
        Ok(Self::new(config))
    }

    /// Construct and initialize every configured plugin, then fire the
    /// `startup` hook.
    ///
    /// Plugins initialize in config order. Any failure aborts startup and
    /// shuts the already-initialized prefix down in reverse.
    pub async fn initialize(&self, factories: &PluginFactoryRegistry) -> Result<(), ToriiError> {
        self.config.validate()?;

        let mut started: Vec<Arc<dyn Plugin>> = Vec::new();
        for entry in &self.config.plugins {
            let factory = factories
                .get(&entry.kind)
                .ok_or_else(|| ToriiError::UnknownPlugin(entry.kind.clone()))?;
            let plugin = factory.as_ref()(PluginBase::from_entry(entry))?;

            if let Err(e) = plugin.initialize().await {
                error!(plugin = %entry.name, error = %e, "Plugin initialization failed, aborting startup");
                self.teardown(&started).await;
                return Err(e);
            }
            if let Err(e) = self.registry.register(Arc::clone(&plugin)) {
                self.teardown_one(&plugin).await;
                self.teardown(&started).await;
                return Err(e);
            }
            started.push(plugin);
        }

        self.initialized.store(true, Ordering::SeqCst);

        // Engine-internal startup hook. A failure here is a startup
        // failure like any other.
        let global = GlobalContext::generated();
        match self.startup(StartupPayload::default(), &global, None).await {
            Ok((result, _)) if result.is_pass() => {}
            Ok((result, _)) => {
                self.initialized.store(false, Ordering::SeqCst);
                self.teardown(&started).await;
                let violation = result.violation.unwrap_or_else(|| {
                    PluginViolation::new(
                        "Startup blocked",
                        "a plugin stopped the startup hook",
                        "startup",
                    )
                });
                return Err(ToriiError::Violation(violation));
            }
            Err(e) => {
                self.initialized.store(false, Ordering::SeqCst);
                self.teardown(&started).await;
                return Err(e);
            }
        }

        info!(plugins = self.registry.len(), "Plugin manager initialized");
        Ok(())
    }

    /// Fire the `shutdown` hook, then shut every plugin down in reverse
    /// registration order. Failures are logged and swallowed.
    pub async fn shutdown(&self) {
        if self.initialized.swap(false, Ordering::SeqCst) {
            let global = GlobalContext::generated();
            let plugins = self.registry.plugins_for_hook(ShutdownPayload::HOOK);
            let mut table = PluginContextTable::new();
            let global = Arc::new(global);
            if let Err(e) = self
                .executor
                .execute(plugins, ShutdownPayload::default(), &global, &mut table)
                .await
            {
                warn!(error = %e, "Shutdown hook failed");
            }
        }
        self.registry.shutdown().await;
        info!("Plugin manager stopped");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.registry.get(name)
    }

    pub fn plugin_count(&self) -> usize {
        self.registry.len()
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.config.plugin_settings
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    async fn invoke_hook<T: HookCall>(
        &self,
        payload: T,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<T>, PluginContextTable), ToriiError> {
        if !self.is_initialized() {
            return Err(ToriiError::ManagerNotInitialized);
        }
        let plugins = self.registry.plugins_for_hook(T::HOOK);
        let global = Arc::new(global.clone());
        let mut table = contexts.unwrap_or_default();
        let result = self
            .executor
            .execute(plugins, payload, &global, &mut table)
            .await?;
        Ok((result, table))
    }

    pub async fn prompt_pre_fetch(
        &self,
        payload: PromptPrehookPayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<PromptPrehookPayload>, PluginContextTable), ToriiError> {
        self.invoke_hook(payload, global, contexts).await
    }

    pub async fn prompt_post_fetch(
        &self,
        payload: PromptPosthookPayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<PromptPosthookPayload>, PluginContextTable), ToriiError> {
        self.invoke_hook(payload, global, contexts).await
    }

    pub async fn tool_pre_invoke(
        &self,
        payload: ToolPreInvokePayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<ToolPreInvokePayload>, PluginContextTable), ToriiError> {
        self.invoke_hook(payload, global, contexts).await
    }

    pub async fn tool_post_invoke(
        &self,
        payload: ToolPostInvokePayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<ToolPostInvokePayload>, PluginContextTable), ToriiError> {
        self.invoke_hook(payload, global, contexts).await
    }

    pub async fn resource_pre_fetch(
        &self,
        payload: ResourcePreFetchPayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<ResourcePreFetchPayload>, PluginContextTable), ToriiError> {
        self.invoke_hook(payload, global, contexts).await
    }

    pub async fn resource_post_fetch(
        &self,
        payload: ResourcePostFetchPayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<ResourcePostFetchPayload>, PluginContextTable), ToriiError> {
        self.invoke_hook(payload, global, contexts).await
    }

    pub async fn http_pre_request(
        &self,
        payload: HttpPreRequestPayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<HttpPreRequestPayload>, PluginContextTable), ToriiError> {
        self.invoke_hook(payload, global, contexts).await
    }

    pub async fn http_post_request(
        &self,
        payload: HttpPostRequestPayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<HttpPostRequestPayload>, PluginContextTable), ToriiError> {
        self.invoke_hook(payload, global, contexts).await
    }

    pub async fn http_auth_resolve_user(
        &self,
        payload: HttpAuthResolveUserPayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<HttpAuthResolveUserPayload>, PluginContextTable), ToriiError> {
        self.invoke_hook(payload, global, contexts).await
    }

    pub async fn http_auth_check_permission(
        &self,
        payload: HttpAuthCheckPermissionPayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<HttpAuthCheckPermissionPayload>, PluginContextTable), ToriiError>
    {
        self.invoke_hook(payload, global, contexts).await
    }

    pub async fn startup(
        &self,
        payload: StartupPayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<StartupPayload>, PluginContextTable), ToriiError> {
        self.invoke_hook(payload, global, contexts).await
    }

    pub async fn shutdown_hook(
        &self,
        payload: ShutdownPayload,
        global: &GlobalContext,
        contexts: Option<PluginContextTable>,
    ) -> Result<(PluginResult<ShutdownPayload>, PluginContextTable), ToriiError> {
        self.invoke_hook(payload, global, contexts).await
    }

    async fn teardown_one(&self, plugin: &Arc<dyn Plugin>) {
        if let Err(e) = plugin.shutdown().await {
            warn!(plugin = %plugin.name(), error = %e, "Shutdown after failed startup");
        }
    }

    /// Reverse teardown of a partially started plugin set.
    async fn teardown(&self, started: &[Arc<dyn Plugin>]) {
        for plugin in started.iter().rev() {
            let _ = self.registry.unregister(plugin.name());
            self.teardown_one(plugin).await;
        }
    }
}
