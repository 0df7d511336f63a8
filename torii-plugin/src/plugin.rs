use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use torii_core::condition::PluginCondition;
use torii_core::config::{PluginEntry, PluginMode};
use torii_core::context::PluginContext;
use torii_core::error::ToriiError;
use torii_core::hook::HookPoint;
use torii_core::payload::{
    HookPayload, HttpAuthCheckPermissionPayload, HttpAuthResolveUserPayload,
    HttpPostRequestPayload, HttpPreRequestPayload, PromptPosthookPayload, PromptPrehookPayload,
    ResourcePostFetchPayload, ResourcePreFetchPayload, ShutdownPayload, StartupPayload,
    ToolPostInvokePayload, ToolPreInvokePayload,
};
use torii_core::result::PluginResult;

/// Descriptor every plugin carries, built from its config entry.
///
/// Holds the engine-visible attributes (name, priority, mode, hook
/// subscriptions, conditions, timeout override) and the opaque config
/// value the plugin parses into its own typed config at `initialize()`.
#[derive(Debug, Clone)]
pub struct PluginBase {
    name: String,
    priority: i32,
    mode: PluginMode,
    hooks: Vec<HookPoint>,
    conditions: Vec<PluginCondition>,
    timeout: Option<Duration>,
    config: serde_json::Value,
}

impl PluginBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            mode: PluginMode::default(),
            hooks: Vec::new(),
            conditions: Vec::new(),
            timeout: None,
            config: serde_json::Value::Null,
        }
    }

    pub fn from_entry(entry: &PluginEntry) -> Self {
        Self {
            name: entry.name.clone(),
            priority: entry.priority,
            mode: entry.mode,
            hooks: entry.hooks.clone(),
            conditions: entry.conditions.clone(),
            timeout: entry.timeout(),
            config: entry.config.clone(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_mode(mut self, mode: PluginMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_hooks(mut self, hooks: Vec<HookPoint>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<PluginCondition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn mode(&self) -> PluginMode {
        self.mode
    }

    pub fn hooks(&self) -> &[HookPoint] {
        &self.hooks
    }

    pub fn conditions(&self) -> &[PluginCondition] {
        &self.conditions
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn config(&self) -> &serde_json::Value {
        &self.config
    }
}

/// The capability surface every plugin exposes.
///
/// Concrete plugins embed a [`PluginBase`] and override only the hooks
/// they care about; every hook method defaults to a pass-through. A hook
/// listed in `hooks()` but not overridden is therefore a no-op.
///
/// Hook invocations run concurrently across requests; request-scoped
/// state belongs in the [`PluginContext`], never in plugin fields. A
/// policy block is reported by returning `Err(ToriiError::Violation(..))`
/// or a result with `violation` set; any other error is a technical
/// error.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// The plugin's shared descriptor.
    fn base(&self) -> &PluginBase;

    fn name(&self) -> &str {
        self.base().name()
    }

    fn priority(&self) -> i32 {
        self.base().priority()
    }

    fn mode(&self) -> PluginMode {
        self.base().mode()
    }

    fn hooks(&self) -> &[HookPoint] {
        self.base().hooks()
    }

    fn conditions(&self) -> &[PluginCondition] {
        self.base().conditions()
    }

    /// Per-plugin timeout override; the global default applies when None.
    fn timeout(&self) -> Option<Duration> {
        self.base().timeout()
    }

    /// Called once at manager startup. Parse the opaque config here.
    async fn initialize(&self) -> Result<(), ToriiError> {
        Ok(())
    }

    /// Called once at manager shutdown, in reverse registration order.
    async fn shutdown(&self) -> Result<(), ToriiError> {
        Ok(())
    }

    async fn prompt_pre_fetch(
        &self,
        _payload: &PromptPrehookPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<PromptPrehookPayload>, ToriiError> {
        Ok(PluginResult::pass())
    }

    async fn prompt_post_fetch(
        &self,
        _payload: &PromptPosthookPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<PromptPosthookPayload>, ToriiError> {
        Ok(PluginResult::pass())
    }

    async fn tool_pre_invoke(
        &self,
        _payload: &ToolPreInvokePayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<ToolPreInvokePayload>, ToriiError> {
        Ok(PluginResult::pass())
    }

    async fn tool_post_invoke(
        &self,
        _payload: &ToolPostInvokePayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<ToolPostInvokePayload>, ToriiError> {
        Ok(PluginResult::pass())
    }

    async fn resource_pre_fetch(
        &self,
        _payload: &ResourcePreFetchPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<ResourcePreFetchPayload>, ToriiError> {
        Ok(PluginResult::pass())
    }

    async fn resource_post_fetch(
        &self,
        _payload: &ResourcePostFetchPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<ResourcePostFetchPayload>, ToriiError> {
        Ok(PluginResult::pass())
    }

    async fn http_pre_request(
        &self,
        _payload: &HttpPreRequestPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<HttpPreRequestPayload>, ToriiError> {
        Ok(PluginResult::pass())
    }

    async fn http_post_request(
        &self,
        _payload: &HttpPostRequestPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<HttpPostRequestPayload>, ToriiError> {
        Ok(PluginResult::pass())
    }

    async fn http_auth_resolve_user(
        &self,
        _payload: &HttpAuthResolveUserPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<HttpAuthResolveUserPayload>, ToriiError> {
        Ok(PluginResult::pass())
    }

    async fn http_auth_check_permission(
        &self,
        _payload: &HttpAuthCheckPermissionPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<HttpAuthCheckPermissionPayload>, ToriiError> {
        Ok(PluginResult::pass())
    }

    async fn startup(
        &self,
        _payload: &StartupPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<StartupPayload>, ToriiError> {
        Ok(PluginResult::pass())
    }

    async fn shutdown_hook(
        &self,
        _payload: &ShutdownPayload,
        _ctx: &mut PluginContext,
    ) -> Result<PluginResult<ShutdownPayload>, ToriiError> {
        Ok(PluginResult::pass())
    }
}

/// Typed dispatch from a payload type to its hook method on `dyn Plugin`.
///
/// This is what lets the executor stay generic while hooks remain a
/// closed set dispatched by explicit methods rather than reflection.
pub trait HookCall: HookPayload {
    fn call<'a>(
        plugin: &'a dyn Plugin,
        payload: &'a Self,
        ctx: &'a mut PluginContext,
    ) -> Pin<Box<dyn Future<Output = Result<PluginResult<Self>, ToriiError>> + Send + 'a>>;
}

macro_rules! impl_hook_call {
    ($payload:ty, $method:ident) => {
        impl HookCall for $payload {
            fn call<'a>(
                plugin: &'a dyn Plugin,
                payload: &'a Self,
                ctx: &'a mut PluginContext,
            ) -> Pin<Box<dyn Future<Output = Result<PluginResult<Self>, ToriiError>> + Send + 'a>>
            {
                plugin.$method(payload, ctx)
            }
        }
    };
}

impl_hook_call!(PromptPrehookPayload, prompt_pre_fetch);
impl_hook_call!(PromptPosthookPayload, prompt_post_fetch);
impl_hook_call!(ToolPreInvokePayload, tool_pre_invoke);
impl_hook_call!(ToolPostInvokePayload, tool_post_invoke);
impl_hook_call!(ResourcePreFetchPayload, resource_pre_fetch);
impl_hook_call!(ResourcePostFetchPayload, resource_post_fetch);
impl_hook_call!(HttpPreRequestPayload, http_pre_request);
impl_hook_call!(HttpPostRequestPayload, http_post_request);
impl_hook_call!(HttpAuthResolveUserPayload, http_auth_resolve_user);
impl_hook_call!(HttpAuthCheckPermissionPayload, http_auth_check_permission);
impl_hook_call!(StartupPayload, startup);
impl_hook_call!(ShutdownPayload, shutdown_hook);
