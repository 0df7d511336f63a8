pub mod condition;
pub mod config;
pub mod context;
pub mod error;
pub mod hook;
pub mod payload;
pub mod result;

pub use condition::{PluginCondition, UserPattern};
pub use config::{PluginEntry, PluginMode, PluginSettings, ToriiConfig};
pub use context::{GlobalContext, PluginContext, PluginContextTable};
pub use error::ToriiError;
pub use hook::HookPoint;
pub use payload::{
    HookPayload, HookTarget, HttpAuthCheckPermissionPayload, HttpAuthResolveUserPayload,
    HttpPostRequestPayload, HttpPreRequestPayload, PromptMessage, PromptPosthookPayload,
    PromptPrehookPayload, ResourceContent, ResourcePostFetchPayload, ResourcePreFetchPayload,
    ShutdownPayload, StartupPayload, ToolPostInvokePayload, ToolPreInvokePayload,
};
pub use result::{PluginResult, PluginViolation};
