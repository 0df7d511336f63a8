use crate::hook::HookPoint;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The hook-specific identifier a condition can select on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookTarget<'a> {
    Tool(&'a str),
    Prompt(&'a str),
    Resource(&'a str),
}

/// Contract every hook payload satisfies.
///
/// Ties a payload type to its hook, and exposes the fields conditional
/// filtering needs: the request target (tool name, prompt name, resource
/// URI) and the declared content type. Both default to absent.
pub trait HookPayload: Serialize + Clone + Send + Sync + 'static {
    const HOOK: HookPoint;

    fn target(&self) -> Option<HookTarget<'_>> {
        None
    }

    fn content_type(&self) -> Option<&str> {
        None
    }
}

/// Serialized byte length of a payload.
///
/// This is the measure used by the payload-size guard, taken before the
/// chain runs and again after every modification.
pub fn payload_size<T: Serialize>(payload: &T) -> Result<usize, serde_json::Error> {
    serde_json::to_vec(payload).map(|bytes| bytes.len())
}

/// Case-insensitive header lookup over a plain header map.
fn header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    let lower = name.to_lowercase();
    headers
        .iter()
        .find(|(k, _)| k.to_lowercase() == lower)
        .map(|(_, v)| v.as_str())
}

// ─── Prompt hooks ───

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPrehookPayload {
    /// Prompt template name
    pub name: String,
    /// Template arguments
    #[serde(default)]
    pub args: HashMap<String, String>,
}

impl PromptPrehookPayload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: HashMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

impl HookPayload for PromptPrehookPayload {
    const HOOK: HookPoint = HookPoint::PromptPreFetch;

    fn target(&self) -> Option<HookTarget<'_>> {
        Some(HookTarget::Prompt(&self.name))
    }
}

/// One rendered message of a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPosthookPayload {
    pub name: String,
    /// Rendered messages
    #[serde(default)]
    pub messages: Vec<PromptMessage>,
}

impl PromptPosthookPayload {
    pub fn new(name: impl Into<String>, messages: Vec<PromptMessage>) -> Self {
        Self {
            name: name.into(),
            messages,
        }
    }
}

impl HookPayload for PromptPosthookPayload {
    const HOOK: HookPoint = HookPoint::PromptPostFetch;

    fn target(&self) -> Option<HookTarget<'_>> {
        Some(HookTarget::Prompt(&self.name))
    }
}

// ─── Tool hooks ───

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPreInvokePayload {
    /// Tool name
    pub name: String,
    /// Invocation arguments
    #[serde(default)]
    pub args: Value,
}

impl ToolPreInvokePayload {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl HookPayload for ToolPreInvokePayload {
    const HOOK: HookPoint = HookPoint::ToolPreInvoke;

    fn target(&self) -> Option<HookTarget<'_>> {
        Some(HookTarget::Tool(&self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPostInvokePayload {
    pub name: String,
    /// Tool invocation result
    #[serde(default)]
    pub result: Value,
}

impl ToolPostInvokePayload {
    pub fn new(name: impl Into<String>, result: Value) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

impl HookPayload for ToolPostInvokePayload {
    const HOOK: HookPoint = HookPoint::ToolPostInvoke;

    fn target(&self) -> Option<HookTarget<'_>> {
        Some(HookTarget::Tool(&self.name))
    }
}

// ─── Resource hooks ───

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePreFetchPayload {
    /// Resource URI
    pub uri: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl ResourcePreFetchPayload {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            metadata: HashMap::new(),
        }
    }
}

impl HookPayload for ResourcePreFetchPayload {
    const HOOK: HookPoint = HookPoint::ResourcePreFetch;

    fn target(&self) -> Option<HookTarget<'_>> {
        Some(HookTarget::Resource(&self.uri))
    }
}

/// Fetched resource content, textual or binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContent {
    pub uri: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub blob: Option<Bytes>,
}

impl ResourceContent {
    pub fn text(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: Some("text/plain".to_string()),
            text: Some(text.into()),
            blob: None,
        }
    }

    pub fn blob(uri: impl Into<String>, mime_type: impl Into<String>, blob: Bytes) -> Self {
        Self {
            uri: uri.into(),
            mime_type: Some(mime_type.into()),
            text: None,
            blob: Some(blob),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePostFetchPayload {
    pub uri: String,
    pub content: ResourceContent,
}

impl ResourcePostFetchPayload {
    pub fn new(uri: impl Into<String>, content: ResourceContent) -> Self {
        Self {
            uri: uri.into(),
            content,
        }
    }
}

impl HookPayload for ResourcePostFetchPayload {
    const HOOK: HookPoint = HookPoint::ResourcePostFetch;

    fn target(&self) -> Option<HookTarget<'_>> {
        Some(HookTarget::Resource(&self.uri))
    }

    fn content_type(&self) -> Option<&str> {
        self.content.mime_type.as_deref()
    }
}

// ─── HTTP boundary hooks ───

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpPreRequestPayload {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl HttpPreRequestPayload {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl HookPayload for HttpPreRequestPayload {
    const HOOK: HookPoint = HookPoint::HttpPreRequest;

    fn content_type(&self) -> Option<&str> {
        header(&self.headers, "content-type")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpPostRequestPayload {
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl HttpPostRequestPayload {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
        }
    }
}

impl HookPayload for HttpPostRequestPayload {
    const HOOK: HookPoint = HookPoint::HttpPostRequest;

    fn content_type(&self) -> Option<&str> {
        header(&self.headers, "content-type")
    }
}

// ─── Auth hooks ───

/// Input to user resolution.
///
/// A plugin that resolves the user returns a `modified_payload` with
/// `user` set; that value is authoritative. A result without a modified
/// payload falls through to the gateway's own auth path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpAuthResolveUserPayload {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub user: Option<String>,
}

impl HttpAuthResolveUserPayload {
    pub fn new(headers: HashMap<String, String>) -> Self {
        Self { headers, user: None }
    }
}

impl HookPayload for HttpAuthResolveUserPayload {
    const HOOK: HookPoint = HookPoint::HttpAuthResolveUser;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpAuthCheckPermissionPayload {
    pub user: String,
    pub permission: String,
    #[serde(default)]
    pub resource: Option<String>,
}

impl HttpAuthCheckPermissionPayload {
    pub fn new(user: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            permission: permission.into(),
            resource: None,
        }
    }
}

impl HookPayload for HttpAuthCheckPermissionPayload {
    const HOOK: HookPoint = HookPoint::HttpAuthCheckPermission;
}

// ─── Engine-internal hooks ───

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StartupPayload {}

impl HookPayload for StartupPayload {
    const HOOK: HookPoint = HookPoint::Startup;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShutdownPayload {}

impl HookPayload for ShutdownPayload {
    const HOOK: HookPoint = HookPoint::Shutdown;
}
