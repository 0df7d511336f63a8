use serde::{Deserialize, Serialize};

/// Hook points in the gateway request lifecycle.
///
/// The set is closed: dispatch is by explicit match, never by probing
/// plugin methods at runtime. `startup` and `shutdown` are engine-internal
/// hooks fired by the manager's own lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    /// Before a prompt template is fetched and rendered
    PromptPreFetch,
    /// After a prompt template is rendered
    PromptPostFetch,
    /// Before a tool is invoked
    ToolPreInvoke,
    /// After a tool invocation returns
    ToolPostInvoke,
    /// Before a resource is fetched
    ResourcePreFetch,
    /// After a resource has been fetched
    ResourcePostFetch,
    /// At the HTTP boundary, before the gateway processes a request
    HttpPreRequest,
    /// At the HTTP boundary, after the gateway produced a response
    HttpPostRequest,
    /// During authentication, to resolve the requesting user
    HttpAuthResolveUser,
    /// During authorization, to check a permission
    HttpAuthCheckPermission,
    /// Engine startup
    Startup,
    /// Engine shutdown
    Shutdown,
}

impl HookPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::PromptPreFetch => "prompt_pre_fetch",
            HookPoint::PromptPostFetch => "prompt_post_fetch",
            HookPoint::ToolPreInvoke => "tool_pre_invoke",
            HookPoint::ToolPostInvoke => "tool_post_invoke",
            HookPoint::ResourcePreFetch => "resource_pre_fetch",
            HookPoint::ResourcePostFetch => "resource_post_fetch",
            HookPoint::HttpPreRequest => "http_pre_request",
            HookPoint::HttpPostRequest => "http_post_request",
            HookPoint::HttpAuthResolveUser => "http_auth_resolve_user",
            HookPoint::HttpAuthCheckPermission => "http_auth_check_permission",
            HookPoint::Startup => "startup",
            HookPoint::Shutdown => "shutdown",
        }
    }

    pub fn all() -> &'static [HookPoint] {
        &[
            HookPoint::PromptPreFetch,
            HookPoint::PromptPostFetch,
            HookPoint::ToolPreInvoke,
            HookPoint::ToolPostInvoke,
            HookPoint::ResourcePreFetch,
            HookPoint::ResourcePostFetch,
            HookPoint::HttpPreRequest,
            HookPoint::HttpPostRequest,
            HookPoint::HttpAuthResolveUser,
            HookPoint::HttpAuthCheckPermission,
            HookPoint::Startup,
            HookPoint::Shutdown,
        ]
    }
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_round_trips_with_serde() {
        for hook in HookPoint::all() {
            let json = serde_json::to_string(hook).unwrap();
            assert_eq!(json, format!("\"{}\"", hook.as_str()));
            let back: HookPoint = serde_json::from_str(&json).unwrap();
            assert_eq!(back, *hook);
        }
    }

    #[test]
    fn test_all_is_complete_and_distinct() {
        let all = HookPoint::all();
        assert_eq!(all.len(), 12);
        let strings: std::collections::HashSet<&str> =
            all.iter().map(|h| h.as_str()).collect();
        assert_eq!(strings.len(), 12);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", HookPoint::ToolPreInvoke), "tool_pre_invoke");
        assert_eq!(format!("{}", HookPoint::HttpAuthResolveUser), "http_auth_resolve_user");
    }

    #[test]
    fn test_unknown_hook_is_rejected() {
        let err = serde_json::from_str::<HookPoint>("\"tool_mid_invoke\"");
        assert!(err.is_err());
    }
}
