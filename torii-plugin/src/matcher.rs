use torii_core::condition::PluginCondition;
use torii_core::context::GlobalContext;
use torii_core::payload::HookTarget;

/// Decides whether a plugin sees a hook invocation.
///
/// An empty condition list matches everything; otherwise any single
/// matching condition suffices.
pub fn matches(
    conditions: &[PluginCondition],
    ctx: &GlobalContext,
    target: Option<HookTarget<'_>>,
    content_type: Option<&str>,
) -> bool {
    if conditions.is_empty() {
        return true;
    }
    conditions
        .iter()
        .any(|cond| condition_matches(cond, ctx, target, content_type))
}

/// A condition matches when every populated field matches. A populated
/// target field whose kind differs from the current target (or with no
/// target at all) is a non-match.
fn condition_matches(
    cond: &PluginCondition,
    ctx: &GlobalContext,
    target: Option<HookTarget<'_>>,
    content_type: Option<&str>,
) -> bool {
    if !cond.server_ids.is_empty() {
        match &ctx.server_id {
            Some(id) if cond.server_ids.contains(id) => {}
            _ => return false,
        }
    }

    if !cond.tenant_ids.is_empty() {
        match &ctx.tenant_id {
            Some(id) if cond.tenant_ids.contains(id) => {}
            _ => return false,
        }
    }

    if !cond.tools.is_empty() {
        match target {
            Some(HookTarget::Tool(name)) if cond.tools.contains(name) => {}
            _ => return false,
        }
    }

    if !cond.prompts.is_empty() {
        match target {
            Some(HookTarget::Prompt(name)) if cond.prompts.contains(name) => {}
            _ => return false,
        }
    }

    if !cond.resources.is_empty() {
        match target {
            Some(HookTarget::Resource(uri)) if cond.resources.contains(uri) => {}
            _ => return false,
        }
    }

    if !cond.user_patterns.is_empty() {
        match &ctx.user {
            Some(user) if cond.user_patterns.iter().any(|p| p.is_match(user)) => {}
            _ => return false,
        }
    }

    if !cond.content_types.is_empty() {
        match content_type {
            Some(ct) if cond.content_types.contains(ct) => {}
            _ => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use torii_core::condition::UserPattern;

    fn ctx() -> GlobalContext {
        GlobalContext::new("req-1")
            .with_user("alice")
            .with_tenant("acme")
            .with_server("srv-1")
    }

    #[test]
    fn test_empty_conditions_match_everything() {
        assert!(matches(&[], &ctx(), None, None));
    }

    #[test]
    fn test_tenant_membership() {
        let cond = PluginCondition::new().with_tenant_ids(["acme"]);
        assert!(matches(&[cond.clone()], &ctx(), None, None));

        let other = GlobalContext::new("req-2").with_tenant("other");
        assert!(!matches(&[cond.clone()], &other, None, None));

        // Unset tenant does not satisfy a populated field.
        let unset = GlobalContext::new("req-3");
        assert!(!matches(&[cond], &unset, None, None));
    }

    #[test]
    fn test_conditions_are_or_combined() {
        let miss = PluginCondition::new().with_tenant_ids(["other"]);
        let hit = PluginCondition::new().with_server_ids(["srv-1"]);
        assert!(matches(&[miss.clone(), hit], &ctx(), None, None));
        assert!(!matches(&[miss], &ctx(), None, None));
    }

    #[test]
    fn test_fields_within_condition_are_anded() {
        let cond = PluginCondition::new()
            .with_tenant_ids(["acme"])
            .with_server_ids(["srv-2"]);
        // tenant matches but server does not
        assert!(!matches(&[cond], &ctx(), None, None));
    }

    #[test]
    fn test_tool_target() {
        let cond = PluginCondition::new().with_tools(["calculator"]);
        assert!(matches(
            &[cond.clone()],
            &ctx(),
            Some(HookTarget::Tool("calculator")),
            None
        ));
        assert!(!matches(
            &[cond.clone()],
            &ctx(),
            Some(HookTarget::Tool("translator")),
            None
        ));
        // A prompt target cannot satisfy a tools field.
        assert!(!matches(
            &[cond.clone()],
            &ctx(),
            Some(HookTarget::Prompt("calculator")),
            None
        ));
        assert!(!matches(&[cond], &ctx(), None, None));
    }

    #[test]
    fn test_user_patterns() {
        let cond = PluginCondition::new()
            .with_user_patterns(vec![UserPattern::new("^al").unwrap()]);
        assert!(matches(&[cond.clone()], &ctx(), None, None));

        let bob = GlobalContext::new("req-2").with_user("bob");
        assert!(!matches(&[cond.clone()], &bob, None, None));

        let anonymous = GlobalContext::new("req-3");
        assert!(!matches(&[cond], &anonymous, None, None));
    }

    #[test]
    fn test_content_types() {
        let cond = PluginCondition::new().with_content_types(["application/json"]);
        assert!(matches(&[cond.clone()], &ctx(), None, Some("application/json")));
        assert!(!matches(&[cond.clone()], &ctx(), None, Some("text/plain")));
        assert!(!matches(&[cond], &ctx(), None, None));
    }
}
