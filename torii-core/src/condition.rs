use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

/// A compiled user-matching pattern.
///
/// Patterns are regular expressions, matched unanchored against the
/// request's user. Compilation happens when the configuration is
/// deserialized, so an invalid pattern is a config-load error, never a
/// match-time surprise.
#[derive(Debug, Clone)]
pub struct UserPattern(Regex);

impl UserPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn is_match(&self, user: &str) -> bool {
        self.0.is_match(user)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for UserPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for UserPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        UserPattern::new(&pattern).map_err(|e| {
            serde::de::Error::custom(format!("invalid user pattern {pattern:?}: {e}"))
        })
    }
}

/// Declarative filter gating whether a plugin sees a hook invocation.
///
/// Each field is a constraint; an empty field is unpopulated and does not
/// constrain. A condition matches when every populated field matches. A
/// plugin's condition list is OR-combined, and an empty list matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginCondition {
    /// Request's server id must be in this set
    pub server_ids: HashSet<String>,
    /// Request's tenant id must be in this set
    pub tenant_ids: HashSet<String>,
    /// Current tool target must be in this set
    pub tools: HashSet<String>,
    /// Current prompt target must be in this set
    pub prompts: HashSet<String>,
    /// Current resource target must be in this set
    pub resources: HashSet<String>,
    /// Request's user must match any of these patterns
    pub user_patterns: Vec<UserPattern>,
    /// Payload's declared content type must be in this set
    pub content_types: HashSet<String>,
}

impl PluginCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server_ids<I: IntoIterator<Item = S>, S: Into<String>>(mut self, ids: I) -> Self {
        self.server_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tenant_ids<I: IntoIterator<Item = S>, S: Into<String>>(mut self, ids: I) -> Self {
        self.tenant_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tools<I: IntoIterator<Item = S>, S: Into<String>>(mut self, tools: I) -> Self {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prompts<I: IntoIterator<Item = S>, S: Into<String>>(mut self, prompts: I) -> Self {
        self.prompts = prompts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resources<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        resources: I,
    ) -> Self {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_user_patterns(mut self, patterns: Vec<UserPattern>) -> Self {
        self.user_patterns = patterns;
        self
    }

    pub fn with_content_types<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        types: I,
    ) -> Self {
        self.content_types = types.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_pattern_matches_unanchored() {
        let p = UserPattern::new("^admin").unwrap();
        assert!(p.is_match("admin-1"));
        assert!(!p.is_match("superadmin"));

        let substring = UserPattern::new("bot").unwrap();
        assert!(substring.is_match("chatbot-7"));
    }

    #[test]
    fn test_invalid_pattern_fails_deserialization() {
        let err = serde_json::from_str::<UserPattern>("\"[unclosed\"");
        let msg = err.unwrap_err().to_string();
        assert!(msg.contains("invalid user pattern"), "got: {msg}");
    }

    #[test]
    fn test_condition_deserializes_with_partial_fields() {
        let cond: PluginCondition = serde_json::from_str(
            r#"{"tenant_ids": ["acme"], "user_patterns": ["^svc-"]}"#,
        )
        .unwrap();
        assert!(cond.tenant_ids.contains("acme"));
        assert_eq!(cond.user_patterns.len(), 1);
        assert!(cond.server_ids.is_empty());
        assert!(cond.tools.is_empty());
    }

    #[test]
    fn test_pattern_round_trips_as_string() {
        let cond = PluginCondition::new()
            .with_user_patterns(vec![UserPattern::new("^admin").unwrap()]);
        let json = serde_json::to_string(&cond).unwrap();
        let back: PluginCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_patterns[0].as_str(), "^admin");
    }
}
