use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role of the turn at `index` in a strictly alternating sequence that
    /// starts with the user.
    pub fn at_position(index: usize) -> Self {
        if index % 2 == 0 {
            Self::User
        } else {
            Self::Assistant
        }
    }

    /// Wire name, as expected by chat-completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged message extracted from the transcript.
///
/// Content is always trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTurn")]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    /// Build a turn from raw text. Returns `None` when the text is blank.
    pub fn new(role: Role, text: &str) -> Option<Self> {
        let content = text.trim();
        if content.is_empty() {
            return None;
        }
        Some(Self {
            role,
            content: content.to_string(),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Deserialize)]
struct RawTurn {
    role: Role,
    content: String,
}

impl TryFrom<RawTurn> for Turn {
    type Error = String;

    fn try_from(raw: RawTurn) -> Result<Self, Self::Error> {
        Turn::new(raw.role, &raw.content).ok_or_else(|| "turn content is empty".to_string())
    }
}

/// A reply returned by the completion service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub metadata: ReplyMetadata,
}

/// Metadata about how a reply was generated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReplyMetadata {
    /// Which provider produced this reply.
    pub provider_used: String,
    /// Token count (if reported by the service).
    pub tokens_used: Option<u64>,
    /// Wall-clock request time in milliseconds.
    pub processing_time_ms: u64,
    /// Model identifier echoed by the service.
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_alternates_from_user() {
        assert_eq!(Role::at_position(0), Role::User);
        assert_eq!(Role::at_position(1), Role::Assistant);
        assert_eq!(Role::at_position(2), Role::User);
        assert_eq!(Role::at_position(7), Role::Assistant);
    }

    #[test]
    fn test_turn_trims_content() {
        let turn = Turn::new(Role::User, "  hello there \n").unwrap();
        assert_eq!(turn.content(), "hello there");
        assert_eq!(turn.role(), Role::User);
    }

    #[test]
    fn test_blank_turn_is_never_built() {
        assert!(Turn::new(Role::User, "").is_none());
        assert!(Turn::new(Role::Assistant, " \n\t ").is_none());
    }

    #[test]
    fn test_turn_serializes_as_role_content_pair() {
        let turn = Turn::new(Role::Assistant, "Hi!").unwrap();
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"Hi!"}"#);
    }

    #[test]
    fn test_deserialize_rejects_blank_turn() {
        let json = r#"{"role":"user","content":"   "}"#;
        assert!(serde_json::from_str::<Turn>(json).is_err());
    }
}
