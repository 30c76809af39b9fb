use serde::{Deserialize, Serialize};

use crate::message::{Role, Turn};

/// Conversation context passed to a provider for one completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// System prompt sent ahead of the turns. Empty = no system message.
    #[serde(default)]
    pub system_prompt: String,
    /// Context window, oldest first. The last turn is the one being answered.
    pub turns: Vec<Turn>,
    /// Override the provider's configured model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Context {
    pub fn new(system_prompt: &str, turns: Vec<Turn>) -> Self {
        Self {
            system_prompt: system_prompt.to_string(),
            turns,
            model: None,
        }
    }

    /// The user turn that triggered this request, if the window ends with one.
    pub fn current_message(&self) -> Option<&str> {
        self.turns
            .last()
            .filter(|t| t.role() == Role::User)
            .map(|t| t.content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: Role, text: &str) -> Turn {
        Turn::new(role, text).unwrap()
    }

    #[test]
    fn test_current_message_is_last_user_turn() {
        let ctx = Context::new(
            "",
            vec![
                turn(Role::User, "Hi"),
                turn(Role::Assistant, "Hello!"),
                turn(Role::User, "How are you?"),
            ],
        );
        assert_eq!(ctx.current_message(), Some("How are you?"));
    }

    #[test]
    fn test_current_message_none_when_last_is_assistant() {
        let ctx = Context::new("", vec![turn(Role::Assistant, "Hello!")]);
        assert_eq!(ctx.current_message(), None);
    }

    #[test]
    fn test_context_deserialize_without_optional_fields() {
        let json = r#"{"turns":[{"role":"user","content":"hi"}]}"#;
        let ctx: Context = serde_json::from_str(json).unwrap();
        assert!(ctx.system_prompt.is_empty());
        assert!(ctx.model.is_none());
        assert_eq!(ctx.turns.len(), 1);
    }
}
