use serde::{Deserialize, Serialize};

use crate::api::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn to_api(&self) -> ChatMessage {
        ChatMessage {
            role: self.role.as_str().to_string(),
            content: self.content.clone(),
        }
    }
}

/// The prefix of `conversation` that ends on its last user message.
///
/// Returns `None` when the conversation holds no user message at all.
pub fn trim_to_last_user(conversation: &[Message]) -> Option<&[Message]> {
    let last_user = conversation.iter().rposition(Message::is_user)?;
    Some(&conversation[..=last_user])
}

/// Content of the last user-authored message.
pub fn last_user_content(conversation: &[Message]) -> Option<&str> {
    conversation
        .iter()
        .rev()
        .find(|message| message.is_user())
        .map(|message| message.content.as_str())
}

/// Build the outbound message list: the trimmed conversation, with
/// `system_prompt` in front unless the conversation already opens with a
/// system message.
pub fn prepare_submission(
    conversation: &[Message],
    system_prompt: Option<&str>,
) -> Option<Vec<ChatMessage>> {
    let trimmed = trim_to_last_user(conversation)?;
    let mut api_messages = Vec::with_capacity(trimmed.len() + 1);

    let opens_with_system = trimmed
        .first()
        .is_some_and(|message| message.role == Role::System);
    if let Some(prompt) = system_prompt.filter(|prompt| !prompt.trim().is_empty()) {
        if !opens_with_system {
            api_messages.push(Message::system(prompt).to_api());
        }
    }

    api_messages.extend(trimmed.iter().map(Message::to_api));
    Some(api_messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("tool").is_err());
        assert_eq!(Role::try_from("assistant"), Ok(Role::Assistant));
    }

    #[test]
    fn roles_round_trip_through_serde_as_strings() {
        let message: Message = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(message, Message::user("hi"));
        assert_eq!(
            serde_json::to_string(&Message::system("be brief")).unwrap(),
            r#"{"role":"system","content":"be brief"}"#
        );
    }

    #[test]
    fn trim_to_last_user_drops_trailing_non_user_messages() {
        let conversation = vec![
            Message::system("sys"),
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
            Message::assistant("partial"),
            Message::system("note"),
        ];
        let trimmed = trim_to_last_user(&conversation).unwrap();
        assert_eq!(trimmed.len(), 4);
        assert_eq!(trimmed.last().unwrap().content, "second");
    }

    #[test]
    fn trim_to_last_user_rejects_conversations_without_user() {
        assert!(trim_to_last_user(&[]).is_none());
        assert!(trim_to_last_user(&[Message::system("sys"), Message::assistant("hi")]).is_none());
    }

    #[test]
    fn prepare_submission_prepends_system_prompt_once() {
        let conversation = vec![Message::user("hello")];
        let prepared = prepare_submission(&conversation, Some("You are helpful.")).unwrap();
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].role, "system");
        assert_eq!(prepared[1].content, "hello");

        let conversation = vec![Message::system("custom"), Message::user("hello")];
        let prepared = prepare_submission(&conversation, Some("You are helpful.")).unwrap();
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].content, "custom");

        let prepared = prepare_submission(&[Message::user("hello")], Some("  ")).unwrap();
        assert_eq!(prepared.len(), 1);
    }

    #[test]
    fn last_user_content_finds_latest_user_turn() {
        let conversation = vec![
            Message::user("one"),
            Message::assistant("a"),
            Message::user("two"),
            Message::assistant("b"),
        ];
        assert_eq!(last_user_content(&conversation), Some("two"));
        assert_eq!(last_user_content(&[Message::assistant("x")]), None);
    }
}
