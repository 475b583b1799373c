use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation
// =============================================================================

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona and instruction text. Only the server ever authors one.
    System,
    /// The person chatting.
    User,
    /// The text generator.
    Assistant,
}

/// A single conversation turn, as exchanged with the client and the generator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
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
}

/// Body of `POST /api/chat`. A missing `messages` field is an empty history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Lowercased content of the most recent user message, or an empty string
/// when the history holds no user turn yet.
pub fn latest_user_query(history: &[ChatMessage]) -> String {
    history
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.to_lowercase())
        .unwrap_or_default()
}

// =============================================================================
// Catalog
// =============================================================================

/// Upper bound on catalog records embedded into a single prompt.
pub const MAX_CONTEXT_RECORDS: usize = 5;

/// A menu entry owned by the catalog store.
///
/// `id` keeps the store's natural string form (e.g. `"01"`); photo URLs are
/// built from it verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hola")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hola"}"#);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = serde_json::from_str::<ChatMessage>(r#"{"role":"tool","content":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_chat_request_defaults_to_empty_history() {
        let request: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(request.messages.is_empty());
    }

    #[test]
    fn test_latest_user_query_lowercases() {
        let history = vec![
            ChatMessage::user("Quiero CACHAMA"),
            ChatMessage::assistant("Con gusto"),
        ];
        assert_eq!(latest_user_query(&history), "quiero cachama");
    }

    #[test]
    fn test_latest_user_query_picks_last_user_turn() {
        let history = vec![
            ChatMessage::user("Desayunos"),
            ChatMessage::assistant("Tenemos arepas"),
            ChatMessage::user("Almuerzos"),
            ChatMessage::system("ignored"),
        ];
        assert_eq!(latest_user_query(&history), "almuerzos");
    }

    #[test]
    fn test_latest_user_query_empty_history() {
        assert_eq!(latest_user_query(&[]), "");
        assert_eq!(latest_user_query(&[ChatMessage::assistant("hola")]), "");
    }

    #[test]
    fn test_context_record_json_shape() {
        let record = ContextRecord {
            id: "01".to_string(),
            name: "Cachama frita".to_string(),
            category: "Almuerzos".to_string(),
            description: "Con tostones".to_string(),
            price: 12.5,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "01");
        assert_eq!(value["price"], 12.5);
    }
}
