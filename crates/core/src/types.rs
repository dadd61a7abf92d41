use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Accept an identifier sent as either a JSON string or a number
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, found {other}"
        ))),
    }
}

/// Author of a conversation line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// One line of the character-creation conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub sender: Sender,
    pub text: String,
}

impl ConversationMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            text: text.into(),
        }
    }
}

/// Character backstory: either the saved creation conversation or free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backstory {
    Conversation(Vec<ConversationMessage>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub character_id: i64,
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub character_sheet: Option<String>,
    #[serde(default)]
    pub backstory: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub player_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Character {
    /// Interpret the stored backstory.
    ///
    /// A JSON array of conversation messages becomes a conversation. Any other
    /// JSON value or unparsable text is kept as plain text.
    pub fn parsed_backstory(&self) -> Option<Backstory> {
        let raw = self.backstory.as_deref().filter(|b| !b.trim().is_empty())?;
        match serde_json::from_str::<Vec<ConversationMessage>>(raw) {
            Ok(messages) => Some(Backstory::Conversation(messages)),
            Err(e) => {
                tracing::debug!("Backstory is not a conversation: {e}");
                Some(Backstory::Text(raw.to_string()))
            }
        }
    }

    /// Sheet text, or a placeholder when none has been written
    pub fn sheet_or_placeholder(&self) -> &str {
        self.character_sheet
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("No character sheet available.")
    }
}

/// Narrative session for one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(deserialize_with = "string_or_number")]
    pub session_id: String,
    pub character_id: i64,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub narrative_direction: Option<String>,
}

impl Session {
    /// Replace the summary with the latest narrative
    pub fn advance(&mut self, narrative: &str) {
        self.summary = Some(narrative.to_string());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevLoginRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

/// Narrative returned by the dungeon master
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeResponse {
    #[serde(alias = "Narrative")]
    pub narrative: String,
    #[serde(default, alias = "DmNotes")]
    pub dm_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerActionRequest {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_summary: Option<String>,
}

/// One exchange of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(alias = "sequenceNumber")]
    pub sequence: u64,
    pub action: String,
    pub narrative: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Page of recent submissions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    #[serde(default)]
    pub submissions: Vec<Submission>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiateRequest {
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiateResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCharacterRequest {
    pub name: String,
    pub character_sheet: String,
    pub conversation: Vec<ConversationMessage>,
    pub is_markdown: bool,
}

impl SaveCharacterRequest {
    /// Build a save request from a finished conversation.
    ///
    /// The sheet is the last AI message, or empty when the AI never answered.
    pub fn from_conversation(name: impl Into<String>, conversation: Vec<ConversationMessage>) -> Self {
        let character_sheet = conversation
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Ai)
            .map(|m| m.text.clone())
            .unwrap_or_default();
        Self {
            name: name.into(),
            character_sheet,
            conversation,
            is_markdown: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCharacterResponse {
    pub character_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSheetRequest {
    pub character_sheet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterImage {
    pub image_url: String,
}

/// Selectable AI backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProvider {
    pub provider: i32,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProviderResponse {
    pub current_provider: i32,
    pub display_name: String,
    #[serde(default)]
    pub available_providers: Vec<ApiProvider>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetApiProviderRequest {
    pub provider: i32,
}

/// Player row of the administrator user list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub player_id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_login_at: Option<String>,
    #[serde(default)]
    pub subscription: Option<AdminUserSubscription>,
}

impl AdminUser {
    /// Display name, falling back to the email
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("Unknown player")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserSubscription {
    pub tier: String,
    pub status: String,
    #[serde(default)]
    pub is_admin_granted: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUsersResponse {
    #[serde(default)]
    pub users: Vec<AdminUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActionRequest {
    pub player_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
