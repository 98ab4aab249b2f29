/// Type definitions for the ChatGPT data export (`conversations.json`, and the
/// `jsonData` array embedded in `chat.html`).
///
/// The export is produced by a third party and drifts over time, so every
/// field here is optional and coerced leniently: a value of the wrong shape is
/// read as "missing" instead of failing the whole file.
///
/// Shape of one conversation:
/// ```json
/// {
///   "title": "Trip planning",
///   "id": "6790c6f1-...",
///   "create_time": 1737541361.2,
///   "update_time": 1737541999.8,
///   "mapping": {
///     "<node-id>": {
///       "message": {
///         "id": "<message-id>",
///         "author": { "role": "user" },
///         "create_time": 1737541361.2,
///         "content": { "content_type": "text", "parts": ["hello"] },
///         "metadata": { "attachments": [{ "id": "file-1", "name": "a.png", "mimeType": "image/png" }] }
///       },
///       "parent": null,
///       "children": ["..."]
///     }
///   }
/// }
/// ```
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// One exported conversation. Read once, never mutated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Conversation {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub create_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub update_time: Option<f64>,
    /// Node-id keyed message DAG. Nodes may be `null`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub mapping: HashMap<String, Option<Node>>,

    // Grouping keys; the first non-empty one wins.
    #[serde(default)]
    pub project: Option<Value>,
    #[serde(default)]
    pub project_id: Option<Value>,
    #[serde(default)]
    pub workspace_id: Option<Value>,
    #[serde(default)]
    pub team_id: Option<Value>,
}

impl Conversation {
    /// Every `(node_id, message)` pair whose node carries a message, in
    /// unspecified order.
    pub fn message_nodes(&self) -> impl Iterator<Item = (&str, &Message)> {
        self.mapping.iter().filter_map(|(node_id, node)| {
            node.as_ref()
                .and_then(|n| n.message.as_ref())
                .map(|m| (node_id.as_str(), m))
        })
    }

    /// The project/workspace grouping key, stringified.
    pub fn project_key(&self) -> Option<String> {
        [
            &self.project,
            &self.project_id,
            &self.workspace_id,
            &self.team_id,
        ]
        .into_iter()
        .flatten()
        .find_map(value_as_key)
    }

    /// The title, or `Conversation {position}` when absent or empty.
    /// `position` is 1-based.
    pub fn display_title(&self, position: usize) -> String {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("Conversation {}", position),
        }
    }
}

fn value_as_key(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(fields) if fields.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// One entry of the mapping. Structural-only nodes have no message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub message: Option<Message>,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub create_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub update_time: Option<f64>,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    /// Author role, `"unknown"` when absent.
    pub fn role(&self) -> &str {
        self.author
            .as_ref()
            .and_then(|a| a.role.as_deref())
            .filter(|r| !r.is_empty())
            .unwrap_or("unknown")
    }

    pub fn is_visually_hidden(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.is_visually_hidden_from_conversation)
            .unwrap_or(false)
    }

    pub fn attachments(&self) -> &[AttachmentRef] {
        self.metadata
            .as_ref()
            .map(|m| m.attachments.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_visually_hidden_from_conversation: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<AttachmentRef>,
}

/// An attachment as referenced from message metadata. The export never
/// ships the payload, only these identifiers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentRef {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<Value>,
}

/// Frontmatter stub for an attachment. `present` is always false and `path`
/// always absent: no payload is ever resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentStub {
    pub id: Option<Value>,
    pub name: Option<Value>,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<Value>,
    pub present: bool,
    pub path: Option<String>,
}

impl From<&AttachmentRef> for AttachmentStub {
    fn from(r: &AttachmentRef) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            mime_type: r.mime_type.clone(),
            present: false,
            path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Message content
// ---------------------------------------------------------------------------

/// Message body, tagged by `content_type`.
///
/// Missing content, or content without a `content_type`, is text with no parts.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// `"text"`: ordered parts. Parts are usually strings but may be `null`.
    /// `declared` is true only when the content named its type `text`.
    Text { parts: Vec<Value>, declared: bool },

    /// `"tether_quote"`: a quoted/cited passage.
    TetherQuote { text: String },

    /// Any other kind. `payload` is the whole content object.
    Other { content_type: String, payload: Value },
}

impl Default for Content {
    fn default() -> Self {
        Self::Text {
            parts: Vec::new(),
            declared: false,
        }
    }
}

impl Content {
    pub fn content_type(&self) -> &str {
        match self {
            Content::Text { .. } => "text",
            Content::TetherQuote { .. } => "tether_quote",
            Content::Other { content_type, .. } => content_type,
        }
    }

    pub fn from_value(value: Value) -> Self {
        let declared = value.get("content_type").and_then(Value::as_str);
        let content_type = declared
            .filter(|s| !s.is_empty())
            .unwrap_or("text")
            .to_string();
        let declared = declared == Some("text");

        match content_type.as_str() {
            "text" => Content::Text {
                parts: value
                    .get("parts")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
                declared,
            },
            "tether_quote" => Content::TetherQuote {
                text: match value.get("text") {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                },
            },
            _ => Content::Other {
                content_type,
                payload: value,
            },
        }
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(value))
    }
}

// ---------------------------------------------------------------------------
// Side tables
// ---------------------------------------------------------------------------

/// `user.json`. Only the email is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
}

/// One item of `shared_conversations.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SharedConversation {
    #[serde(default, deserialize_with = "lenient_string")]
    pub conversation_id: Option<String>,
    /// Share identifier, emitted verbatim as `share_id`.
    #[serde(default)]
    pub id: Option<Value>,
}

// ---------------------------------------------------------------------------
// Lenient deserializers
// ---------------------------------------------------------------------------

/// Numbers and numeric strings become seconds; everything else is missing.
pub fn coerce_timestamp(value: &Value) -> Option<f64> {
    let ts = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    ts.is_finite().then_some(ts)
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_timestamp))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Ok(Some(b)),
        _ => Ok(None),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
