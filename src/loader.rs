use crate::error::LoadError;
use crate::importer::{Conversation, SharedConversation, UserProfile};
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

pub const CONVERSATIONS_JSON: &str = "conversations.json";
pub const CHAT_HTML: &str = "chat.html";
pub const USER_JSON: &str = "user.json";
pub const SHARED_CONVERSATIONS_JSON: &str = "shared_conversations.json";

// Greedy: the array runs to the last `];` in the document.
static JSON_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)var\s+jsonData\s*=\s*(\[.*\])\s*;").expect("jsonData pattern is valid")
});

/// Which input format to try first when both are present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Prefer {
    #[default]
    Json,
    Html,
}

/// The two encodings an export bundle can come in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportSource {
    ConversationsJson,
    ChatHtml,
}

impl ExportSource {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportSource::ConversationsJson => CONVERSATIONS_JSON,
            ExportSource::ChatHtml => CHAT_HTML,
        }
    }

    /// Recorded as `source` in every frontmatter block.
    pub fn label(self) -> &'static str {
        self.file_name()
    }

    fn search_order(prefer: Prefer) -> [ExportSource; 2] {
        match prefer {
            Prefer::Json => [ExportSource::ConversationsJson, ExportSource::ChatHtml],
            Prefer::Html => [ExportSource::ChatHtml, ExportSource::ConversationsJson],
        }
    }
}

pub struct LoadedExport {
    pub conversations: Vec<Conversation>,
    pub source: ExportSource,
}

impl LoadedExport {
    pub fn source_label(&self) -> &'static str {
        self.source.label()
    }
}

/// Locate and decode the conversation array in `input_dir`.
pub fn load_export(input_dir: &Path, prefer: Prefer) -> Result<LoadedExport, LoadError> {
    for source in ExportSource::search_order(prefer) {
        let path = input_dir.join(source.file_name());
        if !path.exists() {
            continue;
        }
        info!(path = %path.display(), "loading export");
        let conversations = match source {
            ExportSource::ConversationsJson => read_json::<Vec<Conversation>>(&path)?,
            ExportSource::ChatHtml => {
                let text = read_text_lossy(&path)?;
                parse_chat_html(&path, &text)?
            }
        };
        debug!(count = conversations.len(), "decoded conversations");
        return Ok(LoadedExport {
            conversations,
            source,
        });
    }

    Err(LoadError::InputNotFound {
        dir: input_dir.to_path_buf(),
    })
}

/// Pull the `var jsonData = [...];` array out of an exported HTML page,
/// unescape HTML entities and decode it.
pub fn parse_chat_html(path: &Path, html: &str) -> Result<Vec<Conversation>, LoadError> {
    let blob = extract_json_data(html)
        .ok_or_else(|| LoadError::format_parse(path, "jsonData array not found"))?;
    let unescaped = html_escape::decode_html_entities(blob);
    serde_json::from_str(&unescaped).map_err(|e| LoadError::json(path, e))
}

/// Raw (still entity-escaped) array text of the `jsonData` assignment.
pub fn extract_json_data(html: &str) -> Option<&str> {
    JSON_DATA_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn read_text_lossy(path: &Path) -> Result<String, LoadError> {
    let bytes = fs::read(path).map_err(|e| LoadError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let bytes = fs::read(path).map_err(|e| LoadError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| LoadError::json(path, e))
}

// ── Side tables ───────────────────────────────────────────────────────────────

/// Email from `user.json`, if the file exists and parses.
pub fn load_owner_email(input_dir: &Path) -> Option<String> {
    let path = input_dir.join(USER_JSON);
    if !path.exists() {
        return None;
    }
    match read_json::<UserProfile>(&path) {
        Ok(profile) => profile.email,
        Err(e) => {
            warn!("ignoring {}: {}", USER_JSON, e);
            None
        }
    }
}

/// Index of `shared_conversations.json`, or an unavailable index when the
/// file is missing or unreadable.
pub fn load_shared_index(input_dir: &Path) -> SharedIndex {
    let path = input_dir.join(SHARED_CONVERSATIONS_JSON);
    if !path.exists() {
        return SharedIndex::unavailable();
    }
    match read_json::<Vec<SharedConversation>>(&path) {
        Ok(items) => SharedIndex::from_items(items),
        Err(e) => {
            warn!("ignoring {}: {}", SHARED_CONVERSATIONS_JSON, e);
            SharedIndex::unavailable()
        }
    }
}

/// Shared conversations keyed by `conversation_id`.
///
/// `None` means the index could not be loaded, so whether a conversation
/// was shared is unknowable.
#[derive(Debug, Clone, Default)]
pub struct SharedIndex {
    entries: Option<HashMap<String, SharedConversation>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SharedLookup {
    Unknown,
    NotShared,
    Shared { share_id: Option<Value> },
}

impl SharedIndex {
    pub fn unavailable() -> Self {
        Self { entries: None }
    }

    /// Later items win on duplicate ids; items without an id are dropped.
    pub fn from_items(items: Vec<SharedConversation>) -> Self {
        let entries = items
            .into_iter()
            .filter_map(|item| item.conversation_id.clone().map(|id| (id, item)))
            .collect();
        Self {
            entries: Some(entries),
        }
    }

    pub fn is_available(&self) -> bool {
        self.entries.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, conversation_id: Option<&str>) -> SharedLookup {
        match (&self.entries, conversation_id) {
            (Some(entries), Some(id)) => match entries.get(id) {
                Some(item) => SharedLookup::Shared {
                    share_id: item.id.clone(),
                },
                None => SharedLookup::NotShared,
            },
            _ => SharedLookup::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn extracts_multiline_json_data() {
        let html = "<html><script>\nvar jsonData = [\n  {\"title\": \"x\"}\n];\n</script></html>";
        assert_eq!(extract_json_data(html), Some("[\n  {\"title\": \"x\"}\n]"));
    }

    #[test]
    fn extraction_is_greedy_to_last_terminator() {
        let html = r#"var jsonData = [{"title": "a];b"}]; var other = 1;"#;
        let conversations = parse_chat_html(Path::new("chat.html"), html).unwrap();
        assert_eq!(conversations[0].title.as_deref(), Some("a];b"));
    }

    #[test]
    fn html_entities_are_unescaped() {
        let html = r#"<script>var jsonData = [{"title":"A &amp; B","mapping":{}}];</script>"#;
        let conversations = parse_chat_html(Path::new("chat.html"), html).unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].title.as_deref(), Some("A & B"));
        assert!(conversations[0].mapping.is_empty());
    }

    #[test]
    fn missing_assignment_is_format_error() {
        let err = parse_chat_html(Path::new("chat.html"), "<html></html>").unwrap_err();
        assert!(matches!(err, LoadError::FormatParse { .. }));
    }

    #[test]
    fn malformed_array_is_json_error() {
        let err = parse_chat_html(Path::new("chat.html"), "var jsonData = [{,}];").unwrap_err();
        assert!(matches!(err, LoadError::JsonParse { .. }));
    }

    #[test]
    fn prefer_selects_format_when_both_exist() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONVERSATIONS_JSON), r#"[{"title": "from json"}]"#).unwrap();
        fs::write(
            dir.path().join(CHAT_HTML),
            r#"var jsonData = [{"title": "from html"}, {"title": "two"}];"#,
        )
        .unwrap();

        let json = load_export(dir.path(), Prefer::Json).unwrap();
        assert_eq!(json.source_label(), "conversations.json");
        assert_eq!(json.conversations[0].title.as_deref(), Some("from json"));

        let html = load_export(dir.path(), Prefer::Html).unwrap();
        assert_eq!(html.source_label(), "chat.html");
        assert_eq!(html.conversations.len(), 2);
    }

    #[test]
    fn falls_back_to_whichever_exists() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CHAT_HTML), "var jsonData = [];").unwrap();
        let loaded = load_export(dir.path(), Prefer::Json).unwrap();
        assert_eq!(loaded.source, ExportSource::ChatHtml);
        assert!(loaded.conversations.is_empty());
    }

    #[test]
    fn nothing_to_load() {
        let dir = TempDir::new().unwrap();
        let err = load_export(dir.path(), Prefer::Json).err().unwrap();
        assert!(matches!(err, LoadError::InputNotFound { .. }));
    }

    #[test]
    fn side_tables_default_on_failure() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_owner_email(dir.path()), None);
        assert!(!load_shared_index(dir.path()).is_available());

        fs::write(dir.path().join(USER_JSON), "{not json").unwrap();
        fs::write(dir.path().join(SHARED_CONVERSATIONS_JSON), r#"{"oops": 1}"#).unwrap();
        assert_eq!(load_owner_email(dir.path()), None);
        assert!(!load_shared_index(dir.path()).is_available());
    }

    #[test]
    fn side_tables_load() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(USER_JSON), r#"{"email": "me@example.com", "id": "user-1"}"#)
            .unwrap();
        fs::write(
            dir.path().join(SHARED_CONVERSATIONS_JSON),
            r#"[{"id": "share-1", "conversation_id": "c1"}, {"id": "orphan"}]"#,
        )
        .unwrap();

        assert_eq!(load_owner_email(dir.path()).as_deref(), Some("me@example.com"));
        let index = load_shared_index(dir.path());
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.lookup(Some("c1")),
            SharedLookup::Shared {
                share_id: Some(json!("share-1"))
            }
        );
        assert_eq!(index.lookup(Some("c2")), SharedLookup::NotShared);
        assert_eq!(index.lookup(None), SharedLookup::Unknown);
        assert_eq!(SharedIndex::unavailable().lookup(Some("c1")), SharedLookup::Unknown);
    }
}
