use crate::frontmatter::FrontMatter;
use crate::importer::{AttachmentStub, Content, Message};
use crate::loader::SharedLookup;
use crate::utils::epoch_to_iso;
use serde_json::Value;
use std::io::{self, Write};

/// Everything the frontmatter says about a conversation besides its messages.
#[derive(Debug, Clone)]
pub struct ConversationMeta {
    pub title: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub stable_id: String,
    pub source: String,
    pub participants: Vec<String>,
    pub project: Option<String>,
    pub shared: SharedLookup,
    pub owner_email: Option<String>,
    pub attachments: Vec<AttachmentStub>,
}

pub fn build_frontmatter(meta: &ConversationMeta, message_count: usize) -> io::Result<FrontMatter> {
    let mut fm = FrontMatter::new();
    fm.push("title", meta.title.as_str())
        .push("created_at", meta.created_at.clone())
        .push("updated_at", meta.updated_at.clone())
        .push("stable_id", meta.stable_id.as_str())
        .push("source", meta.source.as_str())
        .push("message_count", message_count)
        .push("participants", meta.participants.clone())
        .push("project", meta.project.clone());

    match &meta.shared {
        SharedLookup::Unknown => {}
        SharedLookup::NotShared => {
            fm.push("shared", false);
        }
        SharedLookup::Shared { share_id } => {
            fm.push("shared", true)
                .push("share_id", share_id.clone().unwrap_or(Value::Null));
        }
    }

    fm.push("owner_email", meta.owner_email.clone());

    if !meta.attachments.is_empty() {
        let attachments = serde_json::to_value(&meta.attachments).map_err(io::Error::other)?;
        fm.push("attachments", attachments);
    }

    Ok(fm)
}

/// Write `conversation.md`: frontmatter, then a blank line and the body when
/// there is one. The output always ends in exactly one newline.
pub fn render_conversation<W: Write>(
    writer: &mut W,
    meta: &ConversationMeta,
    messages: &[&Message],
) -> io::Result<()> {
    build_frontmatter(meta, messages.len())?.write_to(writer)?;

    let body = render_body(messages);
    if !body.is_empty() {
        writeln!(writer)?;
        write!(writer, "{}", body)?;
    }
    Ok(())
}

/// Concatenated message sections, right-trimmed, with one trailing newline.
/// Empty when there are no messages.
pub fn render_body(messages: &[&Message]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for message in messages {
        lines.push(message_header(message));
        let (_, text) = render_message(message);
        if !text.is_empty() {
            lines.push(String::new());
            lines.push(text);
            lines.push(String::new());
        }
    }

    let body = lines.join("\n");
    let body = body.trim_end();
    if body.is_empty() {
        String::new()
    } else {
        format!("{}\n", body)
    }
}

/// `## [role] <iso-timestamp>`, or `## [role]` without a creation time.
pub fn message_header(message: &Message) -> String {
    match epoch_to_iso(message.create_time) {
        Some(ts) => format!("## [{}] {}", message.role(), ts),
        None => format!("## [{}]", message.role()),
    }
}

/// `(content_type, markdown)` for one message.
pub fn render_message(message: &Message) -> (&str, String) {
    let content = &message.content;
    let text = match content {
        Content::Text { parts, .. } => render_text(parts),
        Content::TetherQuote { text } => render_quote(text),
        Content::Other {
            content_type,
            payload,
        } => render_other(content_type, payload),
    };
    (content.content_type(), text)
}

fn render_text(parts: &[Value]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Lines split on `\r\n`, `\n` or a lone `\r`.
fn render_quote(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                ">".to_string()
            } else {
                format!("> {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_other(content_type: &str, payload: &Value) -> String {
    let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    format!("```{}\n{}\n```", content_type, pretty)
}
