use crate::importer::{Content, Conversation, Message};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Surviving messages of one conversation, in chronological order.
#[derive(Debug)]
pub struct OrderedConversation<'a> {
    pub messages: Vec<&'a Message>,
    /// Sorted, distinct roles of `messages`.
    pub participants: Vec<String>,
}

/// Every message in the mapping, sorted by (create_time, update_time, id).
/// Nothing is filtered here.
pub fn collect_messages(conversation: &Conversation) -> Vec<&Message> {
    let mut messages: Vec<&Message> = conversation.message_nodes().map(|(_, m)| m).collect();
    messages.sort_by(|a, b| compare_messages(a, b));
    messages
}

/// Sorted and filtered message sequence plus its participant roles.
pub fn order_messages(conversation: &Conversation, include_tools: bool) -> OrderedConversation<'_> {
    let messages: Vec<&Message> = collect_messages(conversation)
        .into_iter()
        .filter(|m| !is_hidden(m))
        .filter(|m| include_tools || m.role() != "tool")
        .collect();

    let participants = messages
        .iter()
        .map(|m| m.role().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    OrderedConversation {
        messages,
        participants,
    }
}

/// Missing timestamps sort after every present one; full ties break on id.
pub fn compare_messages(a: &Message, b: &Message) -> Ordering {
    let key = |m: &Message| {
        (
            m.create_time.unwrap_or(f64::INFINITY),
            m.update_time.unwrap_or(f64::INFINITY),
        )
    };
    let (a_create, a_update) = key(a);
    let (b_create, b_update) = key(b);

    a_create
        .total_cmp(&b_create)
        .then_with(|| a_update.total_cmp(&b_update))
        .then_with(|| {
            a.id.as_deref()
                .unwrap_or_default()
                .cmp(b.id.as_deref().unwrap_or_default())
        })
}

/// Flagged hidden, or an empty system placeholder. Only content explicitly
/// typed `text` counts as a placeholder.
pub fn is_hidden(message: &Message) -> bool {
    if message.is_visually_hidden() {
        return true;
    }
    match &message.content {
        Content::Text {
            parts,
            declared: true,
        } if message.role() == "system" => parts.iter().all(|p| match p {
            serde_json::Value::Null => true,
            serde_json::Value::String(s) => s.trim().is_empty(),
            _ => false,
        }),
        _ => false,
    }
}
