use crate::importer::Conversation;
use crate::loader::Prefer;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Hex characters kept from the structural digest.
pub const STABLE_ID_LEN: usize = 10;

/// Configuration required to run the export process.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Clone, Debug)]
pub struct ExportConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub prefer: Prefer,
    pub include_tools: bool,
    pub copy_attachments: bool,
    pub dry_run: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("source-data"),
            output_dir: PathBuf::from("conversations"),
            prefer: Prefer::Json,
            include_tools: false,
            copy_attachments: true,
            dry_run: false,
            verbose: false,
            quiet: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    Written,
    Planned,
}

/// Structural fingerprint of a conversation: digest of its sorted
/// message-bearing node ids. Message text, titles and timestamps do not
/// participate, so editing a message in place keeps the id.
pub fn stable_id(conversation: &Conversation) -> String {
    let mut node_ids: Vec<&str> = conversation.message_nodes().map(|(id, _)| id).collect();
    node_ids.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(node_ids.join("\n").as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..STABLE_ID_LEN].to_string()
}

/// Epoch seconds to a UTC datetime, at microsecond precision.
pub fn epoch_to_utc(ts: f64) -> Option<DateTime<Utc>> {
    let micros = (ts * 1_000_000.0).round();
    if !micros.is_finite() || micros.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64)
}

/// ISO-8601 rendering used in headers and frontmatter:
/// `2024-01-02T03:04:05+00:00`, with `.ffffff` only for fractional seconds.
pub fn format_iso(dt: &DateTime<Utc>) -> String {
    if dt.timestamp_subsec_micros() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
    }
}

pub fn epoch_to_iso(ts: Option<f64>) -> Option<String> {
    ts.and_then(epoch_to_utc).map(|dt| format_iso(&dt))
}
