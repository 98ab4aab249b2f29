use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while locating or decoding the export bundle.
///
/// Any of these aborts the run with exit code 2. Side-table problems
/// (`user.json`, `shared_conversations.json`) never surface here.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Neither `conversations.json` nor `chat.html` exists in the input directory.
    #[error("Neither conversations.json nor chat.html found in {}", dir.display())]
    InputNotFound { dir: PathBuf },

    /// `chat.html` has no `var jsonData = [...];` assignment.
    #[error("Could not parse {}: {reason}", path.display())]
    FormatParse { path: PathBuf, reason: String },

    /// The conversation array is not valid JSON (after unescaping, for HTML).
    #[error("Invalid JSON in {}: {source}", path.display())]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl LoadError {
    pub fn format_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FormatParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonParse {
            path: path.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
