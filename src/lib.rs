//! # chat-export-md
//!
//! Converts a ChatGPT data export into a tree of Markdown files, one folder per
//! conversation.
//!
//! ## What it does
//!
//! The export bundle carries conversations either as `conversations.json` or as a
//! `var jsonData = [...]` array embedded in `chat.html`. Each conversation is a
//! tree of nodes keyed by id; this crate flattens the message-bearing nodes into
//! chronological order, drops hidden placeholders (and tool output unless asked
//! for), and writes `conversation.md` with YAML frontmatter:
//!
//! ```text
//! conversations/
//! ├── 20240105-101500_trip-planning/conversation.md
//! └── my-project/
//!     └── 20240106-080000_schema-review/conversation.md
//! ```
//!
//! Folder names are `{created-stamp}_{title-slug}`. When a name is already taken,
//! the first 8 characters of the conversation's `stable_id` are appended. The
//! `stable_id` is a digest of the conversation's message-bearing node ids only, so
//! it survives title changes and in-place message edits.
//!
//! ## Usage
//!
//! ```sh
//! chat-export-md --input source-data --output conversations
//! chat-export-md --prefer html --include-tools --dry-run
//! ```
//!
//! Preferences can be persisted in `~/.config/chat-export-md/config.toml`.
pub mod error;
pub mod frontmatter;
pub mod importer;
pub mod loader;
pub mod logging;
pub mod ordering;
pub mod renderer;
pub mod sequential;
pub mod slug;
pub mod utils;
pub mod writer;

pub use error::LoadError;
pub use loader::{Prefer, load_export};
pub use sequential::{RunSummary, execute};
pub use utils::{ExportConfig, stable_id};
