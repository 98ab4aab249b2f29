//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

/// Builder for an export bundle directory (`source-data/`) next to an empty
/// output location.
pub struct ExportDirBuilder {
    temp_dir: TempDir,
}

impl ExportDirBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("source-data")).expect("Failed to create source-data");
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn input_dir(&self) -> PathBuf {
        self.temp_dir.path().join("source-data")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("conversations")
    }

    pub fn with_file(self, name: &str, content: &str) -> Self {
        fs::write(self.input_dir().join(name), content).expect("Failed to write fixture");
        self
    }

    pub fn with_conversations(self, conversations: &Value) -> Self {
        let content = serde_json::to_string_pretty(conversations).expect("fixture serializes");
        self.with_file("conversations.json", &content)
    }

    pub fn with_chat_html(self, array_literal: &str) -> Self {
        let html = format!(
            "<!DOCTYPE html>\n<html>\n<head><title>ChatGPT Data Export</title></head>\n<body>\n<div id=\"root\"></div>\n<script>\nvar jsonData = {};\n</script>\n</body>\n</html>\n",
            array_literal
        );
        self.with_file("chat.html", &html)
    }
}

/// A message node for a conversation mapping.
pub fn message_node(id: &str, role: &str, create_time: Option<f64>, text: &str) -> Value {
    json!({
        "id": format!("node-{id}"),
        "message": {
            "id": id,
            "author": { "role": role },
            "create_time": create_time,
            "update_time": null,
            "content": { "content_type": "text", "parts": [text] },
            "metadata": {}
        },
        "children": []
    })
}

/// Every `conversation.md` under `root`, sorted by path.
pub fn conversation_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.file_name().is_some_and(|n| n == "conversation.md") {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

/// Parse the frontmatter block of a rendered file as YAML.
pub fn frontmatter_yaml(text: &str) -> serde_yaml::Value {
    let inner = text
        .strip_prefix("---\n")
        .and_then(|rest| rest.split_once("\n---\n"))
        .map(|(yaml, _)| yaml)
        .expect("file starts with a frontmatter block");
    serde_yaml::from_str(inner).expect("frontmatter is valid YAML")
}
