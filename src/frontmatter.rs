use serde_json::Value;
use std::io::{self, Write};

pub const DELIMITER: &str = "---";

/// Ordered key/value header rendered as a YAML block.
///
/// Keys come out in insertion order. Scalars are written as JSON (which is
/// valid YAML), so strings are always quoted and escaped while numbers and
/// booleans stay bare. `null` values are dropped entirely.
#[derive(Debug, Default, Clone)]
pub struct FrontMatter {
    entries: Vec<(String, Value)>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key`. A `null` value (including `None`) is skipped.
    pub fn push(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if !value.is_null() {
            self.entries.push((key.to_string(), value));
        }
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{}", DELIMITER)?;
        for (key, value) in &self.entries {
            match value {
                Value::Array(items) => {
                    writeln!(writer, "{}:", key)?;
                    for item in items {
                        write_list_item(writer, item)?;
                    }
                }
                scalar => writeln!(writer, "{}: {}", key, scalar)?,
            }
        }
        writeln!(writer, "{}", DELIMITER)
    }

    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn write_list_item<W: Write>(writer: &mut W, item: &Value) -> io::Result<()> {
    match item {
        Value::Object(fields) => {
            writeln!(writer, "  -")?;
            for (field, value) in fields {
                if !value.is_null() {
                    writeln!(writer, "    {}: {}", field, value)?;
                }
            }
            Ok(())
        }
        scalar => writeln!(writer, "  - {}", scalar),
    }
}
