//! Section lookup over hierarchical configuration sources.
//!
//! A section name is a `:`-separated path (`RnCore:Encryption`). Path segments
//! are matched case-insensitively. The returned section has its keys
//! normalised to lowercase with `_` and `-` removed, and null entries dropped,
//! so `LoggingEnabled`, `loggingEnabled` and `logging_enabled` all bind to the
//! same field.

use serde_json::{Map, Value};

use crate::error::ConfigError;

/// A source that can hand out a named configuration section.
pub trait SectionSource {
    /// Look up `name`.
    ///
    /// Returns `Ok(None)` when the section does not exist, is null, or is an
    /// empty table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Source`] if the underlying source cannot be read.
    fn section(&self, name: &str) -> Result<Option<Value>, ConfigError>;
}

impl SectionSource for Value {
    fn section(&self, name: &str) -> Result<Option<Value>, ConfigError> {
        Ok(find_section(self, name).and_then(normalise))
    }
}

impl SectionSource for ::config::Config {
    fn section(&self, name: &str) -> Result<Option<Value>, ConfigError> {
        // Files and environment variables disagree on key casing; walking a
        // JSON copy lets the lookup stay case-insensitive for both.
        let tree: Value = self.clone().try_deserialize()?;
        tree.section(name)
    }
}

fn find_section<'a>(root: &'a Value, name: &str) -> Option<&'a Value> {
    name.split(':')
        .filter(|segment| !segment.is_empty())
        .try_fold(root, |node, segment| {
            node.as_object()?
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(segment))
                .map(|(_, value)| value)
        })
}

fn normalise(section: &Value) -> Option<Value> {
    let table = section.as_object()?;
    let fields: Map<String, Value> = table
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (normalise_key(key), value.clone()))
        .collect();
    if fields.is_empty() {
        return None;
    }
    Some(Value::Object(fields))
}

fn normalise_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
