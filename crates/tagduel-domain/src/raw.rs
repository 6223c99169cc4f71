//! Raw posts as delivered by the feed

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unparsed post object from the feed
///
/// Only `text`, `lang` and `entities.hashtags` are interpreted here; every
/// other field is carried along as metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPost(Map<String, Value>);

impl RawPost {
    /// Wrap a JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value, which must be an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Post text, if present as a string
    pub fn text(&self) -> Option<&str> {
        self.0.get("text").and_then(Value::as_str)
    }

    /// Whether the post declares a language (`null` counts as undeclared)
    pub fn has_language(&self) -> bool {
        self.0.get("lang").is_some_and(|lang| !lang.is_null())
    }

    /// Declared language code
    pub fn language(&self) -> Option<&str> {
        self.0.get("lang").and_then(Value::as_str)
    }

    /// Structured hashtag entities; empty when the section is missing
    pub fn hashtags(&self) -> &[Value] {
        self.0
            .get("entities")
            .and_then(|entities| entities.get("hashtags"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every field except `text`
    pub fn metadata(&self) -> Map<String, Value> {
        self.0
            .iter()
            .filter(|(key, _)| key.as_str() != "text")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Borrow all fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}
