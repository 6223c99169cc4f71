//! Parsed posts
//!
//! A [`PostRecord`] turns the salient parts of a post's metadata into typed
//! fields: redacted text, tokens, tags, coordinates and author. Everything is
//! computed once at construction; the record is immutable afterwards.

use crate::flatten::{FlatMetadata, MetaValue};
use crate::tokenize::{split_whitespace_tokens, Tokenizer};
use regex::{NoExpand, Regex};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, VecDeque};
use std::sync::LazyLock;

/// Replacement for every user mention in redacted text
pub const MENTION_PLACEHOLDER: &str = "@xxxxxxxx";

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").expect("valid regex"));
static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid regex"));

/// Replace every `@mention` with [`MENTION_PLACEHOLDER`]
///
/// Applying it twice yields the same text as applying it once.
///
/// # Examples
///
/// ```
/// use tagduel_domain::post::redact_mentions;
///
/// assert_eq!(redact_mentions("hi @alice and @bob_2"), "hi @xxxxxxxx and @xxxxxxxx");
/// ```
pub fn redact_mentions(text: &str) -> String {
    MENTION_RE.replace_all(text, NoExpand(MENTION_PLACEHOLDER)).into_owned()
}

/// Scan text for `#tag` tokens, returning tag text without the `#`
pub fn scan_hashtags(text: &str) -> BTreeSet<String> {
    HASHTAG_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Geolocation of a post
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Longitude (first element of the source pair)
    pub longitude: f64,
    /// Latitude (second element of the source pair)
    pub latitude: f64,
}

impl Coordinates {
    /// `(longitude, latitude)`
    pub fn as_pair(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }
}

/// Resolve a `coordinates` value to a point
///
/// Objects are unwrapped through their own `coordinates` field and nested
/// lists through their first element, until a two-element numeric list is
/// reached. Anything else resolves to `None`.
pub fn resolve_coordinates(value: &Value) -> Option<Coordinates> {
    let mut current = value;
    loop {
        match current {
            Value::Object(obj) => current = obj.get("coordinates")?,
            Value::Array(items) => match items.as_slice() {
                [first @ Value::Array(_), ..] => current = first,
                [lon, lat] => {
                    return Some(Coordinates {
                        longitude: lon.as_f64()?,
                        latitude: lat.as_f64()?,
                    })
                }
                _ => return None,
            },
            _ => return None,
        }
    }
}

/// Shallowest resolvable `coordinates` field anywhere in the metadata
fn find_coordinates(metadata: &Map<String, Value>) -> Option<Coordinates> {
    let mut pending: VecDeque<&Map<String, Value>> = VecDeque::from([metadata]);
    while let Some(level) = pending.pop_front() {
        for (key, value) in level {
            if key == "coordinates" {
                if let Some(point) = resolve_coordinates(value) {
                    return Some(point);
                }
            }
            if let Value::Object(child) = value {
                pending.push_back(child);
            }
        }
    }
    None
}

/// Structured tags from `entities.hashtags`
fn entity_hashtags(metadata: &Map<String, Value>) -> BTreeSet<String> {
    metadata
        .get("entities")
        .and_then(|entities| entities.get("hashtags"))
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(|tag| match tag {
                    Value::Object(obj) => obj.get("text").and_then(Value::as_str),
                    Value::String(s) => Some(s.as_str()),
                    _ => None,
                })
                .map(|text| text.trim_start_matches('#').to_string())
                .filter(|text| !text.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Render an identifier value as text
fn identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// One parsed post
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tagduel_domain::PostRecord;
///
/// let metadata = json!({
///     "user": {"id": 99, "time_zone": "Pacific Time (US & Canada)"},
///     "entities": {"hashtags": [{"text": "rust"}]},
///     "coordinates": {"type": "Point", "coordinates": [-122.6, 45.5]},
/// });
/// let post = PostRecord::new("hey @ferris #rust", metadata.as_object());
///
/// assert_eq!(post.redacted_text(), "hey @xxxxxxxx #rust");
/// assert!(post.tags().contains("rust"));
/// assert_eq!(post.author_id(), Some("99"));
/// assert_eq!(post.time_zone(), Some("Pacific Time (US & Canada)"));
/// assert_eq!(post.coordinates().unwrap().as_pair(), (-122.6, 45.5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    text: String,
    redacted_text: String,
    tokens: Vec<String>,
    tags: BTreeSet<String>,
    metadata: Option<FlatMetadata>,
    coordinates: Option<Coordinates>,
    author_id: Option<String>,
}

impl PostRecord {
    /// Parse a post using the whitespace tokenizer
    ///
    /// An empty `text` is recovered from the metadata's `text` field.
    pub fn new(text: impl Into<String>, metadata: Option<&Map<String, Value>>) -> Self {
        Self::with_tokenizer(text, metadata, &split_whitespace_tokens)
    }

    /// Parse a post with a custom tokenizer
    pub fn with_tokenizer(
        text: impl Into<String>,
        metadata: Option<&Map<String, Value>>,
        tokenizer: &dyn Tokenizer,
    ) -> Self {
        let mut text = text.into();
        if text.is_empty() {
            if let Some(recovered) = metadata
                .and_then(|m| m.get("text"))
                .and_then(Value::as_str)
            {
                text = recovered.to_string();
            }
        }

        let mut tags = metadata.map(entity_hashtags).unwrap_or_default();
        if tags.is_empty() {
            tags = scan_hashtags(&text);
        }

        let flat = metadata.map(FlatMetadata::from_nested);
        let author_id = flat
            .as_ref()
            .and_then(|meta| meta.get("user").as_object())
            .and_then(|user| identifier(user.get("id")));

        Self {
            redacted_text: redact_mentions(&text),
            tokens: tokenizer.tokenize(&text),
            coordinates: metadata.and_then(find_coordinates),
            metadata: flat,
            tags,
            author_id,
            text,
        }
    }

    /// Original text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text with mentions replaced by [`MENTION_PLACEHOLDER`]
    pub fn redacted_text(&self) -> &str {
        &self.redacted_text
    }

    /// Tokenized text
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Tags, without the leading `#`
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Flattened metadata, if metadata was supplied
    pub fn metadata(&self) -> Option<&FlatMetadata> {
        self.metadata.as_ref()
    }

    /// Typed metadata lookup; `Missing` when the post has no metadata
    pub fn meta(&self, key: &str) -> MetaValue<'_> {
        match &self.metadata {
            Some(meta) => meta.get(key),
            None => MetaValue::Missing,
        }
    }

    /// Raw metadata lookup
    pub fn meta_raw(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|meta| meta.raw(key))
    }

    /// Geolocation, if the metadata carries one
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// Author id from `user.id`
    pub fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }

    /// Author time zone
    pub fn time_zone(&self) -> Option<&str> {
        self.meta("time_zone").as_str()
    }
}
