//! Metadata flattening
//!
//! Post metadata arrives as deeply nested JSON. The flattener lifts every key
//! found at any depth into a single-level map so callers can look up values
//! such as `time_zone` or `user` without knowing where the feed nests them.
//!
//! Collisions are resolved deterministically: the shallowest occurrence of a
//! key wins, and among keys at the same depth the first one visited wins.
//! Traversal is breadth-first over an explicit queue, so nesting depth is
//! bounded only by memory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::VecDeque;

/// Flatten a nested mapping into a single level
///
/// Every key keeps its full value, so intermediate keys still map to their
/// whole sub-object. Arrays are treated as leaves.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tagduel_domain::flatten::flatten;
///
/// let nested = json!({"id": 1, "user": {"id": 2, "time_zone": "UTC"}});
/// let flat = flatten(nested.as_object().unwrap());
///
/// assert_eq!(flat["id"], json!(1));
/// assert_eq!(flat["time_zone"], json!("UTC"));
/// assert!(flat["user"].is_object());
/// ```
pub fn flatten(metadata: &Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    let mut pending: VecDeque<&Map<String, Value>> = VecDeque::new();
    pending.push_back(metadata);

    while let Some(level) = pending.pop_front() {
        for (key, value) in level {
            if !flat.contains_key(key) {
                flat.insert(key.clone(), value.clone());
            }
            if let Value::Object(child) = value {
                pending.push_back(child);
            }
        }
    }

    flat
}

/// Tagged view of one flattened metadata value
///
/// `Missing` means the key does not exist; `Null` means it exists with an
/// explicit JSON null.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetaValue<'a> {
    /// Key not present
    Missing,
    /// Explicit null
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value
    Number(&'a Number),
    /// String value
    Text(&'a str),
    /// Array value
    List(&'a [Value]),
    /// Nested object
    Object(&'a Map<String, Value>),
}

impl<'a> MetaValue<'a> {
    /// Build a tagged view from an optional raw value
    pub fn from_value(value: Option<&'a Value>) -> Self {
        match value {
            None => MetaValue::Missing,
            Some(Value::Null) => MetaValue::Null,
            Some(Value::Bool(b)) => MetaValue::Bool(*b),
            Some(Value::Number(n)) => MetaValue::Number(n),
            Some(Value::String(s)) => MetaValue::Text(s),
            Some(Value::Array(items)) => MetaValue::List(items),
            Some(Value::Object(obj)) => MetaValue::Object(obj),
        }
    }

    /// True when the key is absent
    pub fn is_missing(&self) -> bool {
        matches!(self, MetaValue::Missing)
    }

    /// True when the key is present with a non-null value
    pub fn is_present(&self) -> bool {
        !matches!(self, MetaValue::Missing | MetaValue::Null)
    }

    /// String contents, if this is a string
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric contents as f64, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Numeric contents as i64, if this is an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Array contents, if this is an array
    pub fn as_list(&self) -> Option<&'a [Value]> {
        match self {
            MetaValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Object contents, if this is an object
    pub fn as_object(&self) -> Option<&'a Map<String, Value>> {
        match self {
            MetaValue::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

/// Flattened post metadata
///
/// Built once per post; lookups never fail, they return [`MetaValue::Missing`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatMetadata(Map<String, Value>);

impl FlatMetadata {
    /// Flatten nested metadata
    pub fn from_nested(metadata: &Map<String, Value>) -> Self {
        Self(flatten(metadata))
    }

    /// Typed lookup
    pub fn get(&self, key: &str) -> MetaValue<'_> {
        MetaValue::from_value(self.0.get(key))
    }

    /// Raw lookup
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether a key exists (null values included)
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over all flattened keys
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Number of flattened keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no keys were found
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_keeps_intermediate_keys() {
        let flat = flatten(&object(json!({
            "entities": {"hashtags": [{"text": "rust"}]},
        })));

        assert!(flat["entities"].is_object());
        assert_eq!(flat["hashtags"], json!([{"text": "rust"}]));
    }

    #[test]
    fn test_shallowest_key_wins() {
        let flat = flatten(&object(json!({
            "user": {"id": 7, "profile": {"id": 9}},
            "id": 1,
        })));

        assert_eq!(flat["id"], json!(1));
    }

    #[test]
    fn test_first_visited_wins_at_equal_depth() {
        let flat = flatten(&object(json!({
            "user": {"name": "alice"},
            "place": {"name": "Portland"},
        })));

        assert_eq!(flat["name"], json!("alice"));
    }

    #[test]
    fn test_arrays_are_leaves() {
        let flat = flatten(&object(json!({
            "list": [{"hidden": true}],
        })));

        assert!(!flat.contains_key("hidden"));
    }

    #[test]
    fn test_flattening_is_stable() {
        let nested = object(json!({
            "a": {"b": {"c": 1}, "d": 2},
            "e": null,
        }));
        let once = flatten(&nested);
        let twice = flatten(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_deep_nesting() {
        let mut value = json!({"leaf": true});
        for depth in 0..200 {
            let mut wrapper = Map::new();
            wrapper.insert(format!("k{}", depth), value);
            value = Value::Object(wrapper);
        }
        let flat = flatten(value.as_object().unwrap());
        assert_eq!(flat["leaf"], json!(true));
        assert_eq!(flat.len(), 201);
    }

    #[test]
    fn test_meta_value_tags() {
        let meta = FlatMetadata::from_nested(&object(json!({
            "text": "hi",
            "count": 3,
            "nothing": null,
            "user": {"verified": false},
        })));

        assert_eq!(meta.get("text").as_str(), Some("hi"));
        assert_eq!(meta.get("count").as_i64(), Some(3));
        assert_eq!(meta.get("verified"), MetaValue::Bool(false));
        assert_eq!(meta.get("nothing"), MetaValue::Null);
        assert!(meta.get("absent").is_missing());
        assert!(!meta.get("nothing").is_present());
        assert!(meta.get("user").as_object().is_some());
        assert_eq!(meta.raw("count"), Some(&json!(3)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 48, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
                prop::collection::btree_map("[a-e]{1,2}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn arb_object() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map("[a-e]{1,2}", arb_value(), 0..5)
            .prop_map(|m| m.into_iter().collect())
    }

    fn all_keys(map: &Map<String, Value>, out: &mut BTreeSet<String>) {
        for (key, value) in map {
            out.insert(key.clone());
            if let Value::Object(child) = value {
                all_keys(child, out);
            }
        }
    }

    proptest! {
        /// Property: every key at any depth appears in the flat map, and nothing else does
        #[test]
        fn test_flatten_complete_and_sound(nested in arb_object()) {
            let mut expected = BTreeSet::new();
            all_keys(&nested, &mut expected);

            let flat = flatten(&nested);
            let actual: BTreeSet<String> = flat.keys().cloned().collect();

            prop_assert_eq!(actual, expected);
        }

        /// Property: top-level values always survive flattening unchanged
        #[test]
        fn test_top_level_values_preserved(nested in arb_object()) {
            let flat = flatten(&nested);
            for (key, value) in &nested {
                prop_assert_eq!(&flat[key], value);
            }
        }
    }
}
