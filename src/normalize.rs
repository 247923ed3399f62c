//! Shape normalization for decoded XML documents.
//!
//! XML cannot tell a one-item list from a scalar, and an empty list is
//! usually just a missing element. Responses are first decoded into an
//! untyped [`serde_json::Value`] tree (see [`parse_xml`]); every site that
//! reads a possibly repeated element goes through [`one_or_many`] so a lone
//! `<Bucket>` is never mistaken for the list itself.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub use crate::util::xml::parse_xml;

/// Normalizes a possibly repeated element into a list.
///
/// - absent (or JSON `null`) yields `None`
/// - an array is returned unchanged
/// - anything else becomes a one-element list
///
/// Re-normalizing the output of this function is a no-op.
pub fn one_or_many(value: Option<Value>) -> Option<Vec<Value>> {
    match value? {
        Value::Null => None,
        Value::Array(items) => Some(items),
        other => Some(vec![other]),
    }
}

/// Like [`one_or_many`], but treats absence as an empty list.
pub fn list_or_empty(value: Option<Value>) -> Vec<Value> {
    one_or_many(value).unwrap_or_default()
}

/// Lowercases the first character of `key` (`AllowedOrigin` -> `allowedOrigin`).
pub fn lower_first(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Applies [`lower_first`] to every top-level key of an object.
///
/// Nested values and non-object inputs are returned untouched.
pub fn lower_first_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (lower_first(&k), v))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

/// Reads a text leaf, accepting numbers and booleans as their string form.
pub(crate) fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Text leaf that is `None` when missing or empty.
pub(crate) fn non_empty_text(value: Option<&Value>) -> Option<String> {
    text(value).filter(|s| !s.is_empty())
}

/// A caller-supplied field that may be one string or several.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OneOrMany(pub Vec<String>);

impl OneOrMany {
    /// Returns the normalized list.
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(value: Vec<&str>) -> Self {
        Self(value.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany {
    fn from(value: [&str; N]) -> Self {
        Self(value.into_iter().map(str::to_string).collect())
    }
}

impl<'de> Deserialize<'de> for OneOrMany {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let items = list_or_empty(Some(value))
            .iter()
            .filter_map(|v| text(Some(v)))
            .collect();
        Ok(Self(items))
    }
}
