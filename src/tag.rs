//! Tag types and the two tag encodings found on template resources.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// A resource tag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tag {
    /// The tag key.
    pub key: String,

    /// The tag value.
    pub value: String,
}

impl Tag {
    /// Construct a tag from a key and a value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The stack tag set configured once per deployment.
///
/// Keys are unique; inserting a tag whose key is already present replaces the
/// earlier value (last write wins).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TagSet(Vec<Tag>);

impl TagSet {
    /// Construct an empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag, replacing any existing tag with the same key.
    pub fn insert(&mut self, tag: Tag) {
        match self.0.iter_mut().find(|existing| existing.key == tag.key) {
            Some(existing) => *existing = tag,
            None => self.0.push(tag),
        }
    }

    /// Whether any tags are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of configured tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether a tag with the given key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|tag| tag.key == key)
    }

    pub(crate) fn as_sdk_map(&self) -> HashMap<String, String> {
        self.0
            .iter()
            .map(|tag| (tag.key.clone(), tag.value.clone()))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for TagSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Self::new();
        for (key, value) in iter {
            tags.insert(Tag::new(key, value));
        }
        tags
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The encoding a resource type's schema uses for its `Tags` property.
///
/// Most resource types declare tags as a list of `{"Key": ..., "Value": ...}`
/// objects; a handful (API Gateway v2, SSM parameters) take a plain key/value
/// map instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TagEncoding {
    /// `[{"Key": k, "Value": v}, ...]`
    List,

    /// `{"k": "v", ...}`
    Map,
}

/// Tag pairs as they appear on a template resource, in declaration order.
///
/// Values are arbitrary JSON: declared tags may carry intrinsics such as
/// `{"Ref": ...}`, which must pass through the merge untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceTags(Vec<(String, Value)>);

impl ResourceTags {
    /// Decode a `Tags` property value in either encoding.
    ///
    /// Returns `None` if the value is neither a list of `{Key, Value}`
    /// objects nor a key/value map.
    #[must_use]
    pub fn decode(value: &Value) -> Option<Self> {
        match value {
            Value::Array(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for entry in entries {
                    let entry = entry.as_object()?;
                    let key = entry.get("Key")?.as_str()?;
                    let value = entry.get("Value")?;
                    pairs.push((key.to_string(), value.clone()));
                }
                Some(Self(pairs))
            }
            Value::Object(map) => Some(Self(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Encode the pairs in the given encoding.
    #[must_use]
    pub fn encode(&self, encoding: TagEncoding) -> Value {
        match encoding {
            TagEncoding::List => Value::Array(
                self.0
                    .iter()
                    .map(|(key, value)| {
                        let mut entry = Map::new();
                        entry.insert("Key".to_string(), Value::String(key.clone()));
                        entry.insert("Value".to_string(), value.clone());
                        Value::Object(entry)
                    })
                    .collect(),
            ),
            TagEncoding::Map => Value::Object(
                self.0
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
        }
    }

    /// Append each stack tag whose key is not already present.
    ///
    /// Existing pairs are preserved unchanged; a stack tag never overrides a
    /// tag the resource already declares.
    #[must_use]
    pub fn merge(mut self, stack_tags: &TagSet) -> Self {
        for tag in stack_tags {
            if !self.contains_key(&tag.key) {
                self.0
                    .push((tag.key.clone(), Value::String(tag.value.clone())));
            }
        }
        self
    }

    /// Whether a pair with the given key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(existing, _)| existing == key)
    }

    /// Whether any pairs are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
