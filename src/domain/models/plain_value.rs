//! Plain-data values shared by the cache, the accessors and the tool responses.
//!
//! `PlainValue` is the only shape that crosses the encoder/decoder boundary:
//! descriptors returned by the Cloud Run API are turned into it by the
//! converter registry, and every cache file decodes back into it. Mappings keep
//! their insertion order so YAML and JSON files read the way they were built.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A loosely shaped, fully encodable value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlainValue {
    /// Absent value (`null` / `~`).
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integral number.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Ordered sequence.
    List(Vec<PlainValue>),
    /// Mapping with insertion-ordered, unique keys.
    Map(Vec<(String, PlainValue)>),
}

impl PlainValue {
    /// Empty mapping.
    pub const fn empty_map() -> Self {
        Self::Map(Vec::new())
    }

    /// Returns true for `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text content, if this is `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Borrow the items, if this is a `List`.
    pub fn as_list(&self) -> Option<&[PlainValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key in a `Map`. Returns `None` for any other variant.
    pub fn get(&self, key: &str) -> Option<&PlainValue> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Insert or replace a key in a `Map`. Has no effect on other variants.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PlainValue>) {
        if let Self::Map(entries) = self {
            let key = key.into();
            let value = value.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
    }

    /// Copy with every non-finite float replaced by its string form.
    ///
    /// JSON has no spelling for NaN or infinity; those leaves are coerced to
    /// text instead of failing the whole document.
    pub fn json_safe(&self) -> Self {
        match self {
            Self::Float(f) if !f.is_finite() => Self::Text(f.to_string()),
            Self::List(items) => Self::List(items.iter().map(Self::json_safe).collect()),
            Self::Map(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.json_safe()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Render as a YAML document.
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

impl fmt::Display for PlainValue {
    /// Text renders verbatim, everything else as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            other => match serde_json::to_string(&other.json_safe()) {
                Ok(json) => f.write_str(&json),
                Err(_) => f.write_str("null"),
            },
        }
    }
}

impl From<bool> for PlainValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PlainValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PlainValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PlainValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PlainValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<PlainValue>> From<Vec<T>> for PlainValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PlainValue>> From<Option<T>> for PlainValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for PlainValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_else(|| Self::Text(n.to_string())),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Builder for `PlainValue::Map` that leaves out empty fields, the way a
/// protobuf-to-dict conversion omits defaults.
#[derive(Debug, Default)]
pub struct PlainMapBuilder {
    entries: Vec<(String, PlainValue)>,
}

impl PlainMapBuilder {
    /// Start an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always insert.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<PlainValue>) -> Self {
        self.entries.push((key.to_string(), value.into()));
        self
    }

    /// Insert unless the text is empty.
    #[must_use]
    pub fn text(self, key: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.field(key, value)
        }
    }

    /// Insert when present.
    #[must_use]
    pub fn optional(self, key: &str, value: Option<impl Into<PlainValue>>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    /// Insert unless the list is empty.
    #[must_use]
    pub fn list(self, key: &str, items: Vec<PlainValue>) -> Self {
        if items.is_empty() {
            self
        } else {
            self.field(key, PlainValue::List(items))
        }
    }

    /// Insert unless the value is an empty mapping or `Null`.
    #[must_use]
    pub fn nested(self, key: &str, value: PlainValue) -> Self {
        match &value {
            PlainValue::Null => self,
            PlainValue::Map(entries) if entries.is_empty() => self,
            _ => self.field(key, value),
        }
    }

    /// Finish the mapping.
    pub fn build(self) -> PlainValue {
        PlainValue::Map(self.entries)
    }
}

impl Serialize for PlainValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(text) => serializer.serialize_str(text),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

struct PlainValueVisitor;

impl<'de> Visitor<'de> for PlainValueVisitor {
    type Value = PlainValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a plain data value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(PlainValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(PlainValue::Integer(v))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(i64::try_from(v).map_or(PlainValue::Float(v as f64), PlainValue::Integer))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(PlainValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(PlainValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(PlainValue::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(PlainValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(PlainValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        PlainValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<PlainValue>()? {
            items.push(item);
        }
        Ok(PlainValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut value = PlainValue::Map(Vec::with_capacity(map.size_hint().unwrap_or(0)));
        // YAML allows non-string keys; they are kept in their rendered form.
        while let Some((key, item)) = map.next_entry::<PlainValue, PlainValue>()? {
            value.insert(key.to_string(), item);
        }
        Ok(value)
    }
}

impl<'de> Deserialize<'de> for PlainValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PlainValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PlainValue {
        PlainMapBuilder::new()
            .field("zeta", "last-letter")
            .field("alpha", 1_i64)
            .field("ratio", 0.5)
            .field("enabled", true)
            .field("missing", PlainValue::Null)
            .field("items", vec!["a", "b"])
            .build()
    }

    #[test]
    fn test_json_preserves_key_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.find("zeta").unwrap() < json.find("alpha").unwrap());

        let back: PlainValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_yaml_preserves_key_order_and_types() {
        let yaml = sample().to_yaml_string().unwrap();
        assert!(yaml.starts_with("zeta:"));

        let back: PlainValue = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_numeric_looking_text_stays_text_in_yaml() {
        let value = PlainValue::from("0042");
        let yaml = value.to_yaml_string().unwrap();
        let back: PlainValue = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, PlainValue::Text("0042".to_string()));
    }

    #[test]
    fn test_json_safe_coerces_non_finite_floats() {
        let value = PlainValue::List(vec![PlainValue::Float(f64::NAN), PlainValue::Float(1.5)]);
        let safe = value.json_safe();
        assert_eq!(
            safe,
            PlainValue::List(vec![PlainValue::Text("NaN".to_string()), PlainValue::Float(1.5)])
        );
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut value = PlainValue::empty_map();
        value.insert("name", "first");
        value.insert("name", "second");
        assert_eq!(value, PlainMapBuilder::new().field("name", "second").build());
    }

    #[test]
    fn test_builder_skips_empty_fields() {
        let value = PlainMapBuilder::new()
            .text("empty", "")
            .optional("none", None::<i64>)
            .list("nothing", vec![])
            .nested("blank", PlainValue::empty_map())
            .text("kept", "yes")
            .build();
        assert_eq!(value, PlainMapBuilder::new().field("kept", "yes").build());
    }

    #[test]
    fn test_from_json_value() {
        let json = serde_json::json!({"a": [1, 2.5, "x", null, true]});
        let value = PlainValue::from(json);
        let items = value.get("a").and_then(PlainValue::as_list).unwrap();
        assert_eq!(items[0], PlainValue::Integer(1));
        assert_eq!(items[1], PlainValue::Float(2.5));
        assert_eq!(items[2], PlainValue::Text("x".to_string()));
        assert!(items[3].is_null());
        assert_eq!(items[4], PlainValue::Bool(true));
    }

    #[test]
    fn test_display_renders_text_verbatim() {
        assert_eq!(PlainValue::from("plain words").to_string(), "plain words");
        assert_eq!(PlainValue::from(vec![1_i64, 2]).to_string(), "[1,2]");
    }
}
