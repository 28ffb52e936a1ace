//! Application values
//!
//! The dynamic value model application code reads and writes. Unlike wire
//! values, a `Value` can hold a live object reference.

use std::collections::BTreeMap;

use tether_dom::ObjectId;

use crate::{wire_number, Wire};

/// Application-level property value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Reference to a logical object
    Object(ObjectId),
}

impl Value {
    /// Build a map value from key/value pairs
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectId> {
        match self {
            Value::Object(id) => Some(id),
            _ => None,
        }
    }

    /// Map entry lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Structural conversion from a wire value; strings stay strings
    pub fn from_wire(wire: &Wire) -> Self {
        match wire {
            Wire::Null => Value::Null,
            Wire::Bool(b) => Value::Bool(*b),
            Wire::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            Wire::String(s) => Value::String(s.clone()),
            Wire::Array(items) => Value::Array(items.iter().map(Value::from_wire).collect()),
            Wire::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_wire(v)))
                    .collect(),
            ),
        }
    }

    /// Structural conversion to a wire value; objects become their ids
    pub fn to_wire(&self) -> Wire {
        match self {
            Value::Null => Wire::Null,
            Value::Bool(b) => Wire::Bool(*b),
            Value::Number(n) => wire_number(*n),
            Value::String(s) => Wire::String(s.clone()),
            Value::Array(items) => Wire::Array(items.iter().map(Value::to_wire).collect()),
            Value::Map(map) => Wire::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_wire()))
                    .collect(),
            ),
            Value::Object(id) => Wire::from(id),
        }
    }

    /// Short rendering for diagnostics
    pub fn describe(&self) -> String {
        match self {
            Value::Object(id) => format!("<object {id}>"),
            other => other.to_wire().to_string(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Object(id)
    }
}

impl From<&ObjectId> for Value {
    fn from(id: &ObjectId) -> Self {
        Value::Object(id.clone())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_round_trip() {
        let wire = json!({"a": [1, 2.5, "x"], "b": null, "c": true});
        assert_eq!(Value::from_wire(&wire).to_wire(), wire);
    }

    #[test]
    fn test_object_to_wire_is_id() {
        let value = Value::from(ObjectId::new("$7"));
        assert_eq!(value.to_wire(), json!("$7"));
        assert_eq!(value.describe(), "<object $7>");
    }

    #[test]
    fn test_map_get() {
        let value = Value::map([("width", 10)]);
        assert_eq!(value.get("width"), Some(&Value::Number(10.0)));
        assert!(value.get("height").is_none());
    }
}
