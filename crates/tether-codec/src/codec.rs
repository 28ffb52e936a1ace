//! Type Codec Table
//!
//! Closed catalog of property types. Static arguments (choice members,
//! wrapped codecs) are captured when the descriptor is built.

use tether_dom::{ObjectId, ObjectLookup, Selector};

use crate::{color, constraint, font, geometry, image, wire_number};
use crate::{CodecError, CodecResult, Value, Wire};

/// Accepted members of a choice codec
#[derive(Debug, Clone, PartialEq)]
pub enum Choices {
    /// Closed set, sent as-is
    Set(Vec<String>),
    /// Member name to wire value translation
    Map(Vec<(String, Wire)>),
}

impl Choices {
    fn names(&self) -> Vec<&str> {
        match self {
            Choices::Set(names) => names.iter().map(String::as_str).collect(),
            Choices::Map(entries) => entries.iter().map(|(k, _)| k.as_str()).collect(),
        }
    }
}

/// Property type
#[derive(Debug, Clone, PartialEq)]
pub enum Codec {
    /// JSON-representable pass-through
    Any,
    Boolean,
    String,
    Number,
    /// Non-negative, rounded
    Natural,
    /// Rounded
    Integer,
    /// Number in [0, 1]
    Opacity,
    Color,
    Font,
    Image,
    /// Layout edge constraint
    Edge,
    /// Non-negative size or null (auto)
    Dimension,
    /// Object, `prev()` or selector reference
    Sibling,
    Transform,
    /// Read-only `[left, top, width, height]`
    Bounds,
    Choice(Choices),
    Nullable(Box<Codec>),
    Array(Box<Codec>),
}

impl Codec {
    /// Choice over a closed set of names
    pub fn choice(names: &[&str]) -> Self {
        Codec::Choice(Choices::Set(names.iter().map(|s| s.to_string()).collect()))
    }

    /// Choice translating names to wire values
    pub fn choice_map<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Wire)>,
    {
        Codec::Choice(Choices::Map(
            entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        ))
    }

    pub fn nullable(inner: Codec) -> Self {
        Codec::Nullable(Box::new(inner))
    }

    pub fn array(inner: Codec) -> Self {
        Codec::Array(Box::new(inner))
    }

    /// Validate and translate an application value
    pub fn encode(&self, value: &Value, objects: &dyn ObjectLookup) -> CodecResult<Wire> {
        match self {
            Codec::Any => match value {
                Value::Object(id) if !objects.is_alive(id) => {
                    Err(CodecError::new(value, "referenced object has been destroyed"))
                }
                _ => Ok(value.to_wire()),
            },
            Codec::Boolean => value
                .as_bool()
                .map(Wire::Bool)
                .ok_or_else(|| CodecError::new(value, "expected a boolean")),
            Codec::String => match value {
                Value::Null => Ok(Wire::from("")),
                Value::String(s) => Ok(Wire::from(s.as_str())),
                Value::Number(n) if n.is_finite() => Ok(Wire::from(crate::format_number(*n))),
                Value::Bool(b) => Ok(Wire::from(b.to_string())),
                _ => Err(CodecError::new(value, "expected a string")),
            },
            Codec::Number => finite(value).map(wire_number),
            Codec::Natural => {
                let n = finite(value)?;
                if n < 0.0 {
                    return Err(CodecError::new(value, "must be a non-negative number"));
                }
                Ok(wire_number(n.round()))
            }
            Codec::Integer => finite(value).map(|n| wire_number(n.round())),
            Codec::Opacity => {
                let n = finite(value)?;
                if !(0.0..=1.0).contains(&n) {
                    return Err(CodecError::new(value, "must be between 0 and 1"));
                }
                Ok(wire_number(n))
            }
            Codec::Color => color::encode(value),
            Codec::Font => font::encode(value),
            Codec::Image => image::encode(value),
            Codec::Edge => constraint::encode(value, objects),
            Codec::Dimension => match value {
                Value::Null => Ok(Wire::Null),
                Value::String(s) if s == "auto" => Ok(Wire::Null),
                _ => {
                    let n = finite(value)?;
                    if n < 0.0 {
                        return Err(CodecError::new(value, "dimension must not be negative"));
                    }
                    Ok(wire_number(n))
                }
            },
            Codec::Sibling => encode_sibling(value, objects),
            Codec::Transform => geometry::encode_transform(value),
            Codec::Bounds => geometry::encode_bounds(value),
            Codec::Choice(choices) => encode_choice(choices, value),
            Codec::Nullable(inner) => match value {
                Value::Null => Ok(Wire::Null),
                _ => inner.encode(value, objects),
            },
            Codec::Array(inner) => match value {
                Value::Null => Ok(Wire::Array(Vec::new())),
                Value::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        inner.encode(item, objects).map_err(|mut err| {
                            err.reason = format!("item {i}: {}", err.reason);
                            err
                        })
                    })
                    .collect::<CodecResult<Vec<_>>>()
                    .map(Wire::Array),
                _ => Err(CodecError::new(value, "expected an array")),
            },
        }
    }

    /// Translate a wire value back; never fails
    ///
    /// Reference codecs consult `objects`, so the result depends on which
    /// objects are still alive.
    pub fn decode(&self, wire: &Wire, objects: &dyn ObjectLookup) -> Value {
        match self {
            Codec::Any => Value::from_wire(wire),
            Codec::Boolean => wire.as_bool().map(Value::Bool).unwrap_or(Value::Null),
            Codec::String => wire
                .as_str()
                .map(Value::from)
                .unwrap_or_else(|| Value::from_wire(wire)),
            Codec::Number
            | Codec::Natural
            | Codec::Integer
            | Codec::Opacity
            | Codec::Dimension => wire.as_f64().map(Value::Number).unwrap_or(Value::Null),
            Codec::Color => color::decode(wire),
            Codec::Font => font::decode(wire),
            Codec::Image => image::decode(wire),
            Codec::Edge => constraint::decode(wire, objects),
            Codec::Sibling => match wire {
                Wire::String(s) => match objects.lookup(s) {
                    Some(id) => Value::Object(id),
                    None if objects.was_issued(s) => Value::Object(ObjectId::new(s)),
                    None => Value::from(s.as_str()),
                },
                _ => Value::Null,
            },
            Codec::Transform => geometry::decode_transform(wire),
            Codec::Bounds => geometry::decode_bounds(wire),
            Codec::Choice(Choices::Map(entries)) => entries
                .iter()
                .find(|(_, w)| w == wire)
                .map(|(name, _)| Value::from(name.as_str()))
                .unwrap_or_else(|| Value::from_wire(wire)),
            Codec::Choice(Choices::Set(_)) => Value::from_wire(wire),
            Codec::Nullable(inner) => match wire {
                Wire::Null => Value::Null,
                _ => inner.decode(wire, objects),
            },
            Codec::Array(inner) => match wire {
                Wire::Array(items) => {
                    Value::Array(items.iter().map(|w| inner.decode(w, objects)).collect())
                }
                _ => Value::Array(Vec::new()),
            },
        }
    }
}

fn finite(value: &Value) -> CodecResult<f64> {
    value
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| CodecError::new(value, "expected a finite number"))
}

fn encode_sibling(value: &Value, objects: &dyn ObjectLookup) -> CodecResult<Wire> {
    match value {
        Value::Null => Ok(Wire::Null),
        Value::Object(id) if objects.is_alive(id) => Ok(Wire::from(id)),
        Value::Object(_) => Err(CodecError::new(value, "referenced object has been destroyed")),
        Value::String(text) if Selector::parse(text).is_some() => Ok(Wire::from(text.as_str())),
        _ => Err(CodecError::new(value, "expected an object, \"prev()\" or a selector")),
    }
}

fn encode_choice(choices: &Choices, value: &Value) -> CodecResult<Wire> {
    let unknown = || {
        let accepted: Vec<String> = choices.names().iter().map(|n| format!("\"{n}\"")).collect();
        CodecError::new(value, format!("accepted values are {}", accepted.join(", ")))
    };
    let name = value.as_str().ok_or_else(unknown)?;
    match choices {
        Choices::Set(names) if names.iter().any(|n| n == name) => Ok(Wire::from(name)),
        Choices::Map(entries) => entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, w)| w.clone())
            .ok_or_else(unknown),
        _ => Err(unknown()),
    }
}
