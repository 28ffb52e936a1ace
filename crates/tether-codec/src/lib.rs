//! Tether Codec - Property types
//!
//! Encode/decode pairs translating application values into wire values and
//! back, plus the per-type property descriptor registry built on top.
//!
//! Encoding validates and may fail with a [`CodecError`]; decoding is
//! total for anything the matching encoder produced.

mod codec;
mod color;
mod constraint;
mod descriptor;
mod font;
mod geometry;
mod image;
mod value;

pub use codec::{Choices, Codec};
pub use color::Color;
pub use constraint::{Constraint, Reference};
pub use descriptor::{
    ChildPolicy, Getter, PropertyDescriptor, SchemaError, Setter, SyncMode, TypeDescriptor,
    TypeRegistry, LAYOUT_PROPERTIES,
};
pub use font::Font;
pub use geometry::{Bounds, Transform};
pub use image::Image;
pub use value::Value;

/// Wire-level value handed to the transport
pub type Wire = serde_json::Value;

/// Property map as sent in create/set operations
pub type WireMap = serde_json::Map<String, Wire>;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Rejected application value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid value {value}{}: {reason}", for_property(.property))]
pub struct CodecError {
    /// Property being written, when known
    pub property: Option<String>,
    /// Offending value, rendered as JSON
    pub value: String,
    pub reason: String,
}

fn for_property(property: &Option<String>) -> String {
    property
        .as_ref()
        .map(|p| format!(" for property \"{p}\""))
        .unwrap_or_default()
}

impl CodecError {
    pub fn new(value: &Value, reason: impl Into<String>) -> Self {
        Self {
            property: None,
            value: value.describe(),
            reason: reason.into(),
        }
    }

    /// Attach the property name unless one is already set
    pub fn with_property(mut self, name: &str) -> Self {
        if self.property.is_none() {
            self.property = Some(name.to_string());
        }
        self
    }
}

/// Wire number, integral when the value has no fraction
pub fn wire_number(n: f64) -> Wire {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Wire::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map(Wire::Number).unwrap_or(Wire::Null)
    }
}

/// Number formatting without a trailing `.0`
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_names_property() {
        let err = CodecError::new(&Value::from(2.0), "must be between 0 and 1").with_property("opacity");
        assert_eq!(
            err.to_string(),
            "Invalid value 2 for property \"opacity\": must be between 0 and 1"
        );
    }

    #[test]
    fn test_wire_number() {
        assert_eq!(wire_number(3.0), serde_json::json!(3));
        assert_eq!(wire_number(0.5), serde_json::json!(0.5));
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(1.25), "1.25");
    }
}
