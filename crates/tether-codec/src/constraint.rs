//! Layout edge constraints
//!
//! Symbolic edge values. They are stored unresolved; the layout resolver
//! turns references into ids or percentages when the parent is flushed.

use tether_dom::{ObjectId, ObjectLookup, Selector};

use crate::{format_number, wire_number, CodecError, CodecResult, Value, Wire};

/// What an edge is attached to
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// Percentage of the parent's resolved box
    Percent(f64),
    /// The preceding sibling, whatever it is at resolution time
    Prev,
    /// First sibling matching an attribute selector
    Selector(String),
    /// A specific sibling
    Object(ObjectId),
}

impl Reference {
    /// Read a reference token back from the wire
    ///
    /// Ids of destroyed objects stay object references so they can never
    /// be mistaken for a selector.
    fn from_wire_text(text: &str, objects: &dyn ObjectLookup) -> Self {
        if text == "prev()" {
            return Reference::Prev;
        }
        match objects.lookup(text) {
            Some(id) => Reference::Object(id),
            None if objects.was_issued(text) => Reference::Object(ObjectId::new(text)),
            None => Reference::Selector(text.to_string()),
        }
    }
}

/// Declared edge value
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Absolute offset from the parent edge
    Offset(f64),
    Relative { reference: Reference, offset: f64 },
}

impl Constraint {
    pub fn relative(reference: Reference, offset: f64) -> Self {
        Constraint::Relative { reference, offset }
    }

    pub fn offset(&self) -> f64 {
        match self {
            Constraint::Offset(n) => *n,
            Constraint::Relative { offset, .. } => *offset,
        }
    }

    pub fn reference(&self) -> Option<&Reference> {
        match self {
            Constraint::Offset(_) => None,
            Constraint::Relative { reference, .. } => Some(reference),
        }
    }

    /// Validate an application value
    pub fn from_value(value: &Value, objects: &dyn ObjectLookup) -> CodecResult<Self> {
        match value {
            Value::Number(n) => finite(*n, value).map(Constraint::Offset),
            Value::String(text) => parse_text(text).ok_or_else(|| {
                CodecError::new(value, "expected a number, percentage, selector or \"prev()\"")
            }),
            Value::Object(_) => Ok(Constraint::relative(reference_from_value(value, objects)?, 0.0)),
            Value::Array(items) if items.len() == 2 => {
                let offset = items[1]
                    .as_f64()
                    .ok_or_else(|| CodecError::new(value, "offset must be a number"))
                    .and_then(|n| finite(n, value))?;
                let reference = match &items[0] {
                    Value::Number(p) => Reference::Percent(finite(*p, value)?),
                    other => reference_from_value(other, objects)?,
                };
                Ok(Constraint::relative(reference, offset))
            }
            _ => Err(CodecError::new(value, "invalid layout constraint")),
        }
    }

    /// Unresolved wire form: number or `[reference, offset]`
    pub fn to_wire(&self) -> Wire {
        match self {
            Constraint::Offset(n) => wire_number(*n),
            Constraint::Relative { reference, offset } => {
                let reference = match reference {
                    Reference::Percent(p) => wire_number(*p),
                    Reference::Prev => Wire::from("prev()"),
                    Reference::Selector(s) => Wire::from(s.as_str()),
                    Reference::Object(id) => Wire::from(id),
                };
                Wire::Array(vec![reference, wire_number(*offset)])
            }
        }
    }

    /// Read an unresolved wire form back
    pub fn from_wire(wire: &Wire, objects: &dyn ObjectLookup) -> Option<Self> {
        if let Some(n) = wire.as_f64() {
            return Some(Constraint::Offset(n));
        }
        let items = wire.as_array().filter(|items| items.len() == 2)?;
        let offset = items[1].as_f64()?;
        let reference = match &items[0] {
            Wire::Number(p) => Reference::Percent(p.as_f64()?),
            Wire::String(s) => Reference::from_wire_text(s, objects),
            _ => return None,
        };
        Some(Constraint::relative(reference, offset))
    }

    /// Canonical application form
    pub fn to_value(&self) -> Value {
        match self {
            Constraint::Offset(n) => Value::Number(*n),
            Constraint::Relative { reference, offset } => {
                let reference = match reference {
                    Reference::Percent(p) => Value::String(format!("{}%", format_number(*p))),
                    Reference::Prev => Value::from("prev()"),
                    Reference::Selector(s) => Value::from(s.as_str()),
                    Reference::Object(id) => Value::from(id),
                };
                Value::Array(vec![reference, Value::Number(*offset)])
            }
        }
    }
}

fn finite(n: f64, value: &Value) -> CodecResult<f64> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(CodecError::new(value, "must be a finite number"))
    }
}

fn reference_from_value(value: &Value, objects: &dyn ObjectLookup) -> CodecResult<Reference> {
    match value {
        Value::Object(id) if objects.is_alive(id) => Ok(Reference::Object(id.clone())),
        Value::Object(_) => Err(CodecError::new(value, "referenced object has been destroyed")),
        Value::String(text) => parse_reference(text)
            .ok_or_else(|| CodecError::new(value, "invalid layout reference")),
        _ => Err(CodecError::new(value, "invalid layout reference")),
    }
}

fn parse_reference(token: &str) -> Option<Reference> {
    if let Some(p) = token.strip_suffix('%') {
        return p.parse::<f64>().ok().filter(|p| p.is_finite()).map(Reference::Percent);
    }
    match Selector::parse(token)? {
        Selector::Prev => Some(Reference::Prev),
        _ => Some(Reference::Selector(token.to_string())),
    }
}

/// `"10"`, `"30%"`, `"prev() 8"`, `"#title -4"`
fn parse_text(text: &str) -> Option<Constraint> {
    let mut tokens = text.split_whitespace();
    let first = tokens.next()?;
    let second = tokens.next();
    if tokens.next().is_some() {
        return None;
    }
    if let Ok(n) = first.parse::<f64>() {
        return (second.is_none() && n.is_finite()).then_some(Constraint::Offset(n));
    }
    let reference = parse_reference(first)?;
    let offset = match second {
        Some(token) => token.parse::<f64>().ok().filter(|n| n.is_finite())?,
        None => 0.0,
    };
    Some(Constraint::relative(reference, offset))
}

pub(crate) fn encode(value: &Value, objects: &dyn ObjectLookup) -> CodecResult<Wire> {
    if value.is_null() {
        return Ok(Wire::Null);
    }
    Constraint::from_value(value, objects).map(|c| c.to_wire())
}

pub(crate) fn decode(wire: &Wire, objects: &dyn ObjectLookup) -> Value {
    Constraint::from_wire(wire, objects)
        .map(|c| c.to_value())
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tether_dom::ObjectRegistry;

    #[test]
    fn test_text_forms() {
        assert_eq!(parse_text("12"), Some(Constraint::Offset(12.0)));
        assert_eq!(
            parse_text("30% 10"),
            Some(Constraint::relative(Reference::Percent(30.0), 10.0))
        );
        assert_eq!(parse_text("prev() 8"), Some(Constraint::relative(Reference::Prev, 8.0)));
        assert_eq!(
            parse_text("#title -4"),
            Some(Constraint::relative(Reference::Selector("#title".into()), -4.0))
        );
        assert_eq!(parse_text("12 4"), None);
        assert_eq!(parse_text("prev() x"), None);
        assert_eq!(parse_text("a b c"), None);
    }

    #[test]
    fn test_wire_forms() {
        let registry = ObjectRegistry::default();
        let wire = encode(&Value::from("prev() 8"), &registry).unwrap();
        assert_eq!(wire, json!(["prev()", 8]));

        let wire = encode(&Value::Array(vec![Value::from(50), Value::from(0)]), &registry).unwrap();
        assert_eq!(wire, json!([50, 0]));
        assert_eq!(decode(&wire, &registry), Value::Array(vec!["50%".into(), 0.into()]));
    }

    #[test]
    fn test_object_reference() {
        let mut registry = ObjectRegistry::default();
        let id = registry.register("Composite", None).unwrap();

        let wire = encode(&Value::from(&id), &registry).unwrap();
        assert_eq!(wire, json!([id.as_str(), 0]));
        assert_eq!(
            decode(&wire, &registry),
            Value::Array(vec![Value::from(&id), Value::from(0)])
        );

        registry.remove(&id);
        assert!(encode(&Value::from(&id), &registry).is_err());
    }

    #[test]
    fn test_destroyed_fixed_id_is_not_a_selector() {
        let mut registry = ObjectRegistry::default();
        let main = registry.register("tether.Composite", Some("app.Main")).unwrap();
        let wire = encode(&Value::from(&main), &registry).unwrap();
        registry.remove(&main);

        let constraint = Constraint::from_wire(&wire, &registry).unwrap();
        assert_eq!(constraint.reference(), Some(&Reference::Object(main)));

        let selector = Constraint::from_wire(&json!(["app.Other", 0]), &registry).unwrap();
        assert_eq!(
            selector.reference(),
            Some(&Reference::Selector("app.Other".into()))
        );
    }
}
