//! Font codec
//!
//! CSS-like shorthand: `[style] [weight] <size>px [family[, family]*]`.

use serde_json::json;

use crate::{format_number, CodecError, CodecResult, Value, Wire};

const STYLES: &[&str] = &["normal", "italic"];
const WEIGHTS: &[&str] = &["normal", "thin", "light", "medium", "bold", "black"];

/// Parsed font description
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: Vec<String>,
    pub size: f64,
    pub weight: String,
    pub style: String,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: Vec::new(),
            size: 12.0,
            weight: "normal".into(),
            style: "normal".into(),
        }
    }
}

impl Font {
    /// Parse shorthand text, `None` if malformed
    pub fn parse(text: &str) -> Option<Self> {
        let mut font = Font::default();
        let mut rest = text.trim();
        let mut seen_size = false;

        while !rest.is_empty() {
            let (token, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            rest = tail.trim_start();
            if let Some(px) = token.strip_suffix("px") {
                let size: f64 = px.parse().ok()?;
                if !size.is_finite() || size < 0.0 {
                    return None;
                }
                font.size = size;
                seen_size = true;
                break;
            }
            if token == "normal" {
                continue;
            }
            if STYLES.contains(&token) {
                font.style = token.to_string();
            } else if WEIGHTS.contains(&token) {
                font.weight = token.to_string();
            } else {
                return None;
            }
        }
        if !seen_size {
            return None;
        }

        font.family = rest
            .split(',')
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
            .filter(|f| !f.is_empty())
            .collect();
        Some(font)
    }

    /// Canonical shorthand
    pub fn to_css(&self) -> String {
        let mut parts = Vec::new();
        if self.style != "normal" {
            parts.push(self.style.clone());
        }
        if self.weight != "normal" {
            parts.push(self.weight.clone());
        }
        parts.push(format!("{}px", format_number(self.size)));
        if !self.family.is_empty() {
            parts.push(self.family.join(", "));
        }
        parts.join(" ")
    }

    pub fn to_wire(&self) -> Wire {
        json!({
            "family": self.family,
            "size": crate::wire_number(self.size),
            "weight": self.weight,
            "style": self.style,
        })
    }

    pub fn from_wire(wire: &Wire) -> Option<Self> {
        let family = wire
            .get("family")?
            .as_array()?
            .iter()
            .filter_map(|f| f.as_str().map(str::to_string))
            .collect();
        Some(Self {
            family,
            size: wire.get("size")?.as_f64()?,
            weight: wire.get("weight")?.as_str()?.to_string(),
            style: wire.get("style")?.as_str()?.to_string(),
        })
    }
}

pub(crate) fn encode(value: &Value) -> CodecResult<Wire> {
    match value {
        Value::Null => Ok(Wire::Null),
        Value::String(text) if text == "initial" => Ok(Wire::Null),
        Value::String(text) => Font::parse(text)
            .map(|f| f.to_wire())
            .ok_or_else(|| CodecError::new(value, "invalid font")),
        _ => Err(CodecError::new(value, "font must be a string")),
    }
}

pub(crate) fn decode(wire: &Wire) -> Value {
    Font::from_wire(wire)
        .map(|f| Value::String(f.to_css()))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let font = Font::parse("italic bold 14px Arial, 'Helvetica Neue', sans-serif").unwrap();
        assert_eq!(font.style, "italic");
        assert_eq!(font.weight, "bold");
        assert_eq!(font.size, 14.0);
        assert_eq!(font.family, ["Arial", "Helvetica Neue", "sans-serif"]);
    }

    #[test]
    fn test_parse_size_only() {
        let font = Font::parse("9.5px").unwrap();
        assert_eq!(font.size, 9.5);
        assert!(font.family.is_empty());
        assert_eq!(font.to_css(), "9.5px");
    }

    #[test]
    fn test_rejects() {
        assert!(Font::parse("Arial").is_none());
        assert!(Font::parse("heavy 12px Arial").is_none());
        assert!(Font::parse("-3px Arial").is_none());
    }

    #[test]
    fn test_wire_shape() {
        let wire = encode(&Value::from("bold 16px serif")).unwrap();
        assert_eq!(
            wire,
            json!({"family": ["serif"], "size": 16, "weight": "bold", "style": "normal"})
        );
        assert_eq!(decode(&wire), Value::from("bold 16px serif"));
    }
}
