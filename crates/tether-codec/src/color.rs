//! Color codec
//!
//! Accepts hex notation, `rgb()`/`rgba()`, a subset of named colors and
//! channel arrays. Wire form is `[r, g, b, a]` with 0-255 channels.

use crate::{format_number, CodecError, CodecResult, Value, Wire};

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse any supported color text
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.starts_with('#') {
            return Self::from_hex(text);
        }
        let lower = text.to_ascii_lowercase();
        if let Some(args) = lower.strip_prefix("rgba(").and_then(|s| s.strip_suffix(')')) {
            return Self::from_function(args, true);
        }
        if let Some(args) = lower.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
            return Self::from_function(args, false);
        }
        Self::from_name(&lower)
    }

    /// Parse a hex color (#RGB, #RGBA, #RRGGBB, #RRGGBBAA)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let short = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
        let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Self::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgb(long(0)?, long(2)?, long(4)?)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    fn from_function(args: &str, with_alpha: bool) -> Option<Self> {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != if with_alpha { 4 } else { 3 } {
            return None;
        }
        let channel = |s: &str| -> Option<u8> {
            let v: f64 = s.parse().ok()?;
            (0.0..=255.0).contains(&v).then(|| v.round() as u8)
        };
        let a = if with_alpha {
            let a: f64 = parts[3].parse().ok()?;
            if !(0.0..=1.0).contains(&a) {
                return None;
            }
            (a * 255.0).round() as u8
        } else {
            255
        };
        Some(Self::rgba(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, a))
    }

    /// Parse a named color
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "transparent" => Self::TRANSPARENT,
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "cyan" | "aqua" => Self::rgb(0, 255, 255),
            "magenta" | "fuchsia" => Self::rgb(255, 0, 255),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "silver" => Self::rgb(192, 192, 192),
            "maroon" => Self::rgb(128, 0, 0),
            "olive" => Self::rgb(128, 128, 0),
            "lime" => Self::rgb(0, 255, 0),
            "navy" => Self::rgb(0, 0, 128),
            "purple" => Self::rgb(128, 0, 128),
            "teal" => Self::rgb(0, 128, 128),
            "orange" => Self::rgb(255, 165, 0),
            "pink" => Self::rgb(255, 192, 203),
            _ => return None,
        })
    }

    /// Canonical CSS text
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            let alpha = (self.a as f64 / 255.0 * 1000.0).round() / 1000.0;
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, format_number(alpha))
        }
    }

    pub fn to_wire(&self) -> Wire {
        Wire::from(vec![self.r, self.g, self.b, self.a])
    }

    /// Read a `[r, g, b, a]` wire array
    pub fn from_wire(wire: &Wire) -> Option<Self> {
        let items = wire.as_array()?;
        if items.len() != 4 {
            return None;
        }
        let mut channels = [0u8; 4];
        for (slot, item) in channels.iter_mut().zip(items) {
            *slot = u8::try_from(item.as_u64()?).ok()?;
        }
        let [r, g, b, a] = channels;
        Some(Self::rgba(r, g, b, a))
    }

    /// Interpret an application value
    pub fn from_value(value: &Value) -> CodecResult<Self> {
        match value {
            Value::String(text) => {
                Self::parse(text).ok_or_else(|| CodecError::new(value, "invalid color"))
            }
            Value::Array(items) if items.len() == 3 || items.len() == 4 => {
                let mut channels = [255u8; 4];
                for (slot, item) in channels.iter_mut().zip(items) {
                    *slot = item
                        .as_f64()
                        .filter(|v| (0.0..=255.0).contains(v))
                        .map(|v| v.round() as u8)
                        .ok_or_else(|| CodecError::new(value, "color channels must be 0-255"))?;
                }
                let [r, g, b, a] = channels;
                Ok(Self::rgba(r, g, b, a))
            }
            _ => Err(CodecError::new(value, "invalid color")),
        }
    }
}

pub(crate) fn encode(value: &Value) -> CodecResult<Wire> {
    match value {
        Value::Null => Ok(Wire::Null),
        Value::String(s) if s == "initial" => Ok(Wire::Null),
        _ => Color::from_value(value).map(|c| c.to_wire()),
    }
}

pub(crate) fn decode(wire: &Wire) -> Value {
    Color::from_wire(wire)
        .map(|c| Value::String(c.to_css()))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(Color::parse("#f00"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("#ff000080"), Some(Color::rgba(255, 0, 0, 128)));
        assert_eq!(Color::parse("#0f08"), Some(Color::rgba(0, 255, 0, 136)));
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("#zzzzzz"), None);
        assert_eq!(Color::parse("#+f+f+f"), None);
        assert_eq!(Color::parse("#+f+"), None);
    }

    #[test]
    fn test_functions() {
        assert_eq!(Color::parse("rgb(1, 2, 3)"), Some(Color::rgb(1, 2, 3)));
        assert_eq!(Color::parse("rgba(0, 0, 0, 0.5)"), Some(Color::rgba(0, 0, 0, 128)));
        assert_eq!(Color::parse("rgb(300, 0, 0)"), None);
        assert_eq!(Color::parse("rgba(0, 0, 0, 2)"), None);
        assert_eq!(Color::parse("rgb(0, 0)"), None);
    }

    #[test]
    fn test_css_round_trip() {
        for text in ["#336699", "rgba(10, 20, 30, 0.2)", "transparent", "navy"] {
            let color = Color::parse(text).unwrap();
            assert_eq!(Color::parse(&color.to_css()), Some(color), "{text}");
        }
    }

    #[test]
    fn test_encode_initial_is_null() {
        assert_eq!(encode(&Value::from("initial")).unwrap(), Wire::Null);
        assert_eq!(decode(&Wire::Null), Value::Null);
    }
}
