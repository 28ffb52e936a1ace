//! Transform and bounds codecs

use serde_json::json;

use crate::{wire_number, CodecError, CodecResult, Value, Wire};

const TRANSFORM_KEYS: [&str; 6] = [
    "rotation",
    "scaleX",
    "scaleY",
    "translationX",
    "translationY",
    "translationZ",
];

/// 2.5D widget transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub translation_x: f64,
    pub translation_y: f64,
    pub translation_z: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        rotation: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        translation_x: 0.0,
        translation_y: 0.0,
        translation_z: 0.0,
    };

    fn fields(&self) -> [f64; 6] {
        [
            self.rotation,
            self.scale_x,
            self.scale_y,
            self.translation_x,
            self.translation_y,
            self.translation_z,
        ]
    }

    fn from_fields(f: [f64; 6]) -> Self {
        Self {
            rotation: f[0],
            scale_x: f[1],
            scale_y: f[2],
            translation_x: f[3],
            translation_y: f[4],
            translation_z: f[5],
        }
    }

    /// Validate a map value, defaulting missing keys
    pub fn from_value(value: &Value) -> CodecResult<Self> {
        let map = value
            .as_map()
            .ok_or_else(|| CodecError::new(value, "transform must be a map"))?;
        if let Some(key) = map.keys().find(|k| !TRANSFORM_KEYS.contains(&k.as_str())) {
            return Err(CodecError::new(value, format!("unknown transform key \"{key}\"")));
        }
        let mut fields = Transform::IDENTITY.fields();
        for (slot, key) in fields.iter_mut().zip(TRANSFORM_KEYS) {
            match map.get(key) {
                None => {}
                Some(Value::Number(n)) if n.is_finite() => *slot = *n,
                Some(_) => {
                    return Err(CodecError::new(value, format!("transform \"{key}\" must be a finite number")));
                }
            }
        }
        Ok(Self::from_fields(fields))
    }

    pub fn to_wire(&self) -> Wire {
        let map = TRANSFORM_KEYS
            .iter()
            .zip(self.fields())
            .map(|(k, v)| (k.to_string(), wire_number(v)))
            .collect();
        Wire::Object(map)
    }

    pub fn to_value(&self) -> Value {
        Value::map(TRANSFORM_KEYS.iter().copied().zip(self.fields()))
    }

    pub fn from_wire(wire: &Wire) -> Option<Self> {
        let mut fields = Transform::IDENTITY.fields();
        for (slot, key) in fields.iter_mut().zip(TRANSFORM_KEYS) {
            if let Some(n) = wire.get(key).and_then(Wire::as_f64) {
                *slot = n;
            }
        }
        wire.is_object().then(|| Self::from_fields(fields))
    }
}

/// Widget bounds as reported by native
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn from_wire(wire: &Wire) -> Option<Self> {
        let items = wire.as_array()?;
        if items.len() != 4 {
            return None;
        }
        Some(Self {
            left: items[0].as_f64()?,
            top: items[1].as_f64()?,
            width: items[2].as_f64()?,
            height: items[3].as_f64()?,
        })
    }

    pub fn to_wire(&self) -> Wire {
        json!([
            wire_number(self.left),
            wire_number(self.top),
            wire_number(self.width),
            wire_number(self.height)
        ])
    }

    pub fn to_value(&self) -> Value {
        Value::map([
            ("left", self.left),
            ("top", self.top),
            ("width", self.width),
            ("height", self.height),
        ])
    }

    pub fn from_value(value: &Value) -> CodecResult<Self> {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_f64)
                .ok_or_else(|| CodecError::new(value, format!("bounds \"{key}\" must be a number")))
        };
        Ok(Self {
            left: field("left")?,
            top: field("top")?,
            width: field("width")?,
            height: field("height")?,
        })
    }
}

pub(crate) fn encode_transform(value: &Value) -> CodecResult<Wire> {
    if value.is_null() {
        return Ok(Transform::IDENTITY.to_wire());
    }
    Transform::from_value(value).map(|t| t.to_wire())
}

pub(crate) fn decode_transform(wire: &Wire) -> Value {
    Transform::from_wire(wire).unwrap_or_default().to_value()
}

pub(crate) fn encode_bounds(value: &Value) -> CodecResult<Wire> {
    Bounds::from_value(value).map(|b| b.to_wire())
}

pub(crate) fn decode_bounds(wire: &Wire) -> Value {
    Bounds::from_wire(wire).unwrap_or_default().to_value()
}
