//! Image codec

use serde_json::json;

use crate::{CodecError, CodecResult, Value, Wire};

/// Image source with optional size hints
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub src: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub scale: Option<f64>,
}

impl Image {
    pub fn new(src: &str) -> Self {
        Self {
            src: src.to_string(),
            width: None,
            height: None,
            scale: None,
        }
    }

    /// Validate an application value
    pub fn from_value(value: &Value) -> CodecResult<Self> {
        let image = match value {
            Value::String(src) => Image::new(src),
            Value::Map(map) => {
                let src = map
                    .get("src")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CodecError::new(value, "image \"src\" must be a string"))?;
                let number = |key: &str| -> CodecResult<Option<f64>> {
                    match map.get(key) {
                        None | Some(Value::Null) => Ok(None),
                        Some(Value::Number(n)) if n.is_finite() && *n > 0.0 => Ok(Some(*n)),
                        Some(_) => Err(CodecError::new(
                            value,
                            format!("image \"{key}\" must be a positive number"),
                        )),
                    }
                };
                Image {
                    src: src.to_string(),
                    width: number("width")?,
                    height: number("height")?,
                    scale: number("scale")?,
                }
            }
            _ => return Err(CodecError::new(value, "image must be a string or a map")),
        };
        if image.src.is_empty() {
            return Err(CodecError::new(value, "image \"src\" must not be empty"));
        }
        if image.scale.is_some() && (image.width.is_some() || image.height.is_some()) {
            return Err(CodecError::new(
                value,
                "image \"scale\" cannot be used with \"width\" and \"height\"",
            ));
        }
        Ok(image)
    }

    pub fn to_wire(&self) -> Wire {
        json!({
            "src": self.src,
            "width": self.width,
            "height": self.height,
            "scale": self.scale,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut entries = vec![("src", Value::from(self.src.as_str()))];
        for (key, v) in [("width", self.width), ("height", self.height), ("scale", self.scale)] {
            if let Some(v) = v {
                entries.push((key, Value::Number(v)));
            }
        }
        Value::map(entries)
    }
}

pub(crate) fn encode(value: &Value) -> CodecResult<Wire> {
    if value.is_null() {
        return Ok(Wire::Null);
    }
    Image::from_value(value).map(|i| i.to_wire())
}

pub(crate) fn decode(wire: &Wire) -> Value {
    let Some(src) = wire.get("src").and_then(Wire::as_str) else {
        return Value::Null;
    };
    let number = |key: &str| wire.get(key).and_then(Wire::as_f64);
    Image {
        src: src.to_string(),
        width: number("width"),
        height: number("height"),
        scale: number("scale"),
    }
    .to_value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_source() {
        let wire = encode(&Value::from("icon.png")).unwrap();
        assert_eq!(wire, json!({"src": "icon.png", "width": null, "height": null, "scale": null}));
    }

    #[test]
    fn test_scale_excludes_size() {
        let value = Value::map([
            ("src", Value::from("a.png")),
            ("width", Value::from(10)),
            ("scale", Value::from(2)),
        ]);
        let err = encode(&value).unwrap_err();
        assert!(err.reason.contains("scale"));
    }

    #[test]
    fn test_rejects_bad_sizes() {
        let value = Value::map([("src", Value::from("a.png")), ("width", Value::from(-1))]);
        assert!(encode(&value).is_err());
        assert!(encode(&Value::from("")).is_err());
        assert!(encode(&Value::from(3)).is_err());
    }

    #[test]
    fn test_decode_map() {
        let value = Value::map([("src", Value::from("a.png")), ("height", Value::from(4))]);
        let wire = encode(&value).unwrap();
        assert_eq!(decode(&wire), value);
    }
}
