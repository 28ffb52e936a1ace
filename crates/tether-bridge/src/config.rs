//! Engine Configuration

use serde::Deserialize;
use tether_canvas::DrawPacketFormat;

/// Engine configuration options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix of generated object ids
    pub id_prefix: String,

    /// Drawing packet encoding, fixed for the engine's lifetime
    pub draw_format: DrawPacketFormat,

    /// Maximum live cells per virtualized list
    pub cell_pool_limit: usize,

    /// Treat invalid native-originated writes as errors instead of
    /// warning and ignoring them
    pub strict_native_writes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            id_prefix: "$".to_string(),
            draw_format: DrawPacketFormat::ParallelTables,
            cell_pool_limit: 64,
            strict_native_writes: false,
        }
    }
}

impl EngineConfig {
    /// Load from JSON; missing keys take their defaults
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{"cell_pool_limit": 8, "draw_format": "nestedArrays"}"#).unwrap();
        assert_eq!(config.cell_pool_limit, 8);
        assert_eq!(config.draw_format, DrawPacketFormat::NestedArrays);
        assert_eq!(config.id_prefix, "$");
        assert!(!config.strict_native_writes);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(EngineConfig::from_json(r#"{"draw_format": "typed"}"#).is_err());
    }
}
