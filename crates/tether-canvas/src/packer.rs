//! Drawing Command Packer
//!
//! Opcode names are registered once per packer and referenced by index
//! afterwards. The name table is append-only for the packer's lifetime.

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;
use tether_codec::{wire_number, Wire};

/// Wire encoding of a packet, chosen once per packer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawPacketFormat {
    /// Opcode index sequence plus one table per operand type
    #[default]
    ParallelTables,
    /// One `[name, operands...]` array per recorded call
    NestedArrays,
}

/// One flushed batch of drawing calls
#[derive(Debug, Clone, PartialEq)]
pub enum DrawPacket {
    Tables {
        /// Names first seen since the previous flush, in index order
        new_opcodes: Vec<String>,
        sequence: Vec<u32>,
        doubles: Vec<f64>,
        booleans: Vec<bool>,
        strings: Vec<String>,
        ints: Vec<i32>,
    },
    Nested(Vec<Vec<Wire>>),
}

impl DrawPacket {
    /// `[newOpcodeNames, opcodeIndexSequence, doubles, booleans, strings, ints]`
    /// or the nested array-of-arrays form
    pub fn to_wire(&self) -> Wire {
        match self {
            DrawPacket::Tables {
                new_opcodes,
                sequence,
                doubles,
                booleans,
                strings,
                ints,
            } => {
                let doubles: Vec<Wire> = doubles.iter().map(|d| wire_number(*d)).collect();
                json!([new_opcodes, sequence, doubles, booleans, strings, ints])
            }
            DrawPacket::Nested(calls) => json!(calls),
        }
    }

    /// Opcode names in call order, resolved against the full table
    pub fn operations<'a>(&'a self, table: &'a [String]) -> Vec<&'a str> {
        match self {
            DrawPacket::Tables { sequence, .. } => sequence
                .iter()
                .filter_map(|i| table.get(*i as usize).map(String::as_str))
                .collect(),
            DrawPacket::Nested(calls) => calls
                .iter()
                .filter_map(|call| call.first().and_then(Wire::as_str))
                .collect(),
        }
    }
}

impl Serialize for DrawPacket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

/// Records drawing calls until the next flush
#[derive(Debug, Default)]
pub struct DrawPacker {
    format: DrawPacketFormat,
    indices: HashMap<String, u32>,
    /// Every name ever registered, by index
    names: Vec<String>,
    /// First index not yet announced to native
    announced: usize,
    sequence: Vec<u32>,
    doubles: Vec<f64>,
    booleans: Vec<bool>,
    strings: Vec<String>,
    ints: Vec<i32>,
    calls: Vec<Vec<Wire>>,
}

impl DrawPacker {
    pub fn new(format: DrawPacketFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn format(&self) -> DrawPacketFormat {
        self.format
    }

    /// Full opcode table, by index
    pub fn opcode_table(&self) -> &[String] {
        &self.names
    }

    /// Start a new call
    pub fn add_operation(&mut self, name: &str) {
        match self.format {
            DrawPacketFormat::ParallelTables => {
                let index = match self.indices.get(name) {
                    Some(index) => *index,
                    None => {
                        let index = self.names.len() as u32;
                        self.indices.insert(name.to_string(), index);
                        self.names.push(name.to_string());
                        index
                    }
                };
                self.sequence.push(index);
            }
            DrawPacketFormat::NestedArrays => self.calls.push(vec![Wire::from(name)]),
        }
        tracing::trace!("draw op {}", name);
    }

    pub fn add_double(&mut self, values: &[f64]) {
        match self.format {
            DrawPacketFormat::ParallelTables => self.doubles.extend_from_slice(values),
            DrawPacketFormat::NestedArrays => self.push_operands(values.iter().map(|v| wire_number(*v))),
        }
    }

    pub fn add_boolean(&mut self, values: &[bool]) {
        match self.format {
            DrawPacketFormat::ParallelTables => self.booleans.extend_from_slice(values),
            DrawPacketFormat::NestedArrays => self.push_operands(values.iter().map(|v| Wire::Bool(*v))),
        }
    }

    pub fn add_string(&mut self, values: &[&str]) {
        match self.format {
            DrawPacketFormat::ParallelTables => {
                self.strings.extend(values.iter().map(|s| s.to_string()))
            }
            DrawPacketFormat::NestedArrays => self.push_operands(values.iter().map(|s| Wire::from(*s))),
        }
    }

    pub fn add_int(&mut self, values: &[i32]) {
        match self.format {
            DrawPacketFormat::ParallelTables => self.ints.extend_from_slice(values),
            DrawPacketFormat::NestedArrays => self.push_operands(values.iter().map(|v| Wire::from(*v))),
        }
    }

    fn push_operands(&mut self, operands: impl Iterator<Item = Wire>) {
        if let Some(call) = self.calls.last_mut() {
            call.extend(operands);
        }
    }

    /// Whether any call is pending
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty() && self.calls.is_empty()
    }

    /// Emit and clear everything recorded since the last flush
    pub fn flush(&mut self) -> Option<DrawPacket> {
        if self.is_empty() {
            return None;
        }
        let packet = match self.format {
            DrawPacketFormat::ParallelTables => {
                let new_opcodes = self.names[self.announced..].to_vec();
                self.announced = self.names.len();
                DrawPacket::Tables {
                    new_opcodes,
                    sequence: std::mem::take(&mut self.sequence),
                    doubles: std::mem::take(&mut self.doubles),
                    booleans: std::mem::take(&mut self.booleans),
                    strings: std::mem::take(&mut self.strings),
                    ints: std::mem::take(&mut self.ints),
                }
            }
            DrawPacketFormat::NestedArrays => DrawPacket::Nested(std::mem::take(&mut self.calls)),
        };
        Some(packet)
    }
}
