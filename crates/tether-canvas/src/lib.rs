//! Tether Canvas - Immediate-mode drawing
//!
//! Drawing calls are recorded into a packer that replaces repeated
//! operation names with small integer indices and splits operands into
//! typed tables. A 2D context tracks property state on top of it.

mod context;
mod packer;

pub use context::{Context2d, ContextState, LineCap, LineJoin, TextAlign, TextBaseline};
pub use packer::{DrawPacker, DrawPacket, DrawPacketFormat};
