//! Tether Layout - Constraint resolution
//!
//! Declared edge constraints stay symbolic until the owning parent is
//! flushed. Resolution then substitutes sibling ids and percentages
//! against the current child order and produces a fresh `layoutData`
//! map; the declaration itself is never touched.

mod data;
mod resolver;

pub use data::LayoutData;
pub use resolver::{resolve, LayoutQueue};

/// Property name the resolved map is sent under
pub const LAYOUT_DATA: &str = "layoutData";
