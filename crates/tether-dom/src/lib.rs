//! Tether DOM - Logical object graph
//!
//! Identity registry and arena-style scene graph for the objects mirrored
//! on the native side. Parent/child links are id-to-id edges, never owning
//! pointers.

mod registry;
mod selector;
mod tree;

pub use registry::{LogicalObject, ObjectLookup, ObjectRegistry};
pub use selector::Selector;
pub use tree::{SceneGraph, TreeChange};

use std::fmt;
use std::sync::Arc;

/// Opaque object identifier
///
/// Cheap to clone; compares by content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(Arc<str>);

impl ObjectId {
    /// Wrap a raw id string
    pub fn new(id: &str) -> Self {
        ObjectId(Arc::from(id))
    }

    /// Raw id text as sent over the wire
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ObjectId> for serde_json::Value {
    fn from(id: &ObjectId) -> Self {
        serde_json::Value::String(id.0.to_string())
    }
}

impl From<ObjectId> for serde_json::Value {
    fn from(id: ObjectId) -> Self {
        serde_json::Value::from(&id)
    }
}

/// Result type for tree and registry operations
pub type TreeResult<T> = Result<T, TreeError>;

/// Registry and scene graph errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("Object not found: {0}")]
    NotFound(ObjectId),

    #[error("Id already in use: {0}")]
    DuplicateId(String),

    #[error("Cannot append {child} to its own descendant {parent}")]
    Cycle { parent: ObjectId, child: ObjectId },

    #[error("Index {index} out of range (0..={len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: ObjectId, child: ObjectId },
}
