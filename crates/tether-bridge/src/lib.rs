//! Tether Bridge - Object synchronization engine
//!
//! Keeps a tree of logical objects in sync with a native rendering layer.
//! Mutations are validated, queued and coalesced; each flush resolves
//! dirty layouts, reloads virtualized lists, packs pending drawing calls
//! and hands one ordered batch to the [`Transport`].

mod collection;
mod config;
mod engine;
mod events;
mod operation;
mod transport;
mod types;

pub use collection::CellAdapter;
pub use config::EngineConfig;
pub use engine::Engine;
pub use events::{Event, Handler, HandlerId};
pub use operation::{Operation, OperationQueue};
pub use transport::{RecordingTransport, Transport};
pub use types::{CANVAS, COLLECTION_VIEW, COMPOSITE, GC};

pub use tether_canvas::{Context2d, DrawPacketFormat};
pub use tether_codec::{Codec, PropertyDescriptor, TypeDescriptor, Value, Wire, WireMap};
pub use tether_dom::ObjectId;

use tether_codec::{CodecError, SchemaError};
use tether_dom::TreeError;

/// Result type for engine operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Engine errors
///
/// All of these are raised synchronously and nothing is applied.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unknown property \"{property}\" on {type_name}")]
    UnknownProperty { type_name: String, property: String },

    #[error("Property \"{0}\" is read-only")]
    ReadOnly(String),

    #[error("Property \"{0}\" can only be set on creation")]
    Const(String),

    #[error("Object {0} has been destroyed")]
    Destroyed(ObjectId),

    #[error("Cannot {action} {child}: {reason}")]
    Structure {
        action: &'static str,
        child: ObjectId,
        reason: String,
    },

    #[error("Index {index} out of range for item count {count}")]
    OutOfRange { index: usize, count: usize },

    #[error("Count must be positive")]
    EmptyRange,

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("{id} is not a {expected}")]
    WrongType { id: ObjectId, expected: &'static str },
}
