//! Native transport contract
//!
//! The engine never talks to a renderer directly; it hands flushed batches
//! and synchronous reads to a [`Transport`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tether_codec::{Wire, WireMap};
use tether_dom::ObjectId;

use crate::Operation;

/// Native side of the bridge
pub trait Transport {
    fn create(&mut self, id: &ObjectId, type_name: &str, properties: &WireMap);

    fn set(&mut self, id: &ObjectId, properties: &WireMap);

    fn listen(&mut self, id: &ObjectId, event: &str, enabled: bool);

    fn destroy(&mut self, id: &ObjectId);

    /// Invoke a native method; synchronous
    fn call(&mut self, id: &ObjectId, method: &str, params: &WireMap) -> Wire;

    /// Read a native property; synchronous
    fn get(&mut self, id: &ObjectId, property: &str) -> Wire;

    /// Deliver one flushed batch in order
    ///
    /// Results of queued calls are discarded.
    fn send(&mut self, batch: &[Operation]) {
        for operation in batch {
            match operation {
                Operation::Create { id, type_name, properties } => {
                    self.create(id, type_name, properties)
                }
                Operation::Set { id, properties } => self.set(id, properties),
                Operation::Listen { id, event, enabled } => self.listen(id, event, *enabled),
                Operation::Call { id, method, params } => {
                    self.call(id, method, params);
                }
                Operation::Destroy { id } => self.destroy(id),
            }
        }
    }
}

#[derive(Debug, Default)]
struct Recording {
    batches: Vec<Vec<Operation>>,
    calls: Vec<Operation>,
    gets: Vec<(ObjectId, String)>,
    responses: HashMap<(String, String), Wire>,
}

/// Transport double that records everything it receives
///
/// Clones share one recording, so a test can keep a handle after moving
/// the transport into an engine. `get` and synchronous `call` answer from
/// a response table keyed by id and property or method name.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    inner: Rc<RefCell<Recording>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program the answer for `get(id, name)` and `call(id, name, ..)`
    pub fn respond(&self, id: &ObjectId, name: &str, value: Wire) {
        self.inner
            .borrow_mut()
            .responses
            .insert((id.to_string(), name.to_string()), value);
    }

    /// Every flushed batch, in delivery order
    pub fn batches(&self) -> Vec<Vec<Operation>> {
        self.inner.borrow().batches.clone()
    }

    /// All delivered operations, flattened
    pub fn operations(&self) -> Vec<Operation> {
        self.inner.borrow().batches.iter().flatten().cloned().collect()
    }

    /// Synchronous calls, as Call operations
    pub fn calls(&self) -> Vec<Operation> {
        self.inner.borrow().calls.clone()
    }

    /// Synchronous property reads
    pub fn gets(&self) -> Vec<(ObjectId, String)> {
        self.inner.borrow().gets.clone()
    }

    /// Forget everything recorded so far; responses are kept
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.batches.clear();
        inner.calls.clear();
        inner.gets.clear();
    }

    fn response(&self, id: &ObjectId, name: &str) -> Wire {
        self.inner
            .borrow()
            .responses
            .get(&(id.to_string(), name.to_string()))
            .cloned()
            .unwrap_or(Wire::Null)
    }
}

impl Transport for RecordingTransport {
    fn create(&mut self, id: &ObjectId, type_name: &str, properties: &WireMap) {
        self.send(&[Operation::Create {
            id: id.clone(),
            type_name: type_name.to_string(),
            properties: properties.clone(),
        }]);
    }

    fn set(&mut self, id: &ObjectId, properties: &WireMap) {
        self.send(&[Operation::Set {
            id: id.clone(),
            properties: properties.clone(),
        }]);
    }

    fn listen(&mut self, id: &ObjectId, event: &str, enabled: bool) {
        self.send(&[Operation::Listen {
            id: id.clone(),
            event: event.to_string(),
            enabled,
        }]);
    }

    fn destroy(&mut self, id: &ObjectId) {
        self.send(&[Operation::Destroy { id: id.clone() }]);
    }

    fn call(&mut self, id: &ObjectId, method: &str, params: &WireMap) -> Wire {
        self.inner.borrow_mut().calls.push(Operation::Call {
            id: id.clone(),
            method: method.to_string(),
            params: params.clone(),
        });
        self.response(id, method)
    }

    fn get(&mut self, id: &ObjectId, property: &str) -> Wire {
        self.inner
            .borrow_mut()
            .gets
            .push((id.clone(), property.to_string()));
        self.response(id, property)
    }

    fn send(&mut self, batch: &[Operation]) {
        self.inner.borrow_mut().batches.push(batch.to_vec());
    }
}
