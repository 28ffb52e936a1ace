//! Operation Queue
//!
//! Pending operations in issue order. A Set merges into the operation
//! directly before it when that is a Create or Set of the same id; any
//! other operation in between closes it. Values that depend on position,
//! such as `parent`/`index`, therefore never move past another write.

use std::collections::HashSet;

use serde::{Serialize, Serializer};
use serde_json::json;
use tether_codec::{Wire, WireMap};
use tether_dom::ObjectId;

/// One wire operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Create {
        id: ObjectId,
        type_name: String,
        properties: WireMap,
    },
    Set {
        id: ObjectId,
        properties: WireMap,
    },
    Listen {
        id: ObjectId,
        event: String,
        enabled: bool,
    },
    Call {
        id: ObjectId,
        method: String,
        params: WireMap,
    },
    Destroy {
        id: ObjectId,
    },
}

impl Operation {
    pub fn id(&self) -> &ObjectId {
        match self {
            Operation::Create { id, .. }
            | Operation::Set { id, .. }
            | Operation::Listen { id, .. }
            | Operation::Call { id, .. }
            | Operation::Destroy { id } => id,
        }
    }

    /// Verb name as sent over the wire
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::Set { .. } => "set",
            Operation::Listen { .. } => "listen",
            Operation::Call { .. } => "call",
            Operation::Destroy { .. } => "destroy",
        }
    }

    /// `[verb, id, ...arguments]`
    pub fn to_wire(&self) -> Wire {
        match self {
            Operation::Create { id, type_name, properties } => {
                json!(["create", id.as_str(), type_name, properties])
            }
            Operation::Set { id, properties } => json!(["set", id.as_str(), properties]),
            Operation::Listen { id, event, enabled } => {
                json!(["listen", id.as_str(), event, enabled])
            }
            Operation::Call { id, method, params } => json!(["call", id.as_str(), method, params]),
            Operation::Destroy { id } => json!(["destroy", id.as_str()]),
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

/// Ordered, coalescing operation buffer for one flush cycle
#[derive(Debug, Default)]
pub struct OperationQueue {
    operations: Vec<Operation>,
    /// Ids destroyed in this batch
    destroyed: HashSet<ObjectId>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations queued so far
    pub fn pending(&self) -> &[Operation] {
        &self.operations
    }

    fn dropped(&self, id: &ObjectId, verb: &str) -> bool {
        if self.destroyed.contains(id) {
            tracing::debug!("dropping {} for destroyed {}", verb, id);
            return true;
        }
        false
    }

    fn push(&mut self, operation: Operation) {
        tracing::trace!("queue {} {}", operation.verb(), operation.id());
        self.operations.push(operation);
    }

    /// Queue a Create; a re-created id accepts operations again
    pub fn create(&mut self, id: &ObjectId, type_name: &str, properties: WireMap) {
        self.destroyed.remove(id);
        self.push(Operation::Create {
            id: id.clone(),
            type_name: type_name.to_string(),
            properties,
        });
    }

    /// Queue one property write, merging into the open operation if any
    pub fn set(&mut self, id: &ObjectId, name: &str, value: Wire) {
        let mut properties = WireMap::new();
        properties.insert(name.to_string(), value);
        self.set_all(id, properties);
    }

    /// Queue several property writes; later values win on merge
    pub fn set_all(&mut self, id: &ObjectId, properties: WireMap) {
        if self.dropped(id, "set") {
            return;
        }
        if let Some(
            Operation::Create { id: open_id, properties: open, .. }
            | Operation::Set { id: open_id, properties: open },
        ) = self.operations.last_mut()
        {
            if *open_id == *id {
                tracing::trace!("merge set {}", id);
                open.extend(properties);
                return;
            }
        }
        self.push(Operation::Set {
            id: id.clone(),
            properties,
        });
    }

    pub fn listen(&mut self, id: &ObjectId, event: &str, enabled: bool) {
        if self.dropped(id, "listen") {
            return;
        }
        self.push(Operation::Listen {
            id: id.clone(),
            event: event.to_string(),
            enabled,
        });
    }

    pub fn call(&mut self, id: &ObjectId, method: &str, params: WireMap) {
        if self.dropped(id, "call") {
            return;
        }
        self.push(Operation::Call {
            id: id.clone(),
            method: method.to_string(),
            params,
        });
    }

    /// Queue a Destroy; every later operation on `id` in this batch is dropped
    pub fn destroy(&mut self, id: &ObjectId) {
        if self.dropped(id, "destroy") {
            return;
        }
        self.destroyed.insert(id.clone());
        self.push(Operation::Destroy { id: id.clone() });
    }

    /// Drain the batch; operations queued afterwards start a new one
    pub fn take(&mut self) -> Vec<Operation> {
        self.destroyed.clear();
        std::mem::take(&mut self.operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: &[(&str, Wire)]) -> WireMap {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_consecutive_sets_merge() {
        let mut queue = OperationQueue::new();
        let a = ObjectId::new("a");
        queue.set(&a, "x", json!(1));
        queue.set(&a, "y", json!(2));
        queue.set(&a, "x", json!(3));
        assert_eq!(
            queue.take(),
            vec![Operation::Set {
                id: a,
                properties: props(&[("x", json!(3)), ("y", json!(2))]),
            }]
        );
    }

    #[test]
    fn test_set_merges_into_create() {
        let mut queue = OperationQueue::new();
        let a = ObjectId::new("a");
        queue.create(&a, "T", WireMap::new());
        queue.set(&a, "x", json!(1));
        assert_eq!(queue.len(), 1);
        let Operation::Create { properties, .. } = &queue.pending()[0] else {
            panic!("expected create");
        };
        assert_eq!(properties["x"], json!(1));
    }

    #[test]
    fn test_create_closes_open_sets() {
        let mut queue = OperationQueue::new();
        let a = ObjectId::new("a");
        let b = ObjectId::new("b");
        queue.set(&a, "x", json!(1));
        queue.create(&b, "T", WireMap::new());
        queue.set(&a, "ref", json!("b"));
        let verbs: Vec<&str> = queue.pending().iter().map(Operation::verb).collect();
        assert_eq!(verbs, vec!["set", "create", "set"]);
    }

    #[test]
    fn test_interleaved_sets_stay_in_order() {
        let mut queue = OperationQueue::new();
        let a = ObjectId::new("a");
        let b = ObjectId::new("b");
        queue.set(&a, "index", json!(0));
        queue.set(&b, "index", json!(1));
        queue.set(&a, "index", json!(1));
        queue.listen(&b, "tap", true);
        queue.set(&b, "y", json!(2));
        let ops: Vec<(&str, &str)> = queue
            .pending()
            .iter()
            .map(|op| (op.verb(), op.id().as_str()))
            .collect();
        assert_eq!(
            ops,
            vec![("set", "a"), ("set", "b"), ("set", "a"), ("listen", "b"), ("set", "b")]
        );
    }

    #[test]
    fn test_operations_after_destroy_dropped() {
        let mut queue = OperationQueue::new();
        let a = ObjectId::new("a");
        queue.destroy(&a);
        queue.set(&a, "x", json!(1));
        queue.listen(&a, "tap", true);
        queue.destroy(&a);
        assert_eq!(queue.take(), vec![Operation::Destroy { id: a.clone() }]);

        queue.set(&a, "x", json!(1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_recreated_id_accepts_operations() {
        let mut queue = OperationQueue::new();
        let a = ObjectId::new("app.Main");
        queue.destroy(&a);
        queue.create(&a, "T", WireMap::new());
        queue.listen(&a, "tap", true);
        queue.set(&a, "x", json!(1));
        let verbs: Vec<&str> = queue.pending().iter().map(Operation::verb).collect();
        assert_eq!(verbs, vec!["destroy", "create", "listen", "set"]);
    }

    #[test]
    fn test_wire_shape() {
        let op = Operation::Listen {
            id: ObjectId::new("$3"),
            event: "tap".into(),
            enabled: true,
        };
        assert_eq!(serde_json::to_value(&op).unwrap(), json!(["listen", "$3", "tap", true]));
    }
}
