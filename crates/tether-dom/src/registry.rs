//! Object Identity Registry
//!
//! Single source of truth for "does this object still exist". Removed
//! objects are dropped immediately, so repeated create/destroy cycles
//! never grow the map.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::{Map, Value as Wire};

use crate::{ObjectId, TreeError, TreeResult};

/// A live logical object
#[derive(Debug, Clone)]
pub struct LogicalObject {
    /// Assigned once, never changes
    pub id: ObjectId,
    /// Registered type name
    pub type_name: String,
    /// Cached encoded property values
    pub properties: Map<String, Wire>,
    /// Events with the native listener enabled
    pub listeners: BTreeSet<String>,
}

impl LogicalObject {
    fn new(id: ObjectId, type_name: &str) -> Self {
        Self {
            id,
            type_name: type_name.to_string(),
            properties: Map::new(),
            listeners: BTreeSet::new(),
        }
    }
}

/// Resolves raw id text to a live object id
///
/// Used by reference codecs to decode ids coming back from native.
pub trait ObjectLookup {
    /// Return the canonical id if `raw` names a live object
    fn lookup(&self, raw: &str) -> Option<ObjectId>;

    /// Check whether an id is still alive
    fn is_alive(&self, id: &ObjectId) -> bool {
        self.lookup(id.as_str()).is_some()
    }

    /// Whether `raw` was ever handed out as an id, alive or not
    fn was_issued(&self, raw: &str) -> bool {
        self.lookup(raw).is_some()
    }
}

/// Id to object map with id generation
#[derive(Debug)]
pub struct ObjectRegistry {
    objects: HashMap<ObjectId, LogicalObject>,
    prefix: String,
    next_id: u64,
    /// Every fixed id registered so far; a small well-known set
    fixed: HashSet<ObjectId>,
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new("$")
    }
}

impl ObjectRegistry {
    /// Create an empty registry generating ids with `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            objects: HashMap::new(),
            prefix: prefix.to_string(),
            next_id: 1,
            fixed: HashSet::new(),
        }
    }

    /// Register a new object and return its id
    ///
    /// A fixed id is used for well-known singletons and fails if taken.
    pub fn register(&mut self, type_name: &str, fixed_id: Option<&str>) -> TreeResult<ObjectId> {
        let id = match fixed_id {
            Some(raw) => {
                let id = ObjectId::new(raw);
                if self.objects.contains_key(&id) {
                    return Err(TreeError::DuplicateId(raw.to_string()));
                }
                self.fixed.insert(id.clone());
                id
            }
            None => self.generate_id(),
        };
        tracing::trace!("register {} as {}", type_name, id);
        self.objects.insert(id.clone(), LogicalObject::new(id.clone(), type_name));
        Ok(id)
    }

    fn generate_id(&mut self) -> ObjectId {
        // Fixed ids may collide with the generated sequence; skip those.
        loop {
            let id = ObjectId::new(&format!("{}{}", self.prefix, self.next_id));
            self.next_id += 1;
            if !self.objects.contains_key(&id) {
                return id;
            }
        }
    }

    /// Remove an object; later lookups report "not found"
    pub fn remove(&mut self, id: &ObjectId) -> Option<LogicalObject> {
        self.objects.remove(id)
    }

    /// Find a live object
    pub fn find(&self, id: &ObjectId) -> Option<&LogicalObject> {
        self.objects.get(id)
    }

    /// Find a live object for mutation
    pub fn find_mut(&mut self, id: &ObjectId) -> Option<&mut LogicalObject> {
        self.objects.get_mut(id)
    }

    /// Find a live object, failing with `NotFound`
    pub fn get(&self, id: &ObjectId) -> TreeResult<&LogicalObject> {
        self.find(id).ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Ids of all live objects (unordered)
    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.keys()
    }
}

impl ObjectLookup for ObjectRegistry {
    fn lookup(&self, raw: &str) -> Option<ObjectId> {
        self.objects.get_key_value(raw).map(|(id, _)| id.clone())
    }

    fn was_issued(&self, raw: &str) -> bool {
        if self.objects.contains_key(raw) || self.fixed.contains(raw) {
            return true;
        }
        raw.strip_prefix(self.prefix.as_str())
            .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|n| n.parse::<u64>().ok())
            .is_some_and(|n| n > 0 && n < self.next_id)
    }
}

impl std::borrow::Borrow<str> for ObjectId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let mut registry = ObjectRegistry::default();
        let a = registry.register("Composite", None).unwrap();
        let b = registry.register("Composite", None).unwrap();

        assert_ne!(a, b);
        assert_eq!(a.as_str(), "$1");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_fixed_id_collision() {
        let mut registry = ObjectRegistry::default();
        registry.register("Device", Some("tether.Device")).unwrap();

        let err = registry.register("Device", Some("tether.Device")).unwrap_err();
        assert_eq!(err, TreeError::DuplicateId("tether.Device".into()));
    }

    #[test]
    fn test_generation_skips_fixed_ids() {
        let mut registry = ObjectRegistry::default();
        registry.register("Thing", Some("$1")).unwrap();

        let id = registry.register("Thing", None).unwrap();
        assert_eq!(id.as_str(), "$2");
    }

    #[test]
    fn test_removed_ids_stay_recognizable() {
        let mut registry = ObjectRegistry::new("w");
        let generated = registry.register("Composite", None).unwrap();
        let fixed = registry.register("Composite", Some("app.Main")).unwrap();
        registry.remove(&generated);
        registry.remove(&fixed);

        assert!(registry.lookup("app.Main").is_none());
        assert!(registry.was_issued("app.Main"));
        assert!(registry.was_issued(generated.as_str()));
        assert!(!registry.was_issued("w9"));
        assert!(!registry.was_issued("Composite"));
    }

    #[test]
    fn test_remove_then_find() {
        let mut registry = ObjectRegistry::default();
        let id = registry.register("Composite", None).unwrap();

        assert!(registry.remove(&id).is_some());
        assert!(registry.find(&id).is_none());
        assert!(registry.lookup(id.as_str()).is_none());
        assert!(registry.remove(&id).is_none());
    }

    #[test]
    fn test_no_growth_across_cycles() {
        let mut registry = ObjectRegistry::default();
        for _ in 0..1000 {
            let id = registry.register("Composite", None).unwrap();
            registry.remove(&id);
        }
        assert!(registry.is_empty());
    }
}
