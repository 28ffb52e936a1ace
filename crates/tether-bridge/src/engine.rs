//! Engine
//!
//! The engine context: identity registry, scene graph, operation queue and
//! layout dirty set, owned by one value and passed explicitly to every
//! object operation.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use tether_canvas::Context2d;
use tether_codec::{Codec, PropertyDescriptor, SyncMode, TypeDescriptor, TypeRegistry, Value, Wire, WireMap};
use tether_dom::{LogicalObject, ObjectId, ObjectRegistry, SceneGraph, Selector};
use tether_layout::{LayoutData, LayoutQueue, LAYOUT_DATA};

use crate::collection::Collection;
use crate::events::Listeners;
use crate::types::{builtin_types, CANVAS, GC};
use crate::{BridgeError, BridgeResult, EngineConfig, Operation, OperationQueue, Transport};

/// Who asked for a property write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Application,
    Native,
}

/// Synchronization engine for one object graph
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) types: TypeRegistry,
    pub(crate) objects: ObjectRegistry,
    pub(crate) graph: SceneGraph,
    pub(crate) queue: OperationQueue,
    pub(crate) layout: LayoutQueue,
    transport: Box<dyn Transport>,
    pub(crate) listeners: Listeners,
    pub(crate) next_handler: u64,
    /// Drawing contexts by GC id
    contexts: BTreeMap<ObjectId, Context2d>,
    /// Canvas id to its GC id
    drawables: HashMap<ObjectId, ObjectId>,
    pub(crate) collections: BTreeMap<ObjectId, Collection>,
    /// Cell id to the collection owning it
    pub(crate) cells: HashMap<ObjectId, ObjectId>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("objects", &self.objects.len())
            .field("pending", &self.queue.len())
            .field("dirty_layouts", &self.layout.len())
            .finish()
    }
}

fn property<'a>(desc: &'a TypeDescriptor, name: &str) -> BridgeResult<&'a PropertyDescriptor> {
    desc.get(name).ok_or_else(|| BridgeError::UnknownProperty {
        type_name: desc.name.clone(),
        property: name.to_string(),
    })
}

impl Engine {
    /// Create an engine with the built-in types registered
    pub fn new(config: EngineConfig, transport: impl Transport + 'static) -> Self {
        let mut types = TypeRegistry::new();
        for descriptor in builtin_types() {
            if let Err(err) = types.register(descriptor) {
                tracing::warn!("{}", err);
            }
        }
        Self {
            objects: ObjectRegistry::new(&config.id_prefix),
            config,
            types,
            graph: SceneGraph::new(),
            queue: OperationQueue::new(),
            layout: LayoutQueue::new(),
            transport: Box::new(transport),
            listeners: HashMap::new(),
            next_handler: 0,
            contexts: BTreeMap::new(),
            drawables: HashMap::new(),
            collections: BTreeMap::new(),
            cells: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register an application type; names are unique
    pub fn register_type(&mut self, descriptor: TypeDescriptor) -> BridgeResult<()> {
        Ok(self.types.register(descriptor)?)
    }

    pub fn is_alive(&self, id: &ObjectId) -> bool {
        self.objects.contains(id)
    }

    /// Live object with its cached encoded properties
    pub fn object(&self, id: &ObjectId) -> Option<&LogicalObject> {
        self.objects.find(id)
    }

    pub fn type_of(&self, id: &ObjectId) -> Option<&str> {
        self.objects.find(id).map(|o| o.type_name.as_str())
    }

    /// Operations queued since the last flush
    pub fn pending(&self) -> &[Operation] {
        self.queue.pending()
    }

    pub(crate) fn alive(&self, id: &ObjectId) -> BridgeResult<()> {
        if self.objects.contains(id) {
            Ok(())
        } else {
            Err(BridgeError::Destroyed(id.clone()))
        }
    }

    pub(crate) fn descriptor_of(&self, id: &ObjectId) -> BridgeResult<Rc<TypeDescriptor>> {
        let object = self
            .objects
            .find(id)
            .ok_or_else(|| BridgeError::Destroyed(id.clone()))?;
        self.types
            .get(&object.type_name)
            .ok_or_else(|| BridgeError::UnknownType(object.type_name.clone()))
    }

    // Lifecycle

    /// Create an object, validating every initial property first
    pub fn create(&mut self, type_name: &str, properties: &[(&str, Value)]) -> BridgeResult<ObjectId> {
        self.create_object(type_name, None, properties)
    }

    /// Create a well-known object under a fixed id
    pub fn create_with_id(
        &mut self,
        type_name: &str,
        id: &str,
        properties: &[(&str, Value)],
    ) -> BridgeResult<ObjectId> {
        self.create_object(type_name, Some(id), properties)
    }

    fn create_object(
        &mut self,
        type_name: &str,
        fixed_id: Option<&str>,
        properties: &[(&str, Value)],
    ) -> BridgeResult<ObjectId> {
        let desc = self
            .types
            .get(type_name)
            .ok_or_else(|| BridgeError::UnknownType(type_name.to_string()))?;

        let mut encoded = Vec::with_capacity(properties.len());
        for (name, value) in properties {
            let prop = property(&desc, name)?;
            if prop.readonly {
                return Err(BridgeError::ReadOnly(name.to_string()));
            }
            encoded.push((*name, prop.encode(name, value, &self.objects)?, prop.sync));
        }

        let id = self.objects.register(type_name, fixed_id)?;
        self.graph.add_node(id.clone(), type_name);
        let mut native = WireMap::new();
        for (name, wire, sync) in encoded {
            self.local_side_effects(&id, name, &wire);
            if sync == SyncMode::Native {
                native.insert(name.to_string(), wire.clone());
            }
            self.store(&id, name, wire);
        }
        self.queue.create(&id, type_name, native);
        Ok(id)
    }

    /// Destroy an object and its subtree
    ///
    /// Destroying a dead id is a no-op. The id is gone from the registry
    /// immediately, before the Destroy operation is flushed.
    pub fn destroy(&mut self, id: &ObjectId) -> BridgeResult<()> {
        if !self.objects.contains(id) {
            tracing::debug!("{} already destroyed", id);
            return Ok(());
        }
        if let Some(owner) = self.cells.get(id) {
            tracing::warn!("Cannot destroy {}: cell is owned by {}", id, owner);
            return Ok(());
        }
        self.dispose(id);
        Ok(())
    }

    pub(crate) fn dispose(&mut self, id: &ObjectId) {
        if let Some(parent) = self.graph.parent(id).cloned() {
            self.layout.mark_dirty(&parent);
        }
        let mut doomed = self.graph.descendants_post_order(id);
        doomed.push(id.clone());
        for target in &doomed {
            if let Some(gc) = self.drawables.remove(target) {
                self.release(&gc);
            }
            self.release(target);
        }
    }

    fn release(&mut self, id: &ObjectId) {
        self.graph.remove_node(id);
        self.objects.remove(id);
        self.layout.release(id);
        self.listeners.remove(id);
        self.contexts.remove(id);
        self.collections.remove(id);
        self.drawables.retain(|_, gc| gc != id);
        if let Some(owner) = self.cells.remove(id) {
            if let Some(collection) = self.collections.get_mut(&owner) {
                collection.forget(id);
            }
        }
        self.queue.destroy(id);
    }

    // Properties

    /// Application property write; invalid values are errors
    pub fn set(&mut self, id: &ObjectId, name: &str, value: impl Into<Value>) -> BridgeResult<()> {
        let value = value.into();
        let desc = self.descriptor_of(id)?;
        let prop = property(&desc, name)?;
        if prop.readonly {
            return Err(BridgeError::ReadOnly(name.to_string()));
        }
        if prop.constant {
            return Err(BridgeError::Const(name.to_string()));
        }
        let wire = prop.encode(name, &value, &self.objects)?;
        self.write(id, name, wire, prop.sync, Origin::Application);
        Ok(())
    }

    /// Native-originated property write
    ///
    /// Invalid values are logged and dropped, keeping the previous value,
    /// unless `strict_native_writes` is set. Returns whether it was applied.
    pub fn set_from_native(&mut self, id: &ObjectId, name: &str, wire: &Wire) -> BridgeResult<bool> {
        let desc = self.descriptor_of(id)?;
        let prop = match property(&desc, name) {
            Ok(prop) => prop,
            Err(err) if self.config.strict_native_writes => return Err(err),
            Err(err) => {
                tracing::warn!("Ignoring native write: {}", err);
                return Ok(false);
            }
        };
        let decoded = prop.codec.decode(wire, &self.objects);
        match prop.codec.encode(&decoded, &self.objects) {
            Ok(canonical) => {
                self.write(id, name, canonical, prop.sync, Origin::Native);
                Ok(true)
            }
            Err(err) if self.config.strict_native_writes => Err(err.with_property(name).into()),
            Err(err) => {
                tracing::warn!("Ignoring native write to {}: {}", id, err.with_property(name));
                Ok(false)
            }
        }
    }

    fn write(&mut self, id: &ObjectId, name: &str, wire: Wire, sync: SyncMode, origin: Origin) {
        self.local_side_effects(id, name, &wire);
        match sync {
            SyncMode::Native if origin == Origin::Application => self.queue.set(id, name, wire.clone()),
            SyncMode::Layout => self.mark_parent_dirty(id),
            _ => {}
        }
        self.store(id, name, wire);
    }

    pub(crate) fn store(&mut self, id: &ObjectId, name: &str, wire: Wire) {
        if let Some(object) = self.objects.find_mut(id) {
            object.properties.insert(name.to_string(), wire);
        }
    }

    /// Selector attributes and list reloads hang off a few property names
    fn local_side_effects(&mut self, id: &ObjectId, name: &str, wire: &Wire) {
        match name {
            "id" => {
                let widget_name = wire.as_str().filter(|s| !s.is_empty()).map(str::to_string);
                self.graph.set_name(id, widget_name);
                self.mark_parent_dirty(id);
            }
            "class" => {
                let classes = wire
                    .as_str()
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                self.graph.set_classes(id, classes);
                self.mark_parent_dirty(id);
            }
            "itemCount" => {
                if let Some(collection) = self.collections.get_mut(id) {
                    collection.reload_pending = true;
                }
            }
            _ => {}
        }
    }

    pub(crate) fn mark_parent_dirty(&mut self, id: &ObjectId) {
        if let Some(parent) = self.graph.parent(id).cloned() {
            self.layout.mark_dirty(&parent);
        }
    }

    /// Read a property; uncached properties flush and ask native
    pub fn get(&mut self, id: &ObjectId, name: &str) -> BridgeResult<Value> {
        let desc = self.descriptor_of(id)?;
        let prop = property(&desc, name)?;
        if !prop.cached {
            self.flush();
            let wire = self.transport.get(id, name);
            return Ok(prop.decode(&wire, &self.objects));
        }
        let cached = self.objects.find(id).and_then(|o| o.properties.get(name)).cloned();
        Ok(match cached {
            Some(wire) => prop.decode(&wire, &self.objects),
            None => prop.default_value(),
        })
    }

    // Methods

    fn encode_params(&self, params: &[(&str, Value)]) -> BridgeResult<WireMap> {
        let mut encoded = WireMap::new();
        for (name, value) in params {
            let wire = Codec::Any
                .encode(value, &self.objects)
                .map_err(|e| e.with_property(name))?;
            encoded.insert(name.to_string(), wire);
        }
        Ok(encoded)
    }

    /// Synchronous native method call; flushes first
    pub fn call(&mut self, id: &ObjectId, method: &str, params: &[(&str, Value)]) -> BridgeResult<Value> {
        self.alive(id)?;
        let params = self.encode_params(params)?;
        self.flush();
        let result = self.transport.call(id, method, &params);
        Ok(Codec::Any.decode(&result, &self.objects))
    }

    /// Queue a native method call for the next flush
    pub fn call_async(&mut self, id: &ObjectId, method: &str, params: &[(&str, Value)]) -> BridgeResult<()> {
        self.alive(id)?;
        let params = self.encode_params(params)?;
        self.queue.call(id, method, params);
        Ok(())
    }

    // Tree

    pub fn append(&mut self, parent: &ObjectId, child: &ObjectId) -> BridgeResult<()> {
        self.attach(parent, child, None)
    }

    pub fn insert(&mut self, parent: &ObjectId, child: &ObjectId, index: usize) -> BridgeResult<()> {
        self.attach(parent, child, Some(index))
    }

    fn attach(&mut self, parent: &ObjectId, child: &ObjectId, index: Option<usize>) -> BridgeResult<()> {
        self.alive(parent)?;
        self.alive(child)?;
        if let Some(owner) = self.cells.get(child) {
            tracing::warn!("Cannot re-parent {}: cell is owned by {}", child, owner);
            return Ok(());
        }
        let parent_desc = self.descriptor_of(parent)?;
        let child_desc = self.descriptor_of(child)?;
        if child_desc.fixed {
            return Err(BridgeError::Structure {
                action: "append",
                child: child.clone(),
                reason: format!("{} is structurally fixed", child_desc.name),
            });
        }
        if !parent_desc.children.accepts(&child_desc.name) {
            return Err(BridgeError::Structure {
                action: "append",
                child: child.clone(),
                reason: format!("{} does not accept {} children", parent_desc.name, child_desc.name),
            });
        }
        self.place(parent, child, index)
    }

    /// Move `child` under `parent` without policy checks
    pub(crate) fn place(&mut self, parent: &ObjectId, child: &ObjectId, index: Option<usize>) -> BridgeResult<()> {
        let change = self.graph.insert(parent, child, index)?;
        if let Some(old) = change.old_parent.as_ref().filter(|old| *old != parent) {
            self.layout.mark_dirty(old);
        }
        self.layout.mark_dirty(parent);

        let mut properties = WireMap::new();
        properties.insert("parent".to_string(), Wire::from(parent));
        properties.insert("index".to_string(), Wire::from(change.index));
        self.queue.set_all(child, properties);
        Ok(())
    }

    pub fn detach(&mut self, child: &ObjectId) -> BridgeResult<()> {
        self.alive(child)?;
        if let Some(owner) = self.cells.get(child) {
            tracing::warn!("Cannot detach {}: cell is owned by {}", child, owner);
            return Ok(());
        }
        if self.descriptor_of(child)?.fixed {
            return Err(BridgeError::Structure {
                action: "detach",
                child: child.clone(),
                reason: "structurally fixed".to_string(),
            });
        }
        if let Some(old) = self.graph.detach(child)? {
            self.layout.mark_dirty(&old);
            self.queue.set(child, "parent", Wire::Null);
        }
        Ok(())
    }

    pub fn children(&self, parent: &ObjectId) -> BridgeResult<Vec<ObjectId>> {
        self.alive(parent)?;
        Ok(self.graph.children(parent).to_vec())
    }

    pub fn parent(&self, child: &ObjectId) -> Option<ObjectId> {
        self.graph.parent(child).cloned()
    }

    /// First child of `parent` matching an attribute selector
    pub fn find(&self, parent: &ObjectId, selector: &str) -> BridgeResult<Option<ObjectId>> {
        self.alive(parent)?;
        let parsed = Selector::parse(selector)
            .filter(|s| !s.is_positional())
            .ok_or_else(|| BridgeError::InvalidSelector(selector.to_string()))?;
        Ok(self.graph.query_children(parent, &parsed).cloned())
    }

    // Canvas

    /// Drawing context of a canvas, creating its GC on first use
    pub fn context_2d(&mut self, canvas: &ObjectId) -> BridgeResult<&mut Context2d> {
        let type_name = self
            .type_of(canvas)
            .ok_or_else(|| BridgeError::Destroyed(canvas.clone()))?;
        if type_name != CANVAS {
            return Err(BridgeError::WrongType {
                id: canvas.clone(),
                expected: CANVAS,
            });
        }
        let gc = match self.drawables.get(canvas) {
            Some(gc) => gc.clone(),
            None => {
                let gc = self.objects.register(GC, None)?;
                let mut properties = WireMap::new();
                properties.insert("parent".to_string(), Wire::from(canvas));
                self.queue.create(&gc, GC, properties);
                self.drawables.insert(canvas.clone(), gc.clone());
                gc
            }
        };
        let format = self.config.draw_format;
        Ok(self.contexts.entry(gc).or_insert_with(|| Context2d::new(format)))
    }

    // Flush

    /// End of an externally driven turn
    pub fn tick(&mut self) {
        self.flush();
    }

    /// Resolve layouts, reload lists, pack drawing and send one batch
    pub fn flush(&mut self) {
        self.flush_layout();
        self.flush_collections();
        self.flush_drawing();

        let batch = self.queue.take();
        if batch.is_empty() {
            return;
        }
        tracing::debug!("flush: {} operations", batch.len());
        self.transport.send(&batch);
    }

    fn flush_layout(&mut self) {
        let resolved = self.layout.flush(&self.graph, |child| {
            let object = self.objects.find(child)?;
            let desc = self.types.get(&object.type_name)?;
            desc.widget
                .then(|| LayoutData::from_properties(&object.properties, &self.objects))
        });
        for (child, data) in resolved {
            self.queue.set(&child, LAYOUT_DATA, Wire::Object(data));
        }
    }

    fn flush_drawing(&mut self) {
        for (gc, context) in self.contexts.iter_mut() {
            if let Some(packet) = context.flush() {
                let mut params = WireMap::new();
                params.insert("packedOps".to_string(), packet.to_wire());
                self.queue.call(gc, "draw", params);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecordingTransport, COMPOSITE};
    use serde_json::json;

    fn engine() -> (Engine, RecordingTransport) {
        let transport = RecordingTransport::new();
        (Engine::new(EngineConfig::default(), transport.clone()), transport)
    }

    #[test]
    fn test_create_sends_native_properties_only() {
        let (mut engine, transport) = engine();
        let id = engine
            .create(COMPOSITE, &[("opacity", Value::from(0.5)), ("left", Value::from(4)), ("class", "a b".into())])
            .unwrap();
        engine.flush();
        assert_eq!(
            transport.operations(),
            vec![Operation::Create {
                id: id.clone(),
                type_name: COMPOSITE.to_string(),
                properties: json!({"opacity": 0.5}).as_object().cloned().unwrap(),
            }]
        );
        assert_eq!(engine.get(&id, "left").unwrap(), Value::from(4));
        assert_eq!(engine.get(&id, "class").unwrap(), Value::from("a b"));
    }

    #[test]
    fn test_invalid_create_registers_nothing() {
        let (mut engine, _) = engine();
        let err = engine.create(COMPOSITE, &[("opacity", Value::from(3))]).unwrap_err();
        assert!(matches!(err, BridgeError::Codec(_)));
        assert!(engine.create("Nope", &[]).is_err());
        assert!(matches!(
            engine.create(COMPOSITE, &[("bogus", Value::from(1))]),
            Err(BridgeError::UnknownProperty { .. })
        ));
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn test_get_falls_back_to_default() {
        let (mut engine, _) = engine();
        let id = engine.create(COMPOSITE, &[]).unwrap();
        assert_eq!(engine.get(&id, "visible").unwrap(), Value::from(true));
        assert_eq!(engine.get(&id, "background").unwrap(), Value::Null);
    }

    #[test]
    fn test_readonly_property_rejected() {
        let (mut engine, _) = engine();
        let id = engine.create(COMPOSITE, &[]).unwrap();
        assert!(matches!(
            engine.set(&id, "bounds", Value::Null),
            Err(BridgeError::ReadOnly(_))
        ));
    }

    #[test]
    fn test_fixed_gc_cannot_be_appended() {
        let (mut engine, _) = engine();
        let canvas = engine.create(CANVAS, &[]).unwrap();
        let parent = engine.create(COMPOSITE, &[]).unwrap();
        engine.context_2d(&canvas).unwrap();
        let gc = engine
            .pending()
            .iter()
            .find_map(|op| match op {
                Operation::Create { id, type_name, .. } if type_name == GC => Some(id.clone()),
                _ => None,
            })
            .unwrap();
        assert!(matches!(engine.append(&parent, &gc), Err(BridgeError::Structure { .. })));
    }
}
