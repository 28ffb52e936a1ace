//! Property Descriptor Registry
//!
//! Per-type closed tables of property descriptors, resolved once when a
//! type is registered. Descriptors are immutable afterwards.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use serde_json::json;
use tether_dom::ObjectLookup;

use crate::{Codec, CodecResult, Value, Wire};

/// Edge and size properties routed through the layout resolver
pub const LAYOUT_PROPERTIES: [&str; 9] = [
    "left", "right", "top", "bottom", "centerX", "centerY", "baseline", "width", "height",
];

/// Pre-encode transform applied to application writes
pub type Setter = Rc<dyn Fn(&Value) -> CodecResult<Value>>;

/// Post-decode transform applied to reads
pub type Getter = Rc<dyn Fn(Value) -> Value>;

/// Where a property write goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Sent with a Set operation
    #[default]
    Native,
    /// Stored locally, never sent
    Local,
    /// Stored, sent as part of the resolved `layoutData`
    Layout,
}

#[derive(Clone)]
enum DefaultValue {
    Fixed(Value),
    Factory(Rc<dyn Fn() -> Value>),
}

/// Declaration of one property
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub codec: Codec,
    default: DefaultValue,
    /// Cached locally; uncached properties are always fetched from native
    pub cached: bool,
    /// Application writes are rejected
    pub readonly: bool,
    /// Only settable at creation
    pub constant: bool,
    pub sync: SyncMode,
    setter: Option<Setter>,
    getter: Option<Getter>,
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("codec", &self.codec)
            .field("cached", &self.cached)
            .field("readonly", &self.readonly)
            .field("constant", &self.constant)
            .field("sync", &self.sync)
            .field("setter", &self.setter.is_some())
            .field("getter", &self.getter.is_some())
            .finish()
    }
}

impl PropertyDescriptor {
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            default: DefaultValue::Fixed(Value::Null),
            cached: true,
            readonly: false,
            constant: false,
            sync: SyncMode::Native,
            setter: None,
            getter: None,
        }
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultValue::Fixed(value.into());
        self
    }

    /// Fresh default per read, for mutable defaults
    pub fn default_with(mut self, factory: impl Fn() -> Value + 'static) -> Self {
        self.default = DefaultValue::Factory(Rc::new(factory));
        self
    }

    /// Always fetch from native
    pub fn nocache(mut self) -> Self {
        self.cached = false;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn constant(mut self) -> Self {
        self.constant = true;
        self
    }

    pub fn local(mut self) -> Self {
        self.sync = SyncMode::Local;
        self
    }

    pub fn layout(mut self) -> Self {
        self.sync = SyncMode::Layout;
        self
    }

    pub fn setter(mut self, f: impl Fn(&Value) -> CodecResult<Value> + 'static) -> Self {
        self.setter = Some(Rc::new(f));
        self
    }

    pub fn getter(mut self, f: impl Fn(Value) -> Value + 'static) -> Self {
        self.getter = Some(Rc::new(f));
        self
    }

    pub fn default_value(&self) -> Value {
        match &self.default {
            DefaultValue::Fixed(v) => v.clone(),
            DefaultValue::Factory(f) => f(),
        }
    }

    /// Run the custom setter and the codec; errors carry `name`
    pub fn encode(&self, name: &str, value: &Value, objects: &dyn ObjectLookup) -> CodecResult<Wire> {
        let transformed;
        let value = match &self.setter {
            Some(setter) => {
                transformed = setter(value).map_err(|e| e.with_property(name))?;
                &transformed
            }
            None => value,
        };
        self.codec
            .encode(value, objects)
            .map_err(|e| e.with_property(name))
    }

    /// Run the codec and the custom getter
    pub fn decode(&self, wire: &Wire, objects: &dyn ObjectLookup) -> Value {
        let value = self.codec.decode(wire, objects);
        match &self.getter {
            Some(getter) => getter(value),
            None => value,
        }
    }
}

/// Which child types a type accepts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChildPolicy {
    Any,
    #[default]
    None,
    Only(Vec<String>),
}

impl ChildPolicy {
    pub fn accepts(&self, type_name: &str) -> bool {
        match self {
            ChildPolicy::Any => true,
            ChildPolicy::None => false,
            ChildPolicy::Only(types) => types.iter().any(|t| t == type_name),
        }
    }
}

/// Schema of one object type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,
    pub properties: BTreeMap<String, PropertyDescriptor>,
    pub children: ChildPolicy,
    /// Cannot be appended or re-parented by the application
    pub fixed: bool,
    /// Carries the common widget property set
    pub widget: bool,
}

impl TypeDescriptor {
    /// Plain (non-widget) type with no properties
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: BTreeMap::new(),
            children: ChildPolicy::None,
            fixed: false,
            widget: false,
        }
    }

    /// Widget type with the common property set
    pub fn widget(name: &str) -> Self {
        let mut desc = Self::new(name);
        desc.widget = true;
        for edge in ["left", "right", "top", "bottom", "baseline"] {
            desc = desc.property(edge, PropertyDescriptor::new(Codec::Edge).layout());
        }
        for center in ["centerX", "centerY"] {
            desc = desc.property(center, PropertyDescriptor::new(Codec::nullable(Codec::Number)).layout());
        }
        for size in ["width", "height"] {
            desc = desc.property(size, PropertyDescriptor::new(Codec::Dimension).layout());
        }
        desc.property("background", PropertyDescriptor::new(Codec::Color))
            .property("opacity", PropertyDescriptor::new(Codec::Opacity).default(1.0))
            .property("visible", PropertyDescriptor::new(Codec::Boolean).default(true))
            .property("enabled", PropertyDescriptor::new(Codec::Boolean).default(true))
            .property("id", PropertyDescriptor::new(Codec::nullable(Codec::String)).local())
            .property("class", PropertyDescriptor::new(Codec::String).default("").local())
            .property(
                "transform",
                PropertyDescriptor::new(Codec::Transform)
                    .default_with(|| crate::Transform::IDENTITY.to_value()),
            )
            .property(
                "bounds",
                PropertyDescriptor::new(Codec::Bounds)
                    .readonly()
                    .nocache()
                    .default_with(|| Value::from_wire(&json!({"left": 0, "top": 0, "width": 0, "height": 0}))),
            )
    }

    pub fn property(mut self, name: &str, descriptor: PropertyDescriptor) -> Self {
        self.properties.insert(name.to_string(), descriptor);
        self
    }

    pub fn children(mut self, policy: ChildPolicy) -> Self {
        self.children = policy;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn get(&self, property: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(property)
    }
}

/// Registration failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Type already registered: {0}")]
    DuplicateType(String),
}

/// All registered types
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Rc<TypeDescriptor>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type; names are unique and descriptors frozen
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<(), SchemaError> {
        if self.types.contains_key(&descriptor.name) {
            return Err(SchemaError::DuplicateType(descriptor.name));
        }
        tracing::debug!(
            "registered type {} ({} properties)",
            descriptor.name,
            descriptor.properties.len()
        );
        self.types.insert(descriptor.name.clone(), Rc::new(descriptor));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Rc<TypeDescriptor>> {
        self.types.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
