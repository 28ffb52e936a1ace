//! Built-in object types

use tether_codec::{ChildPolicy, Codec, PropertyDescriptor, TypeDescriptor};

pub const COMPOSITE: &str = "tether.Composite";
pub const CANVAS: &str = "tether.Canvas";
pub const GC: &str = "tether.GC";
pub const COLLECTION_VIEW: &str = "tether.CollectionView";

/// Types every engine starts with
pub(crate) fn builtin_types() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::widget(COMPOSITE).children(ChildPolicy::Any),
        TypeDescriptor::widget(CANVAS).children(ChildPolicy::Any),
        TypeDescriptor::new(GC).fixed(),
        TypeDescriptor::widget(COLLECTION_VIEW)
            .property("itemCount", PropertyDescriptor::new(Codec::Natural).default(0).local())
            .property("cellHeight", PropertyDescriptor::new(Codec::Dimension))
            .property("columnCount", PropertyDescriptor::new(Codec::Natural).default(1))
            .property("refreshEnabled", PropertyDescriptor::new(Codec::Boolean).default(false))
            .property("refreshIndicator", PropertyDescriptor::new(Codec::Boolean).default(false))
            .property(
                "firstVisibleIndex",
                PropertyDescriptor::new(Codec::Natural).default(0).readonly().nocache(),
            )
            .property(
                "lastVisibleIndex",
                PropertyDescriptor::new(Codec::Natural).default(0).readonly().nocache(),
            ),
    ]
}
