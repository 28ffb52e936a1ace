//! Declared layout attributes and consistency rules

use tether_codec::{Constraint, Reference, Wire, WireMap};
use tether_dom::{ObjectId, ObjectLookup};

/// Layout attributes of one child, decoded from its property cache
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutData {
    pub left: Option<Constraint>,
    pub right: Option<Constraint>,
    pub top: Option<Constraint>,
    pub bottom: Option<Constraint>,
    pub center_x: Option<f64>,
    pub center_y: Option<f64>,
    pub baseline: Option<Constraint>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl LayoutData {
    /// Read the encoded layout properties of an object
    ///
    /// Missing or null attributes stay unset.
    pub fn from_properties(props: &WireMap, objects: &dyn ObjectLookup) -> Self {
        let edge = |name: &str| props.get(name).and_then(|w| Constraint::from_wire(w, objects));
        let number = |name: &str| props.get(name).and_then(Wire::as_f64);
        Self {
            left: edge("left"),
            right: edge("right"),
            top: edge("top"),
            bottom: edge("bottom"),
            center_x: number("centerX"),
            center_y: number("centerY"),
            baseline: edge("baseline"),
            width: number("width"),
            height: number("height"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == LayoutData::default()
    }

    /// Drop conflicting attributes, returning the names removed
    ///
    /// Never fatal; every dropped attribute is logged as a warning.
    pub fn check_consistency(&mut self, owner: &ObjectId) -> Vec<&'static str> {
        let mut dropped = Vec::new();

        if matches!(self.baseline.as_ref().and_then(Constraint::reference), Some(Reference::Percent(_))) {
            discard(&mut self.baseline, "baseline", "it is a percentage", owner, &mut dropped);
        }
        if self.center_x.is_some() {
            discard(&mut self.left, "left", "centerX is set", owner, &mut dropped);
            discard(&mut self.right, "right", "centerX is set", owner, &mut dropped);
        }
        if self.baseline.is_some() {
            discard(&mut self.top, "top", "baseline is set", owner, &mut dropped);
            discard(&mut self.bottom, "bottom", "baseline is set", owner, &mut dropped);
            discard(&mut self.center_y, "centerY", "baseline is set", owner, &mut dropped);
        }
        if self.center_y.is_some() {
            discard(&mut self.top, "top", "centerY is set", owner, &mut dropped);
            discard(&mut self.bottom, "bottom", "centerY is set", owner, &mut dropped);
        }
        if self.left.is_some() && self.right.is_some() {
            discard(&mut self.width, "width", "left and right are set", owner, &mut dropped);
        }
        if self.top.is_some() && self.bottom.is_some() {
            discard(&mut self.height, "height", "top and bottom are set", owner, &mut dropped);
        }
        dropped
    }
}

fn discard<T>(
    slot: &mut Option<T>,
    name: &'static str,
    reason: &str,
    owner: &ObjectId,
    dropped: &mut Vec<&'static str>,
) {
    if slot.take().is_some() {
        tracing::warn!("Inconsistent layoutData for {}: {} is ignored when {}", owner, name, reason);
        dropped.push(name);
    }
}
