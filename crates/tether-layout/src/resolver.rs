//! Layout Resolver
//!
//! Parents move from clean to dirty when a child is added, removed,
//! re-declared or resized, and back to clean when the queue is flushed.

use std::collections::HashSet;

use serde_json::json;
use tether_codec::{wire_number, Constraint, Reference, Wire, WireMap};
use tether_dom::{ObjectId, SceneGraph, Selector};

use crate::LayoutData;

/// Resolve one child's layout against its current siblings
///
/// Works on a copy; unresolvable references fall back to the parent edge.
pub fn resolve(child: &ObjectId, mut data: LayoutData, graph: &SceneGraph) -> WireMap {
    data.check_consistency(child);

    let mut resolved = WireMap::new();
    let edges = [
        ("left", &data.left),
        ("right", &data.right),
        ("top", &data.top),
        ("bottom", &data.bottom),
        ("baseline", &data.baseline),
    ];
    for (name, constraint) in edges {
        if let Some(constraint) = constraint {
            resolved.insert(name.to_string(), resolve_constraint(child, constraint, graph));
        }
    }
    let numbers = [
        ("centerX", data.center_x),
        ("centerY", data.center_y),
        ("width", data.width),
        ("height", data.height),
    ];
    for (name, value) in numbers {
        if let Some(value) = value {
            resolved.insert(name.to_string(), wire_number(value));
        }
    }
    resolved
}

fn resolve_constraint(owner: &ObjectId, constraint: &Constraint, graph: &SceneGraph) -> Wire {
    match constraint {
        Constraint::Offset(n) => wire_number(*n),
        Constraint::Relative { reference, offset } => {
            json!([resolve_reference(owner, reference, graph), wire_number(*offset)])
        }
    }
}

fn resolve_reference(owner: &ObjectId, reference: &Reference, graph: &SceneGraph) -> Wire {
    let parent_edge = Wire::from(0);
    match reference {
        Reference::Percent(p) => wire_number(*p),
        Reference::Prev => graph.prev_sibling(owner).map(Wire::from).unwrap_or(parent_edge),
        Reference::Selector(text) => match Selector::parse(text) {
            Some(Selector::Prev) => {
                graph.prev_sibling(owner).map(Wire::from).unwrap_or(parent_edge)
            }
            Some(selector) => graph
                .parent(owner)
                .and_then(|parent| {
                    graph
                        .children(parent)
                        .iter()
                        .find(|c| *c != owner && graph.matches(c, &selector))
                })
                .map(Wire::from)
                .unwrap_or(parent_edge),
            None => {
                tracing::warn!("Invalid layout reference {:?} on {}", text, owner);
                parent_edge
            }
        },
        Reference::Object(id) if graph.are_siblings(owner, id) => Wire::from(id),
        Reference::Object(id) if !graph.contains(id) => {
            tracing::debug!("Layout reference {} of {} no longer exists", id, owner);
            parent_edge
        }
        Reference::Object(id) => {
            tracing::warn!("Layout reference {} of {} is not a sibling", id, owner);
            parent_edge
        }
    }
}

/// Parents whose children need their layout re-resolved
#[derive(Debug, Default)]
pub struct LayoutQueue {
    order: Vec<ObjectId>,
    dirty: HashSet<ObjectId>,
}

impl LayoutQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a parent dirty; returns false if it already was
    pub fn mark_dirty(&mut self, parent: &ObjectId) -> bool {
        if !self.dirty.insert(parent.clone()) {
            return false;
        }
        self.order.push(parent.clone());
        true
    }

    /// Forget a parent, e.g. once it is destroyed
    pub fn release(&mut self, id: &ObjectId) {
        if self.dirty.remove(id) {
            self.order.retain(|p| p != id);
        }
    }

    pub fn is_dirty(&self, id: &ObjectId) -> bool {
        self.dirty.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Resolve the children of every dirty parent in child order
    ///
    /// `declared` yields the layout of a child, or `None` for children
    /// that do not take part in layout. All parents are clean afterwards.
    pub fn flush<F>(&mut self, graph: &SceneGraph, mut declared: F) -> Vec<(ObjectId, WireMap)>
    where
        F: FnMut(&ObjectId) -> Option<LayoutData>,
    {
        let parents = std::mem::take(&mut self.order);
        self.dirty.clear();

        let mut resolved = Vec::new();
        for parent in &parents {
            if !graph.contains(parent) {
                continue;
            }
            for child in graph.children(parent) {
                if let Some(data) = declared(child) {
                    resolved.push((child.clone(), resolve(child, data, graph)));
                }
            }
        }
        if !parents.is_empty() {
            tracing::debug!("layout flush: {} parents, {} children", parents.len(), resolved.len());
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(count: usize) -> (SceneGraph, ObjectId, Vec<ObjectId>) {
        let mut graph = SceneGraph::new();
        let parent = ObjectId::new("p");
        graph.add_node(parent.clone(), "tether.Composite");
        let children: Vec<ObjectId> = (0..count).map(|i| ObjectId::new(&format!("c{i}"))).collect();
        for child in &children {
            graph.add_node(child.clone(), "tether.Composite");
            graph.insert(&parent, child, None).unwrap();
        }
        (graph, parent, children)
    }

    #[test]
    fn test_prev_resolves_to_sibling_or_zero() {
        let (graph, _, children) = family(2);
        let data = LayoutData {
            top: Some(Constraint::relative(Reference::Prev, 8.0)),
            ..LayoutData::default()
        };
        let first = resolve(&children[0], data.clone(), &graph);
        assert_eq!(first["top"], json!([0, 8]));
        let second = resolve(&children[1], data, &graph);
        assert_eq!(second["top"], json!(["c0", 8]));
    }

    #[test]
    fn test_selector_takes_first_other_match() {
        let (mut graph, _, children) = family(3);
        graph.set_name(&children[2], Some("title".into()));
        let data = LayoutData {
            left: Some(Constraint::relative(Reference::Selector("#title".into()), 4.0)),
            right: Some(Constraint::relative(Reference::Selector(".missing".into()), 0.0)),
            ..LayoutData::default()
        };
        let resolved = resolve(&children[0], data, &graph);
        assert_eq!(resolved["left"], json!(["c2", 4]));
        assert_eq!(resolved["right"], json!([0, 0]));
    }

    #[test]
    fn test_non_sibling_object_falls_back() {
        let (mut graph, _, children) = family(1);
        let stranger = ObjectId::new("x");
        graph.add_node(stranger.clone(), "tether.Composite");
        let data = LayoutData {
            bottom: Some(Constraint::relative(Reference::Object(stranger), 2.0)),
            width: Some(40.0),
            ..LayoutData::default()
        };
        let resolved = resolve(&children[0], data, &graph);
        assert_eq!(resolved["bottom"], json!([0, 2]));
        assert_eq!(resolved["width"], json!(40));
    }

    #[test]
    fn test_percent_and_offset_pass_through() {
        let (graph, _, children) = family(1);
        let data = LayoutData {
            left: Some(Constraint::relative(Reference::Percent(25.0), 0.0)),
            top: Some(Constraint::Offset(12.5)),
            ..LayoutData::default()
        };
        let resolved = resolve(&children[0], data, &graph);
        assert_eq!(resolved["left"], json!([25, 0]));
        assert_eq!(resolved["top"], json!(12.5));
    }

    #[test]
    fn test_queue_dedupes_and_releases() {
        let mut queue = LayoutQueue::new();
        let a = ObjectId::new("a");
        let b = ObjectId::new("b");
        assert!(queue.mark_dirty(&a));
        assert!(!queue.mark_dirty(&a));
        queue.mark_dirty(&b);
        queue.release(&a);
        assert!(!queue.is_dirty(&a));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_flush_resolves_children_in_order() {
        let (graph, parent, children) = family(3);
        let mut queue = LayoutQueue::new();
        queue.mark_dirty(&parent);
        let resolved = queue.flush(&graph, |_| {
            Some(LayoutData {
                top: Some(Constraint::relative(Reference::Prev, 0.0)),
                ..LayoutData::default()
            })
        });
        let ids: Vec<&ObjectId> = resolved.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, children.iter().collect::<Vec<_>>());
        assert!(queue.is_empty());
        assert!(queue.flush(&graph, |_| None).is_empty());
    }
}
