//! Scene graph (arena-based)
//!
//! Ordered parent/child edges between object ids. Nodes are stored in a
//! map keyed by id, so the graph never owns its objects.

use std::collections::HashMap;

use crate::{ObjectId, Selector, TreeError, TreeResult};

#[derive(Debug, Clone, Default)]
struct TreeNode {
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    type_name: String,
    /// Widget `id` property, used by `#name` selectors
    name: Option<String>,
    classes: Vec<String>,
}

/// Outcome of a structural change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeChange {
    /// Parent the child was detached from, if any
    pub old_parent: Option<ObjectId>,
    /// Final index of the child in its new parent
    pub index: usize,
}

/// Parent/child topology for all live objects
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<ObjectId, TreeNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node
    pub fn add_node(&mut self, id: ObjectId, type_name: &str) {
        self.nodes.insert(
            id,
            TreeNode {
                type_name: type_name.to_string(),
                ..TreeNode::default()
            },
        );
    }

    /// Remove a node, detaching it from its parent
    ///
    /// Remaining children become roots; callers dispose subtrees first.
    pub fn remove_node(&mut self, id: &ObjectId) -> Option<ObjectId> {
        let old_parent = self.detach(id).ok().flatten();
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                if let Some(child) = self.nodes.get_mut(&child) {
                    child.parent = None;
                }
            }
        }
        old_parent
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.nodes.contains_key(id)
    }

    fn node(&self, id: &ObjectId) -> TreeResult<&TreeNode> {
        self.nodes.get(id).ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    /// Insert `child` into `parent` at `index` (append when `None`)
    ///
    /// Moving a child within the same parent is allowed. Nothing is
    /// changed when an error is returned.
    pub fn insert(
        &mut self,
        parent: &ObjectId,
        child: &ObjectId,
        index: Option<usize>,
    ) -> TreeResult<TreeChange> {
        self.node(child)?;
        let len = self.node(parent)?.children.len();
        if parent == child || self.is_ancestor(child, parent) {
            return Err(TreeError::Cycle {
                parent: parent.clone(),
                child: child.clone(),
            });
        }

        let old_parent = self.node(child)?.parent.clone();
        let same_parent = old_parent.as_ref() == Some(parent);
        let max = if same_parent { len - 1 } else { len };
        let index = index.unwrap_or(max);
        if index > max {
            return Err(TreeError::IndexOutOfRange { index, len: max });
        }

        self.detach(child)?;
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.insert(index, child.clone());
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent.clone());
        }
        Ok(TreeChange { old_parent, index })
    }

    /// Detach `child` from its parent, returning the old parent
    pub fn detach(&mut self, child: &ObjectId) -> TreeResult<Option<ObjectId>> {
        let old_parent = self.node(child)?.parent.clone();
        if let Some(parent) = &old_parent {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.retain(|c| c != child);
            }
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = None;
            }
        }
        Ok(old_parent)
    }

    pub fn parent(&self, id: &ObjectId) -> Option<&ObjectId> {
        self.nodes.get(id).and_then(|n| n.parent.as_ref())
    }

    /// Children in order; empty for unknown ids
    pub fn children(&self, id: &ObjectId) -> &[ObjectId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Position of `id` among its siblings
    pub fn index_of(&self, id: &ObjectId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| c == id)
    }

    /// Sibling directly before `id`
    pub fn prev_sibling(&self, id: &ObjectId) -> Option<&ObjectId> {
        let index = self.index_of(id)?;
        let parent = self.parent(id)?;
        index.checked_sub(1).and_then(|i| self.children(parent).get(i))
    }

    /// Whether `a` and `b` share a parent
    pub fn are_siblings(&self, a: &ObjectId, b: &ObjectId) -> bool {
        match (self.parent(a), self.parent(b)) {
            (Some(pa), Some(pb)) => a != b && pa == pb,
            _ => false,
        }
    }

    /// Whether `ancestor` is above `id` in the tree
    pub fn is_ancestor(&self, ancestor: &ObjectId, id: &ObjectId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// All descendants of `id`, children before their parents
    pub fn descendants_post_order(&self, id: &ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.collect_post_order(id, &mut out);
        out
    }

    fn collect_post_order(&self, id: &ObjectId, out: &mut Vec<ObjectId>) {
        for child in self.children(id) {
            self.collect_post_order(child, out);
            out.push(child.clone());
        }
    }

    /// Update the widget name used by `#name` selectors
    pub fn set_name(&mut self, id: &ObjectId, name: Option<String>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.name = name;
        }
    }

    /// Update the class list used by `.class` selectors
    pub fn set_classes(&mut self, id: &ObjectId, classes: Vec<String>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.classes = classes;
        }
    }

    /// Whether `id` matches an attribute selector
    pub fn matches(&self, id: &ObjectId, selector: &Selector) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| selector.matches(&n.type_name, n.name.as_deref(), &n.classes))
    }

    /// First child of `parent` matching `selector`
    pub fn query_children(&self, parent: &ObjectId, selector: &Selector) -> Option<&ObjectId> {
        self.children(parent).iter().find(|c| self.matches(c, selector))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(ids: &[&str]) -> (SceneGraph, Vec<ObjectId>) {
        let mut graph = SceneGraph::new();
        let ids: Vec<ObjectId> = ids.iter().map(|s| ObjectId::new(s)).collect();
        for id in &ids {
            graph.add_node(id.clone(), "Composite");
        }
        (graph, ids)
    }

    #[test]
    fn test_insert_and_order() {
        let (mut graph, ids) = graph_with(&["p", "a", "b", "c"]);
        graph.insert(&ids[0], &ids[1], None).unwrap();
        graph.insert(&ids[0], &ids[3], None).unwrap();
        let change = graph.insert(&ids[0], &ids[2], Some(1)).unwrap();

        assert_eq!(change.index, 1);
        assert_eq!(graph.children(&ids[0]), &ids[1..]);
        assert_eq!(graph.prev_sibling(&ids[2]), Some(&ids[1]));
        assert_eq!(graph.prev_sibling(&ids[1]), None);
    }

    #[test]
    fn test_reparent_reports_old_parent() {
        let (mut graph, ids) = graph_with(&["p", "q", "a"]);
        graph.insert(&ids[0], &ids[2], None).unwrap();
        let change = graph.insert(&ids[1], &ids[2], None).unwrap();

        assert_eq!(change.old_parent, Some(ids[0].clone()));
        assert!(graph.children(&ids[0]).is_empty());
        assert_eq!(graph.parent(&ids[2]), Some(&ids[1]));
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut graph, ids) = graph_with(&["a", "b"]);
        graph.insert(&ids[0], &ids[1], None).unwrap();

        let err = graph.insert(&ids[1], &ids[0], None).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
        assert_eq!(graph.parent(&ids[1]), Some(&ids[0]));
    }

    #[test]
    fn test_index_out_of_range_leaves_tree_untouched() {
        let (mut graph, ids) = graph_with(&["p", "a", "b"]);
        graph.insert(&ids[0], &ids[1], None).unwrap();

        let err = graph.insert(&ids[0], &ids[2], Some(5)).unwrap_err();
        assert_eq!(err, TreeError::IndexOutOfRange { index: 5, len: 1 });
        assert_eq!(graph.children(&ids[0]).len(), 1);
        assert_eq!(graph.parent(&ids[2]), None);
    }

    #[test]
    fn test_move_within_parent() {
        let (mut graph, ids) = graph_with(&["p", "a", "b", "c"]);
        for id in &ids[1..] {
            graph.insert(&ids[0], id, None).unwrap();
        }
        graph.insert(&ids[0], &ids[3], Some(0)).unwrap();

        let order: Vec<&str> = graph.children(&ids[0]).iter().map(|c| c.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn test_descendants_post_order() {
        let (mut graph, ids) = graph_with(&["root", "a", "a1", "b"]);
        graph.insert(&ids[0], &ids[1], None).unwrap();
        graph.insert(&ids[1], &ids[2], None).unwrap();
        graph.insert(&ids[0], &ids[3], None).unwrap();

        let post = graph.descendants_post_order(&ids[0]);
        let order: Vec<&str> = post
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(order, ["a1", "a", "b"]);
    }

    #[test]
    fn test_query_children() {
        let (mut graph, ids) = graph_with(&["p", "a", "b"]);
        graph.insert(&ids[0], &ids[1], None).unwrap();
        graph.insert(&ids[0], &ids[2], None).unwrap();
        graph.set_name(&ids[2], Some("title".into()));
        graph.set_classes(&ids[1], vec!["row".into()]);

        let by_id = Selector::parse("#title").unwrap();
        let by_class = Selector::parse(".row").unwrap();
        assert_eq!(graph.query_children(&ids[0], &by_id), Some(&ids[2]));
        assert_eq!(graph.query_children(&ids[0], &by_class), Some(&ids[1]));
    }
}
