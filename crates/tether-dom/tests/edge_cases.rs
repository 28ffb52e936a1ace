//! Edge case tests for tether-dom
//!
//! Identity churn, structural errors and selector corner cases.

use tether_dom::{ObjectId, ObjectLookup, ObjectRegistry, SceneGraph, Selector, TreeError};

fn graph(registry: &mut ObjectRegistry, count: usize) -> (SceneGraph, Vec<ObjectId>) {
    let mut graph = SceneGraph::new();
    let ids: Vec<ObjectId> = (0..count)
        .map(|_| registry.register("tether.Composite", None).unwrap())
        .collect();
    for id in &ids {
        graph.add_node(id.clone(), "tether.Composite");
    }
    (graph, ids)
}

// ============================================================================
// IDENTITY
// ============================================================================

#[test]
fn test_create_destroy_cycles_do_not_grow() {
    let mut registry = ObjectRegistry::default();
    for _ in 0..1000 {
        let id = registry.register("tether.Composite", None).unwrap();
        assert!(registry.remove(&id).is_some());
    }
    assert!(registry.is_empty());
}

#[test]
fn test_removed_id_is_never_found() {
    let mut registry = ObjectRegistry::default();
    let id = registry.register("tether.Composite", None).unwrap();
    registry.remove(&id);
    assert!(registry.find(&id).is_none());
    assert!(registry.lookup(id.as_str()).is_none());
    assert_eq!(registry.get(&id).unwrap_err(), TreeError::NotFound(id.clone()));
    assert!(registry.remove(&id).is_none());
}

#[test]
fn test_fixed_id_collides_with_generated() {
    let mut registry = ObjectRegistry::default();
    registry.register("tether.App", Some("$2")).unwrap();
    let a = registry.register("tether.Composite", None).unwrap();
    let b = registry.register("tether.Composite", None).unwrap();
    assert_eq!(a.as_str(), "$1");
    assert_eq!(b.as_str(), "$3");
    assert!(matches!(
        registry.register("tether.App", Some("$1")),
        Err(TreeError::DuplicateId(_))
    ));
}

#[test]
fn test_custom_prefix() {
    let mut registry = ObjectRegistry::new("w");
    assert_eq!(registry.register("tether.Composite", None).unwrap().as_str(), "w1");
}

// ============================================================================
// STRUCTURE
// ============================================================================

#[test]
fn test_self_and_descendant_cycles_rejected() {
    let mut registry = ObjectRegistry::default();
    let (mut graph, ids) = graph(&mut registry, 3);
    graph.insert(&ids[0], &ids[1], None).unwrap();
    graph.insert(&ids[1], &ids[2], None).unwrap();

    assert!(matches!(graph.insert(&ids[0], &ids[0], None), Err(TreeError::Cycle { .. })));
    assert!(matches!(graph.insert(&ids[2], &ids[0], None), Err(TreeError::Cycle { .. })));
    assert_eq!(graph.parent(&ids[0]), None);
}

#[test]
fn test_out_of_range_insert_changes_nothing() {
    let mut registry = ObjectRegistry::default();
    let (mut graph, ids) = graph(&mut registry, 3);
    graph.insert(&ids[0], &ids[1], None).unwrap();

    let err = graph.insert(&ids[0], &ids[2], Some(5)).unwrap_err();
    assert_eq!(err, TreeError::IndexOutOfRange { index: 5, len: 1 });
    assert_eq!(graph.children(&ids[0]), &[ids[1].clone()]);
    assert_eq!(graph.parent(&ids[2]), None);
}

#[test]
fn test_move_within_parent() {
    let mut registry = ObjectRegistry::default();
    let (mut graph, ids) = graph(&mut registry, 4);
    for child in &ids[1..] {
        graph.insert(&ids[0], child, None).unwrap();
    }
    let change = graph.insert(&ids[0], &ids[3], Some(0)).unwrap();
    assert_eq!(change.old_parent.as_ref(), Some(&ids[0]));
    assert_eq!(
        graph.children(&ids[0]),
        &[ids[3].clone(), ids[1].clone(), ids[2].clone()]
    );
    assert!(graph.insert(&ids[0], &ids[3], Some(3)).is_err());
}

#[test]
fn test_remove_node_orphans_children() {
    let mut registry = ObjectRegistry::default();
    let (mut graph, ids) = graph(&mut registry, 3);
    graph.insert(&ids[0], &ids[1], None).unwrap();
    graph.insert(&ids[1], &ids[2], None).unwrap();

    assert_eq!(graph.remove_node(&ids[1]), Some(ids[0].clone()));
    assert!(graph.children(&ids[0]).is_empty());
    assert_eq!(graph.parent(&ids[2]), None);
    assert!(!graph.contains(&ids[1]));
}

#[test]
fn test_post_order_lists_children_first() {
    let mut registry = ObjectRegistry::default();
    let (mut graph, ids) = graph(&mut registry, 4);
    graph.insert(&ids[0], &ids[1], None).unwrap();
    graph.insert(&ids[1], &ids[2], None).unwrap();
    graph.insert(&ids[0], &ids[3], None).unwrap();
    assert_eq!(
        graph.descendants_post_order(&ids[0]),
        vec![ids[2].clone(), ids[1].clone(), ids[3].clone()]
    );
}

// ============================================================================
// SELECTORS
// ============================================================================

#[test]
fn test_malformed_selectors() {
    for text in ["", "#", ".", "#a b", "1abc", "a..b", "prev( )"] {
        assert_eq!(Selector::parse(text), None, "{text:?}");
    }
}

#[test]
fn test_query_first_match_in_order() {
    let mut registry = ObjectRegistry::default();
    let (mut graph, ids) = graph(&mut registry, 4);
    for child in &ids[1..] {
        graph.insert(&ids[0], child, None).unwrap();
    }
    graph.set_classes(&ids[2], vec!["row".into()]);
    graph.set_classes(&ids[3], vec!["row".into()]);
    graph.set_name(&ids[3], Some("last".into()));

    let row = Selector::parse(".row").unwrap();
    assert_eq!(graph.query_children(&ids[0], &row), Some(&ids[2]));
    let last = Selector::parse("#last").unwrap();
    assert_eq!(graph.query_children(&ids[0], &last), Some(&ids[3]));
    let ty = Selector::parse("Composite").unwrap();
    assert_eq!(graph.query_children(&ids[0], &ty), Some(&ids[1]));
    assert_eq!(graph.query_children(&ids[0], &Selector::Prev), None);
}
