// Cycle rejection at insertion time
use tangle::{DependencyGraph, EdgeKind};

#[test]
fn self_loop_is_rejected() {
    let graph = DependencyGraph::new();
    let x = graph.add_node("x", "");

    let err = graph.add_edge(x, x).unwrap_err();
    assert_eq!(err.from, x);
    assert_eq!(err.to, x);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn two_edge_cycle_is_rejected() {
    let graph = DependencyGraph::new();
    let a = graph.add_node("a", "");
    let b = graph.add_node("b", "");

    graph.add_edge(a, b).unwrap();
    assert!(graph.add_edge(b, a).is_err());
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn long_cycle_is_rejected_with_the_attempted_endpoints() {
    let graph = DependencyGraph::new();
    let a = graph.add_node("a", "");
    let b = graph.add_node("b", "");
    let c = graph.add_node("c", "");
    let d = graph.add_node("d", "");

    graph.add_edge(a, b).unwrap();
    graph.add_edge(b, c).unwrap();
    graph.add_edge(c, d).unwrap();

    let err = graph.add_edge(d, a).unwrap_err();
    assert_eq!(err.from, d);
    assert_eq!(err.to, a);

    let involved = graph.filter_between(d, a);
    assert_eq!(involved.len(), 4);
    for node in [a, b, c, d] {
        assert!(involved.contains(&node));
    }
}

#[test]
fn rejection_does_not_poison_the_graph() {
    let graph = DependencyGraph::new();
    let a = graph.add_node("a", "");
    let b = graph.add_node("b", "");
    let c = graph.add_node("c", "");

    graph.add_edge(a, b).unwrap();
    graph.add_edge(b, c).unwrap();
    assert!(graph.add_edge(c, a).is_err());

    // Non-cyclic work continues normally after a rejection.
    let d = graph.add_node("d", "");
    graph.add_edge(c, d).unwrap();
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn cycles_through_mixed_edge_kinds_are_caught() {
    let graph = DependencyGraph::new();
    let a = graph.add_node("a", "");
    let b = graph.add_node("b", "");
    let c = graph.add_node("c", "");

    graph.add_edge_with(a, b, EdgeKind::Flow, "").unwrap();
    graph.add_edge_with(b, c, EdgeKind::Depend, "").unwrap();

    assert!(graph.add_edge_with(c, a, EdgeKind::Fulfill, "").is_err());
}

#[test]
fn acyclic_insertions_accumulate() {
    let graph = DependencyGraph::new();
    let nodes: Vec<_> = (0..20).map(|i| graph.add_node(format!("n{}", i), "")).collect();

    let mut inserted = 0;
    for window in nodes.windows(2) {
        graph.add_edge(window[0], window[1]).unwrap();
        inserted += 1;
        assert_eq!(graph.edge_count(), inserted);
    }

    // Any back edge along the chain closes a cycle.
    assert!(graph.add_edge(nodes[19], nodes[0]).is_err());
    assert!(graph.add_edge(nodes[10], nodes[3]).is_err());
    assert_eq!(graph.edge_count(), inserted);
}
