// Graph construction over the public API
use tangle::{ClusterId, DependencyGraph, EdgeKind, NodeId};

#[test]
fn builds_a_forest_of_clusters_with_members() {
    let graph = DependencyGraph::new();

    let top = graph.add_cluster("top level", "");
    let stage_a = graph.add_cluster_under(top, "235", "");
    let stage_b = graph.add_cluster_under(top, "46", "");

    let n1 = graph.add_node("node 1", "this is a longer description");
    let n2 = graph.add_node_in(stage_a, "node 2", "description of node 2\nmay be line broken");
    let n3 = graph.add_node_in(stage_a, "node 3", "this is the last node");
    let n4 = graph.add_node_in(stage_b, "node 4", "");
    let n5 = graph.add_node_in(stage_a, "node 5", "");
    let n6 = graph.add_node_in(stage_b, "node 6", "");

    graph.add_edge(n1, n2).unwrap();
    graph.add_edge(n2, n3).unwrap();
    graph.add_edge(n3, n4).unwrap();
    graph.add_edge(n2, n5).unwrap();
    graph.add_edge(n4, n5).unwrap();
    graph.add_edge(n5, n6).unwrap();

    assert_eq!(graph.node_count(), 6);
    assert_eq!(graph.cluster_count(), 3);
    assert_eq!(graph.edge_count(), 6);
    assert_eq!(top, ClusterId(0));
    assert_eq!(n6, NodeId(5));
}

#[test]
fn ids_stay_stable_across_later_insertions() {
    let graph = DependencyGraph::new();
    let first = graph.add_node("first", "");

    for i in 0..100 {
        graph.add_node(format!("n{}", i), "");
    }

    assert_eq!(first, NodeId(0));
    assert_eq!(graph.add_node("last", ""), NodeId(101));
}

#[test]
fn labeled_edges_of_every_kind() {
    let graph = DependencyGraph::new();
    let a = graph.add_node("a", "");
    let b = graph.add_node("b", "");
    let c = graph.add_node("c", "");

    graph.add_edge_with(a, b, EdgeKind::Depend, "because").unwrap();
    graph.add_edge_with(b, c, EdgeKind::Flow, "then").unwrap();
    graph.add_edge_with(a, c, EdgeKind::Fulfill, "fulfills").unwrap();

    assert_eq!(graph.edge_count(), 3);
    assert!(graph.contains_edge(a, b));
    assert!(graph.contains_edge(b, c));
    assert!(graph.contains_edge(a, c));
}
