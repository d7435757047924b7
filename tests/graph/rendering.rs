// Graphviz output over the public API
use tangle::{DependencyGraph, EdgeKind};

#[test]
fn diamond_renders_four_nodes_and_four_back_edges() {
    let graph = DependencyGraph::new();
    let a = graph.add_node("a", "");
    let b = graph.add_node("b", "");
    let c = graph.add_node("c", "");
    let d = graph.add_node("d", "");
    graph.add_edge(a, b).unwrap();
    graph.add_edge(a, c).unwrap();
    graph.add_edge(b, d).unwrap();
    graph.add_edge(c, d).unwrap();

    let out = graph.to_graphviz();
    for id in 0..4 {
        assert!(out.contains(&format!("node_{} [ label =", id)));
    }
    assert_eq!(out.matches("dir = \"back\"").count(), 4);
}

#[test]
fn clusters_nest_in_the_output() {
    let graph = DependencyGraph::new();
    let top = graph.add_cluster("top level", "");
    let inner = graph.add_cluster_under(top, "inner", "");
    graph.add_node_in(inner, "leaf", "");

    let out = graph.to_graphviz();
    let top_at = out.find("subgraph cluster_0 {").unwrap();
    let inner_at = out.find("subgraph cluster_1 {").unwrap();
    assert!(top_at < inner_at);
    assert!(out.contains("            node_0;"));
}

#[test]
fn cycle_error_renders_the_involved_nodes() {
    let graph = DependencyGraph::new();
    let a = graph.add_node("a", "");
    let b = graph.add_node("b", "");
    let c = graph.add_node("c", "");
    let d = graph.add_node("d", "");
    let bystander = graph.add_node("bystander", "");

    graph.add_edge(a, b).unwrap();
    graph.add_edge(b, c).unwrap();
    graph.add_edge(c, d).unwrap();
    graph.add_edge(a, bystander).unwrap();

    let err = graph.add_edge(d, a).unwrap_err();

    let filtered = err.to_graphviz(&graph);
    for id in 0..4 {
        assert!(filtered.contains(&format!("node_{} [ label =", id)));
    }
    assert!(!filtered.contains("node_4 [ label ="));
    assert!(filtered.contains("color = \"red\""));
    assert!(filtered.contains("constraint = \"false\""));

    let full = err.full_graph_graphviz(&graph);
    assert!(full.contains("node_4 [ label ="));
    assert!(full.contains("color = \"red\""));
}

#[test]
fn flow_and_fulfill_edges_keep_their_styles_in_context() {
    let graph = DependencyGraph::new();
    let a = graph.add_node("a", "");
    let b = graph.add_node("b", "");
    let c = graph.add_node("c", "");
    graph.add_edge_with(a, b, EdgeKind::Flow, "").unwrap();
    graph.add_edge_with(b, c, EdgeKind::Fulfill, "done").unwrap();

    let out = graph.to_graphviz();
    assert!(out.contains("style = \"dashed\" arrowhead = \"dot\""));
    assert!(out.contains("arrowhead = \"vee\" label = \"done\""));
}
