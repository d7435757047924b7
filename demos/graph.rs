//! Build a small clustered graph, render it, then trip the cycle check.

use std::fs;

use tangle::DependencyGraph;

fn main() {
    let graph = DependencyGraph::new();

    let top = graph.add_cluster("top level", "");
    let stage_a = graph.add_cluster_under(top, "235", "");
    let stage_b = graph.add_cluster_under(top, "46", "");

    let n1 = graph.add_node("node 1", "this is a longer description");
    let n2 = graph.add_node_in(stage_a, "node 2", "this is a description of node 2\nmay be line broken");
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

    println!("Full graph:");
    let rendered = graph.to_graphviz();
    println!("{}", rendered);
    fs::write("success.dot", &rendered).unwrap();

    match graph.add_edge(n6, n2) {
        Ok(()) => unreachable!("n2 reaches n6, so this edge closes a cycle"),
        Err(cycle) => {
            println!("\nNodes inside cycle:");
            let rendered = cycle.to_graphviz(&graph);
            println!("{}", rendered);
            fs::write("failure.dot", &rendered).unwrap();
        }
    }
}
