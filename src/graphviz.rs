//! Graphviz text rendering of graphs and cycle diagnostics.
//!
//! Output contract: `rankdir = "TB"`, `newrank = "true"`; node labels carry
//! a literal newline between `name (#id)` and the description, cluster
//! labels carry the two-character `\n` escape; clusters nest to match the
//! parent/child structure, indented four spaces per level. Edge styling by
//! kind: `depend` renders inverted (`dir = "back"`), `flow` is dashed with
//! a dot arrowhead, `fulfill` uses a vee arrowhead.

use crate::error::DependencyCycle;
use crate::graph::{Cluster, DependencyGraph, EdgeKind, GraphInner, NodeId, NodeIdSet};

const HEADER: &str = "\ndigraph {\n    rankdir = \"TB\";\n    newrank = \"true\";\n\n";
const FOOTER: &str = "}";

fn edge_style(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Depend => "dir = \"back\" ",
        EdgeKind::Flow => "style = \"dashed\" arrowhead = \"dot\" ",
        EdgeKind::Fulfill => "arrowhead = \"vee\" ",
    }
}

fn visible(filter: Option<&NodeIdSet>, id: NodeId) -> bool {
    filter.map_or(true, |set| set.contains(&id))
}

fn render_cluster(
    inner: &GraphInner,
    out: &mut String,
    cluster: &Cluster,
    prefix: &str,
    filter: Option<&NodeIdSet>,
) {
    out.push_str(&format!("{}subgraph cluster_{} {{\n", prefix, cluster.id.0));
    out.push_str(&format!(
        "{}    label = \"{} (#{})\\n{}\";\n\n",
        prefix, cluster.name, cluster.id.0, cluster.description
    ));

    for &child in &cluster.child_clusters {
        render_cluster(
            inner,
            out,
            &inner.clusters[child.0],
            &format!("{}    ", prefix),
            filter,
        );
    }

    for &child in &cluster.child_nodes {
        if visible(filter, child) {
            out.push_str(&format!("{}    node_{};\n", prefix, child.0));
        }
    }

    out.push_str(&format!("{}}}\n", prefix));
}

fn render(
    inner: &GraphInner,
    filter: Option<&NodeIdSet>,
    overlay: Option<&DependencyCycle>,
) -> String {
    let mut out = String::from(HEADER);

    for node in &inner.nodes {
        if visible(filter, node.id) {
            out.push_str(&format!(
                "    node_{id} [ label = \"{name} (#{id})\n{desc}\" ];\n",
                id = node.id.0,
                name = node.name,
                desc = node.description
            ));
        }
    }
    out.push('\n');

    for cluster in &inner.clusters {
        if cluster.parent.is_none() {
            render_cluster(inner, &mut out, cluster, "    ", filter);
        }
    }
    out.push('\n');

    if let Some(cycle) = overlay {
        out.push_str(&format!(
            "    node_{} -> node_{} [ style = \"dashed\" color = \"red\" constraint = \"false\" label = \"{}\" ];\n",
            cycle.to.0, cycle.from.0, cycle.label
        ));
    }

    for edge in &inner.edges {
        if visible(filter, edge.from) && visible(filter, edge.to) {
            out.push_str(&format!(
                "    node_{} -> node_{} [ {}label = \"{}\" ];\n",
                edge.from.0,
                edge.to.0,
                edge_style(edge.kind),
                edge.label
            ));
        }
    }

    out.push_str(FOOTER);
    out
}

impl DependencyGraph {
    /// Render the whole graph.
    pub fn to_graphviz(&self) -> String {
        render(&self.inner(), None, None)
    }

    /// Render only the nodes lying on some path from `from` to `to`.
    ///
    /// The cluster skeleton is kept in full; member nodes and edges are
    /// restricted to the [`filter_between`](DependencyGraph::filter_between)
    /// set.
    pub fn to_graphviz_between(&self, from: NodeId, to: NodeId) -> String {
        let included = self.filter_between(from, to);
        render(&self.inner(), Some(&included), None)
    }
}

impl DependencyCycle {
    /// Render the nodes involved in the cycle, with the rejected edge
    /// overlaid as a dashed red, non-constraining back edge.
    pub fn to_graphviz(&self, graph: &DependencyGraph) -> String {
        let included = graph.filter_between(self.from, self.to);
        render(&graph.inner(), Some(&included), Some(self))
    }

    /// Render the full graph with the rejected edge overlaid.
    pub fn full_graph_graphviz(&self, graph: &DependencyGraph) -> String {
        render(&graph.inner(), None, Some(self))
    }
}
