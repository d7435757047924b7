//! Dependency graph with nested clusters, typed labeled edges,
//! insertion-time cycle detection and subgraph extraction.
//!
//! The graph is append-only: nodes, clusters and edges are never removed
//! and ids are never reused. Edges live in a single vector kept sorted by
//! `(from, to, kind, label)`, so enumerating a node's outgoing edges is a
//! `partition_point` pair. All interior state sits behind a `RefCell`,
//! letting every task that records into the graph share one `Rc` to it;
//! execution is single-threaded, so no locking is involved.

use std::cell::{Ref, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hasher};

#[cfg(feature = "tracing")]
use tracing::{debug, error};

use crate::error::DependencyCycle;

/// Dense, insertion-ordered node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Dense, insertion-ordered cluster identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(pub usize);

/// What an edge asserts about its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    /// `to` cannot complete until `from` completes.
    Depend,
    /// Execution proceeds from `from` to `to` within one task.
    Flow,
    /// `from`'s completion fulfills the obligation represented by `to`.
    Fulfill,
}

/// Hasher that uses the dense ids as their own hashes.
#[derive(Default, Clone)]
pub struct PassThroughHasher {
    hash: u64,
}

impl Hasher for PassThroughHasher {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write_usize(&mut self, i: usize) {
        self.hash = i as u64;
    }

    fn write(&mut self, _bytes: &[u8]) {
        panic!("PassThroughHasher used on invalid type");
    }
}

impl BuildHasher for PassThroughHasher {
    type Hasher = PassThroughHasher;

    fn build_hasher(&self) -> Self::Hasher {
        PassThroughHasher::default()
    }
}

/// Working-set type for reachability passes and filtered rendering.
pub type NodeIdSet = HashSet<NodeId, PassThroughHasher>;

pub(crate) struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) description: String,
}

pub(crate) struct Cluster {
    pub(crate) id: ClusterId,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) child_clusters: Vec<ClusterId>,
    pub(crate) child_nodes: Vec<NodeId>,
    pub(crate) parent: Option<ClusterId>,
}

// Derived Ord is lexicographic over (from, to, kind, label), which is the
// strict ordering the sorted edge vector requires.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Edge {
    pub(crate) from: NodeId,
    pub(crate) to: NodeId,
    pub(crate) kind: EdgeKind,
    pub(crate) label: String,
}

#[derive(Default)]
pub(crate) struct GraphInner {
    pub(crate) nodes: Vec<Node>,
    pub(crate) clusters: Vec<Cluster>,
    pub(crate) edges: Vec<Edge>,
}

impl GraphInner {
    /// All edges leaving `from`, via `equal_range` on the sorted vector.
    pub(crate) fn outgoing(&self, from: NodeId) -> &[Edge] {
        let lo = self.edges.partition_point(|e| e.from < from);
        let hi = self.edges.partition_point(|e| e.from <= from);
        &self.edges[lo..hi]
    }

    /// Would inserting `from -> to` close a cycle?
    ///
    /// True iff `from` is reachable from `to` along existing edges; the
    /// empty path makes a self-edge trivially cyclic. Edge kinds are not
    /// distinguished: every edge is a constraint.
    fn would_close_cycle(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }

        let mut reachable = NodeIdSet::default();
        reachable.insert(to);
        let mut queue = VecDeque::from([to]);

        while let Some(current) = queue.pop_front() {
            for edge in self.outgoing(current) {
                if edge.to == from {
                    return true;
                }
                if reachable.insert(edge.to) {
                    queue.push_back(edge.to);
                }
            }
        }

        false
    }

    /// Nodes reachable from `start`, with `extra` treated as an edge.
    fn forward_reachable(&self, start: NodeId, extra: (NodeId, NodeId)) -> NodeIdSet {
        let mut reachable = NodeIdSet::default();
        reachable.insert(start);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            let followups = self.outgoing(current).iter().map(|e| e.to);
            let hypothetical = (current == extra.0).then_some(extra.1);
            for next in followups.chain(hypothetical) {
                if reachable.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        reachable
    }

    /// Nodes that can reach `start`, with `extra` treated as an edge.
    fn backward_reachable(&self, start: NodeId, extra: (NodeId, NodeId)) -> NodeIdSet {
        let mut incoming: HashMap<NodeId, Vec<NodeId>, PassThroughHasher> = HashMap::default();
        for edge in &self.edges {
            incoming.entry(edge.to).or_default().push(edge.from);
        }
        incoming.entry(extra.1).or_default().push(extra.0);

        let mut reachable = NodeIdSet::default();
        reachable.insert(start);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            let Some(sources) = incoming.get(&current) else {
                continue;
            };
            for &source in sources {
                if reachable.insert(source) {
                    queue.push_back(source);
                }
            }
        }

        reachable
    }
}

/// Graph of nodes, nested clusters and typed labeled edges.
///
/// Construction operations return stable ids and never fail, except
/// [`add_edge`](DependencyGraph::add_edge) and
/// [`add_edge_with`](DependencyGraph::add_edge_with), which reject (and do
/// not insert) an edge that would close a cycle. Duplicate edges are
/// permitted.
///
/// # Examples
///
/// ```
/// use tangle::DependencyGraph;
///
/// let graph = DependencyGraph::new();
/// let setup = graph.add_node("setup", "");
/// let work = graph.add_node("work", "");
///
/// graph.add_edge(setup, work).unwrap();
/// let rejected = graph.add_edge(work, setup);
/// assert!(rejected.is_err());
/// ```
#[derive(Default)]
pub struct DependencyGraph {
    inner: RefCell<GraphInner>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn inner(&self) -> Ref<'_, GraphInner> {
        self.inner.borrow()
    }

    /// Add a root cluster.
    pub fn add_cluster(&self, name: impl Into<String>, description: impl Into<String>) -> ClusterId {
        let mut inner = self.inner.borrow_mut();
        let id = ClusterId(inner.clusters.len());
        inner.clusters.push(Cluster {
            id,
            name: name.into(),
            description: description.into(),
            child_clusters: Vec::new(),
            child_nodes: Vec::new(),
            parent: None,
        });

        #[cfg(feature = "tracing")]
        debug!(cluster_id = id.0, "added cluster");

        id
    }

    /// Add a cluster nested under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a cluster of this graph.
    pub fn add_cluster_under(
        &self,
        parent: ClusterId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> ClusterId {
        let id = self.add_cluster(name, description);
        let mut inner = self.inner.borrow_mut();
        inner.clusters[parent.0].child_clusters.push(id);
        inner.clusters[id.0].parent = Some(parent);
        id
    }

    /// Add a node outside any cluster.
    pub fn add_node(&self, name: impl Into<String>, description: impl Into<String>) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = NodeId(inner.nodes.len());
        inner.nodes.push(Node {
            id,
            name: name.into(),
            description: description.into(),
        });

        #[cfg(feature = "tracing")]
        debug!(node_id = id.0, "added node");

        id
    }

    /// Add a node as a member of `cluster`.
    ///
    /// # Panics
    ///
    /// Panics if `cluster` is not a cluster of this graph.
    pub fn add_node_in(
        &self,
        cluster: ClusterId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> NodeId {
        let id = self.add_node(name, description);
        self.inner.borrow_mut().clusters[cluster.0].child_nodes.push(id);
        id
    }

    /// Add an unlabeled [`EdgeKind::Depend`] edge.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyCycle`], inserting nothing, if the edge would
    /// close a cycle.
    pub fn add_edge(&self, from: NodeId, to: NodeId) -> Result<(), DependencyCycle> {
        self.add_edge_with(from, to, EdgeKind::Depend, "")
    }

    /// Add an edge with an explicit kind and label.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyCycle`], inserting nothing, if the edge would
    /// close a cycle. Kinds are not distinguished by the cycle
    /// check; `Flow` and `Fulfill` edges constrain reachability exactly
    /// like `Depend` edges.
    pub fn add_edge_with(
        &self,
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
        label: impl Into<String>,
    ) -> Result<(), DependencyCycle> {
        let label = label.into();
        let mut inner = self.inner.borrow_mut();
        debug_assert!(from.0 < inner.nodes.len() && to.0 < inner.nodes.len());

        if inner.would_close_cycle(from, to) {
            #[cfg(feature = "tracing")]
            error!(
                from = from.0,
                to = to.0,
                label = %label,
                "edge rejected: would close a dependency cycle"
            );

            return Err(DependencyCycle { from, to, label });
        }

        let edge = Edge {
            from,
            to,
            kind,
            label,
        };
        let at = inner.edges.partition_point(|e| e <= &edge);
        inner.edges.insert(at, edge);

        #[cfg(feature = "tracing")]
        debug!(from = from.0, to = to.0, ?kind, "added edge");

        Ok(())
    }

    /// Nodes lying on some path from `from` to `to`, both included.
    ///
    /// The set is computed on the edge set extended with a hypothetical
    /// `from -> to` edge, which is what makes it usable for rendering a
    /// rejected edge: for a cycle `(from, to)` it yields every node of the
    /// loop the edge would have closed.
    pub fn filter_between(&self, from: NodeId, to: NodeId) -> NodeIdSet {
        let inner = self.inner.borrow();
        let forward = inner.forward_reachable(from, (from, to));
        let backward = inner.backward_reachable(to, (from, to));

        let mut included: NodeIdSet = forward.intersection(&backward).copied().collect();
        included.insert(from);
        included.insert(to);
        included
    }

    /// True if at least one `from -> to` edge exists, of any kind.
    pub fn contains_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.inner
            .borrow()
            .outgoing(from)
            .iter()
            .any(|e| e.to == to)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    /// Number of clusters.
    pub fn cluster_count(&self) -> usize {
        self.inner.borrow().clusters.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.inner.borrow().edges.len()
    }
}
