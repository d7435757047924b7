//! Error types for graph construction and task execution.
//!
//! Two error domains exist: graph construction can reject an edge with
//! [`DependencyCycle`], and task execution surfaces failures through
//! [`TaskError`]. Everything else in the crate treats misuse as a
//! programming error and panics.

use crate::graph::NodeId;

/// An edge insertion was rejected because it would close a cycle.
///
/// Returned by [`crate::DependencyGraph::add_edge`] and
/// [`crate::DependencyGraph::add_edge_with`]. The offending edge is *not*
/// inserted; the graph is unchanged. The error records the attempted edge
/// and renders the involved subgraph via [`DependencyCycle::to_graphviz`]
/// and [`DependencyCycle::full_graph_graphviz`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCycle {
    /// Source of the rejected edge.
    pub from: NodeId,
    /// Target of the rejected edge.
    pub to: NodeId,
    /// Label the rejected edge would have carried.
    pub label: String,
}

impl std::fmt::Display for DependencyCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Edge node_{} -> node_{} would close a dependency cycle: \
             the work represented by node_{} can only complete by waiting on itself.",
            self.from.0, self.to.0, self.to.0
        )
    }
}

impl std::error::Error for DependencyCycle {}

/// Errors that can surface from a running task.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TaskError {
    /// An annotation inside the task body attempted to record a dependency
    /// edge that would close a cycle.
    Cycle(DependencyCycle),
    /// The task body panicked during a poll.
    Panicked { message: String },
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskError::Cycle(cycle) => write!(f, "{}", cycle),
            TaskError::Panicked { message } => {
                write!(f, "Task body panicked during execution: {}", message)
            }
        }
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TaskError::Cycle(cycle) => Some(cycle),
            TaskError::Panicked { .. } => None,
        }
    }
}

impl From<DependencyCycle> for TaskError {
    fn from(cycle: DependencyCycle) -> Self {
        TaskError::Cycle(cycle)
    }
}

/// Result type produced by task bodies and awaits.
pub type TaskResult<T> = Result<T, TaskError>;
