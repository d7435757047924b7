//! Single-threaded async task graphs with live dependency tracing.
//!
//! `tangle` lets you compose work out of cooperatively scheduled async
//! tasks and, as they execute, records a graph of what ran inside each
//! task and what waited on what across tasks. If the composition implies a
//! deadlock (a task that can only complete by waiting on itself), the
//! cycle is detected at the exact moment the closing dependency is
//! recorded, and the error renders the offending subgraph as Graphviz
//! text.
//!
//! # The three layers
//!
//! - **Execution**: [`Task`] is a lazily started, reference-counted unit
//!   of async work with a shared result cell; [`ExecutionContext`] is the
//!   FIFO queue its continuations run on. There is no thread pool and no
//!   preemption: the host drains the queue, usually with
//!   [`ExecutionContext::run_until`].
//! - **Graph**: [`DependencyGraph`] stores named nodes grouped into nested
//!   clusters and typed, labeled edges. Every edge insertion is checked;
//!   an edge that would close a cycle is rejected with
//!   [`DependencyCycle`], which can render both the involved nodes and the
//!   full graph with the rejected edge overlaid.
//! - **Annotation**: [`annotated::AnnotatedTask`] instruments a task body
//!   so that declared regions become `flow`-linked node pairs inside the
//!   task's cluster and every await of another annotated task becomes a
//!   `depend` edge labeled with its source location.
//!
//! # Quick start
//!
//! ```
//! use std::rc::Rc;
//! use tangle::{when_all, ExecutionContext, Task};
//!
//! let exec = Rc::new(ExecutionContext::new());
//!
//! let base = Task::spawn(&exec, async { Ok(2) });
//! let left = Task::spawn(&exec, {
//!     let base = base.clone();
//!     async move { Ok(base.await? + 1) }
//! });
//! let right = Task::spawn(&exec, {
//!     let base = base.clone();
//!     async move { Ok(base.await? * 10) }
//! });
//!
//! let both = when_all(&exec, (left, right));
//! both.start();
//! exec.run_until(|| both.is_ready());
//!
//! assert_eq!(both.result().unwrap(), (3, 20));
//! ```
//!
//! # Tracing a composition
//!
//! Annotated tasks carry a [`annotated::Context`] that points at the graph
//! and at the position of their creator in it:
//!
//! ```
//! use std::rc::Rc;
//! use tangle::annotated::{AnnotatedTask, Context};
//! use tangle::{DependencyGraph, ExecutionContext};
//!
//! let exec = Rc::new(ExecutionContext::new());
//! let graph = Rc::new(DependencyGraph::new());
//! let main_cluster = graph.add_cluster("main()", "");
//! let main_node = graph.add_node_in(main_cluster, "main()", "");
//!
//! let ctx = Context::new(exec.clone(), graph.clone(), main_cluster, main_node);
//! let work = AnnotatedTask::spawn(ctx, |scope| async move {
//!     scope.declare_function("work", "");
//!     scope.declare_region("prepare", "").await?;
//!     scope.declare_region("finish", "").await?;
//!     Ok(())
//! });
//!
//! work.start();
//! exec.run_until(|| work.is_ready());
//! work.result().unwrap();
//!
//! // Two regions, four nodes, plus the main() node.
//! assert_eq!(graph.node_count(), 5);
//! println!("{}", graph.to_graphviz());
//! ```
//!
//! # Error handling
//!
//! Task bodies return [`TaskResult`]; `?` at each await re-raises a
//! child's failure at the awaiter. Panics inside a body are caught and
//! published as [`TaskError::Panicked`], so every waiter of a failed task
//! observes the same error. A cycle detected inside an annotated body
//! surfaces as [`TaskError::Cycle`] and keeps the rejected edge's
//! coordinates for rendering.
//!
//! Misuse (completing a result cell twice, reading an unfinished result,
//! annotating before `declare_function`) is a programming error and
//! panics.
//!
//! # Scheduling model
//!
//! Everything is single-threaded and cooperative; nothing in this crate is
//! `Send`. Completions never resume waiters on the completer's stack:
//! waiters are posted onto the [`ExecutionContext`] and run when the host
//! drains it. Continuations fire in registration order and the queue is
//! strictly FIFO, so execution order is reproducible.
//!
//! # Optional tracing
//!
//! With the `tracing` cargo feature enabled, graph mutations and the task
//! lifecycle emit structured events through the `tracing` crate (`debug!`
//! for mutations, `trace!` for queue and poll detail, `error!` for panics
//! and cycle rejections). The instrumentation is conditionally compiled;
//! the default build carries none of it.

pub mod annotated;
mod cell;
mod combinators;
mod context;
mod error;
mod graph;
mod graphviz;
mod task;
mod waker;

pub use combinators::{when_all, TaskList};
pub use context::{default_context, ExecutionContext};
pub use error::{DependencyCycle, TaskError, TaskResult};
pub use graph::{ClusterId, DependencyGraph, EdgeKind, NodeId, NodeIdSet, PassThroughHasher};
pub use task::{Promise, Task};
