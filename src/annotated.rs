//! Annotated tasks: task execution that records itself into a
//! [`DependencyGraph`] as it runs.
//!
//! An annotated task wraps a plain [`Task`] and threads a [`Scope`] handle
//! through its body. The scope's methods are the annotation points: the
//! body declares a function cluster once, carves itself into named regions
//! (each a `begin`/`end` node pair joined by `flow` edges), and awaits
//! other annotated tasks through [`Scope::await_task`], which records a
//! labeled `depend` edge before delegating to the ordinary await protocol.
//! If one of those edges would close a cycle, the rejection surfaces as
//! [`TaskError::Cycle`] right at the await that introduced it.
//!
//! Spawning an annotated task immediately runs its body up to the first
//! real suspension point. Only the first [`Scope::declare_region`] in a
//! body completes without suspending; every later one yields once through
//! the execution context. The prologue therefore always leaves the task
//! with its function cluster and first region in place, which is what lets
//! a parent read the task's terminal node when it awaits it.

use std::cell::Cell;
use std::future::Future;
use std::panic::Location;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context as PollContext, Poll};

use futures::future::LocalBoxFuture;
use futures::FutureExt;

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::{DependencyCycle, TaskError, TaskResult};
use crate::graph::{ClusterId, DependencyGraph, EdgeKind, NodeId};
use crate::task::Task;

/// A `begin`/`end` node pair bracketing a stretch of one task's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Node entered when the region starts.
    pub start: NodeId,
    /// Node other work depends on; completed when the region ends.
    pub end: NodeId,
}

/// Position in the graph captured when an annotated task is created.
///
/// Records which graph to annotate, the creating task's function cluster
/// and current node, and the source location of the capture. The executor
/// rides along so annotated constructors stay `(ctx, body)`-shaped.
#[derive(Clone)]
pub struct Context {
    pub(crate) exec: Rc<ExecutionContext>,
    pub(crate) graph: Rc<DependencyGraph>,
    pub(crate) current_function: ClusterId,
    pub(crate) current_node: NodeId,
    pub(crate) location: &'static Location<'static>,
}

impl Context {
    /// Capture a context at the caller's source location.
    #[track_caller]
    pub fn new(
        exec: Rc<ExecutionContext>,
        graph: Rc<DependencyGraph>,
        current_function: ClusterId,
        current_node: NodeId,
    ) -> Self {
        Context {
            exec,
            graph,
            current_function,
            current_node,
            location: Location::caller(),
        }
    }

    /// The execution context annotated tasks created from this run on.
    pub fn executor(&self) -> &Rc<ExecutionContext> {
        &self.exec
    }

    /// The graph annotations are recorded into.
    ///
    /// The graph must outlive every task holding this context; sharing it
    /// through `Rc` makes that the default.
    pub fn graph(&self) -> &Rc<DependencyGraph> {
        &self.graph
    }

    /// The function cluster of whoever captured this context.
    pub fn current_function(&self) -> ClusterId {
        self.current_function
    }

    /// The node new work is considered to flow out of.
    pub fn current_node(&self) -> NodeId {
        self.current_node
    }

    /// Source location of the capture.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

struct AnnotationState {
    captured: Context,
    function: Cell<Option<ClusterId>>,
    region: Cell<Option<Region>>,
    use_predecessor: Cell<bool>,
    use_captured: Cell<bool>,
    already_suspended: Cell<bool>,
}

fn located(loc: &Location<'_>, description: String) -> String {
    format!("at {}:{}\n{}", loc.file(), loc.line(), description)
}

/// Annotation handle threaded through an annotated task's body.
///
/// The scope is the running task's promise surface: it carries the
/// captured [`Context`], the task's function cluster and current region,
/// and is the body's only way to write graph structure. It is handed to
/// the body at spawn time and can be cloned freely.
#[derive(Clone)]
pub struct Scope {
    state: Rc<AnnotationState>,
}

impl Scope {
    /// Name this task's function cluster. Exactly once per task; completes
    /// without suspending.
    ///
    /// The cluster is added as a forest root; its description is prefixed
    /// with the caller's source location.
    ///
    /// # Panics
    ///
    /// Panics on a second call, or after [`Scope::inherit_function`].
    #[track_caller]
    pub fn declare_function(&self, name: impl Into<String>, description: impl Into<String>) {
        let loc = Location::caller();
        assert!(
            self.state.function.get().is_none(),
            "declare_function called twice (or after inherit_function)"
        );

        let name = name.into();

        #[cfg(feature = "tracing")]
        debug!(function = %name, "declaring function cluster");

        let cluster = self
            .state
            .captured
            .graph
            .add_cluster(name, located(loc, description.into()));
        self.state.function.set(Some(cluster));
    }

    /// Open a new named region inside the function cluster.
    ///
    /// Synchronously adds the `begin`/`end` node pair, the `flow` edge
    /// between them, a `flow` edge from the previous region's end if there
    /// is one, and, on the task's first region only, a `flow` edge from
    /// the captured context's current node. The returned future resolves
    /// to a [`Context`] whose current node is the region's begin node.
    ///
    /// The first region of a task completes without suspending; every
    /// later one is a real suspension point that re-enters through the
    /// execution context.
    ///
    /// # Panics
    ///
    /// Panics if no function has been declared or inherited yet.
    #[track_caller]
    pub fn declare_region(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> DeclareRegion {
        self.declare_region_at(Location::caller(), name.into(), description.into())
    }

    pub(crate) fn declare_region_at(
        &self,
        loc: &'static Location<'static>,
        name: String,
        description: String,
    ) -> DeclareRegion {
        let state = &self.state;
        let function = state
            .function
            .get()
            .expect("declare_region before declare_function");
        let graph = &state.captured.graph;

        #[cfg(feature = "tracing")]
        debug!(region = %name, "declaring region");

        let description = located(loc, description);
        let start = graph.add_node_in(function, format!("begin: {}", name), description.clone());
        let end = graph.add_node_in(function, format!("end: {}", name), description);

        let mut outcome = graph.add_edge_with(start, end, EdgeKind::Flow, "");
        if outcome.is_ok() {
            if let Some(prev) = state.region.get() {
                outcome = graph.add_edge_with(prev.end, start, EdgeKind::Flow, "");
            }
        }
        if outcome.is_ok() && state.use_predecessor.get() {
            outcome = graph.add_edge_with(state.captured.current_node, start, EdgeKind::Flow, "");
            state.use_predecessor.set(false);
        }
        if outcome.is_ok() {
            state.region.set(Some(Region { start, end }));
        }

        let immediate = !state.already_suspended.replace(true);

        DeclareRegion {
            scope: self.clone(),
            location: loc,
            immediate,
            woken: false,
            rejected: outcome.err(),
        }
    }

    /// Await another annotated task, recording the dependency.
    ///
    /// Adds a `depend` edge from the awaited task's terminal node to the
    /// current region's end node, labeled with the caller's source
    /// location, then follows the ordinary await protocol: no suspension
    /// if the task is ready, otherwise register-and-schedule. If the edge
    /// would close a cycle the future resolves to [`TaskError::Cycle`]
    /// without awaiting anything.
    ///
    /// # Panics
    ///
    /// Panics if no region has been declared yet, or if the awaited task
    /// has no terminal node.
    #[track_caller]
    pub fn await_task<U: Clone + 'static>(&self, task: &AnnotatedTask<U>) -> AwaitTask<U> {
        let loc = Location::caller();
        let region = self
            .state
            .region
            .get()
            .expect("await_task outside any declared region");
        let label = format!("at {}:{}", loc.file(), loc.line());

        let rejected = self
            .state
            .captured
            .graph
            .add_edge_with(task.terminal_node(), region.end, EdgeKind::Depend, label)
            .err();

        AwaitTask {
            inner: task.inner.clone(),
            rejected,
        }
    }

    /// Share the caller's function cluster instead of declaring one.
    ///
    /// Subsequent regions attach their nodes to the captured context's
    /// cluster. Completes without suspending.
    pub fn inherit_function(&self) {
        self.state
            .function
            .set(Some(self.state.captured.current_function));
        self.state.use_captured.set(true);
    }

    /// The current position of this task in the graph.
    ///
    /// # Panics
    ///
    /// Panics before the first region has been declared.
    #[track_caller]
    pub fn context(&self) -> Context {
        self.context_at(Location::caller())
    }

    fn context_at(&self, loc: &'static Location<'static>) -> Context {
        let state = &self.state;
        let function = state
            .function
            .get()
            .expect("context requested before declare_function");
        let region = state
            .region
            .get()
            .expect("context requested before any declared region");
        Context {
            exec: Rc::clone(&state.captured.exec),
            graph: Rc::clone(&state.captured.graph),
            current_function: function,
            current_node: region.start,
            location: loc,
        }
    }

    /// The most recently declared region.
    ///
    /// # Panics
    ///
    /// Panics before the first region has been declared.
    pub fn region(&self) -> Region {
        self.state
            .region
            .get()
            .expect("region requested before any declared region")
    }

    /// The graph this task annotates.
    pub fn graph(&self) -> &Rc<DependencyGraph> {
        &self.state.captured.graph
    }
}

/// Future returned by [`Scope::declare_region`].
pub struct DeclareRegion {
    scope: Scope,
    location: &'static Location<'static>,
    immediate: bool,
    woken: bool,
    rejected: Option<DependencyCycle>,
}

impl Future for DeclareRegion {
    type Output = TaskResult<Context>;

    fn poll(self: Pin<&mut Self>, cx: &mut PollContext<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if !this.immediate && !this.woken {
            // Second and later regions are real suspension points: yield
            // once and re-enter through the execution context.
            this.woken = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }

        if let Some(cycle) = this.rejected.take() {
            return Poll::Ready(Err(TaskError::Cycle(cycle)));
        }

        Poll::Ready(Ok(this.scope.context_at(this.location)))
    }
}

/// Future returned by [`Scope::await_task`].
pub struct AwaitTask<U> {
    inner: Task<U>,
    rejected: Option<DependencyCycle>,
}

impl<U: Clone + 'static> Future for AwaitTask<U> {
    type Output = TaskResult<U>;

    fn poll(self: Pin<&mut Self>, cx: &mut PollContext<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(cycle) = this.rejected.take() {
            return Poll::Ready(Err(TaskError::Cycle(cycle)));
        }

        Pin::new(&mut this.inner).poll(cx)
    }
}

/// A task whose execution is recorded into a dependency graph.
///
/// Beyond the wrapped [`Task`], an annotated task knows its *terminal
/// node*: the node other tasks depend on when they await it. By default
/// that is the end node of the task's current region at await time; it can
/// be overridden with [`AnnotatedTask::with_terminal`] or supplied
/// explicitly through [`AnnotatedTask::from_task`].
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use tangle::annotated::{AnnotatedTask, Context};
/// use tangle::{DependencyGraph, ExecutionContext};
///
/// let exec = Rc::new(ExecutionContext::new());
/// let graph = Rc::new(DependencyGraph::new());
/// let main_cluster = graph.add_cluster("main()", "");
/// let main_node = graph.add_node_in(main_cluster, "main()", "");
///
/// let ctx = Context::new(exec.clone(), graph.clone(), main_cluster, main_node);
/// let task = AnnotatedTask::spawn(ctx, |scope| async move {
///     scope.declare_function("answer", "");
///     scope.declare_region("compute", "").await?;
///     Ok(42)
/// });
///
/// task.start();
/// exec.run_until(|| task.is_ready());
/// assert_eq!(task.result().unwrap(), 42);
/// ```
pub struct AnnotatedTask<T> {
    inner: Task<T>,
    state: Option<Rc<AnnotationState>>,
    terminal: Option<NodeId>,
}

impl<T> Clone for AnnotatedTask<T> {
    fn clone(&self) -> Self {
        AnnotatedTask {
            inner: self.inner.clone(),
            state: self.state.clone(),
            terminal: self.terminal,
        }
    }
}

impl<T: 'static> AnnotatedTask<T> {
    /// Spawn an annotated task over `ctx`'s graph and executor.
    ///
    /// The body receives the task's [`Scope`] and runs *immediately* up to
    /// its first real suspension point, so the annotation prologue
    /// (function cluster, first region) is in place when `spawn` returns.
    pub fn spawn<F, Fut>(ctx: Context, body: F) -> Self
    where
        F: FnOnce(Scope) -> Fut,
        Fut: Future<Output = TaskResult<T>> + 'static,
    {
        let exec = Rc::clone(&ctx.exec);
        let state = Rc::new(AnnotationState {
            captured: ctx,
            function: Cell::new(None),
            region: Cell::new(None),
            use_predecessor: Cell::new(true),
            use_captured: Cell::new(false),
            already_suspended: Cell::new(false),
        });
        let scope = Scope {
            state: Rc::clone(&state),
        };

        let inner = Task::spawn(&exec, body(scope));
        inner.step_now();

        AnnotatedTask {
            inner,
            state: Some(state),
            terminal: None,
        }
    }

    /// Wrap a plain task, supplying the terminal node other annotated
    /// tasks will depend on when awaiting it.
    ///
    /// Use this to bridge externally fulfilled work (typically a
    /// [`Task::manual`] pair) into an annotated graph.
    pub fn from_task(task: Task<T>, terminal: NodeId) -> Self {
        AnnotatedTask {
            inner: task,
            state: None,
            terminal: Some(terminal),
        }
    }

    /// Override the terminal node.
    pub fn with_terminal(mut self, node: NodeId) -> Self {
        self.terminal = Some(node);
        self
    }

    /// Post a resumption of the task onto its execution context.
    pub fn start(&self) {
        self.inner.post_step();
    }

    /// True once the body has returned or failed.
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    /// The node other tasks depend on when awaiting this one.
    ///
    /// # Panics
    ///
    /// Panics if no terminal override was given and the task has not
    /// declared a region yet.
    pub fn terminal_node(&self) -> NodeId {
        if let Some(node) = self.terminal {
            return node;
        }
        self.state
            .as_ref()
            .and_then(|state| state.region.get())
            .map(|region| region.end)
            .expect("annotated task has no terminal node yet")
    }
}

impl<T: Clone + 'static> AnnotatedTask<T> {
    /// Clone out the completed result. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if the task has not completed yet.
    pub fn result(&self) -> TaskResult<T> {
        self.inner.result()
    }
}

/// Tuple of annotated tasks acceptable by [`when_all`]. Implemented for
/// tuples of [`AnnotatedTask`] up to arity 8.
pub trait AnnotatedList {
    /// Tuple of the children's values, in declaration order.
    type Output;

    #[doc(hidden)]
    fn join(self, scope: Scope) -> LocalBoxFuture<'static, TaskResult<Self::Output>>;
}

macro_rules! impl_annotated_list {
    ($(($T:ident, $idx:tt)),+) => {
        impl<$($T: Clone + 'static),+> AnnotatedList for ($(AnnotatedTask<$T>,)+) {
            type Output = ($($T,)+);

            fn join(self, scope: Scope) -> LocalBoxFuture<'static, TaskResult<Self::Output>> {
                async move { Ok(($(scope.await_task(&self.$idx).await?,)+)) }.boxed_local()
            }
        }
    };
}

impl_annotated_list!((A, 0));
impl_annotated_list!((A, 0), (B, 1));
impl_annotated_list!((A, 0), (B, 1), (C, 2));
impl_annotated_list!((A, 0), (B, 1), (C, 2), (D, 3));
impl_annotated_list!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4));
impl_annotated_list!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5));
impl_annotated_list!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6));
impl_annotated_list!(
    (A, 0),
    (B, 1),
    (C, 2),
    (D, 3),
    (E, 4),
    (F, 5),
    (G, 6),
    (H, 7)
);

/// Join a tuple of annotated tasks, recording an explicit fork/join.
///
/// The aggregate is itself a small annotated task: it inherits the
/// caller's function cluster, declares a `"when_all"` region located at
/// `ctx`'s capture site, then awaits each child in declaration order
/// through [`Scope::await_task`], so the graph shows one `depend` edge
/// from every child's terminal node into the join region's end node.
pub fn when_all<L: AnnotatedList + 'static>(ctx: Context, tasks: L) -> AnnotatedTask<L::Output>
where
    L::Output: 'static,
{
    let loc = ctx.location;
    AnnotatedTask::spawn(ctx, move |scope| async move {
        scope.inherit_function();
        scope
            .declare_region_at(loc, "when_all".to_string(), String::new())
            .await?;
        tasks.join(scope).await
    })
}
