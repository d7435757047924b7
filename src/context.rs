//! Single-threaded execution context.
//!
//! A plain FIFO of posted callbacks. Tasks never invoke their waiters
//! directly; completion posts a resumption here, and the host decides when
//! to drain. There is no implicit concurrency anywhere in this module.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[cfg(feature = "tracing")]
use tracing::trace;

type Callback = Box<dyn FnOnce()>;

/// FIFO queue of ready callbacks.
///
/// All continuations produced by the task machinery are posted onto one of
/// these; nothing runs until the owner drains the queue with [`run_one`],
/// [`run_all`] or [`run_until`].
///
/// [`run_one`]: ExecutionContext::run_one
/// [`run_all`]: ExecutionContext::run_all
/// [`run_until`]: ExecutionContext::run_until
///
/// # Examples
///
/// ```
/// use tangle::ExecutionContext;
///
/// let ctx = ExecutionContext::new();
/// ctx.post(|| println!("hello"));
/// ctx.run_all();
/// ```
#[derive(Default)]
pub struct ExecutionContext {
    callbacks: RefCell<VecDeque<Callback>>,
}

impl ExecutionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a callback at the back of the queue.
    pub fn post(&self, f: impl FnOnce() + 'static) {
        self.callbacks.borrow_mut().push_back(Box::new(f));

        #[cfg(feature = "tracing")]
        trace!(queued = self.callbacks.borrow().len(), "posted callback");
    }

    /// Pop and invoke the front callback.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty.
    pub fn run_one(&self) {
        // The borrow must be released before the callback runs: callbacks
        // routinely post further callbacks.
        let front = self
            .callbacks
            .borrow_mut()
            .pop_front()
            .expect("run_one called on an empty execution context");
        front();
    }

    /// Drain the queue, including callbacks posted while draining.
    pub fn run_all(&self) {
        while !self.is_empty() {
            self.run_one();
        }
    }

    /// Drain until the queue is empty or `pred` returns true.
    ///
    /// The predicate is evaluated between callbacks, never during one.
    pub fn run_until(&self, mut pred: impl FnMut() -> bool) {
        while !self.is_empty() && !pred() {
            self.run_one();
        }
    }

    /// Number of callbacks currently queued.
    pub fn pending(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }
}

thread_local! {
    static DEFAULT_CONTEXT: Rc<ExecutionContext> = Rc::new(ExecutionContext::new());
}

/// The per-thread default execution context.
///
/// Lazily created on first access and never torn down. A convenience only;
/// every constructor in the crate takes the context explicitly, so programs
/// that want full control can ignore this entirely.
pub fn default_context() -> Rc<ExecutionContext> {
    DEFAULT_CONTEXT.with(Rc::clone)
}
