//! The core task primitive.
//!
//! A [`Task`] is a reference-counted handle to a lazily started body
//! (a boxed local future) plus a shared result cell. Awaiting a task that
//! is not ready registers a continuation on its cell and schedules the
//! task if nobody started it yet; completion posts waiters onto the
//! execution context instead of resuming them inline, so the call graph
//! stays flat no matter how deep the await chains get.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context as PollContext, Poll};

use futures::future::LocalBoxFuture;
use futures::FutureExt;

#[cfg(feature = "tracing")]
use tracing::{error, trace};

use crate::cell::SharedCell;
use crate::context::ExecutionContext;
use crate::error::{TaskError, TaskResult};
use crate::waker::local_waker;

pub(crate) struct TaskCore<T> {
    cell: SharedCell<T>,
    body: RefCell<Option<LocalBoxFuture<'static, TaskResult<T>>>>,
    exec: Rc<ExecutionContext>,
    started: Cell<bool>,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Post a re-poll of `core` onto its execution context.
fn schedule<T: 'static>(core: &Rc<TaskCore<T>>) {
    let exec = Rc::clone(&core.exec);
    let core = Rc::clone(core);
    exec.post(move || step(&core));
}

/// Poll the task body once, publishing the outcome into the cell.
///
/// A panic escaping the body is caught here and published as
/// [`TaskError::Panicked`], the single place where unwinding is
/// intercepted. Stepping a task whose body already finished is a no-op, so
/// spurious wakeups and repeated `start` calls are harmless.
fn step<T: 'static>(core: &Rc<TaskCore<T>>) {
    let Some(mut body) = core.body.borrow_mut().take() else {
        return;
    };

    #[cfg(feature = "tracing")]
    trace!("polling task body");

    let waker = local_waker({
        let core = Rc::clone(core);
        move || schedule(&core)
    });
    let mut cx = PollContext::from_waker(&waker);

    match catch_unwind(AssertUnwindSafe(|| body.as_mut().poll(&mut cx))) {
        Ok(Poll::Pending) => {
            *core.body.borrow_mut() = Some(body);
        }
        Ok(Poll::Ready(Ok(value))) => core.cell.set_value(value),
        Ok(Poll::Ready(Err(e))) => core.cell.set_error(e),
        Err(payload) => {
            let message = panic_message(payload);

            #[cfg(feature = "tracing")]
            error!(panic_message = %message, "task body panicked");

            core.cell.set_error(TaskError::Panicked { message });
        }
    }
}

/// Handle to a unit of asynchronous work.
///
/// Cloning a `Task` is cheap and shares the underlying body and result
/// cell; the body is dropped when the last handle goes away. A freshly
/// spawned task does nothing until [`Task::start`] posts its first poll or
/// an awaiter schedules it.
///
/// `Task<T>` implements `Future` (for `T: Clone`), yielding
/// [`TaskResult<T>`]: every waiter observes the same value or the same
/// error.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use tangle::{ExecutionContext, Task};
///
/// let exec = Rc::new(ExecutionContext::new());
/// let task = Task::spawn(&exec, async { Ok(42) });
///
/// task.start();
/// exec.run_until(|| task.is_ready());
/// assert_eq!(task.result().unwrap(), 42);
/// ```
pub struct Task<T> {
    core: Rc<TaskCore<T>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Task {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T: 'static> Task<T> {
    /// Create a lazily started task from an async body.
    pub fn spawn<F>(exec: &Rc<ExecutionContext>, body: F) -> Self
    where
        F: Future<Output = TaskResult<T>> + 'static,
    {
        Task {
            core: Rc::new(TaskCore {
                cell: SharedCell::new(),
                body: RefCell::new(Some(body.boxed_local())),
                exec: Rc::clone(exec),
                started: Cell::new(false),
            }),
        }
    }

    /// Create a task that is already completed with `value`.
    pub fn ready(exec: &Rc<ExecutionContext>, value: T) -> Self {
        let task = Task {
            core: Rc::new(TaskCore {
                cell: SharedCell::new(),
                body: RefCell::new(None),
                exec: Rc::clone(exec),
                started: Cell::new(true),
            }),
        };
        task.core.cell.set_value(value);
        task
    }

    /// Create an externally fulfilled task.
    ///
    /// The returned [`Promise`] is the only way to complete the task; use
    /// this to bridge non-task code into an await chain.
    pub fn manual(exec: &Rc<ExecutionContext>) -> (Self, Promise<T>) {
        let task = Task {
            core: Rc::new(TaskCore {
                cell: SharedCell::new(),
                body: RefCell::new(None),
                exec: Rc::clone(exec),
                started: Cell::new(true),
            }),
        };
        let promise = Promise {
            core: Rc::clone(&task.core),
        };
        (task, promise)
    }

    /// Post the task's first poll onto its execution context.
    ///
    /// Calling `start` more than once is a no-op.
    pub fn start(&self) {
        if !self.core.started.replace(true) {
            schedule(&self.core);
        }
    }

    /// True once the body has returned or failed.
    pub fn is_ready(&self) -> bool {
        self.core.cell.is_ready()
    }

    /// Poll the body once, inline, on the caller's stack.
    ///
    /// Used by the annotated layer to run a body's annotation prologue
    /// eagerly at construction time.
    pub(crate) fn step_now(&self) {
        self.core.started.set(true);
        step(&self.core);
    }

    /// Unconditionally post a poll, regardless of the started flag.
    pub(crate) fn post_step(&self) {
        self.core.started.set(true);
        schedule(&self.core);
    }
}

impl<T: Clone + 'static> Task<T> {
    /// Clone out the completed result.
    ///
    /// Idempotent: the cell is never consumed.
    ///
    /// # Panics
    ///
    /// Panics if the task has not completed yet.
    pub fn result(&self) -> TaskResult<T> {
        self.core.cell.result()
    }
}

impl<T: Clone + 'static> Future for Task<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut PollContext<'_>) -> Poll<Self::Output> {
        if self.core.cell.is_ready() {
            return Poll::Ready(self.core.cell.result());
        }

        // The waker posts through the execution context, so the completer
        // never re-enters this waiter on its own stack.
        let waker = cx.waker().clone();
        self.core.cell.add_continuation(move || waker.wake());
        self.start();
        Poll::Pending
    }
}

/// Externally held completion side of a [`Task::manual`] pair.
pub struct Promise<T> {
    core: Rc<TaskCore<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T: 'static> Promise<T> {
    /// Fulfill the paired task.
    ///
    /// # Panics
    ///
    /// Panics if the task was already completed.
    pub fn set_value(&self, value: T) {
        self.core.cell.set_value(value);
    }

    /// Fail the paired task.
    ///
    /// # Panics
    ///
    /// Panics if the task was already completed.
    pub fn set_error(&self, error: TaskError) {
        self.core.cell.set_error(error);
    }

    /// True once the paired task has been completed.
    pub fn is_ready(&self) -> bool {
        self.core.cell.is_ready()
    }
}
