//! Joining combinators over heterogeneous task tuples.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use crate::context::ExecutionContext;
use crate::error::TaskResult;
use crate::task::Task;

/// Tuple of tasks acceptable by [`when_all`]. Implemented for tuples of
/// [`Task`] up to arity 8.
pub trait TaskList {
    /// Tuple of the children's values, in declaration order.
    type Output;

    #[doc(hidden)]
    fn join(self) -> LocalBoxFuture<'static, TaskResult<Self::Output>>;
}

macro_rules! impl_task_list {
    ($(($T:ident, $idx:tt)),+) => {
        impl<$($T: Clone + 'static),+> TaskList for ($(Task<$T>,)+) {
            type Output = ($($T,)+);

            fn join(self) -> LocalBoxFuture<'static, TaskResult<Self::Output>> {
                async move { Ok(($(self.$idx.await?,)+)) }.boxed_local()
            }
        }
    };
}

impl_task_list!((A, 0));
impl_task_list!((A, 0), (B, 1));
impl_task_list!((A, 0), (B, 1), (C, 2));
impl_task_list!((A, 0), (B, 1), (C, 2), (D, 3));
impl_task_list!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4));
impl_task_list!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5));
impl_task_list!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6));
impl_task_list!(
    (A, 0),
    (B, 1),
    (C, 2),
    (D, 3),
    (E, 4),
    (F, 5),
    (G, 6),
    (H, 7)
);

/// Aggregate a tuple of tasks into one task producing the tuple of values.
///
/// Children are awaited in declaration order; awaiting starts any child
/// that has not been started. The aggregate completes when the last child
/// completes. If a child fails, the aggregate fails with the first error
/// seen in await order; children started independently still run to
/// completion, their results are just never read.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use tangle::{when_all, ExecutionContext, Task};
///
/// let exec = Rc::new(ExecutionContext::new());
/// let a = Task::spawn(&exec, async { Ok(1) });
/// let b = Task::spawn(&exec, async { Ok("two") });
///
/// let both = when_all(&exec, (a, b));
/// both.start();
/// exec.run_until(|| both.is_ready());
/// assert_eq!(both.result().unwrap(), (1, "two"));
/// ```
pub fn when_all<L: TaskList + 'static>(exec: &Rc<ExecutionContext>, tasks: L) -> Task<L::Output>
where
    L::Output: 'static,
{
    Task::spawn(exec, tasks.join())
}
