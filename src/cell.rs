//! Single-assignment result cell shared between a task and its waiters.

use std::cell::RefCell;

use crate::error::{TaskError, TaskResult};

enum CellState<T> {
    Empty,
    Value(T),
    Failed(TaskError),
}

type Continuation = Box<dyn FnOnce()>;

/// Monotonic three-state cell: `Empty -> Value(T)` or `Empty -> Failed(e)`.
///
/// Transitions out of `Empty` are one-shot; a second transition is a
/// programming error and panics. Continuations registered while empty fire
/// exactly once, in registration order, when the transition happens.
pub(crate) struct SharedCell<T> {
    state: RefCell<CellState<T>>,
    continuations: RefCell<Vec<Continuation>>,
}

impl<T> SharedCell<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: RefCell::new(CellState::Empty),
            continuations: RefCell::new(Vec::new()),
        }
    }

    /// Publish a value.
    ///
    /// # Panics
    ///
    /// Panics if the cell is not empty.
    pub(crate) fn set_value(&self, value: T) {
        {
            let mut state = self.state.borrow_mut();
            assert!(
                matches!(*state, CellState::Empty),
                "value set twice on the same result cell"
            );
            *state = CellState::Value(value);
        }
        self.fire_continuations();
    }

    /// Publish an error.
    ///
    /// # Panics
    ///
    /// Panics if the cell is not empty.
    pub(crate) fn set_error(&self, error: TaskError) {
        {
            let mut state = self.state.borrow_mut();
            assert!(
                matches!(*state, CellState::Empty),
                "error set on an already completed result cell"
            );
            *state = CellState::Failed(error);
        }
        self.fire_continuations();
    }

    pub(crate) fn is_ready(&self) -> bool {
        !matches!(*self.state.borrow(), CellState::Empty)
    }

    /// Register a completion callback.
    ///
    /// On a ready cell the callback is invoked immediately, exactly once,
    /// and is not retained.
    pub(crate) fn add_continuation(&self, f: impl FnOnce() + 'static) {
        if self.is_ready() {
            f();
            return;
        }
        self.continuations.borrow_mut().push(Box::new(f));
    }

    fn fire_continuations(&self) {
        // Take the whole list first: a continuation may register further
        // continuations on this cell (they run inline, the cell is ready).
        let pending = std::mem::take(&mut *self.continuations.borrow_mut());
        for continuation in pending {
            continuation();
        }
    }
}

impl<T: Clone> SharedCell<T> {
    /// Clone out the completed result.
    ///
    /// # Panics
    ///
    /// Panics if the cell is still empty.
    pub(crate) fn result(&self) -> TaskResult<T> {
        match &*self.state.borrow() {
            CellState::Empty => panic!("result read from an incomplete cell"),
            CellState::Value(value) => Ok(value.clone()),
            CellState::Failed(error) => Err(error.clone()),
        }
    }
}
