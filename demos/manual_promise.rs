//! Bridging non-task code: two tasks wait on an externally fulfilled cell.

use std::rc::Rc;

use tangle::{when_all, ExecutionContext, Task};

fn main() {
    let exec = Rc::new(ExecutionContext::new());

    let (base, promise) = Task::<()>::manual(&exec);

    let left = Task::spawn(&exec, {
        let base = base.clone();
        async move { base.await }
    });
    let right = Task::spawn(&exec, {
        let base = base.clone();
        async move { base.await }
    });

    let work = when_all(&exec, (left, right));
    work.start();

    // Fulfill after composition; the join completes once drained.
    promise.set_value(());

    assert!(!work.is_ready());
    exec.run_until(|| work.is_ready());
    assert!(work.is_ready());
    work.result().unwrap();
}
