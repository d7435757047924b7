// when_all integration tests
use crate::common;

use tangle::{when_all, Task};

#[test]
fn joins_two_tasks_that_share_a_base() {
    let exec = common::exec();
    let (base, promise) = Task::<i32>::manual(&exec);

    let left = Task::spawn(&exec, {
        let base = base.clone();
        async move { Ok(base.await? + 1) }
    });
    let right = Task::spawn(&exec, {
        let base = base.clone();
        async move { Ok(base.await? + 2) }
    });

    let all = when_all(&exec, (left, right));

    // Fulfill between composition and the drain; the aggregate becomes
    // ready only once the queue is pumped.
    promise.set_value(10);
    assert!(!all.is_ready());

    all.start();
    exec.run_until(|| all.is_ready());
    assert_eq!(all.result().unwrap(), (11, 12));
}

#[test]
fn nested_when_all() {
    let exec = common::exec();

    let a = Task::spawn(&exec, async { Ok(1) });
    let b = Task::spawn(&exec, async { Ok(2) });
    let inner = when_all(&exec, (a, b));

    let c = Task::spawn(&exec, async { Ok(3) });
    let outer = when_all(&exec, (inner, c));

    outer.start();
    exec.run_until(|| outer.is_ready());

    assert_eq!(outer.result().unwrap(), ((1, 2), 3));
}

#[test]
fn wide_join() {
    let exec = common::exec();

    let t0 = Task::spawn(&exec, async { Ok(0) });
    let t1 = Task::spawn(&exec, async { Ok(1) });
    let t2 = Task::spawn(&exec, async { Ok(2) });
    let t3 = Task::spawn(&exec, async { Ok(3) });
    let t4 = Task::spawn(&exec, async { Ok(4) });
    let t5 = Task::spawn(&exec, async { Ok(5) });
    let t6 = Task::spawn(&exec, async { Ok(6) });
    let t7 = Task::spawn(&exec, async { Ok(7) });

    let all = when_all(&exec, (t0, t1, t2, t3, t4, t5, t6, t7));
    all.start();
    exec.run_until(|| all.is_ready());

    assert_eq!(all.result().unwrap(), (0, 1, 2, 3, 4, 5, 6, 7));
}

#[test]
fn mixed_value_and_unit_children() {
    let exec = common::exec();

    let value = Task::spawn(&exec, async { Ok(9) });
    let unit: Task<()> = Task::spawn(&exec, async { Ok(()) });

    let all = when_all(&exec, (value, unit));
    all.start();
    exec.run_until(|| all.is_ready());

    assert_eq!(all.result().unwrap(), (9, ()));
}
