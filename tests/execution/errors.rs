// Error propagation through await chains
use crate::common;

use tangle::{Task, TaskError};

#[test]
fn panic_in_a_body_surfaces_as_an_error() {
    let exec = common::exec();

    let task: Task<i32> = Task::spawn(&exec, async {
        panic!("worker exploded");
    });

    task.start();
    exec.run_until(|| task.is_ready());

    match task.result().unwrap_err() {
        TaskError::Panicked { message } => assert!(message.contains("worker exploded")),
        other => panic!("expected panic error, got {:?}", other),
    }
}

#[test]
fn errors_reraise_through_an_await_chain() {
    let exec = common::exec();

    let failing: Task<i32> = Task::spawn(&exec, async {
        panic!("root cause");
    });
    let middle = Task::spawn(&exec, {
        let failing = failing.clone();
        async move { Ok(failing.await? + 1) }
    });
    let outer = Task::spawn(&exec, {
        let middle = middle.clone();
        async move { Ok(middle.await? + 1) }
    });

    outer.start();
    exec.run_until(|| outer.is_ready());

    match outer.result().unwrap_err() {
        TaskError::Panicked { message } => assert!(message.contains("root cause")),
        other => panic!("expected panic error, got {:?}", other),
    }
}

#[test]
fn explicit_errors_from_a_promise_propagate() {
    let exec = common::exec();
    let (base, promise) = Task::<i32>::manual(&exec);

    let waiter = Task::spawn(&exec, {
        let base = base.clone();
        async move { Ok(base.await? + 1) }
    });

    waiter.start();
    exec.run_all();

    promise.set_error(TaskError::Panicked {
        message: "external failure".to_string(),
    });
    exec.run_all();

    assert!(waiter.result().is_err());
}

#[test]
fn a_waiter_can_recover_from_a_child_error() {
    let exec = common::exec();

    let failing: Task<i32> = Task::spawn(&exec, async {
        panic!("recoverable");
    });
    let waiter = Task::spawn(&exec, {
        let failing = failing.clone();
        async move { Ok(failing.await.unwrap_or(0) + 1) }
    });

    waiter.start();
    exec.run_until(|| waiter.is_ready());

    assert_eq!(waiter.result().unwrap(), 1);
}
