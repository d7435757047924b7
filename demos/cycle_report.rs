//! The failure showcase: an annotated composition whose dependencies close
//! a loop, reported as a rendered cycle instead of a silent deadlock.

use std::cell::RefCell;
use std::rc::Rc;

use tangle::annotated::{when_all, AnnotatedTask, Context};
use tangle::{DependencyGraph, ExecutionContext, TaskError};

type Slot = Rc<RefCell<Option<AnnotatedTask<()>>>>;

fn base_task(ctx: Context, right_slot: &Slot) -> AnnotatedTask<()> {
    AnnotatedTask::spawn(ctx, {
        let right_slot = Rc::clone(right_slot);
        |scope| async move {
            scope.declare_function("base_task", "");
            scope.declare_region("create base work", "").await?;
            // Parking here lets the right-hand task be bound before the
            // base resumes and waits on it.
            scope.declare_region("wait for right", "").await?;
            let right = right_slot.borrow().clone().expect("right task bound");
            scope.await_task(&right).await?;
            Ok(())
        }
    })
}

fn waiting_task(ctx: Context, name: &'static str, base: &AnnotatedTask<()>) -> AnnotatedTask<()> {
    AnnotatedTask::spawn(ctx, {
        let base = base.clone();
        move |scope| async move {
            scope.declare_function(name, "");
            scope.declare_region("wait for base work", "").await?;
            scope.await_task(&base).await?;
            Ok(())
        }
    })
}

fn main() {
    let exec = Rc::new(ExecutionContext::new());
    let graph = Rc::new(DependencyGraph::new());
    let main_cluster = graph.add_cluster("main()", "");
    let main_node = graph.add_node_in(main_cluster, "main()", "");
    let ctx = Context::new(Rc::clone(&exec), Rc::clone(&graph), main_cluster, main_node);

    let right_slot: Slot = Rc::new(RefCell::new(None));
    let base = base_task(ctx.clone(), &right_slot);
    let left = waiting_task(ctx.clone(), "task_left", &base);
    let right = waiting_task(ctx.clone(), "task_right", &base);
    *right_slot.borrow_mut() = Some(right.clone());

    let work = when_all(ctx, (left, right));

    assert!(!work.is_ready());
    work.start();
    exec.run_until(|| work.is_ready());
    assert!(work.is_ready());

    match work.result() {
        Ok(_) => println!("{}", graph.to_graphviz()),
        Err(TaskError::Cycle(cycle)) => {
            println!("{}", cycle.full_graph_graphviz(&graph));
        }
        Err(other) => eprintln!("unexpected failure: {}", other),
    }
}
