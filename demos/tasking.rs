//! Plain task composition: two tasks share a base, a when_all joins them.

use std::rc::Rc;

use tangle::{when_all, ExecutionContext, Task};

fn main() {
    let exec = Rc::new(ExecutionContext::new());

    let base = Task::spawn(&exec, async {
        println!("base");
        Ok(())
    });

    let left = Task::spawn(&exec, {
        let base = base.clone();
        async move {
            println!("left: before");
            base.await?;
            println!("left: after");
            Ok(())
        }
    });

    let right = Task::spawn(&exec, {
        let base = base.clone();
        async move {
            println!("right: before");
            base.await?;
            println!("right: after");
            Ok(())
        }
    });

    let work = when_all(&exec, (left, right));

    assert!(!work.is_ready());
    work.start();
    exec.run_until(|| work.is_ready());
    assert!(work.is_ready());
    work.result().unwrap();
}
