// Common helpers for the integration suite.

use std::rc::Rc;

use tangle::annotated::Context;
use tangle::{DependencyGraph, ExecutionContext};

// Initialize tracing subscriber for tests (idempotent)
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init()
            .ok();
    });
}

#[cfg(not(feature = "tracing"))]
pub fn init_tracing() {
    // No-op when tracing is disabled
}

pub fn exec() -> Rc<ExecutionContext> {
    init_tracing();
    Rc::new(ExecutionContext::new())
}

/// A graph seeded with a `main()` cluster and node, plus a context rooted
/// there: the shape every annotated program starts from.
pub fn annotated_root() -> (Rc<ExecutionContext>, Rc<DependencyGraph>, Context) {
    let exec = exec();
    let graph = Rc::new(DependencyGraph::new());
    let cluster = graph.add_cluster("main()", "");
    let node = graph.add_node_in(cluster, "main()", "");
    let ctx = Context::new(Rc::clone(&exec), Rc::clone(&graph), cluster, node);
    (exec, graph, ctx)
}
