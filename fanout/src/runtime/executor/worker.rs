use crate::runtime::context::{CURRENT_LOCALS, CURRENT_WORKER_ID};
use crate::runtime::task::Runnable;
use crate::runtime::work_stealing::injector::InjectorHandle;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::sync::Arc;

/// One executor thread.
///
/// Work is looked up in this order:
/// 1. the worker's own queue,
/// 2. the global injector,
/// 3. a peer's queue,
///
/// and the worker parks on the injector when all three are empty.
pub(crate) struct Worker {
    id: usize,
    locals: Arc<Vec<Arc<LocalQueue>>>,
    injector: InjectorHandle,
}

impl Worker {
    pub(crate) fn new(id: usize, locals: Arc<Vec<Arc<LocalQueue>>>, injector: InjectorHandle) -> Self {
        Self {
            id,
            locals,
            injector,
        }
    }

    /// Runs tasks until the injector reports shutdown.
    ///
    /// Must be called with the runtime context installed.
    pub(crate) fn run(&self) {
        CURRENT_WORKER_ID.with(|id| *id.borrow_mut() = Some(self.id));
        CURRENT_LOCALS.with(|locals| *locals.borrow_mut() = Some(self.locals.clone()));

        tracing::trace!(worker = self.id, "worker started");

        while !self.injector.is_shutdown() {
            match self.next_task() {
                Some(task) => task.run(),
                None => self.injector.park(),
            }
        }

        CURRENT_LOCALS.with(|locals| locals.borrow_mut().take());
        CURRENT_WORKER_ID.with(|id| id.borrow_mut().take());

        tracing::trace!(worker = self.id, "worker stopped");
    }

    fn next_task(&self) -> Option<Arc<dyn Runnable>> {
        self.locals[self.id]
            .pop()
            .or_else(|| self.injector.steal())
            .or_else(|| self.steal_from_peers())
    }

    /// Visits peers round-robin starting after this worker.
    fn steal_from_peers(&self) -> Option<Arc<dyn Runnable>> {
        let len = self.locals.len();

        (1..len)
            .map(|offset| (self.id + offset) % len)
            .find_map(|victim| self.locals[victim].steal())
    }
}
