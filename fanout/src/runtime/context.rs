use crate::driver::DriverHandle;
use crate::runtime::work_stealing::injector::InjectorHandle;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    /// Timer driver of the runtime this thread belongs to.
    pub(crate) static CURRENT_DRIVER: RefCell<Option<DriverHandle>> =
        const { RefCell::new(None) };

    /// Global injector of the runtime this thread belongs to.
    pub(crate) static CURRENT_INJECTOR: RefCell<Option<InjectorHandle>> =
        const { RefCell::new(None) };

    /// Index of the current worker, if this thread is a worker.
    pub(crate) static CURRENT_WORKER_ID: RefCell<Option<usize>> =
        const { RefCell::new(None) };

    /// Local queues of every worker, indexed by worker id.
    pub(crate) static CURRENT_LOCALS: RefCell<Option<Arc<Vec<Arc<LocalQueue>>>>> =
        const { RefCell::new(None) };
}

/// Installs the driver and injector handles for the duration of `f`,
/// restoring whatever was installed before.
pub(crate) fn enter_context<R>(
    driver: DriverHandle,
    injector: InjectorHandle,
    f: impl FnOnce() -> R,
) -> R {
    let prev_driver = CURRENT_DRIVER.with(|d| d.replace(Some(driver)));
    let prev_injector = CURRENT_INJECTOR.with(|i| i.replace(Some(injector)));

    let out = f();

    CURRENT_INJECTOR.with(|i| i.replace(prev_injector));
    CURRENT_DRIVER.with(|d| d.replace(prev_driver));

    out
}

/// Returns the current timer driver.
///
/// # Panics
///
/// Panics when called from a thread that is not running a Fanout task.
pub(crate) fn driver() -> DriverHandle {
    CURRENT_DRIVER.with(|cell| {
        cell.borrow()
            .as_ref()
            .expect("timer used outside of a fanout runtime")
            .clone()
    })
}
