use super::core::spawn;
use super::handle::{JoinError, JoinHandle};
use crate::sync::mpsc::{self, Receiver, Sender};

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

type Completion<T> = (u64, Result<T, JoinError>);

/// A group of tasks whose outputs are collected in completion order.
///
/// Every task spawned through the set reports back on an internal channel
/// when it finishes, so [`join_next`](Self::join_next) costs the same no
/// matter how many tasks are in flight.
///
/// Dropping the set aborts every task that has not been joined yet.
pub struct JoinSet<T> {
    tasks: HashMap<u64, JoinHandle<()>>,
    next_id: u64,
    sender: Sender<Completion<T>>,
    receiver: Receiver<Completion<T>>,
}

impl<T: Send + 'static> JoinSet<T> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded();

        Self {
            tasks: HashMap::new(),
            next_id: 0,
            sender,
            receiver,
        }
    }

    /// Spawns `future` onto the current runtime as a member of this set.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Fanout runtime.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        let handle = spawn(Reporting {
            id,
            future: Box::pin(future),
            sender: Some(self.sender.clone()),
        });

        self.tasks.insert(id, handle);
    }

    /// Number of tasks spawned and not yet joined.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for the next task to finish and returns its output.
    ///
    /// Returns `None` once the set is empty.
    pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
        while !self.tasks.is_empty() {
            let (id, output) = self.receiver.recv().await?;

            // Reports from tasks removed by `abort_all` are stale.
            if self.tasks.remove(&id).is_some() {
                return Some(output);
            }
        }

        None
    }

    /// Waits for every task and returns their outputs in completion order.
    pub async fn join_all(&mut self) -> Vec<Result<T, JoinError>> {
        let mut outputs = Vec::with_capacity(self.tasks.len());

        while let Some(output) = self.join_next().await {
            outputs.push(output);
        }

        outputs
    }

    /// Aborts every task in the set and forgets them.
    pub fn abort_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

impl<T: Send + 'static> Default for JoinSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for JoinSet<T> {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

/// Wraps a set member and sends its outcome to the set exactly once:
/// on completion, on panic, or on drop if the task was aborted first.
struct Reporting<T> {
    id: u64,
    future: Pin<Box<dyn Future<Output = T> + Send>>,
    sender: Option<Sender<Completion<T>>>,
}

impl<T> Reporting<T> {
    fn report(&mut self, output: Result<T, JoinError>) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send((self.id, output));
        }
    }
}

impl<T> Future for Reporting<T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        match panic::catch_unwind(AssertUnwindSafe(|| this.future.as_mut().poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(value)) => {
                this.report(Ok(value));
                Poll::Ready(())
            }
            Err(payload) => {
                this.report(Err(JoinError::Panicked(payload)));
                Poll::Ready(())
            }
        }
    }
}

impl<T> Drop for Reporting<T> {
    fn drop(&mut self) {
        self.report(Err(JoinError::Cancelled));
    }
}
