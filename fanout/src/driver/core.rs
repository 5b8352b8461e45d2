use super::command::Command;
use super::parker::{Parker, Unparker};
use super::timer::TimerEntry;

use std::collections::BinaryHeap;
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, SendError, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// The timer driver.
///
/// Each loop iteration:
/// 1. drains pending commands,
/// 2. parks until the earliest deadline or the next command,
/// 3. wakes every task whose deadline has passed.
pub(crate) struct Driver {
    receiver: Receiver<Command>,
    parker: Parker,
    timers: BinaryHeap<TimerEntry>,
}

/// Cloneable handle used by runtime threads to talk to the driver.
#[derive(Clone)]
pub(crate) struct DriverHandle {
    sender: Sender<Command>,
    unparker: Arc<Unparker>,
}

impl DriverHandle {
    /// Queues a command and makes sure the driver will look at it.
    pub(crate) fn send(&self, cmd: Command) -> Result<(), SendError<Command>> {
        let result = self.sender.send(cmd);
        self.unparker.unpark();
        result
    }
}

impl Driver {
    /// Spawns the driver thread.
    ///
    /// Returns the handle used to register timers and the join handle of
    /// the driver thread, which exits after [`Command::Shutdown`].
    pub(crate) fn start() -> io::Result<(DriverHandle, JoinHandle<()>)> {
        let (sender, receiver) = channel();
        let parker = Parker::new()?;
        let unparker = parker.unparker();

        let thread = thread::Builder::new()
            .name("fanout-timer".into())
            .spawn(move || {
                let mut driver = Driver {
                    receiver,
                    parker,
                    timers: BinaryHeap::new(),
                };

                if let Err(err) = driver.run() {
                    tracing::error!(%err, "timer driver stopped");
                }
            })?;

        Ok((DriverHandle { sender, unparker }, thread))
    }

    fn run(&mut self) -> io::Result<()> {
        loop {
            loop {
                match self.receiver.try_recv() {
                    Ok(Command::SetTimer {
                        deadline,
                        waker,
                        cancelled,
                    }) => self.timers.push(TimerEntry {
                        deadline,
                        waker,
                        cancelled,
                    }),
                    Ok(Command::Shutdown) | Err(TryRecvError::Disconnected) => {
                        tracing::debug!(pending = self.timers.len(), "timer driver shutting down");
                        return Ok(());
                    }
                    Err(TryRecvError::Empty) => break,
                }
            }

            let timeout = self
                .timers
                .peek()
                .map(|t| t.deadline.saturating_duration_since(Instant::now()));

            self.parker.park(timeout)?;
            self.fire_expired(Instant::now());
        }
    }

    fn fire_expired(&mut self, now: Instant) {
        while self.timers.peek().is_some_and(|t| t.deadline <= now) {
            let Some(timer) = self.timers.pop() else {
                break;
            };

            if !timer.is_cancelled() {
                timer.waker.wake();
            }
        }
    }
}
