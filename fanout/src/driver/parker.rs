//! Self-pipe parker for the timer driver thread.
//!
//! The driver blocks in `poll(2)` on the read end of a non-blocking pipe,
//! with a timeout equal to the distance to the next deadline. Any thread
//! holding an [`Unparker`] can cut the wait short by writing one byte.

use libc::{F_GETFL, F_SETFL, O_NONBLOCK, POLLIN, c_int, fcntl, pollfd};
use std::io;
use std::os::fd::RawFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Owning side: parks the driver thread.
pub(crate) struct Parker {
    read_fd: RawFd,
    unparker: Arc<Unparker>,
}

/// Shared side: wakes a parked driver.
///
/// Writes are coalesced: while a wake-up is pending and not yet consumed by
/// the driver, further calls to [`unpark`](Self::unpark) are no-ops.
pub(crate) struct Unparker {
    write_fd: RawFd,
    notified: AtomicBool,
}

impl Parker {
    /// Creates the pipe and puts both ends in non-blocking mode.
    pub(crate) fn new() -> io::Result<Self> {
        let mut fds: [c_int; 2] = [0; 2];

        if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
            return Err(io::Error::last_os_error());
        }

        let [read_fd, write_fd] = fds;

        if let Err(err) = set_nonblocking(read_fd).and_then(|()| set_nonblocking(write_fd)) {
            unsafe {
                libc::close(read_fd);
                libc::close(write_fd);
            }
            return Err(err);
        }

        Ok(Self {
            read_fd,
            unparker: Arc::new(Unparker {
                write_fd,
                notified: AtomicBool::new(false),
            }),
        })
    }

    pub(crate) fn unparker(&self) -> Arc<Unparker> {
        self.unparker.clone()
    }

    /// Blocks until unparked or until `timeout` elapses (`None` = forever).
    ///
    /// Timeouts are rounded up to the next millisecond so that a deadline
    /// never fires early and the driver does not spin on sub-millisecond
    /// remainders.
    pub(crate) fn park(&self, timeout: Option<Duration>) -> io::Result<()> {
        let timeout_ms: c_int = match timeout {
            None => -1,
            Some(t) => {
                let ms = t.as_nanos().div_ceil(1_000_000);
                ms.min(c_int::MAX as u128) as c_int
            }
        };

        let mut fd = pollfd {
            fd: self.read_fd,
            events: POLLIN,
            revents: 0,
        };

        let rc = unsafe { libc::poll(&mut fd, 1, timeout_ms) };

        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        if rc > 0 {
            self.drain();
        }

        Ok(())
    }

    fn drain(&self) {
        // Clear the flag first so a wake racing with the drain writes again.
        self.unparker.notified.store(false, Ordering::Release);

        let mut buf = [0u8; 64];
        loop {
            let n = unsafe { libc::read(self.read_fd, buf.as_mut_ptr().cast(), buf.len()) };
            if n <= 0 {
                break;
            }
        }
    }
}

impl Drop for Parker {
    fn drop(&mut self) {
        unsafe { libc::close(self.read_fd) };
    }
}

impl Unparker {
    pub(crate) fn unpark(&self) {
        if self.notified.swap(true, Ordering::AcqRel) {
            return;
        }

        let byte = 1u8;
        unsafe {
            libc::write(self.write_fd, (&byte as *const u8).cast(), 1);
        }
    }
}

impl Drop for Unparker {
    fn drop(&mut self) {
        unsafe { libc::close(self.write_fd) };
    }
}

fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { fcntl(fd, F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    if unsafe { fcntl(fd, F_SETFL, flags | O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}
