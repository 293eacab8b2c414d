//! Cross-platform readiness wait on a single file descriptor (the input fd,
//! in the editor's case), with signal-driven wakeup via a self-pipe.
//!
//! One reader thread owns a `Poller`. `wait` blocks until the watched fd is
//! readable, the timeout elapses, or a signal arrives — interruption by
//! EINTR and wakeups written to the self-pipe both surface as `Signal`, so
//! the caller can re-check its resize/terminate flags and loop.

use std::os::unix::io::RawFd;

use crate::error::CoreResult;

/// Outcome of one [`Poller::wait`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The watched descriptor is readable.
    Ready,
    /// The timeout elapsed with nothing readable.
    Timeout,
    /// Interrupted — by EINTR or by a byte written to the self-pipe. The
    /// caller should re-check its atomic flags and call `wait` again.
    Signal,
}

/// A self-pipe: write a byte to `writer` from a signal handler (or any
/// thread) to force a blocked [`Poller::wait`] to return `Signal`.
struct SelfPipe {
    reader: RawFd,
    writer: RawFd,
}

impl SelfPipe {
    fn new() -> std::io::Result<Self> {
        let mut fds = [0; 2];
        #[allow(unsafe_code)]
        let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC | libc::O_NONBLOCK) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(SelfPipe {
            reader: fds[0],
            writer: fds[1],
        })
    }

    /// Drains any bytes written since the last wait, so a stale wakeup
    /// doesn't cause every subsequent call to return immediately.
    fn drain(&self) {
        let mut buf = [0u8; 64];
        loop {
            #[allow(unsafe_code)]
            let n = unsafe {
                libc::read(
                    self.reader,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                )
            };
            if n <= 0 {
                break;
            }
        }
    }
}

impl Drop for SelfPipe {
    fn drop(&mut self) {
        #[allow(unsafe_code)]
        unsafe {
            libc::close(self.reader);
            libc::close(self.writer);
        }
    }
}

/// Waits for readiness on a single fd using `poll(2)` on every platform.
/// No `epoll`/`kqueue` backend is wired up: with exactly two fds ever
/// watched (the input fd and the self-pipe), `poll`'s O(n) fd scan costs
/// nothing, so the portable syscall was kept instead of adding two more
/// `#[cfg(target_os = ...)]` implementations for the same observable
/// behavior.
pub struct Poller {
    watched: RawFd,
    self_pipe: SelfPipe,
}

impl Poller {
    pub fn new(watched: RawFd) -> CoreResult<Self> {
        Ok(Poller {
            watched,
            self_pipe: SelfPipe::new()?,
        })
    }

    /// Returns a clone of the self-pipe's write end. Register this with
    /// `signal_hook::pipe::register` (or write to it directly) so a signal
    /// handler can interrupt a blocked `wait`.
    pub fn wakeup_fd(&self) -> RawFd {
        self.self_pipe.writer
    }

    /// Blocks until `watched` is readable, `timeout_ms` elapses (`None`
    /// waits indefinitely), or a signal interrupts the wait.
    pub fn wait(&self, timeout_ms: Option<u32>) -> CoreResult<PollOutcome> {
        let mut fds = [
            libc::pollfd {
                fd: self.watched,
                events: libc::POLLIN,
                revents: 0,
            },
            libc::pollfd {
                fd: self.self_pipe.reader,
                events: libc::POLLIN,
                revents: 0,
            },
        ];
        let timeout = timeout_ms.map(|ms| ms as i32).unwrap_or(-1);

        #[allow(unsafe_code)]
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout) };

        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(PollOutcome::Signal);
            }
            return Err(err.into());
        }
        if rc == 0 {
            return Ok(PollOutcome::Timeout);
        }

        if fds[1].revents & libc::POLLIN != 0 {
            self.self_pipe.drain();
            return Ok(PollOutcome::Signal);
        }
        if fds[0].revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0 {
            return Ok(PollOutcome::Ready);
        }
        Ok(PollOutcome::Timeout)
    }
}
