use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

/// Cross-thread wake channel backed by an eventfd.
///
/// The descriptor is registered read-armed with the poller for the lifetime
/// of the port. `signal` bumps the counter; consecutive signals before the
/// worker drains coalesce into a single readable edge. `unsignal` drains the
/// whole counter in one read. Both are single syscalls with no locking.
pub(crate) struct Waker {
    fd: OwnedFd,
}

impl Waker {
    pub(crate) fn new() -> io::Result<Waker> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Waker {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        })
    }

    /// Interrupt the current or next poller wait.
    pub(crate) fn signal(&self) {
        let val: u64 = 1;
        // EAGAIN means the counter is saturated, which is still signaled.
        unsafe {
            libc::write(
                self.fd.as_raw_fd(),
                &val as *const u64 as *const libc::c_void,
                8,
            );
        }
    }

    /// Consume all pending signals.
    pub(crate) fn unsignal(&self) {
        let mut val: u64 = 0;
        unsafe {
            libc::read(
                self.fd.as_raw_fd(),
                &mut val as *mut u64 as *mut libc::c_void,
                8,
            );
        }
    }

    pub(crate) fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}
