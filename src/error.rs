use std::fmt;
use std::io;

/// Errors delivered through [`crate::Sink::on_error`].
#[derive(Debug)]
pub enum Error {
    /// The peer went away. Covers hard resets, timeouts, refused
    /// connections and EOF on a pending receive, normalized to a single
    /// variant so owners have one reconnect path.
    ConnectionReset,
    /// Any other I/O failure, passed through verbatim.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConnectionReset => write!(f, "connection reset"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// True for EAGAIN/EWOULDBLOCK.
pub(crate) fn is_again(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
}

/// Reset class for write paths.
pub(crate) fn is_write_reset(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::ECONNRESET) | Some(libc::ETIMEDOUT) | Some(libc::EPIPE)
    )
}

/// Reset class for read and connect paths.
pub(crate) fn is_read_reset(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::ECONNRESET)
            | Some(libc::ENOTCONN)
            | Some(libc::ECONNREFUSED)
            | Some(libc::ETIMEDOUT)
            | Some(libc::EHOSTUNREACH)
    )
}

/// Transient accept failures: the pending connection is gone or the system
/// is out of resources. The accept stays armed and retries on the next
/// readiness edge.
pub(crate) fn is_accept_transient(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::ECONNABORTED)
            | Some(libc::EPROTO)
            | Some(libc::ENOBUFS)
            | Some(libc::ENOMEM)
            | Some(libc::EMFILE)
            | Some(libc::ENFILE)
    )
}

/// Fold a raw error into the sink-facing taxonomy.
pub(crate) fn classify_read(e: io::Error) -> Error {
    if is_read_reset(&e) {
        Error::ConnectionReset
    } else {
        Error::Io(e)
    }
}

pub(crate) fn classify_write(e: io::Error) -> Error {
    if is_write_reset(&e) {
        Error::ConnectionReset
    } else {
        Error::Io(e)
    }
}
