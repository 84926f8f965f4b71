use std::os::fd::RawFd;

use crate::error::Error;

/// Completion callbacks for a handle (socket, timer or event).
///
/// The owner of a handle supplies a sink at creation and may swap it with
/// `set_sink` when its own state machine changes shape. Callbacks for one
/// handle never overlap: deferred completions are delivered from the port's
/// worker thread, immediate completions from the thread that issued the
/// operation, and a handle is intended to be driven from one owner context
/// at a time.
///
/// Every method has a default body that panics. A handle only invokes the
/// callbacks its operations can reach, so implement exactly the set you use;
/// reaching an unimplemented one means the owner issued an operation it
/// never intended to.
pub trait Sink: Send + Sync {
    /// An outbound connect completed.
    fn on_connected(&self) {
        missing("connected")
    }

    /// An accept completed. The sink owns the descriptor and is expected to
    /// wrap it via [`crate::Usock::child`].
    fn on_accepted(&self, fd: RawFd) {
        let _ = fd;
        missing("accepted")
    }

    /// A send drained fully.
    fn on_sent(&self) {
        missing("sent")
    }

    /// A receive filled the requested buffer, which is handed back here.
    fn on_received(&self, buf: Vec<u8>) {
        let _ = buf;
        missing("received")
    }

    /// A pending operation failed.
    fn on_error(&self, err: Error) {
        let _ = err;
        missing("error")
    }

    /// A timer expired.
    fn on_timeout(&self) {
        missing("timeout")
    }

    /// A cross-thread event was signaled.
    fn on_event(&self) {
        missing("event")
    }

    /// The handle finished closing; its descriptor is released.
    fn on_closed(&self) {
        missing("closed")
    }
}

fn missing(which: &str) -> ! {
    panic!("sink does not handle `{which}` completions");
}
