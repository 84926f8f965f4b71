use std::collections::VecDeque;
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};
use slab::Slab;

bitflags::bitflags! {
    /// Readiness reported for one registered descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Readiness: u8 {
        const IN = 1 << 0;
        const OUT = 1 << 1;
        const ERR = 1 << 2;
    }
}

/// Key identifying a registered descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PollKey(usize);

struct Entry<T> {
    fd: RawFd,
    /// Armed interest. `None` means the descriptor is known to the table
    /// but not currently registered with the OS selector: mio cannot
    /// register an empty interest set, so registration is deferred to the
    /// first arm and dropped on the last disarm. Externally this behaves
    /// like an entry with no interest armed.
    interest: Option<Interest>,
    owner: T,
}

/// Edge-triggered readiness poller over epoll/kqueue.
///
/// Tracks descriptors in a slab keyed by [`PollKey`]; the key doubles as the
/// mio token. `wait` blocks for armed readiness, then the accumulated events
/// are drained one at a time with `next_ready` before the next wait. Only
/// the port's worker thread touches this type.
pub(crate) struct Poller<T> {
    poll: Poll,
    events: Events,
    entries: Slab<Entry<T>>,
    ready: VecDeque<(PollKey, Readiness)>,
}

impl<T> Poller<T> {
    pub(crate) fn new(capacity: usize) -> io::Result<Poller<T>> {
        Ok(Poller {
            poll: Poll::new()?,
            events: Events::with_capacity(capacity),
            entries: Slab::new(),
            ready: VecDeque::new(),
        })
    }

    /// Track a descriptor. No interest is armed yet.
    pub(crate) fn add(&mut self, fd: RawFd, owner: T) -> PollKey {
        PollKey(self.entries.insert(Entry {
            fd,
            interest: None,
            owner,
        }))
    }

    /// Detach a descriptor. Its readiness is never reported after this
    /// returns. The owner is handed back to the caller.
    pub(crate) fn remove(&mut self, key: PollKey) -> Option<T> {
        let entry = self.entries.try_remove(key.0)?;
        if entry.interest.is_some() {
            let _ = self.poll.registry().deregister(&mut SourceFd(&entry.fd));
        }
        Some(entry.owner)
    }

    pub(crate) fn set_in(&mut self, key: PollKey) -> io::Result<()> {
        self.arm(key, Interest::READABLE)
    }

    pub(crate) fn reset_in(&mut self, key: PollKey) -> io::Result<()> {
        self.disarm(key, Interest::READABLE)
    }

    pub(crate) fn set_out(&mut self, key: PollKey) -> io::Result<()> {
        self.arm(key, Interest::WRITABLE)
    }

    pub(crate) fn reset_out(&mut self, key: PollKey) -> io::Result<()> {
        self.disarm(key, Interest::WRITABLE)
    }

    fn arm(&mut self, key: PollKey, what: Interest) -> io::Result<()> {
        let (fd, current) = self.entry_state(key)?;
        let (interest, registered) = match current {
            Some(i) if covers(i, what) => return Ok(()),
            Some(i) => (i.add(what), true),
            None => (what, false),
        };
        let mut src = SourceFd(&fd);
        if registered {
            self.poll.registry().reregister(&mut src, Token(key.0), interest)?;
        } else {
            self.poll.registry().register(&mut src, Token(key.0), interest)?;
        }
        self.set_interest(key, Some(interest));
        Ok(())
    }

    fn disarm(&mut self, key: PollKey, what: Interest) -> io::Result<()> {
        let (fd, current) = self.entry_state(key)?;
        let Some(current) = current else {
            return Ok(());
        };
        if !covers(current, what) {
            return Ok(());
        }
        let mut src = SourceFd(&fd);
        match current.remove(what) {
            Some(rest) => {
                self.poll.registry().reregister(&mut src, Token(key.0), rest)?;
                self.set_interest(key, Some(rest));
            }
            None => {
                self.poll.registry().deregister(&mut src)?;
                self.set_interest(key, None);
            }
        }
        Ok(())
    }

    /// Block until armed readiness arrives, the timeout elapses, or the
    /// wake channel fires. Signal interruption is retried transparently.
    /// Collected events are drained with [`Poller::next_ready`].
    pub(crate) fn wait(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        loop {
            match self.poll.poll(&mut self.events, timeout) {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        for event in self.events.iter() {
            let mut readiness = Readiness::empty();
            // Peer-close edges fold into IN/OUT so a pending operation
            // observes EOF or EPIPE from the actual syscall.
            if event.is_readable() || event.is_read_closed() {
                readiness |= Readiness::IN;
            }
            if event.is_writable() || event.is_write_closed() {
                readiness |= Readiness::OUT;
            }
            if event.is_error() {
                readiness |= Readiness::ERR;
            }
            if !readiness.is_empty() {
                self.ready.push_back((PollKey(event.token().0), readiness));
            }
        }
        Ok(())
    }

    /// Yield one collected readiness tuple, or `None` once drained.
    pub(crate) fn next_ready(&mut self) -> Option<(PollKey, Readiness)> {
        self.ready.pop_front()
    }

    pub(crate) fn owner(&self, key: PollKey) -> Option<&T> {
        self.entries.get(key.0).map(|e| &e.owner)
    }

    fn entry_state(&self, key: PollKey) -> io::Result<(RawFd, Option<Interest>)> {
        self.entries
            .get(key.0)
            .map(|e| (e.fd, e.interest))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "unknown poll key"))
    }

    fn set_interest(&mut self, key: PollKey, interest: Option<Interest>) {
        if let Some(entry) = self.entries.get_mut(key.0) {
            entry.interest = interest;
        }
    }
}

/// Whether `i` already includes `what` (`what` is READABLE or WRITABLE).
fn covers(i: Interest, what: Interest) -> bool {
    (!what.is_readable() || i.is_readable()) && (!what.is_writable() || i.is_writable())
}
