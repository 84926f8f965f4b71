use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Key of a scheduled entry. Deadline first so iteration order is expiry
/// order; the sequence number breaks deadline ties in insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TimerKey {
    deadline: Instant,
    seq: u64,
}

/// Ordered set of deadlines.
///
/// The worker asks for the time to the earliest expiry before each poll
/// wait and drains expired entries after it. `add` and `remove` report
/// whether they changed the earliest deadline; callers use that to decide
/// whether the worker needs a wake-up to recompute its poll timeout.
pub(crate) struct TimerSet<T> {
    entries: BTreeMap<TimerKey, T>,
    seq: u64,
}

impl<T> TimerSet<T> {
    pub(crate) fn new() -> TimerSet<T> {
        TimerSet {
            entries: BTreeMap::new(),
            seq: 0,
        }
    }

    /// Schedule `value` at `deadline`. Returns the key and whether the new
    /// entry became the earliest.
    pub(crate) fn add(&mut self, deadline: Instant, value: T) -> (TimerKey, bool) {
        let key = TimerKey {
            deadline,
            seq: self.seq,
        };
        self.seq += 1;
        self.entries.insert(key, value);
        let first = self
            .entries
            .first_key_value()
            .map(|(k, _)| *k == key)
            .unwrap_or(false);
        (key, first)
    }

    /// Remove a scheduled entry. Returns whether the earliest deadline
    /// changed (i.e. the removed entry was first). Removing an unknown key
    /// is a no-op returning false; a fired entry races its own `stop` that
    /// way.
    pub(crate) fn remove(&mut self, key: TimerKey) -> bool {
        let was_first = self
            .entries
            .first_key_value()
            .map(|(k, _)| *k == key)
            .unwrap_or(false);
        self.entries.remove(&key).is_some() && was_first
    }

    /// Time until the earliest deadline, zero if already due, `None` when
    /// nothing is scheduled.
    pub(crate) fn timeout(&self, now: Instant) -> Option<Duration> {
        self.entries
            .first_key_value()
            .map(|(k, _)| k.deadline.saturating_duration_since(now))
    }

    /// Pop one expired entry, earliest first. The key is returned with the
    /// value so handle-level state can be reconciled against exactly this
    /// expiry (the handle may have been rescheduled since).
    pub(crate) fn pop_expired(&mut self, now: Instant) -> Option<(TimerKey, T)> {
        let key = *self.entries.first_key_value()?.0;
        if key.deadline > now {
            return None;
        }
        self.entries.remove(&key).map(|value| (key, value))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
