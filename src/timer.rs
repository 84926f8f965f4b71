use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::port::{Port, PortShared};
use crate::sink::Sink;
use crate::timerset::TimerKey;

/// One-shot timer bound to a port. Expiry is delivered through
/// [`Sink::on_timeout`] on the port's worker thread, no earlier than the
/// requested delay. Dropping the timer cancels it.
pub struct Timer {
    shared: Arc<TimerShared>,
}

pub(crate) struct TimerShared {
    port: Arc<PortShared>,
    sink: Arc<dyn Sink>,
    key: Mutex<Option<TimerKey>>,
}

impl Timer {
    pub fn new(port: &Port, sink: Arc<dyn Sink>) -> Timer {
        Timer {
            shared: Arc::new(TimerShared {
                port: port.shared().clone(),
                sink,
                key: Mutex::new(None),
            }),
        }
    }

    /// Schedule the timer `ms` milliseconds from now. An already active
    /// timer is rescheduled. If the new deadline becomes the port's
    /// earliest and the caller is not the worker, the worker is woken to
    /// shorten its poll timeout.
    pub fn start(&self, ms: u64) {
        let t = &self.shared;
        let deadline = Instant::now() + Duration::from_millis(ms);
        let first = {
            let mut timers = t.port.timers.lock().unwrap();
            let mut key = t.key.lock().unwrap();
            if let Some(old) = key.take() {
                timers.remove(old);
            }
            let (new_key, first) = timers.add(deadline, t.clone());
            *key = Some(new_key);
            first
        };
        if first && !t.port.is_worker() {
            t.port.waker.signal();
        }
    }

    /// Cancel the timer. A no-op if it is not scheduled.
    pub fn stop(&self) {
        let t = &self.shared;
        let first = {
            let mut timers = t.port.timers.lock().unwrap();
            let mut key = t.key.lock().unwrap();
            let Some(old) = key.take() else {
                return;
            };
            timers.remove(old)
        };
        if first && !t.port.is_worker() {
            t.port.waker.signal();
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker-side expiry dispatch. `key` is the entry the worker popped from
/// the timer set; the handle's slot is cleared only if it still names that
/// entry. If it names something else, a `start` raced the expiry and
/// rescheduled the handle — the stale expiry is dropped so the fresh
/// schedule stays reachable (and cancelable) through the slot.
pub(crate) fn fire(key: TimerKey, t: &Arc<TimerShared>) {
    {
        let mut slot = t.key.lock().unwrap();
        if *slot != Some(key) {
            return;
        }
        slot.take();
    }
    crate::metrics::TIMERS_FIRED.increment();
    t.sink.on_timeout();
}
