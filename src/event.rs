use std::sync::Arc;

use crate::port::{Port, PortShared};
use crate::sink::Sink;

/// Cross-thread completion source. Each [`Event::signal`] queues one
/// [`Sink::on_event`] delivery on the port's worker; signals from one
/// thread are delivered in order. The worker drains events at the end of
/// its dispatch cycle, so a signal raised from a callback is delivered in
/// the same cycle.
pub struct Event {
    shared: Arc<EventShared>,
}

pub(crate) struct EventShared {
    port: Arc<PortShared>,
    sink: Arc<dyn Sink>,
}

impl Event {
    pub fn new(port: &Port, sink: Arc<dyn Sink>) -> Event {
        Event {
            shared: Arc::new(EventShared {
                port: port.shared().clone(),
                sink,
            }),
        }
    }

    /// Queue one `on_event` delivery. May be called from any thread,
    /// including the worker itself.
    pub fn signal(&self) {
        let e = &self.shared;
        e.port.events.lock().unwrap().push_back(e.clone());
        if !e.port.is_worker() {
            e.port.waker.signal();
        }
    }
}

/// Worker-side dispatch.
pub(crate) fn fire(e: &Arc<EventShared>) {
    e.sink.on_event();
}
