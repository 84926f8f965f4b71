//! Worker-path counters, exposed through the metriken registry.

use metriken::{Counter, metric};

#[metric(
    name = "portio/worker/wakeups",
    description = "Times the worker returned from the poller wait"
)]
pub(crate) static WAKEUPS: Counter = Counter::new();

#[metric(
    name = "portio/worker/ops_forwarded",
    description = "Operation requests forwarded from other threads"
)]
pub(crate) static OPS_FORWARDED: Counter = Counter::new();

#[metric(name = "portio/timers/fired", description = "Timer expirations dispatched")]
pub(crate) static TIMERS_FIRED: Counter = Counter::new();

#[metric(
    name = "portio/events/dispatched",
    description = "Cross-thread events dispatched"
)]
pub(crate) static EVENTS_DISPATCHED: Counter = Counter::new();

#[metric(name = "portio/bytes/sent", description = "Bytes written to sockets")]
pub(crate) static BYTES_SENT: Counter = Counter::new();

#[metric(name = "portio/bytes/received", description = "Bytes read from sockets")]
pub(crate) static BYTES_RECEIVED: Counter = Counter::new();

#[metric(
    name = "portio/connections/accepted",
    description = "Connections handed to sinks via accepted"
)]
pub(crate) static CONNECTIONS_ACCEPTED: Counter = Counter::new();

#[metric(
    name = "portio/connections/reset",
    description = "Operations that ended in a connection reset"
)]
pub(crate) static CONNECTIONS_RESET: Counter = Counter::new();
