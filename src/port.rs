use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::Config;
use crate::event::EventShared;
use crate::metrics;
use crate::poller::{PollKey, Poller, Readiness};
use crate::timer::TimerShared;
use crate::timerset::TimerSet;
use crate::usock::{self, UsockShared};
use crate::waker::Waker;

/// Opcode of a forwarded poller operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpCode {
    Add,
    Remove,
    SetIn,
    SetOut,
}

impl OpCode {
    /// Bit in the per-socket queued mask, used to catch double-enqueue.
    pub(crate) fn bit(self) -> u8 {
        match self {
            OpCode::Add => 1 << 0,
            OpCode::Remove => 1 << 1,
            OpCode::SetIn => 1 << 2,
            OpCode::SetOut => 1 << 3,
        }
    }
}

/// One entry of the cross-thread operation queue. A single FIFO carries all
/// requests, so a connect that enqueues Add followed by SetOut is applied in
/// that order.
pub(crate) struct OpRequest {
    pub(crate) code: OpCode,
    pub(crate) usock: Arc<UsockShared>,
}

/// What a poller registration belongs to.
#[derive(Clone)]
pub(crate) enum PollOwner {
    Wake,
    Sock(Arc<UsockShared>),
}

/// State shared between the worker thread and every handle of one port.
pub(crate) struct PortShared {
    pub(crate) config: Config,
    /// Dispatch guard. The worker holds it for the whole dispatch phase of
    /// each cycle; [`Port::lock`] hands it to layered state machines that
    /// need to exclude the worker.
    sync: Mutex<()>,
    pub(crate) timers: Mutex<TimerSet<Arc<TimerShared>>>,
    pub(crate) ops: Mutex<VecDeque<OpRequest>>,
    pub(crate) events: Mutex<VecDeque<Arc<EventShared>>>,
    /// Touched by the worker thread only: directly in the dispatch loop,
    /// and from handle operations that detect they run on the worker.
    pub(crate) poller: Mutex<Poller<PollOwner>>,
    pub(crate) waker: Waker,
    stop: AtomicBool,
    worker_id: OnceLock<ThreadId>,
}

impl PortShared {
    /// Whether the calling thread is this port's worker. Operations on the
    /// worker apply poller changes directly; elsewhere they enqueue a
    /// request and signal the wake channel.
    pub(crate) fn is_worker(&self) -> bool {
        self.worker_id.get().copied() == Some(thread::current().id())
    }
}

/// A completion port: one worker thread multiplexing socket readiness,
/// timers and cross-thread events for the handles attached to it.
///
/// Handles ([`crate::Usock`], [`crate::Timer`], [`crate::Event`]) are bound
/// to a port at creation and deliver their completions through their sinks.
/// Dropping the port stops and joins the worker; owners are expected to have
/// closed their handles first.
pub struct Port {
    shared: Arc<PortShared>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Port {
    /// Create a port and start its worker thread.
    pub fn new(config: Config) -> io::Result<Port> {
        let waker = Waker::new()?;
        let mut poller = Poller::new(config.poll_events)?;
        let wake_key = poller.add(waker.as_raw_fd(), PollOwner::Wake);
        poller.set_in(wake_key)?;

        let ops_capacity = config.ops_capacity;
        let shared = Arc::new(PortShared {
            config,
            sync: Mutex::new(()),
            timers: Mutex::new(TimerSet::new()),
            ops: Mutex::new(VecDeque::with_capacity(ops_capacity)),
            events: Mutex::new(VecDeque::new()),
            poller: Mutex::new(poller),
            waker,
            stop: AtomicBool::new(false),
            worker_id: OnceLock::new(),
        });

        let worker_shared = shared.clone();
        let worker = thread::Builder::new()
            .name("portio-worker".to_string())
            .spawn(move || run(worker_shared))?;

        Ok(Port {
            shared,
            worker: Some(worker),
        })
    }

    /// Stop the worker and join it. Equivalent to dropping the port.
    pub fn term(mut self) {
        self.shutdown();
    }

    /// Exclude the worker's dispatch phase. The guard blocks sink callbacks
    /// port-wide while held, so it must not be taken from inside one.
    pub fn lock(&self) -> PortGuard<'_> {
        PortGuard {
            _guard: self.sync_guard(),
        }
    }

    fn sync_guard(&self) -> MutexGuard<'_, ()> {
        self.shared.sync.lock().unwrap()
    }

    pub(crate) fn shared(&self) -> &Arc<PortShared> {
        &self.shared
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.shared.stop.store(true, Ordering::Release);
            self.shared.waker.signal();
            let _ = handle.join();
        }
    }
}

impl Drop for Port {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Guard returned by [`Port::lock`].
pub struct PortGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// The worker loop. Each cycle: wait for readiness with the dispatch guard
/// released, then under the guard drain forwarded operations, fire expired
/// timers, dispatch readiness to socket sub-state machines, and finally
/// drain user events.
fn run(shared: Arc<PortShared>) {
    let _ = shared.worker_id.set(thread::current().id());
    debug!("worker started");

    let mut ready: Vec<(PollKey, Readiness, PollOwner)> = Vec::new();

    loop {
        let timeout = compute_timeout(&shared);

        {
            let mut poller = shared.poller.lock().unwrap();
            if let Err(e) = poller.wait(timeout) {
                debug!(error = %e, "poller wait failed");
            }
            // Snapshot owners before dispatch: a Remove processed below may
            // free a key (and the slab may reuse it) while its readiness is
            // still in this batch.
            ready.clear();
            while let Some((key, readiness)) = poller.next_ready() {
                if let Some(owner) = poller.owner(key) {
                    ready.push((key, readiness, owner.clone()));
                }
            }
        }
        metrics::WAKEUPS.increment();
        trace!(ready = ready.len(), "dispatch cycle");

        let _guard = shared.sync.lock().unwrap();
        if shared.stop.load(Ordering::Acquire) {
            break;
        }

        drain_ops(&shared);
        fire_timers(&shared);

        for (_key, readiness, owner) in ready.drain(..) {
            match owner {
                PollOwner::Wake => shared.waker.unsignal(),
                PollOwner::Sock(u) => usock::on_ready(&u, readiness),
            }
        }

        drain_events(&shared);
    }

    debug!("worker stopped");
}

fn compute_timeout(shared: &PortShared) -> Option<Duration> {
    // Requests the worker queued on itself carry no wake signal; pick them
    // up immediately instead of blocking.
    if !shared.ops.lock().unwrap().is_empty() || !shared.events.lock().unwrap().is_empty() {
        return Some(Duration::ZERO);
    }
    shared.timers.lock().unwrap().timeout(Instant::now())
}

fn drain_ops(shared: &PortShared) {
    loop {
        let Some(req) = shared.ops.lock().unwrap().pop_front() else {
            break;
        };
        process_op(shared, req);
    }
}

fn process_op(shared: &PortShared, req: OpRequest) {
    let u = req.usock;
    match req.code {
        OpCode::Add => {
            let mut st = u.state.lock().unwrap();
            st.queued &= !OpCode::Add.bit();
            if st.closed {
                return;
            }
            let mut poller = shared.poller.lock().unwrap();
            st.key = Some(poller.add(u.fd, PollOwner::Sock(u.clone())));
        }
        OpCode::SetIn | OpCode::SetOut => {
            let mut st = u.state.lock().unwrap();
            st.queued &= !req.code.bit();
            if st.closed {
                return;
            }
            let Some(key) = st.key else {
                return;
            };
            let mut poller = shared.poller.lock().unwrap();
            let res = if req.code == OpCode::SetIn {
                poller.set_in(key)
            } else {
                poller.set_out(key)
            };
            if let Err(e) = res {
                debug!(error = %e, "failed to arm interest");
            }
        }
        OpCode::Remove => {
            let key = {
                let mut st = u.state.lock().unwrap();
                st.queued &= !OpCode::Remove.bit();
                if st.closed {
                    return;
                }
                st.key.take()
            };
            if let Some(key) = key {
                shared.poller.lock().unwrap().remove(key);
            }
            usock::teardown(&u);
        }
    }
}

fn fire_timers(shared: &PortShared) {
    loop {
        let expired = shared.timers.lock().unwrap().pop_expired(Instant::now());
        let Some((key, timer)) = expired else {
            break;
        };
        crate::timer::fire(key, &timer);
    }
}

fn drain_events(shared: &PortShared) {
    let drained: Vec<Arc<EventShared>> = {
        let mut queue = shared.events.lock().unwrap();
        queue.drain(..).collect()
    };
    for event in drained {
        metrics::EVENTS_DISPATCHED.increment();
        crate::event::fire(&event);
    }
}
