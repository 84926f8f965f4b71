use std::io::{self, IoSlice};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, RawFd};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::debug;

use crate::error::{self, Error};
use crate::metrics;
use crate::poller::{PollKey, Readiness};
use crate::port::{OpCode, OpRequest, PollOwner, Port, PortShared};
use crate::sink::Sink;

#[cfg(any(target_os = "linux", target_os = "android"))]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const SEND_FLAGS: libc::c_int = 0;

/// Non-blocking stream socket driven by a completion port.
///
/// Operations follow a strict issue/complete discipline: at most one inbound
/// (`recv`/`accept`) and one outbound (`send`/`connect`) operation may be in
/// flight, and each completes through exactly one sink callback. Operations
/// that finish immediately invoke the sink on the calling thread; anything
/// that has to wait for readiness completes on the port's worker. Issuing an
/// operation while one of the same direction is pending is a caller bug and
/// panics.
pub struct Usock {
    shared: Arc<UsockShared>,
}

pub(crate) struct UsockShared {
    pub(crate) port: Arc<PortShared>,
    pub(crate) fd: RawFd,
    pub(crate) state: Mutex<UsockState>,
}

pub(crate) struct UsockState {
    sock: Option<Socket>,
    sink: Arc<dyn Sink>,
    /// Set once the socket is (or is queued to be) tracked by the poller.
    registered: bool,
    pub(crate) key: Option<PollKey>,
    /// Bitmask of opcodes currently sitting in the operation queue.
    pub(crate) queued: u8,
    closing: bool,
    pub(crate) closed: bool,
    rx: RecvState,
    tx: SendState,
    batch: Option<Batch>,
}

enum RecvState {
    Idle,
    Receiving { buf: Vec<u8>, filled: usize },
    Accepting,
}

enum SendState {
    Idle,
    Sending {
        iovs: Vec<Bytes>,
        idx: usize,
        off: usize,
    },
    Connecting,
}

/// Receive staging buffer. Reads smaller than the buffer land here first;
/// `pos..len` is the unread span.
struct Batch {
    data: Box<[u8]>,
    pos: usize,
    len: usize,
}

impl Batch {
    fn new(size: usize) -> Batch {
        Batch {
            data: vec![0u8; size].into_boxed_slice(),
            pos: 0,
            len: 0,
        }
    }
}

enum Progress {
    Complete,
    Again,
    Failed(Error),
}

impl Usock {
    /// Create a socket in the unregistered state.
    ///
    /// The descriptor is close-on-exec (set by creation) and non-blocking.
    /// TCP streams get Nagle and, where supported, delayed ACK disabled;
    /// IPv6 sockets are dual-stack. Buffer sizes come from the port's
    /// [`crate::Config`].
    pub fn new(
        port: &Port,
        domain: Domain,
        ty: Type,
        protocol: Option<Protocol>,
        sink: Arc<dyn Sink>,
    ) -> io::Result<Usock> {
        let sock = Socket::new(domain, ty, protocol)?;
        sock.set_nonblocking(true)?;
        let config = &port.shared().config;
        if let Some(n) = config.snd_buf {
            sock.set_send_buffer_size(n)?;
        }
        if let Some(n) = config.rcv_buf {
            sock.set_recv_buffer_size(n)?;
        }
        if ty == Type::STREAM && (domain == Domain::IPV4 || domain == Domain::IPV6) {
            sock.set_nodelay(true)?;
            set_quickack(&sock);
        }
        if domain == Domain::IPV6 {
            sock.set_only_v6(false)?;
        }
        Ok(Usock::wrap(port, sock, sink))
    }

    /// Wrap a descriptor handed to [`Sink::on_accepted`]. Takes ownership of
    /// the fd, applies the same tuning as [`Usock::new`] and registers the
    /// socket with the port.
    pub fn child(port: &Port, fd: RawFd, sink: Arc<dyn Sink>) -> io::Result<Usock> {
        let sock = unsafe { Socket::from_raw_fd(fd) };
        sock.set_cloexec(true)?;
        sock.set_nonblocking(true)?;
        let config = &port.shared().config;
        if let Some(n) = config.snd_buf {
            sock.set_send_buffer_size(n)?;
        }
        if let Some(n) = config.rcv_buf {
            sock.set_recv_buffer_size(n)?;
        }
        // Accepted descriptors are usually TCP; the domain is unknown here
        // so stream tuning is best-effort.
        if sock.set_nodelay(true).is_ok() {
            set_quickack(&sock);
        }

        let usock = Usock::wrap(port, sock, sink);
        {
            let u = &usock.shared;
            let mut st = u.state.lock().unwrap();
            if register(u, &mut st) {
                u.port.waker.signal();
            }
        }
        Ok(usock)
    }

    /// Replace the sink. Owners do this when their own state machine moves
    /// to a phase with different completion handling.
    pub fn set_sink(&self, sink: Arc<dyn Sink>) {
        self.shared.state.lock().unwrap().sink = sink;
    }

    /// Bind to a local address. Address reuse is always enabled. Errors are
    /// returned verbatim.
    pub fn bind(&self, addr: &SockAddr) -> io::Result<()> {
        let st = self.shared.state.lock().unwrap();
        let sock = live(&st)?;
        sock.set_reuse_address(true)?;
        sock.bind(addr)
    }

    /// Start listening and register the socket with the port.
    pub fn listen(&self, backlog: i32) -> io::Result<()> {
        let u = &self.shared;
        let mut st = u.state.lock().unwrap();
        live(&st)?.listen(backlog)?;
        if register(u, &mut st) {
            u.port.waker.signal();
        }
        Ok(())
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> io::Result<SockAddr> {
        let st = self.shared.state.lock().unwrap();
        live(&st)?.local_addr()
    }

    /// Start an outbound connect. Completion is reported through the sink:
    /// `on_connected` (possibly synchronously, if the kernel connects
    /// immediately) or `on_error`.
    pub fn connect(&self, addr: &SockAddr) {
        let u = &self.shared;
        enum Done {
            Connected,
            Failed(Error),
            Pending,
        }
        let (sink, done) = {
            let mut st = u.state.lock().unwrap();
            assert!(!st.closing, "connect on a closed usock");
            assert!(
                matches!(st.tx, SendState::Idle),
                "connect with an outbound operation in progress"
            );
            let sink = st.sink.clone();
            let result = {
                let Some(sock) = st.sock.as_ref() else { return };
                sock.connect(addr)
            };
            let done = match result {
                Ok(()) => {
                    if register(u, &mut st) {
                        u.port.waker.signal();
                    }
                    Done::Connected
                }
                Err(e) if e.raw_os_error() == Some(libc::EINPROGRESS) => {
                    st.tx = SendState::Connecting;
                    // Both requests ride a single wake pulse; the queue is
                    // FIFO so Add lands before SetOut.
                    let registered = register(u, &mut st);
                    let armed = arm(u, &mut st, OpCode::SetOut);
                    if registered || armed {
                        u.port.waker.signal();
                    }
                    Done::Pending
                }
                Err(e) => Done::Failed(error::classify_read(e)),
            };
            (sink, done)
        };
        match done {
            Done::Connected => sink.on_connected(),
            Done::Failed(e) => deliver_error(&sink, e),
            Done::Pending => {}
        }
    }

    /// Start accepting one connection. Completes with `on_accepted(fd)`.
    /// Requires a prior [`Usock::listen`].
    pub fn accept(&self) {
        let u = &self.shared;
        let mut st = u.state.lock().unwrap();
        assert!(!st.closing, "accept on a closed usock");
        assert!(
            matches!(st.rx, RecvState::Idle),
            "accept with an inbound operation in progress"
        );
        assert!(st.registered, "accept before listen");
        st.rx = RecvState::Accepting;
        if arm(u, &mut st, OpCode::SetIn) {
            u.port.waker.signal();
        }
    }

    /// Send the concatenation of `iovs`. Zero-length entries are skipped;
    /// the entry count is capped by [`crate::Config::max_iov`]. Completes
    /// with `on_sent` once every byte is written, or `on_error`.
    pub fn send(&self, iovs: Vec<Bytes>) {
        let u = &self.shared;
        assert!(
            iovs.len() <= u.port.config.max_iov,
            "too many iov entries in send"
        );
        enum Done {
            Sent,
            Failed(Error),
            Pending,
        }
        let (sink, done) = {
            let mut st = u.state.lock().unwrap();
            assert!(!st.closing, "send on a closed usock");
            assert!(
                matches!(st.tx, SendState::Idle),
                "send while another outbound operation is in progress"
            );
            let sink = st.sink.clone();
            let iovs: Vec<Bytes> = iovs.into_iter().filter(|b| !b.is_empty()).collect();
            if iovs.is_empty() {
                (sink, Done::Sent)
            } else {
                let mut idx = 0;
                let mut off = 0;
                let progress = {
                    let Some(sock) = st.sock.as_ref() else { return };
                    drive_send(sock, &iovs, &mut idx, &mut off)
                };
                let done = match progress {
                    Progress::Complete => Done::Sent,
                    Progress::Failed(e) => Done::Failed(e),
                    Progress::Again => {
                        st.tx = SendState::Sending { iovs, idx, off };
                        if arm(u, &mut st, OpCode::SetOut) {
                            u.port.waker.signal();
                        }
                        Done::Pending
                    }
                };
                (sink, done)
            }
        };
        match done {
            Done::Sent => sink.on_sent(),
            Done::Failed(e) => deliver_error(&sink, e),
            Done::Pending => {}
        }
    }

    /// Receive exactly `buf.len()` bytes. The filled buffer comes back via
    /// `on_received`; a zero-length buffer completes immediately. Short
    /// reads are staged through the batch buffer (allocated on first use)
    /// so a stream of small receives costs few syscalls.
    pub fn recv(&self, buf: Vec<u8>) {
        let u = &self.shared;
        enum Done {
            Received(Vec<u8>),
            Failed(Error),
            Pending,
        }
        let (sink, done) = {
            let mut st = u.state.lock().unwrap();
            assert!(!st.closing, "recv on a closed usock");
            assert!(
                matches!(st.rx, RecvState::Idle),
                "recv while another inbound operation is in progress"
            );
            let sink = st.sink.clone();
            if buf.is_empty() {
                (sink, Done::Received(buf))
            } else {
                if st.batch.is_none() {
                    st.batch = Some(Batch::new(u.port.config.batch_size));
                }
                let mut buf = buf;
                let mut filled = 0usize;
                let progress = {
                    let UsockState { sock, batch, .. } = &mut *st;
                    let (Some(sock), Some(batch)) = (sock.as_ref(), batch.as_mut()) else {
                        return;
                    };
                    drive_recv(sock, batch, &mut buf, &mut filled)
                };
                let done = match progress {
                    Progress::Complete => Done::Received(buf),
                    Progress::Failed(e) => Done::Failed(e),
                    Progress::Again => {
                        st.rx = RecvState::Receiving { buf, filled };
                        if arm(u, &mut st, OpCode::SetIn) {
                            u.port.waker.signal();
                        }
                        Done::Pending
                    }
                };
                (sink, done)
            }
        };
        match done {
            Done::Received(buf) => sink.on_received(buf),
            Done::Failed(e) => deliver_error(&sink, e),
            Done::Pending => {}
        }
    }

    /// Close the socket. `on_closed` fires exactly once: synchronously if
    /// the socket never reached the poller or the caller is the worker,
    /// otherwise from the worker after it detaches the descriptor. Closing
    /// twice is a caller bug and panics.
    pub fn close(&self) {
        let u = &self.shared;
        let mut st = u.state.lock().unwrap();
        assert!(!st.closing, "close on an already closed usock");
        st.closing = true;
        if !st.registered {
            drop(st);
            teardown(u);
            return;
        }
        if u.port.is_worker() {
            if let Some(key) = st.key.take() {
                drop(st);
                u.port.poller.lock().unwrap().remove(key);
                teardown(u);
                return;
            }
            // The registration request is still queued; Remove follows it
            // in FIFO order and the zero poll timeout picks both up.
            push_op(u, &mut st, OpCode::Remove);
            return;
        }
        push_op(u, &mut st, OpCode::Remove);
        drop(st);
        u.port.waker.signal();
    }

    fn wrap(port: &Port, sock: Socket, sink: Arc<dyn Sink>) -> Usock {
        let fd = sock.as_raw_fd();
        Usock {
            shared: Arc::new(UsockShared {
                port: port.shared().clone(),
                fd,
                state: Mutex::new(UsockState {
                    sock: Some(sock),
                    sink,
                    registered: false,
                    key: None,
                    queued: 0,
                    closing: false,
                    closed: false,
                    rx: RecvState::Idle,
                    tx: SendState::Idle,
                    batch: None,
                }),
            }),
        }
    }
}

fn live<'a>(st: &'a UsockState) -> io::Result<&'a Socket> {
    st.sock
        .as_ref()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "socket closed"))
}

/// Final teardown: release the descriptor, drop the batch buffer, notify
/// the sink. After this no further callbacks occur for the socket.
pub(crate) fn teardown(u: &Arc<UsockShared>) {
    let (sock, sink) = {
        let mut st = u.state.lock().unwrap();
        st.closed = true;
        st.key = None;
        st.rx = RecvState::Idle;
        st.tx = SendState::Idle;
        st.batch = None;
        (st.sock.take(), st.sink.clone())
    };
    drop(sock);
    debug!(fd = u.fd, "usock closed");
    sink.on_closed();
}

/// Track the socket with the poller: directly on the worker thread, else via
/// a queued Add. Returns whether the caller must pulse the wake channel.
fn register(u: &Arc<UsockShared>, st: &mut UsockState) -> bool {
    st.registered = true;
    if u.port.is_worker() {
        let mut poller = u.port.poller.lock().unwrap();
        st.key = Some(poller.add(u.fd, PollOwner::Sock(u.clone())));
        false
    } else {
        push_op(u, st, OpCode::Add);
        true
    }
}

/// Arm read or write interest. Returns whether the caller must pulse the
/// wake channel.
fn arm(u: &Arc<UsockShared>, st: &mut UsockState, code: OpCode) -> bool {
    assert!(st.registered, "arming an unregistered socket");
    if u.port.is_worker() {
        if let Some(key) = st.key {
            let mut poller = u.port.poller.lock().unwrap();
            let res = match code {
                OpCode::SetIn => poller.set_in(key),
                OpCode::SetOut => poller.set_out(key),
                _ => unreachable!("not an interest opcode"),
            };
            if let Err(e) = res {
                debug!(error = %e, "failed to arm interest");
            }
            false
        } else {
            // Registration request still queued; FIFO order applies this
            // after it, picked up by the zero poll timeout.
            push_op(u, st, code);
            false
        }
    } else {
        push_op(u, st, code);
        true
    }
}

fn disarm(u: &Arc<UsockShared>, st: &mut UsockState, code: OpCode) {
    if let Some(key) = st.key {
        let mut poller = u.port.poller.lock().unwrap();
        let res = match code {
            OpCode::SetIn => poller.reset_in(key),
            OpCode::SetOut => poller.reset_out(key),
            _ => unreachable!("not an interest opcode"),
        };
        if let Err(e) = res {
            debug!(error = %e, "failed to disarm interest");
        }
    }
}

fn push_op(u: &Arc<UsockShared>, st: &mut UsockState, code: OpCode) {
    let bit = code.bit();
    assert!(st.queued & bit == 0, "operation request already queued");
    st.queued |= bit;
    u.port.ops.lock().unwrap().push_back(OpRequest {
        code,
        usock: u.clone(),
    });
    metrics::OPS_FORWARDED.increment();
}

fn deliver_error(sink: &Arc<dyn Sink>, err: Error) {
    if matches!(err, Error::ConnectionReset) {
        metrics::CONNECTIONS_RESET.increment();
    }
    sink.on_error(err);
}

/// Readiness dispatch, called from the port's worker.
pub(crate) fn on_ready(u: &Arc<UsockShared>, ready: Readiness) {
    if ready.contains(Readiness::OUT) {
        out_ready(u);
    }
    if ready.contains(Readiness::IN) {
        in_ready(u);
    }
    if ready.contains(Readiness::ERR) {
        err_ready(u);
    }
}

fn out_ready(u: &Arc<UsockShared>) {
    enum Done {
        Nothing,
        Connected,
        Sent,
        Failed(Error),
    }
    let mut done = Done::Nothing;
    let sink = {
        let mut st = u.state.lock().unwrap();
        if st.closed || st.closing {
            return;
        }
        let sink = st.sink.clone();
        match std::mem::replace(&mut st.tx, SendState::Idle) {
            SendState::Idle => {}
            SendState::Connecting => {
                disarm(u, &mut st, OpCode::SetOut);
                let err = {
                    let Some(sock) = st.sock.as_ref() else { return };
                    match sock.take_error() {
                        Ok(e) => e,
                        Err(e) => Some(e),
                    }
                };
                done = match err {
                    None => Done::Connected,
                    Some(e) => Done::Failed(error::classify_read(e)),
                };
            }
            SendState::Sending {
                iovs,
                mut idx,
                mut off,
            } => {
                let progress = {
                    let Some(sock) = st.sock.as_ref() else { return };
                    drive_send(sock, &iovs, &mut idx, &mut off)
                };
                match progress {
                    Progress::Complete => {
                        disarm(u, &mut st, OpCode::SetOut);
                        done = Done::Sent;
                    }
                    Progress::Again => st.tx = SendState::Sending { iovs, idx, off },
                    Progress::Failed(e) => {
                        disarm(u, &mut st, OpCode::SetOut);
                        done = Done::Failed(e);
                    }
                }
            }
        }
        sink
    };
    match done {
        Done::Nothing => {}
        Done::Connected => sink.on_connected(),
        Done::Sent => sink.on_sent(),
        Done::Failed(e) => deliver_error(&sink, e),
    }
}

fn in_ready(u: &Arc<UsockShared>) {
    enum Done {
        Nothing,
        Received(Vec<u8>),
        Accepted(RawFd),
        Failed(Error),
    }
    let mut done = Done::Nothing;
    let sink = {
        let mut st = u.state.lock().unwrap();
        if st.closed || st.closing {
            return;
        }
        let sink = st.sink.clone();
        match std::mem::replace(&mut st.rx, RecvState::Idle) {
            RecvState::Idle => {}
            RecvState::Receiving { mut buf, mut filled } => {
                let progress = {
                    let UsockState { sock, batch, .. } = &mut *st;
                    let (Some(sock), Some(batch)) = (sock.as_ref(), batch.as_mut()) else {
                        return;
                    };
                    drive_recv(sock, batch, &mut buf, &mut filled)
                };
                match progress {
                    Progress::Complete => {
                        disarm(u, &mut st, OpCode::SetIn);
                        done = Done::Received(buf);
                    }
                    Progress::Again => st.rx = RecvState::Receiving { buf, filled },
                    Progress::Failed(e) => {
                        disarm(u, &mut st, OpCode::SetIn);
                        done = Done::Failed(e);
                    }
                }
            }
            RecvState::Accepting => {
                let result = {
                    let Some(sock) = st.sock.as_ref() else { return };
                    sock.accept()
                };
                match result {
                    Ok((child, _addr)) => {
                        disarm(u, &mut st, OpCode::SetIn);
                        metrics::CONNECTIONS_ACCEPTED.increment();
                        done = Done::Accepted(child.into_raw_fd());
                    }
                    Err(e)
                        if error::is_again(&e) || e.kind() == io::ErrorKind::Interrupted =>
                    {
                        st.rx = RecvState::Accepting;
                    }
                    Err(e) if error::is_accept_transient(&e) => {
                        // The pending connection died or resources ran out;
                        // the next readiness edge retries.
                        st.rx = RecvState::Accepting;
                    }
                    Err(e) => {
                        disarm(u, &mut st, OpCode::SetIn);
                        done = Done::Failed(Error::Io(e));
                    }
                }
            }
        }
        sink
    };
    match done {
        Done::Nothing => {}
        Done::Received(buf) => sink.on_received(buf),
        Done::Accepted(fd) => sink.on_accepted(fd),
        Done::Failed(e) => deliver_error(&sink, e),
    }
}

/// Explicit error readiness with no accompanying IN/OUT progress. Resolves
/// whatever operation is pending through the common error path.
fn err_ready(u: &Arc<UsockShared>) {
    let (sink, err) = {
        let mut st = u.state.lock().unwrap();
        if st.closed || st.closing {
            return;
        }
        let pending =
            !matches!(st.rx, RecvState::Idle) || !matches!(st.tx, SendState::Idle);
        if !pending {
            return;
        }
        let raw = {
            let Some(sock) = st.sock.as_ref() else { return };
            match sock.take_error() {
                Ok(Some(e)) => e,
                Ok(None) => io::Error::from_raw_os_error(libc::ECONNRESET),
                Err(e) => e,
            }
        };
        st.rx = RecvState::Idle;
        st.tx = SendState::Idle;
        disarm(u, &mut st, OpCode::SetIn);
        disarm(u, &mut st, OpCode::SetOut);
        (st.sink.clone(), error::classify_read(raw))
    };
    deliver_error(&sink, err);
}

/// Write as much of the iov list as the kernel takes, advancing the cursor.
fn drive_send(sock: &Socket, iovs: &[Bytes], idx: &mut usize, off: &mut usize) -> Progress {
    while *idx < iovs.len() {
        let mut slices: Vec<IoSlice<'_>> = Vec::with_capacity(iovs.len() - *idx);
        slices.push(IoSlice::new(&iovs[*idx][*off..]));
        for chunk in &iovs[*idx + 1..] {
            slices.push(IoSlice::new(chunk));
        }
        match sock.send_vectored_with_flags(&slices, SEND_FLAGS) {
            Ok(n) => {
                metrics::BYTES_SENT.add(n as u64);
                advance(iovs, idx, off, n);
            }
            Err(e) if error::is_again(&e) => return Progress::Again,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Progress::Failed(error::classify_write(e)),
        }
    }
    Progress::Complete
}

fn advance(iovs: &[Bytes], idx: &mut usize, off: &mut usize, mut n: usize) {
    while n > 0 && *idx < iovs.len() {
        let left = iovs[*idx].len() - *off;
        if n < left {
            *off += n;
            return;
        }
        n -= left;
        *idx += 1;
        *off = 0;
    }
}

/// Fill `buf[filled..]`, staging small reads through the batch buffer.
/// Zero-byte reads and the reset errno class normalize to a connection
/// reset.
fn drive_recv(sock: &Socket, batch: &mut Batch, buf: &mut [u8], filled: &mut usize) -> Progress {
    loop {
        if batch.len > batch.pos {
            let want = (buf.len() - *filled).min(batch.len - batch.pos);
            buf[*filled..*filled + want].copy_from_slice(&batch.data[batch.pos..batch.pos + want]);
            batch.pos += want;
            *filled += want;
        }
        if *filled == buf.len() {
            return Progress::Complete;
        }
        // A remainder larger than the batch buffer is read straight into
        // the caller's buffer; smaller remainders refill the batch.
        let direct = buf.len() - *filled > batch.data.len();
        let result = if direct {
            recv_raw(sock, &mut buf[*filled..])
        } else {
            batch.pos = 0;
            batch.len = 0;
            recv_raw(sock, &mut batch.data)
        };
        match result {
            Ok(0) => return Progress::Failed(Error::ConnectionReset),
            Ok(n) => {
                metrics::BYTES_RECEIVED.add(n as u64);
                if direct {
                    *filled += n;
                } else {
                    batch.len = n;
                }
            }
            Err(e) if error::is_again(&e) => return Progress::Again,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Progress::Failed(error::classify_read(e)),
        }
    }
}

fn recv_raw(sock: &Socket, buf: &mut [u8]) -> io::Result<usize> {
    let n = unsafe {
        libc::recv(
            sock.as_raw_fd(),
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
            0,
        )
    };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn set_quickack(sock: &Socket) {
    let enable: libc::c_int = 1;
    unsafe {
        libc::setsockopt(
            sock.as_raw_fd(),
            libc::IPPROTO_TCP,
            libc::TCP_QUICKACK,
            &enable as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn set_quickack(_sock: &Socket) {}
