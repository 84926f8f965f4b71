//! End-to-end socket scenarios over real TCP and Unix-domain connections.

use std::os::fd::RawFd;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

use portio::{Bytes, Config, Domain, Error, Port, Protocol, Sink, Type, Usock};

#[derive(Debug)]
enum Ev {
    Connected,
    Accepted(RawFd),
    Sent,
    Received(Vec<u8>),
    Error(Error),
    Closed,
}

/// Sink that forwards every completion into an mpsc channel.
struct TestSink {
    tx: Mutex<Sender<Ev>>,
}

impl TestSink {
    fn pair() -> (Arc<TestSink>, Receiver<Ev>) {
        let (tx, rx) = channel();
        (Arc::new(TestSink { tx: Mutex::new(tx) }), rx)
    }

    fn push(&self, ev: Ev) {
        let _ = self.tx.lock().unwrap().send(ev);
    }
}

impl Sink for TestSink {
    fn on_connected(&self) {
        self.push(Ev::Connected);
    }
    fn on_accepted(&self, fd: RawFd) {
        self.push(Ev::Accepted(fd));
    }
    fn on_sent(&self) {
        self.push(Ev::Sent);
    }
    fn on_received(&self, buf: Vec<u8>) {
        self.push(Ev::Received(buf));
    }
    fn on_error(&self, err: Error) {
        self.push(Ev::Error(err));
    }
    fn on_closed(&self) {
        self.push(Ev::Closed);
    }
}

fn next(rx: &Receiver<Ev>) -> Ev {
    rx.recv_timeout(Duration::from_secs(5))
        .expect("timed out waiting for a completion")
}

struct Pair {
    _listener: Usock,
    _listener_rx: Receiver<Ev>,
    client: Usock,
    client_rx: Receiver<Ev>,
    server: Usock,
    server_rx: Receiver<Ev>,
}

/// Listener + connected client + accepted server socket on loopback.
fn connected_pair(port: &Port) -> Pair {
    let (lsink, lrx) = TestSink::pair();
    let listener = Usock::new(port, Domain::IPV4, Type::STREAM, Some(Protocol::TCP), lsink)
        .expect("listener socket");
    let any: std::net::SocketAddr = "127.0.0.1:0".parse().unwrap();
    listener.bind(&any.into()).expect("bind");
    listener.listen(128).expect("listen");
    let addr = listener.local_addr().unwrap().as_socket().unwrap();
    listener.accept();

    let (csink, crx) = TestSink::pair();
    let client = Usock::new(port, Domain::IPV4, Type::STREAM, Some(Protocol::TCP), csink)
        .expect("client socket");
    client.connect(&addr.into());

    match next(&crx) {
        Ev::Connected => {}
        other => panic!("expected Connected, got {other:?}"),
    }
    let fd = match next(&lrx) {
        Ev::Accepted(fd) => fd,
        other => panic!("expected Accepted, got {other:?}"),
    };

    let (ssink, srx) = TestSink::pair();
    let server = Usock::child(port, fd, ssink).expect("child socket");

    Pair {
        _listener: listener,
        _listener_rx: lrx,
        client,
        client_rx: crx,
        server,
        server_rx: srx,
    }
}

#[test]
fn test_connect_and_accept() {
    let port = Port::new(Config::default()).unwrap();
    // connected_pair asserts Connected on the client and Accepted on the
    // listener.
    let _pair = connected_pair(&port);
}

#[test]
fn test_echo_roundtrip() {
    let port = Port::new(Config::default()).unwrap();
    let pair = connected_pair(&port);

    pair.client.send(vec![
        Bytes::from_static(b"hello "),
        Bytes::from_static(b"world"),
    ]);
    match next(&pair.client_rx) {
        Ev::Sent => {}
        other => panic!("expected Sent, got {other:?}"),
    }

    pair.server.recv(vec![0u8; 11]);
    match next(&pair.server_rx) {
        Ev::Received(buf) => assert_eq!(&buf, b"hello world"),
        other => panic!("expected Received, got {other:?}"),
    }

    // And back the other way.
    pair.server.send(vec![Bytes::from_static(b"pong")]);
    match next(&pair.server_rx) {
        Ev::Sent => {}
        other => panic!("expected Sent, got {other:?}"),
    }
    pair.client.recv(vec![0u8; 4]);
    match next(&pair.client_rx) {
        Ev::Received(buf) => assert_eq!(&buf, b"pong"),
        other => panic!("expected Received, got {other:?}"),
    }
}

#[test]
fn test_one_megabyte_in_4096_byte_receives() {
    let config = Config {
        batch_size: 2048,
        ..Config::default()
    };
    let port = Port::new(config).unwrap();
    let pair = connected_pair(&port);

    let payload: Vec<u8> = (0..1_048_576usize).map(|i| (i % 251) as u8).collect();
    pair.client.send(vec![Bytes::from(payload.clone())]);

    let mut received = Vec::with_capacity(payload.len());
    let mut callbacks = 0usize;
    while received.len() < payload.len() {
        pair.server.recv(vec![0u8; 4096]);
        match next(&pair.server_rx) {
            Ev::Received(buf) => {
                assert_eq!(buf.len(), 4096, "every completion reports a full buffer");
                received.extend_from_slice(&buf);
                callbacks += 1;
            }
            other => panic!("expected Received, got {other:?}"),
        }
    }
    assert_eq!(callbacks, 256);
    assert_eq!(received, payload);

    match next(&pair.client_rx) {
        Ev::Sent => {}
        other => panic!("expected Sent, got {other:?}"),
    }
}

#[test]
fn test_zero_length_operations_complete_immediately() {
    let port = Port::new(Config::default()).unwrap();
    let pair = connected_pair(&port);

    // All-empty iov list: sent with no bytes transferred.
    pair.client.send(vec![Bytes::new(), Bytes::new()]);
    match next(&pair.client_rx) {
        Ev::Sent => {}
        other => panic!("expected Sent, got {other:?}"),
    }

    // Zero-length receive: immediate completion.
    pair.server.recv(Vec::new());
    match next(&pair.server_rx) {
        Ev::Received(buf) => assert!(buf.is_empty()),
        other => panic!("expected Received, got {other:?}"),
    }
}

#[test]
fn test_send_accepts_max_iov_entries() {
    let port = Port::new(Config::default()).unwrap();
    let pair = connected_pair(&port);

    let max = Config::default().max_iov;
    let iovs: Vec<Bytes> = (0..max).map(|_| Bytes::from_static(b"x")).collect();
    pair.client.send(iovs);
    match next(&pair.client_rx) {
        Ev::Sent => {}
        other => panic!("expected Sent, got {other:?}"),
    }

    pair.server.recv(vec![0u8; max]);
    match next(&pair.server_rx) {
        Ev::Received(buf) => assert_eq!(buf.len(), max),
        other => panic!("expected Received, got {other:?}"),
    }
}

#[test]
#[should_panic(expected = "too many iov entries")]
fn test_send_rejects_over_long_iov_list() {
    let port = Port::new(Config::default()).unwrap();
    let pair = connected_pair(&port);

    let iovs: Vec<Bytes> = (0..Config::default().max_iov + 1)
        .map(|_| Bytes::from_static(b"x"))
        .collect();
    pair.client.send(iovs);
}

#[test]
fn test_peer_close_resets_pending_recv_and_next_send() {
    let port = Port::new(Config::default()).unwrap();
    let pair = connected_pair(&port);

    // Server parks a receive, then the client goes away.
    pair.server.recv(vec![0u8; 16]);
    pair.client.close();
    match next(&pair.client_rx) {
        Ev::Closed => {}
        other => panic!("expected Closed, got {other:?}"),
    }
    match next(&pair.server_rx) {
        Ev::Error(Error::ConnectionReset) => {}
        other => panic!("expected ConnectionReset, got {other:?}"),
    }

    // Sending into the dead connection errors once the reset propagates.
    // The first sends may still land in the socket buffer.
    let mut reset = false;
    for _ in 0..100 {
        pair.server.send(vec![Bytes::from_static(b"are you there")]);
        match next(&pair.server_rx) {
            Ev::Sent => std::thread::sleep(Duration::from_millis(10)),
            Ev::Error(Error::ConnectionReset) => {
                reset = true;
                break;
            }
            other => panic!("expected Sent or ConnectionReset, got {other:?}"),
        }
    }
    assert!(reset, "send never observed the reset");
}

#[test]
fn test_cross_thread_close() {
    let port = Port::new(Config::default()).unwrap();
    let pair = connected_pair(&port);

    let server = pair.server;
    let handle = std::thread::spawn(move || {
        server.close();
        server
    });
    match next(&pair.server_rx) {
        Ev::Closed => {}
        other => panic!("expected Closed, got {other:?}"),
    }
    let _server = handle.join().unwrap();
}

#[test]
fn test_close_unregistered_is_synchronous() {
    let port = Port::new(Config::default()).unwrap();
    let (sink, rx) = TestSink::pair();
    let sock = Usock::new(&port, Domain::IPV4, Type::STREAM, Some(Protocol::TCP), sink).unwrap();
    sock.close();
    // Never registered, so the callback fired on this thread already.
    match rx.try_recv() {
        Ok(Ev::Closed) => {}
        other => panic!("expected Closed, got {other:?}"),
    }
}

#[test]
#[should_panic(expected = "close on an already closed usock")]
fn test_double_close_panics() {
    let port = Port::new(Config::default()).unwrap();
    let (sink, _rx) = TestSink::pair();
    let sock = Usock::new(&port, Domain::IPV4, Type::STREAM, Some(Protocol::TCP), sink).unwrap();
    sock.close();
    sock.close();
}

#[test]
fn test_connect_refused() {
    let port = Port::new(Config::default()).unwrap();

    // Grab an ephemeral port and release it so nothing is listening there.
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = probe.local_addr().unwrap();
    drop(probe);

    let (sink, rx) = TestSink::pair();
    let sock = Usock::new(&port, Domain::IPV4, Type::STREAM, Some(Protocol::TCP), sink).unwrap();
    sock.connect(&addr.into());
    match next(&rx) {
        Ev::Error(Error::ConnectionReset) => {}
        other => panic!("expected ConnectionReset, got {other:?}"),
    }
}

#[test]
fn test_listener_survives_aborted_connection() {
    let port = Port::new(Config::default()).unwrap();

    let (lsink, lrx) = TestSink::pair();
    let listener =
        Usock::new(&port, Domain::IPV4, Type::STREAM, Some(Protocol::TCP), lsink).unwrap();
    let any: std::net::SocketAddr = "127.0.0.1:0".parse().unwrap();
    listener.bind(&any.into()).unwrap();
    listener.listen(128).unwrap();
    let addr = listener.local_addr().unwrap().as_socket().unwrap();
    listener.accept();

    // A connection that resets itself before we accept it. Depending on
    // timing the accept sees ECONNABORTED (swallowed) or a live socket
    // that is already dead.
    {
        let aborter = socket2::Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).unwrap();
        aborter.connect(&addr.into()).unwrap();
        aborter.set_linger(Some(Duration::ZERO)).unwrap();
        drop(aborter);
    }
    std::thread::sleep(Duration::from_millis(50));

    // A legitimate connection is still accepted.
    let (csink, crx) = TestSink::pair();
    let client = Usock::new(&port, Domain::IPV4, Type::STREAM, Some(Protocol::TCP), csink).unwrap();
    client.connect(&addr.into());
    match next(&crx) {
        Ev::Connected => {}
        other => panic!("expected Connected, got {other:?}"),
    }

    // Whichever connection comes out first, the accept path surfaced no
    // error.
    match next(&lrx) {
        Ev::Accepted(fd) => unsafe {
            libc::close(fd);
        },
        other => panic!("accept path must not surface errors, got {other:?}"),
    }
}

#[test]
fn test_unix_domain_roundtrip() {
    let port = Port::new(Config::default()).unwrap();
    let path = std::env::temp_dir().join(format!("portio-usock-{}.sock", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let (lsink, lrx) = TestSink::pair();
    let listener = Usock::new(&port, Domain::UNIX, Type::STREAM, None, lsink).unwrap();
    listener
        .bind(&portio::SockAddr::unix(&path).unwrap())
        .unwrap();
    listener.listen(16).unwrap();
    listener.accept();

    let (csink, crx) = TestSink::pair();
    let client = Usock::new(&port, Domain::UNIX, Type::STREAM, None, csink).unwrap();
    client.connect(&portio::SockAddr::unix(&path).unwrap());
    match next(&crx) {
        Ev::Connected => {}
        other => panic!("expected Connected, got {other:?}"),
    }
    let fd = match next(&lrx) {
        Ev::Accepted(fd) => fd,
        other => panic!("expected Accepted, got {other:?}"),
    };
    let (ssink, srx) = TestSink::pair();
    let server = Usock::child(&port, fd, ssink).unwrap();

    client.send(vec![Bytes::from_static(b"over the socket file")]);
    match next(&crx) {
        Ev::Sent => {}
        other => panic!("expected Sent, got {other:?}"),
    }
    server.recv(vec![0u8; 20]);
    match next(&srx) {
        Ev::Received(buf) => assert_eq!(&buf, b"over the socket file"),
        other => panic!("expected Received, got {other:?}"),
    }

    let _ = std::fs::remove_file(&path);
}
