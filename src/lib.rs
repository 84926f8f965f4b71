//! portio - completion-port style asynchronous I/O core.
//!
//! One worker thread per [`Port`] multiplexes readiness for non-blocking
//! stream sockets, timers and cross-thread events, and dispatches
//! completions to per-handle [`Sink`]s. This is the substrate a messaging
//! library's endpoint state machines (connect with backoff,
//! accept-and-run, protocol framing) are built on; none of that lives
//! here.
//!
//! # Model
//!
//! - Handles ([`Usock`], [`Timer`], [`Event`]) are bound to a port and a
//!   sink at creation. Their operations may be issued from any thread:
//!   on the worker they apply directly, elsewhere they are forwarded
//!   through a FIFO request queue and a wake channel.
//! - Completions arrive as sink callbacks. Deferred completions run on the
//!   worker; operations that finish immediately call back synchronously.
//! - Each socket allows one inbound and one outbound operation at a time,
//!   and every accepted operation ends in exactly one terminal callback.
//!
//! # Example
//!
//! ```ignore
//! use portio::{Config, Domain, Port, Protocol, Type, Usock};
//!
//! let port = Port::new(Config::default())?;
//! let sock = Usock::new(&port, Domain::IPV4, Type::STREAM,
//!     Some(Protocol::TCP), sink)?;
//! sock.connect(&"127.0.0.1:7000".parse::<std::net::SocketAddr>()?.into());
//! // ... sink.on_connected() fires, then sock.send(..) / sock.recv(..)
//! ```

mod config;
mod error;
mod event;
mod metrics;
mod poller;
mod port;
mod sink;
mod timer;
mod timerset;
mod usock;
mod waker;

pub use config::Config;
pub use error::Error;
pub use event::Event;
pub use port::{Port, PortGuard};
pub use sink::Sink;
pub use timer::Timer;
pub use usock::Usock;

// The socket surface speaks socket2/bytes types; re-export them so callers
// don't have to name the crates themselves.
pub use bytes::Bytes;
pub use socket2::{Domain, Protocol, SockAddr, Type};
