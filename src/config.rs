/// Configuration for a completion port and the sockets attached to it.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Size of the per-socket receive staging buffer in bytes. Reads smaller
    /// than this land in the staging buffer first so several small receives
    /// cost one syscall. Larger values trade memory per socket for fewer
    /// syscalls. The buffer is allocated lazily on the first receive, so
    /// listen-only sockets never pay for it.
    pub batch_size: usize,
    /// Maximum number of scatter/gather entries per send. Exceeding it is a
    /// caller bug and panics.
    pub max_iov: usize,
    /// SO_SNDBUF for new sockets. `None` leaves the kernel default.
    pub snd_buf: Option<usize>,
    /// SO_RCVBUF for new sockets. `None` leaves the kernel default.
    pub rcv_buf: Option<usize>,
    /// Readiness events the worker can collect per poll wait.
    pub poll_events: usize,
    /// Pre-allocated capacity of the cross-thread operation queue, so
    /// steady-state enqueue from other threads does not allocate.
    pub ops_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: 2048,
            max_iov: 3,
            snd_buf: None,
            rcv_buf: None,
            poll_events: 256,
            ops_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.batch_size, 2048);
        assert_eq!(config.max_iov, 3);
        assert!(config.snd_buf.is_none());
        assert!(config.rcv_buf.is_none());
        assert!(config.poll_events > 0);
        assert!(config.ops_capacity > 0);
    }
}
