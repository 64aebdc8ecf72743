//! Dialog layer configuration and the connection hook.

use std::time::Duration;

/// Base retransmission interval T1 (RFC 3261 Section 17.1.1.1). The
/// partial-dialog timeout is `64 * T1`.
pub const DEFAULT_TIMER_T1: Duration = Duration::from_millis(500);

/// Configuration for a [`DialogRegistry`](crate::DialogRegistry).
#[derive(Debug, Clone)]
pub struct DialogConfig {
    /// Library-wide T1 fallback; a connection may override it per call.
    pub timer_t1: Duration,
}

impl Default for DialogConfig {
    fn default() -> Self {
        DialogConfig { timer_t1: DEFAULT_TIMER_T1 }
    }
}

/// The transport connection as the dialog layer sees it: an opaque
/// collaborator that may know a better T1 for its path.
pub trait SipConn: Send + Sync {
    /// Connection-specific T1, or `None` to use the registry default.
    fn timer_t1(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_t1() {
        assert_eq!(DialogConfig::default().timer_t1, Duration::from_millis(500));
    }
}
