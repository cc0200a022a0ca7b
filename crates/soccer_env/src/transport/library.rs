//! Process-wide socket library lifetime.
//!
//! Every [`StreamConnection`](super::StreamConnection) holds one
//! [`LibraryGuard`]. The first guard brings the socket layer up, the last one
//! takes it down again. On platforms where the standard library already
//! manages the socket runtime the hooks only log.

use parking_lot::Mutex;

static LIVE_CONNECTIONS: Mutex<usize> = parking_lot::const_mutex(0);

/// Reference-counted token for the socket library.
#[derive(Debug)]
pub(crate) struct LibraryGuard {
    _private: (),
}

impl LibraryGuard {
    /// Registers one more live connection.
    pub(crate) fn acquire() -> Self {
        let mut live = LIVE_CONNECTIONS.lock();
        if *live == 0 {
            tracing::debug!("socket library initialised");
        }
        *live += 1;
        Self { _private: () }
    }
}

impl Drop for LibraryGuard {
    fn drop(&mut self) {
        let mut live = LIVE_CONNECTIONS.lock();
        *live = live.saturating_sub(1);
        if *live == 0 {
            tracing::debug!("socket library released");
        }
    }
}

/// Number of connection objects currently alive in the process.
#[must_use]
pub fn live_connections() -> usize {
    *LIVE_CONNECTIONS.lock()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_counts_up_and_down() {
        // Other tests create connections concurrently, so only relative
        // movement while both guards are held is checked.
        let a = LibraryGuard::acquire();
        let b = LibraryGuard::acquire();
        assert!(live_connections() >= 2);
        drop(a);
        drop(b);
    }
}
