//! Connection lifecycle state and the bounded reconnect counter.
//!
//! The counter is the only place the retry cap is enforced. The connection
//! task claims a slot per unsolicited close and resets it on a successful open.

use std::time::Duration;

use serde::Serialize;

use crate::config::{DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY_MS};

/// Socket lifecycle as seen by the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No socket, or the last one closed.
    #[default]
    Disconnected,
    /// Opening handshake in progress.
    Connecting,
    /// Socket open; commands are written through.
    Connected,
}

/// Fixed-delay retry policy: no backoff, no jitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Automatic attempts allowed before giving up.
    pub max_attempts: u32,
    /// Wait between a close and the next attempt.
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        }
    }
}

/// Attempts consumed since the last successful open, bounded by a cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectCounter {
    attempts: u32,
    cap: u32,
}

impl ReconnectCounter {
    #[must_use]
    pub fn new(cap: u32) -> Self {
        Self { attempts: 0, cap }
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn cap(&self) -> u32 {
        self.cap
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.cap
    }

    /// Claim the next retry slot, returning its 1-based attempt number.
    ///
    /// Returns `None` once the cap is reached; the count never exceeds it.
    pub fn next_attempt(&mut self) -> Option<u32> {
        if self.is_exhausted() {
            return None;
        }
        self.attempts += 1;
        Some(self.attempts)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
