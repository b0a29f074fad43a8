//! Authentication attempt throttle
//!
//! Sliding window of attempt timestamps per originating address. Every
//! admission records an attempt before the credential service is touched;
//! successful authentication does not clear the window. Stale timestamps
//! are pruned lazily, on the next check for the same address.

use dashmap::DashMap;
use relay_common::ThrottleConfig;
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// Per-address sliding-window authentication throttle
pub struct AuthThrottle {
    /// Rolling attempt timestamps per address
    attempts: DashMap<IpAddr, Vec<Instant>>,

    /// Attempts allowed inside one window
    max_attempts: usize,

    /// Window length
    window: Duration,
}

impl AuthThrottle {
    /// Create a throttle from configuration
    #[must_use]
    pub fn new(config: &ThrottleConfig) -> Self {
        Self::with_limits(
            config.max_attempts as usize,
            Duration::from_secs(config.window_secs),
        )
    }

    /// Create a throttle with explicit limits
    #[must_use]
    pub fn with_limits(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: DashMap::new(),
            max_attempts,
            window,
        }
    }

    /// Record an authentication attempt from `addr` and decide it
    ///
    /// Returns true if the attempt may proceed to token validation. At the
    /// limit the attempt is refused and not recorded; the window clears
    /// only by time passing.
    pub fn check(&self, addr: IpAddr) -> bool {
        let now = Instant::now();
        let mut entry = self.attempts.entry(addr).or_default();

        entry.retain(|at| now.duration_since(*at) < self.window);

        if entry.len() >= self.max_attempts {
            tracing::warn!(
                address = %addr,
                attempts = entry.len(),
                window_secs = self.window.as_secs(),
                "Authentication attempt throttled"
            );
            return false;
        }

        entry.push(now);
        true
    }

    /// Attempts currently inside the window for `addr`
    pub fn attempt_count(&self, addr: IpAddr) -> usize {
        let now = Instant::now();
        self.attempts
            .get(&addr)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|at| now.duration_since(**at) < self.window)
                    .count()
            })
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for AuthThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthThrottle")
            .field("addresses", &self.attempts.len())
            .field("max_attempts", &self.max_attempts)
            .field("window", &self.window)
            .finish()
    }
}
