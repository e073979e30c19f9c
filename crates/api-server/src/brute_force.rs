use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::config::BruteForceConfig;

struct FailureRecord {
    count: u32,
    first_failure: Instant,
    locked_until: Option<Instant>,
}

/// Per-client login failure tracker with automatic lockout.
///
/// After `max_failures` failed logins within `window`, the client is locked
/// out for `lockout`. A successful login clears its record.
pub struct BruteForceGuard {
    failures: DashMap<String, FailureRecord>,
    max_failures: u32,
    window: Duration,
    lockout: Duration,
}

impl BruteForceGuard {
    pub fn new(config: BruteForceConfig) -> Self {
        tracing::info!(
            "Login guard: max {} failures in {}s window, {}s lockout",
            config.max_failures,
            config.window_secs,
            config.lockout_secs
        );

        Self {
            failures: DashMap::new(),
            max_failures: config.max_failures.max(1),
            window: Duration::from_secs(config.window_secs),
            lockout: Duration::from_secs(config.lockout_secs),
        }
    }

    pub fn record_failure(&self, client: &str) {
        let now = Instant::now();
        let mut entry = self
            .failures
            .entry(client.to_string())
            .or_insert(FailureRecord {
                count: 0,
                first_failure: now,
                locked_until: None,
            });
        let record = entry.value_mut();

        if now.duration_since(record.first_failure) > self.window {
            record.count = 0;
            record.first_failure = now;
            record.locked_until = None;
        }

        record.count += 1;
        if record.count >= self.max_failures {
            record.locked_until = Some(now + self.lockout);
            tracing::warn!(
                "Login lockout triggered for {} ({} failures in window)",
                client,
                record.count
            );
        }
    }

    pub fn is_locked(&self, client: &str) -> bool {
        self.failures
            .get(client)
            .and_then(|record| record.locked_until)
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    pub fn record_success(&self, client: &str) {
        self.failures.remove(client);
    }

    /// Drop records older than window + lockout. Run periodically.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let max_age = self.window + self.lockout;
        self.failures
            .retain(|_, record| now.duration_since(record.first_failure) < max_age);
    }

    pub fn tracked(&self) -> usize {
        self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(max_failures: u32, lockout_secs: u64) -> BruteForceGuard {
        BruteForceGuard::new(BruteForceConfig {
            max_failures,
            window_secs: 300,
            lockout_secs,
        })
    }

    #[test]
    fn locks_after_max_failures() {
        let guard = guard(3, 900);
        guard.record_failure("10.0.0.1");
        guard.record_failure("10.0.0.1");
        assert!(!guard.is_locked("10.0.0.1"));
        guard.record_failure("10.0.0.1");
        assert!(guard.is_locked("10.0.0.1"));
        assert!(!guard.is_locked("10.0.0.2"));
    }

    #[test]
    fn success_clears_failures() {
        let guard = guard(2, 900);
        guard.record_failure("client");
        guard.record_success("client");
        guard.record_failure("client");
        assert!(!guard.is_locked("client"));
    }

    #[test]
    fn cleanup_drops_stale_records() {
        let guard = BruteForceGuard::new(BruteForceConfig {
            max_failures: 5,
            window_secs: 0,
            lockout_secs: 0,
        });
        guard.record_failure("client");
        std::thread::sleep(Duration::from_millis(5));
        guard.cleanup();
        assert_eq!(guard.tracked(), 0);
    }
}
