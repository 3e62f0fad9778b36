//! Failed-login throttling.
//!
//! Counts rejected sign-in attempts per client key in fixed windows. Only
//! failures are counted; checking never consumes an attempt.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Throttle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Failed attempts allowed per window.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    /// Window duration in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u32,
}

fn default_max_failures() -> u32 {
    10
}

fn default_window_seconds() -> u32 {
    600
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            window_seconds: default_window_seconds(),
        }
    }
}

/// Result of a throttle check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrottleStatus {
    /// The client may attempt a sign-in.
    Allowed { remaining: u32 },
    /// Too many failures in the current window.
    Exceeded { retry_after: Duration },
}

impl ThrottleStatus {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug, Clone)]
struct WindowState {
    failures: u32,
    window_start: DateTime<Utc>,
}

/// Shared failed-login counter. Clones share state.
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    config: ThrottleConfig,
    state: Arc<RwLock<HashMap<String, WindowState>>>,
}

impl LoginThrottle {
    #[must_use]
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn window(&self) -> Duration {
        Duration::seconds(i64::from(self.config.window_seconds))
    }

    /// Checks whether `key` may attempt a sign-in, without counting.
    #[must_use]
    pub fn check(&self, key: &str) -> ThrottleStatus {
        self.check_at(key, Utc::now())
    }

    fn check_at(&self, key: &str, now: DateTime<Utc>) -> ThrottleStatus {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let window = self.window();

        let Some(entry) = state.get(key) else {
            return ThrottleStatus::Allowed {
                remaining: self.config.max_failures,
            };
        };

        if now - entry.window_start >= window {
            return ThrottleStatus::Allowed {
                remaining: self.config.max_failures,
            };
        }

        if entry.failures >= self.config.max_failures {
            return ThrottleStatus::Exceeded {
                retry_after: entry.window_start + window - now,
            };
        }

        ThrottleStatus::Allowed {
            remaining: self.config.max_failures - entry.failures,
        }
    }

    /// Records one failed sign-in for `key`.
    pub fn record_failure(&self, key: &str) {
        self.record_failure_at(key, Utc::now());
    }

    fn record_failure_at(&self, key: &str, now: DateTime<Utc>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let window = self.window();

        // Keys come from a client-supplied header; expired windows must not pile up.
        state.retain(|_, w| now - w.window_start < window);

        let entry = state.entry(key.to_string()).or_insert(WindowState {
            failures: 0,
            window_start: now,
        });
        if now - entry.window_start >= window {
            entry.failures = 0;
            entry.window_start = now;
        }
        entry.failures = entry.failures.saturating_add(1);
    }

    /// Forgets all failures for `key`.
    pub fn reset(&self, key: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.remove(key);
    }

    #[must_use]
    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(max_failures: u32) -> LoginThrottle {
        LoginThrottle::new(ThrottleConfig {
            max_failures,
            window_seconds: 600,
        })
    }

    #[test]
    fn default_is_ten_failures_per_ten_minutes() {
        let config = ThrottleConfig::default();
        assert_eq!(config.max_failures, 10);
        assert_eq!(config.window_seconds, 600);
    }

    #[test]
    fn check_does_not_count() {
        let throttle = throttle(2);
        for _ in 0..5 {
            assert!(throttle.check("10.0.0.1").is_allowed());
        }
        assert_eq!(
            throttle.check("10.0.0.1"),
            ThrottleStatus::Allowed { remaining: 2 }
        );
    }

    #[test]
    fn blocks_after_max_failures() {
        let throttle = throttle(3);
        for _ in 0..3 {
            assert!(throttle.check("10.0.0.1").is_allowed());
            throttle.record_failure("10.0.0.1");
        }
        assert!(!throttle.check("10.0.0.1").is_allowed());
    }

    #[test]
    fn keys_are_isolated() {
        let throttle = throttle(1);
        throttle.record_failure("a");
        assert!(!throttle.check("a").is_allowed());
        assert!(throttle.check("b").is_allowed());
    }

    #[test]
    fn window_expiry_starts_over() {
        let throttle = throttle(1);
        let start = Utc::now();
        throttle.record_failure_at("a", start);
        assert!(!throttle.check_at("a", start + Duration::seconds(599)).is_allowed());

        let later = start + Duration::seconds(600);
        assert!(throttle.check_at("a", later).is_allowed());
        throttle.record_failure_at("a", later);
        assert!(!throttle.check_at("a", later).is_allowed());
    }

    #[test]
    fn exceeded_reports_retry_after() {
        let throttle = throttle(1);
        let start = Utc::now();
        throttle.record_failure_at("a", start);
        match throttle.check_at("a", start + Duration::seconds(100)) {
            ThrottleStatus::Exceeded { retry_after } => {
                assert_eq!(retry_after, Duration::seconds(500));
            }
            other => panic!("expected exceeded, got {other:?}"),
        }
    }

    #[test]
    fn reset_clears_failures() {
        let throttle = throttle(1);
        throttle.record_failure("a");
        throttle.reset("a");
        assert!(throttle.check("a").is_allowed());
    }

    #[test]
    fn expired_windows_are_dropped_on_write() {
        let throttle = throttle(3);
        let start = Utc::now();
        for i in 0..1_000 {
            throttle.record_failure_at(&format!("198.51.100.{i}"), start);
        }
        assert_eq!(throttle.tracked_keys(), 1_000);

        let later = start + Duration::hours(1);
        throttle.record_failure_at("203.0.113.9", later);
        assert_eq!(throttle.tracked_keys(), 1);
        assert_eq!(
            throttle.check_at("203.0.113.9", later),
            ThrottleStatus::Allowed { remaining: 2 }
        );
    }

    #[test]
    fn live_windows_survive_cleanup() {
        let throttle = throttle(1);
        let start = Utc::now();
        throttle.record_failure_at("a", start);
        throttle.record_failure_at("b", start + Duration::seconds(300));
        assert_eq!(throttle.tracked_keys(), 2);
        assert!(!throttle.check_at("a", start + Duration::seconds(300)).is_allowed());
    }

    #[test]
    fn clones_share_state() {
        let throttle = throttle(1);
        let other = throttle.clone();
        other.record_failure("a");
        assert!(!throttle.check("a").is_allowed());
    }
}
