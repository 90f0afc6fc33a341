//! Rolling-window call counter backed by an injected [`CallStore`].
//!
//! The quota is 100 calls per trailing hour. Every read prunes stale
//! timestamps relative to the caller's "now"; only `record_call` writes.

mod store;

pub use store::{CallStore, FileStore, MemoryStore, StoreError};

use crate::types::RateLimitStatus;
use log::{info, warn};

pub const DEFAULT_LIMIT: u32 = 100;
pub const DEFAULT_WINDOW_MS: i64 = 60 * 60 * 1000;
pub const WARN_PERCENT: u32 = 80;

/// Outcome of persisting the call history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreHealth {
    Persisted,
    /// The write failed; the history lives in memory until the process exits.
    Degraded { reason: String },
}

impl StoreHealth {
    pub fn is_degraded(&self) -> bool {
        matches!(self, StoreHealth::Degraded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquire {
    pub allowed: bool,
    pub status: RateLimitStatus,
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn format_ms(ms: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms)
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

/// Keep only the timestamps newer than `now - window`. Input order is irrelevant.
pub fn prune(calls: &[i64], now: i64, window_ms: i64) -> Vec<i64> {
    let cutoff = now - window_ms;
    calls.iter().copied().filter(|&t| t > cutoff).collect()
}

pub struct RateLimiter<S: CallStore> {
    store: S,
    limit: u32,
    window_ms: i64,
    // Set after a failed save; wins over the store until the process exits.
    unsaved: Option<Vec<i64>>,
}

impl<S: CallStore> RateLimiter<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, DEFAULT_LIMIT, DEFAULT_WINDOW_MS)
    }

    pub fn with_policy(store: S, limit: u32, window_ms: i64) -> Self {
        Self {
            store,
            limit: limit.max(1),
            window_ms,
            unsaved: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn history(&self) -> Vec<i64> {
        if let Some(calls) = &self.unsaved {
            return calls.clone();
        }
        match self.store.load() {
            Ok(calls) => calls,
            Err(e) => {
                warn!("ignoring unreadable rate limit history: {}", e);
                Vec::new()
            }
        }
    }

    pub fn current_status(&self) -> RateLimitStatus {
        self.current_status_at(now_ms())
    }

    pub fn current_status_at(&self, now: i64) -> RateLimitStatus {
        let valid = prune(&self.history(), now, self.window_ms);
        self.status_for(&valid)
    }

    pub fn record_call(&mut self) -> StoreHealth {
        self.record_call_at(now_ms())
    }

    pub fn record_call_at(&mut self, now: i64) -> StoreHealth {
        let mut calls = prune(&self.history(), now, self.window_ms);
        calls.push(now);
        info!(
            "recorded upstream call ({}/{} in window)",
            calls.len(),
            self.limit
        );
        match self.store.save(&calls) {
            Ok(()) => {
                self.unsaved = None;
                StoreHealth::Persisted
            }
            Err(e) => {
                warn!("rate limit history not persisted: {}", e);
                self.unsaved = Some(calls);
                StoreHealth::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn try_acquire(&self) -> Acquire {
        self.try_acquire_at(now_ms())
    }

    pub fn try_acquire_at(&self, now: i64) -> Acquire {
        let status = self.current_status_at(now);
        Acquire {
            allowed: status.remaining > 0,
            status,
        }
    }

    fn status_for(&self, valid: &[i64]) -> RateLimitStatus {
        let count = u32::try_from(valid.len()).unwrap_or(u32::MAX);
        let remaining = self.limit.saturating_sub(count);
        let percent_used = ((count as f64 / self.limit as f64) * 100.0).round() as u32;
        let resets_at = valid
            .iter()
            .min()
            .map(|oldest| format_ms(oldest + self.window_ms));
        let warning = if count >= self.limit {
            Some(format!(
                "Rate limit reached ({}/{} calls in the last hour). Retry after {}.",
                count,
                self.limit,
                resets_at.as_deref().unwrap_or("the window resets")
            ))
        } else if count.saturating_mul(100) >= self.limit.saturating_mul(WARN_PERCENT) {
            Some(format!(
                "Approaching rate limit: {}/{} calls used in the last hour ({} remaining).",
                count, self.limit, remaining
            ))
        } else {
            None
        };
        RateLimitStatus {
            count,
            limit: self.limit,
            remaining,
            percent_used,
            resets_at,
            warning,
        }
    }
}
