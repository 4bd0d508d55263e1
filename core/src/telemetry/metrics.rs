use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters for the polling tasks, surfaced on the diagnostics endpoint.
pub struct PollMetrics {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub position_fixes: usize,
    pub duplicates_skipped: usize,
    pub position_failures: usize,
    pub discarded_after_cancel: usize,
    pub geolocation_resolved: usize,
    pub geolocation_failed: usize,
}

impl PollMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn bump(&self, field: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            field(&mut metrics);
        }
    }

    pub fn record_fix(&self) {
        self.bump(|m| m.position_fixes += 1);
    }

    pub fn record_duplicate(&self) {
        self.bump(|m| m.duplicates_skipped += 1);
    }

    pub fn record_failure(&self) {
        self.bump(|m| m.position_failures += 1);
    }

    pub fn record_discarded(&self) {
        self.bump(|m| m.discarded_after_cancel += 1);
    }

    pub fn record_geolocation(&self, resolved: bool) {
        if resolved {
            self.bump(|m| m.geolocation_resolved += 1);
        } else {
            self.bump(|m| m.geolocation_failed += 1);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for PollMetrics {
    fn default() -> Self {
        Self::new()
    }
}
