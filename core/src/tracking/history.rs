use crate::prelude::PositionFix;
use crate::tracking::status::format_tracking_duration;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Default number of fixes kept for the orbital trail.
pub const DEFAULT_TRAIL_CAPACITY: usize = 100;

/// Minimum movement on either axis before a fix counts as new.
pub const MOVEMENT_EPSILON_DEG: f64 = 0.01;

/// Capacity-bounded, oldest-first sequence of recently observed fixes.
///
/// Consecutive fixes that have not moved by more than
/// [`MOVEMENT_EPSILON_DEG`] are dropped, so a stalled upstream does not pile
/// up duplicate trail points.
#[derive(Debug, Clone)]
pub struct PositionHistory {
    fixes: VecDeque<PositionFix>,
    capacity: usize,
    session_started: Option<DateTime<Utc>>,
}

impl PositionHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            fixes: VecDeque::with_capacity(capacity),
            capacity,
            session_started: None,
        }
    }

    /// Stores `fix` if it moved past the epsilon, evicting the oldest entries
    /// beyond capacity. Returns whether the fix was stored.
    pub fn append(&mut self, fix: PositionFix) -> bool {
        if let Some(last) = self.fixes.back() {
            let moved = (fix.latitude - last.latitude).abs() > MOVEMENT_EPSILON_DEG
                || (fix.longitude - last.longitude).abs() > MOVEMENT_EPSILON_DEG;
            if !moved {
                return false;
            }
        }

        self.session_started.get_or_insert(fix.observed_at);
        self.fixes.push_back(fix);
        while self.fixes.len() > self.capacity {
            self.fixes.pop_front();
        }
        true
    }

    pub fn latest(&self) -> Option<&PositionFix> {
        self.fixes.back()
    }

    /// Most recent fix, or `default` while nothing has been recorded.
    pub fn latest_or<'a>(&'a self, default: &'a PositionFix) -> &'a PositionFix {
        self.fixes.back().unwrap_or(default)
    }

    /// Time of the first fix accepted this session. Survives FIFO eviction.
    pub fn session_started(&self) -> Option<DateTime<Utc>> {
        self.session_started
    }

    /// Elapsed tracking time as `"{h}h {m}m"`, `"{m}m"` or `"Just started"`.
    pub fn tracking_duration(&self, now: DateTime<Utc>) -> String {
        format_tracking_duration(self.session_started, now)
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &PositionFix> {
        self.fixes.iter()
    }
}

impl Default for PositionHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TRAIL_CAPACITY)
    }
}
