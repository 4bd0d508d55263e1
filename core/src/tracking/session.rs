use crate::prelude::PositionFix;
use crate::tracking::history::PositionHistory;
use crate::tracking::viewer::{ResolvedLocation, ViewerLocation};
use chrono::{DateTime, Duration, Utc};
use log::info;
use std::sync::{Arc, RwLock};

/// Where the station is drawn before the first successful poll.
pub const DEFAULT_ISS_POSITION: (f64, f64) = (40.0, -75.0);

/// Session state shared between the polling tasks and the bridge.
pub type SharedSession = Arc<RwLock<TrackingSession>>;

/// Process-lifetime tracking state. Nothing here is persisted.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    current: PositionFix,
    history: PositionHistory,
    viewer: ViewerLocation,
    viewer_ip: Option<String>,
    last_fetched: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TrackingSession {
    pub fn new(trail_capacity: usize, now: DateTime<Utc>) -> Self {
        info!("Starting fresh ISS tracking session");
        let (latitude, longitude) = DEFAULT_ISS_POSITION;
        Self {
            current: PositionFix::new(latitude, longitude, now),
            history: PositionHistory::with_capacity(trail_capacity),
            viewer: ViewerLocation::default(),
            viewer_ip: None,
            last_fetched: None,
            created_at: now,
        }
    }

    pub fn shared(trail_capacity: usize) -> SharedSession {
        Arc::new(RwLock::new(Self::new(trail_capacity, Utc::now())))
    }

    /// Records a successful poll. The current position and fetch time always
    /// advance; the trail only grows when the station actually moved.
    pub fn record_fix(&mut self, fix: PositionFix) -> bool {
        self.last_fetched = Some(fix.observed_at);
        self.current = fix.clone();
        self.history.append(fix)
    }

    pub fn resolve_viewer(&mut self, location: &ResolvedLocation) -> bool {
        let applied = self.viewer.resolve(location);
        if applied {
            self.viewer_ip = location.ip.clone();
        }
        applied
    }

    pub fn fail_viewer(&mut self) -> bool {
        self.viewer.fail()
    }

    pub fn current_position(&self) -> &PositionFix {
        &self.current
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    pub fn viewer(&self) -> &ViewerLocation {
        &self.viewer
    }

    pub fn viewer_ip(&self) -> Option<&str> {
        self.viewer_ip.as_deref()
    }

    pub fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.last_fetched
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Age of the most recent successful fetch.
    pub fn staleness(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_fetched
            .map(|fetched| (now - fetched).max(Duration::zero()))
    }
}
