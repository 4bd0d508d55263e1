use chrono::{DateTime, Utc};
use isscore::scene::{SceneSnapshot, TextureSet};
use isscore::telemetry::MetricsSnapshot;
use isscore::tracking::{StatusReport, TrackingSession};
use isscore::PositionFix;
use serde::{Deserialize, Serialize};

pub const SCENE_UNAVAILABLE: &str =
    "3D visualization not available. ISS position data is still shown below.";

/// Whether a globe can be drawn or only the text cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    Scene,
    TextOnly,
}

/// Payload served on `/state` for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardModel {
    pub status: StatusReport,
    pub scene: Option<SceneSnapshot>,
    pub fallback: Option<String>,
}

impl DashboardModel {
    pub fn capture(
        session: &TrackingSession,
        textures: &TextureSet,
        mode: RenderMode,
        now: DateTime<Utc>,
    ) -> Self {
        let status = StatusReport::from_session(session, now);
        match mode {
            RenderMode::Scene => Self {
                status,
                scene: Some(SceneSnapshot::compose(session, textures)),
                fallback: None,
            },
            RenderMode::TextOnly => Self {
                status,
                scene: None,
                fallback: Some(SCENE_UNAVAILABLE.to_string()),
            },
        }
    }
}

/// Development-only tracking details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    pub environment: String,
    pub trail_points: usize,
    pub trail_capacity: usize,
    pub tracking_time: String,
    pub session_created: DateTime<Utc>,
    pub session_started: Option<DateTime<Utc>>,
    pub metrics: MetricsSnapshot,
    pub trail: Vec<PositionFix>,
}

impl Diagnostics {
    pub fn capture(session: &TrackingSession, metrics: MetricsSnapshot, now: DateTime<Utc>) -> Self {
        let history = session.history();
        Self {
            environment: "Development Server".to_string(),
            trail_points: history.len(),
            trail_capacity: history.capacity(),
            tracking_time: history.tracking_duration(now),
            session_created: session.created_at(),
            session_started: history.session_started(),
            metrics,
            trail: history.iter().cloned().collect(),
        }
    }
}
