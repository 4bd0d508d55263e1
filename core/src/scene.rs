//! Renderable globe state composed from the tracking session.

use crate::math::projection::{lat_long_to_vector3, Vec3};
use crate::tracking::session::{TrackingSession, DEFAULT_ISS_POSITION};
use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS: f64 = 2.0;
/// Height of the station above the surface, exaggerated for visibility.
pub const ISS_ORBIT_HEIGHT: f64 = 0.3;
pub const USER_MARKER_SCALE: f64 = 1.02;
pub const MAX_TRAIL_POINTS: usize = 100;

const REMOTE_TEXTURE_BASE: &str = "https://unpkg.com/three-globe@2.42.2/example/img";

/// The four Earth textures the globe is shaded with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSet {
    pub day: String,
    pub night: String,
    pub topology: String,
    pub water: String,
}

impl TextureSet {
    pub fn remote() -> Self {
        Self::under(REMOTE_TEXTURE_BASE)
    }

    /// Same file names served from a local static directory.
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            day: format!("{base}/earth-blue-marble.jpg"),
            night: format!("{base}/earth-night.jpg"),
            topology: format!("{base}/earth-topology.png"),
            water: format!("{base}/earth-water.png"),
        }
    }

    /// Directory or URL prefix the textures are loaded from.
    pub fn base(&self) -> &str {
        self.day.rsplit_once('/').map_or("", |(base, _)| base)
    }

    pub fn is_remote(&self) -> bool {
        self.base() == REMOTE_TEXTURE_BASE
    }
}

impl Default for TextureSet {
    fn default() -> Self {
        Self::remote()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub earth_radius: f64,
    pub iss: Vec3,
    pub trail: Vec<Vec3>,
    pub user_marker: Option<Vec3>,
    pub textures: TextureSet,
}

impl SceneSnapshot {
    pub fn compose(session: &TrackingSession, textures: &TextureSet) -> Self {
        let orbit_radius = EARTH_RADIUS + ISS_ORBIT_HEIGHT;

        let (latitude, longitude) = session
            .history()
            .latest()
            .map(|fix| (fix.latitude, fix.longitude))
            .unwrap_or(DEFAULT_ISS_POSITION);
        let iss = lat_long_to_vector3(latitude, longitude, orbit_radius);

        let viewer = session.viewer();
        let user_marker = (!viewer.is_loading).then(|| {
            lat_long_to_vector3(
                viewer.latitude,
                viewer.longitude,
                EARTH_RADIUS * USER_MARKER_SCALE,
            )
        });

        let projected = session
            .history()
            .iter()
            .map(|fix| lat_long_to_vector3(fix.latitude, fix.longitude, orbit_radius));
        let trail = limit_trail(projected);

        Self {
            earth_radius: EARTH_RADIUS,
            iss,
            trail,
            user_marker,
            textures: textures.clone(),
        }
    }
}

/// Keeps the newest finite points; fewer than two points draw no trail.
fn limit_trail(points: impl Iterator<Item = Vec3>) -> Vec<Vec3> {
    let mut valid: Vec<Vec3> = points.filter(Vec3::is_finite).collect();
    if valid.len() > MAX_TRAIL_POINTS {
        valid.drain(..valid.len() - MAX_TRAIL_POINTS);
    }
    if valid.len() < 2 {
        valid.clear();
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::PositionFix;
    use crate::tracking::viewer::ResolvedLocation;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_session_draws_default_position_without_trail() {
        let session = TrackingSession::new(100, t0());
        let scene = SceneSnapshot::compose(&session, &TextureSet::remote());
        assert_eq!(scene.iss, lat_long_to_vector3(40.0, -75.0, 2.3));
        assert!(scene.trail.is_empty());
        assert!(scene.user_marker.is_none());
    }

    #[test]
    fn single_fix_draws_no_trail() {
        let mut session = TrackingSession::new(100, t0());
        session.record_fix(PositionFix::new(5.0, 5.0, t0()));
        let scene = SceneSnapshot::compose(&session, &TextureSet::remote());
        assert!(scene.trail.is_empty());
        assert_eq!(scene.iss, lat_long_to_vector3(5.0, 5.0, 2.3));
    }

    #[test]
    fn trail_is_capped_to_newest_points() {
        let mut session = TrackingSession::new(250, t0());
        for i in 0..150 {
            let lat = -60.0 + i as f64 * 0.5;
            session.record_fix(PositionFix::new(lat, 0.0, t0() + Duration::seconds(i)));
        }
        let scene = SceneSnapshot::compose(&session, &TextureSet::remote());
        assert_eq!(scene.trail.len(), MAX_TRAIL_POINTS);
        assert_eq!(scene.trail.last(), Some(&scene.iss));
        assert_eq!(scene.trail[0], lat_long_to_vector3(-60.0 + 50.0 * 0.5, 0.0, 2.3));
    }

    #[test]
    fn user_marker_appears_once_resolved() {
        let mut session = TrackingSession::new(100, t0());
        session.resolve_viewer(&ResolvedLocation {
            latitude: 0.0,
            longitude: 0.0,
            country: None,
            city: None,
            ip: None,
        });
        let scene = SceneSnapshot::compose(&session, &TextureSet::remote());
        let marker = scene.user_marker.unwrap();
        assert!((marker.magnitude() - 2.04).abs() < 1e-9);
    }

    #[test]
    fn non_finite_points_are_dropped() {
        let points = vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(f64::NAN, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        assert_eq!(limit_trail(points.into_iter()).len(), 2);
    }

    #[test]
    fn local_textures_share_file_names() {
        let textures = TextureSet::under("/static/textures/");
        assert_eq!(textures.day, "/static/textures/earth-blue-marble.jpg");
        assert_eq!(textures.water, "/static/textures/earth-water.png");
        assert!(TextureSet::remote().night.starts_with("https://unpkg.com/"));
    }

    #[test]
    fn texture_base_reports_where_maps_come_from() {
        let local = TextureSet::under("/static/textures/");
        assert_eq!(local.base(), "/static/textures");
        assert!(!local.is_remote());

        let remote = TextureSet::remote();
        assert_eq!(remote.base(), REMOTE_TEXTURE_BASE);
        assert!(remote.is_remote());
    }
}
