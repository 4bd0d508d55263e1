use crate::tracking::session::TrackingSession;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MS_PER_HOUR: i64 = 60 * 60 * 1000;
const MS_PER_MINUTE: i64 = 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateAxis {
    Latitude,
    Longitude,
}

/// Formats `value` as `"{abs:.2}° {hemisphere}"`, e.g. `"122.42° W"`.
pub fn format_coordinate(value: f64, axis: CoordinateAxis) -> String {
    let hemisphere = match (axis, value >= 0.0) {
        (CoordinateAxis::Latitude, true) => "N",
        (CoordinateAxis::Latitude, false) => "S",
        (CoordinateAxis::Longitude, true) => "E",
        (CoordinateAxis::Longitude, false) => "W",
    };
    format!("{:.2}° {}", round_half_up_cents(value.abs()), hemisphere)
}

/// `{:.2}` rounds exact ties to even; the cards round them up, so
/// `12.125` reads `12.13`. Ties at two decimals are exactly the odd eighths.
fn round_half_up_cents(magnitude: f64) -> f64 {
    let eighths = magnitude * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 == 1.0 {
        (magnitude * 100.0).round() / 100.0
    } else {
        magnitude
    }
}

pub fn format_tracking_duration(started: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(started) = started else {
        return "Just started".to_string();
    };

    let elapsed_ms = (now - started).num_milliseconds().max(0);
    let hours = elapsed_ms / MS_PER_HOUR;
    let minutes = (elapsed_ms % MS_PER_HOUR) / MS_PER_MINUTE;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Wall-clock time of day such as `"3:04:05 PM"`.
pub fn format_time_of_day<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format("%-I:%M:%S %p").to_string()
}

pub fn format_local_time(at: DateTime<Utc>) -> String {
    format_time_of_day(&at.with_timezone(&Local))
}

/// Everything the status cards show, pre-formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub iss_latitude: String,
    pub iss_longitude: String,
    pub last_updated: String,
    pub staleness_secs: Option<i64>,
    pub viewer_loading: bool,
    pub viewer_place: Option<String>,
    pub viewer_latitude: String,
    pub viewer_longitude: String,
    pub viewer_ip: Option<String>,
    pub trail_points: usize,
    pub tracking_time: String,
}

impl StatusReport {
    pub fn from_session(session: &TrackingSession, now: DateTime<Utc>) -> Self {
        Self::build(session, now, format_local_time)
    }

    /// Same as [`StatusReport::from_session`] with a caller-chosen clock
    /// formatter, so reports can be rendered in a fixed zone.
    pub fn build<F>(session: &TrackingSession, now: DateTime<Utc>, clock: F) -> Self
    where
        F: Fn(DateTime<Utc>) -> String,
    {
        let current = session.current_position();
        let viewer = session.viewer();

        Self {
            iss_latitude: format_coordinate(current.latitude, CoordinateAxis::Latitude),
            iss_longitude: format_coordinate(current.longitude, CoordinateAxis::Longitude),
            last_updated: session.last_fetched().map(&clock).unwrap_or_default(),
            staleness_secs: session.staleness(now).map(|age| age.num_seconds()),
            viewer_loading: viewer.is_loading,
            viewer_place: viewer.place_label(),
            viewer_latitude: format_coordinate(viewer.latitude, CoordinateAxis::Latitude),
            viewer_longitude: format_coordinate(viewer.longitude, CoordinateAxis::Longitude),
            viewer_ip: session.viewer_ip().map(str::to_string),
            trail_points: session.history().len(),
            tracking_time: session.history().tracking_duration(now),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ISS Location")?;
        writeln!(
            f,
            "  Lat: {}, Long: {}",
            self.iss_latitude, self.iss_longitude
        )?;
        writeln!(f, "  Last updated: {}", self.last_updated)?;

        writeln!(f, "Your Location")?;
        if self.viewer_loading {
            writeln!(f, "  Detecting your location...")?;
        } else {
            if let Some(place) = &self.viewer_place {
                writeln!(f, "  {place}")?;
            }
            writeln!(
                f,
                "  Lat: {}, Long: {}",
                self.viewer_latitude, self.viewer_longitude
            )?;
            if let Some(ip) = &self.viewer_ip {
                writeln!(f, "  IP Address: {ip}")?;
            }
        }

        writeln!(f, "Tracking Data")?;
        writeln!(f, "  Trail Points: {}", self.trail_points)?;
        write!(f, "  Tracking Time: {}", self.tracking_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::PositionFix;
    use crate::tracking::viewer::ResolvedLocation;
    use chrono::{Duration, FixedOffset};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 15, 4, 5).unwrap()
    }

    #[test]
    fn coordinates_carry_hemisphere() {
        assert_eq!(
            format_coordinate(37.7749, CoordinateAxis::Latitude),
            "37.77° N"
        );
        assert_eq!(
            format_coordinate(-122.4194, CoordinateAxis::Longitude),
            "122.42° W"
        );
        assert_eq!(format_coordinate(-12.5, CoordinateAxis::Latitude), "12.50° S");
        assert_eq!(format_coordinate(0.0, CoordinateAxis::Longitude), "0.00° E");
    }

    #[test]
    fn exact_ties_round_up() {
        assert_eq!(format_coordinate(12.125, CoordinateAxis::Latitude), "12.13° N");
        assert_eq!(format_coordinate(-45.625, CoordinateAxis::Longitude), "45.63° W");
        assert_eq!(format_coordinate(0.125, CoordinateAxis::Latitude), "0.13° N");
        assert_eq!(format_coordinate(-0.375, CoordinateAxis::Latitude), "0.38° S");
        assert_eq!(format_coordinate(179.875, CoordinateAxis::Longitude), "179.88° E");
        // Values just below a tie are not ties.
        assert_eq!(format_coordinate(1.005, CoordinateAxis::Latitude), "1.00° N");
        assert_eq!(format_coordinate(0.25, CoordinateAxis::Latitude), "0.25° N");
    }

    #[test]
    fn tracking_duration_boundaries() {
        assert_eq!(format_tracking_duration(None, t0()), "Just started");
        assert_eq!(
            format_tracking_duration(Some(t0()), t0() + Duration::seconds(59)),
            "0m"
        );
        assert_eq!(
            format_tracking_duration(Some(t0()), t0() + Duration::minutes(60)),
            "1h 0m"
        );
        assert_eq!(
            format_tracking_duration(Some(t0()), t0() - Duration::minutes(3)),
            "0m"
        );
    }

    #[test]
    fn time_of_day_uses_twelve_hour_clock() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(format_time_of_day(&t0().with_timezone(&utc)), "3:04:05 PM");
    }

    #[test]
    fn report_reflects_loading_viewer() {
        let session = TrackingSession::new(10, t0());
        let report = StatusReport::build(&session, t0(), |_| "x".into());
        assert!(report.viewer_loading);
        assert_eq!(report.last_updated, "");
        assert_eq!(report.tracking_time, "Just started");
        assert_eq!(report.iss_latitude, "40.00° N");
        assert_eq!(report.iss_longitude, "75.00° W");
        assert!(report.to_string().contains("Detecting your location..."));
    }

    #[test]
    fn report_after_fix_and_lookup() {
        let mut session = TrackingSession::new(10, t0());
        session.record_fix(PositionFix::new(-12.3456, 45.678, t0()));
        session.resolve_viewer(&ResolvedLocation {
            latitude: 48.85,
            longitude: 2.35,
            country: Some("France".into()),
            city: Some("Paris".into()),
            ip: Some("198.51.100.4".into()),
        });

        let now = t0() + Duration::seconds(30);
        let report = StatusReport::build(&session, now, |at| format_time_of_day(&at));
        assert_eq!(report.iss_latitude, "12.35° S");
        assert_eq!(report.iss_longitude, "45.68° E");
        assert_eq!(report.last_updated, "3:04:05 PM");
        assert_eq!(report.staleness_secs, Some(30));
        assert_eq!(report.trail_points, 1);

        let text = report.to_string();
        assert!(text.contains("Paris, France"));
        assert!(text.contains("IP Address: 198.51.100.4"));
    }
}
