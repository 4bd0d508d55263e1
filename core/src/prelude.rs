use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Rejects coordinates outside [-90, 90] x [-180, 180] or non-finite values.
    pub fn validated(self) -> TrackerResult<Self> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(TrackerError::OutOfRange(format!(
                "latitude {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(TrackerError::OutOfRange(format!(
                "longitude {}",
                self.longitude
            )));
        }
        Ok(self)
    }
}

/// A single timestamped observation of the station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub observed_at: DateTime<Utc>,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            observed_at,
        }
    }

    pub fn at(coordinate: GeoCoordinate, observed_at: DateTime<Utc>) -> Self {
        Self::new(coordinate.latitude, coordinate.longitude, observed_at)
    }

    pub fn coordinate(&self) -> GeoCoordinate {
        GeoCoordinate::new(self.latitude, self.longitude)
    }
}

/// Common error type for upstream lookups.
#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("upstream rejected request: {0}")]
    Upstream(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("coordinate out of range: {0}")]
    OutOfRange(String),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
