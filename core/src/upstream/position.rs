use crate::prelude::{GeoCoordinate, TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};

/// Satellite position integrations. One is pinned per deployment; payloads
/// are decoded strictly against the chosen feed's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PositionFeed {
    #[default]
    OpenNotify,
    WhereTheIss,
}

impl PositionFeed {
    pub fn default_url(&self) -> &'static str {
        match self {
            PositionFeed::OpenNotify => "http://api.open-notify.org/iss-now.json",
            PositionFeed::WhereTheIss => "https://api.wheretheiss.at/v1/satellites/25544",
        }
    }

    pub fn decode(&self, body: &[u8]) -> TrackerResult<GeoCoordinate> {
        let coordinate = match self {
            PositionFeed::OpenNotify => {
                let response: OpenNotifyResponse = serde_json::from_slice(body)
                    .map_err(|e| TrackerError::Malformed(format!("open-notify: {e}")))?;
                response.coordinate()?
            }
            PositionFeed::WhereTheIss => {
                let response: WhereTheIssResponse = serde_json::from_slice(body)
                    .map_err(|e| TrackerError::Malformed(format!("where-the-iss: {e}")))?;
                GeoCoordinate::new(response.latitude, response.longitude)
            }
        };
        coordinate.validated()
    }
}

/// `iss-now.json` payload; coordinates arrive as decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenNotifyResponse {
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub iss_position: OpenNotifyPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenNotifyPosition {
    pub latitude: String,
    pub longitude: String,
}

impl OpenNotifyResponse {
    pub fn coordinate(&self) -> TrackerResult<GeoCoordinate> {
        if self.message != "success" {
            return Err(TrackerError::Upstream(format!(
                "open-notify message {:?}",
                self.message
            )));
        }
        let latitude = parse_degrees("latitude", &self.iss_position.latitude)?;
        let longitude = parse_degrees("longitude", &self.iss_position.longitude)?;
        Ok(GeoCoordinate::new(latitude, longitude))
    }
}

fn parse_degrees(field: &str, raw: &str) -> TrackerResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| TrackerError::Malformed(format!("{field} {raw:?}: {e}")))
}

/// wheretheiss.at satellite payload with numeric coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhereTheIssResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timestamp: Option<i64>,
}
