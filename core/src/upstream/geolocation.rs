use crate::prelude::{GeoCoordinate, TrackerError, TrackerResult};
use crate::tracking::viewer::ResolvedLocation;
use serde::{Deserialize, Serialize};

/// Viewer geolocation integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GeolocationProvider {
    /// Single request to ip-api.com, keyed by the caller's address.
    #[default]
    IpApi,
    /// ipify for the public address, then ipapi.co for that address.
    IpifyChain,
}

pub const IP_API_URL: &str = "http://ip-api.com/json/";
pub const IPIFY_URL: &str = "https://api.ipify.org?format=json";
pub const IPAPI_CO_BASE_URL: &str = "https://ipapi.co";

/// ip-api.com response. Only the fields we display are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpApiResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub query: Option<String>,
}

impl IpApiResponse {
    pub fn decode(body: &[u8]) -> TrackerResult<Self> {
        serde_json::from_slice(body).map_err(|e| TrackerError::Malformed(format!("ip-api: {e}")))
    }

    pub fn into_location(self) -> TrackerResult<ResolvedLocation> {
        if self.status != "success" {
            return Err(TrackerError::Upstream(format!(
                "ip-api status {:?}: {}",
                self.status,
                self.message.unwrap_or_default()
            )));
        }
        let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
            return Err(TrackerError::Malformed("ip-api: missing lat/lon".into()));
        };
        let coordinate = GeoCoordinate::new(lat, lon).validated()?;
        Ok(ResolvedLocation {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            country: self.country,
            city: self.city,
            ip: self.query,
        })
    }
}

/// ipify response carrying the caller's public address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpifyResponse {
    pub ip: String,
}

impl IpifyResponse {
    pub fn decode(body: &[u8]) -> TrackerResult<String> {
        let response: IpifyResponse = serde_json::from_slice(body)
            .map_err(|e| TrackerError::Malformed(format!("ipify: {e}")))?;
        let ip = response.ip.trim();
        if ip.is_empty() {
            return Err(TrackerError::Malformed("ipify: empty address".into()));
        }
        Ok(ip.to_string())
    }
}

/// ipapi.co per-address response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpapiCoResponse {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub error: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl IpapiCoResponse {
    pub fn url_for(base: &str, ip: &str) -> String {
        format!("{}/{}/json/", base.trim_end_matches('/'), ip)
    }

    pub fn decode(body: &[u8]) -> TrackerResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| TrackerError::Malformed(format!("ipapi.co: {e}")))
    }

    pub fn into_location(self, ip: &str) -> TrackerResult<ResolvedLocation> {
        if self.error.unwrap_or(false) {
            return Err(TrackerError::Upstream(format!(
                "ipapi.co: {}",
                self.reason.unwrap_or_else(|| "unknown error".into())
            )));
        }
        let (Some(lat), Some(lon)) = (self.latitude, self.longitude) else {
            return Err(TrackerError::Malformed(
                "ipapi.co: missing latitude/longitude".into(),
            ));
        };
        let coordinate = GeoCoordinate::new(lat, lon).validated()?;
        Ok(ResolvedLocation {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            country: self.country_name,
            city: self.city,
            ip: Some(ip.to_string()),
        })
    }
}
