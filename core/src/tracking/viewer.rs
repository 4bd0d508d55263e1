use serde::{Deserialize, Serialize};

/// Default viewer coordinates (San Francisco) shown until a lookup resolves.
pub const DEFAULT_VIEWER_LATITUDE: f64 = 37.7749;
pub const DEFAULT_VIEWER_LONGITUDE: f64 = -122.4194;

/// Outcome of a successful IP geolocation lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub city: Option<String>,
    pub ip: Option<String>,
}

/// Where the viewer is, as far as their public IP tells us.
///
/// Starts loading with default coordinates and resolves exactly once; a
/// failed lookup keeps the defaults but still leaves the loading state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub city: Option<String>,
    pub is_loading: bool,
}

impl ViewerLocation {
    pub fn pending(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            country: None,
            city: None,
            is_loading: true,
        }
    }

    /// Applies a successful lookup. Ignored once the location has resolved.
    pub fn resolve(&mut self, location: &ResolvedLocation) -> bool {
        if !self.is_loading {
            return false;
        }
        self.latitude = location.latitude;
        self.longitude = location.longitude;
        self.country = location.country.clone();
        self.city = location.city.clone();
        self.is_loading = false;
        true
    }

    /// Leaves the loading state with the default coordinates retained.
    pub fn fail(&mut self) -> bool {
        if !self.is_loading {
            return false;
        }
        self.is_loading = false;
        true
    }

    /// `"city, country"` when both are known.
    pub fn place_label(&self) -> Option<String> {
        match (&self.city, &self.country) {
            (Some(city), Some(country)) => Some(format!("{city}, {country}")),
            _ => None,
        }
    }
}

impl Default for ViewerLocation {
    fn default() -> Self {
        Self::pending(DEFAULT_VIEWER_LATITUDE, DEFAULT_VIEWER_LONGITUDE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lisbon() -> ResolvedLocation {
        ResolvedLocation {
            latitude: 38.72,
            longitude: -9.14,
            country: Some("Portugal".into()),
            city: Some("Lisbon".into()),
            ip: Some("203.0.113.7".into()),
        }
    }

    #[test]
    fn resolve_moves_out_of_loading() {
        let mut viewer = ViewerLocation::default();
        assert!(viewer.resolve(&lisbon()));
        assert!(!viewer.is_loading);
        assert_eq!(viewer.place_label().as_deref(), Some("Lisbon, Portugal"));
    }

    #[test]
    fn failure_keeps_default_coordinates() {
        let mut viewer = ViewerLocation::default();
        assert!(viewer.fail());
        assert!(!viewer.is_loading);
        assert_eq!(viewer.latitude, DEFAULT_VIEWER_LATITUDE);
        assert_eq!(viewer.longitude, DEFAULT_VIEWER_LONGITUDE);
    }

    #[test]
    fn location_resolves_only_once() {
        let mut viewer = ViewerLocation::default();
        viewer.fail();
        assert!(!viewer.resolve(&lisbon()));
        assert_eq!(viewer.latitude, DEFAULT_VIEWER_LATITUDE);
        assert!(!viewer.is_loading);
    }
}
