use anyhow::Context;
use isscore::scene::TextureSet;
use isscore::scheduler::DEFAULT_POSITION_INTERVAL;
use isscore::tracking::DEFAULT_TRAIL_CAPACITY;
use isscore::upstream::{GeolocationProvider, PositionFeed};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub position_interval_ms: u64,
    pub trail_capacity: usize,
    pub position_feed: PositionFeed,
    /// Overrides the feed's public endpoint.
    pub position_url: Option<String>,
    pub geolocation: GeolocationProvider,
    pub ip_api_url: Option<String>,
    pub ipify_url: Option<String>,
    pub ipapi_co_url: Option<String>,
    pub request_timeout_ms: u64,
    pub bind: SocketAddr,
    /// Serve textures from this directory instead of the CDN.
    pub local_textures: Option<String>,
    pub report_interval_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            position_interval_ms: DEFAULT_POSITION_INTERVAL.as_millis() as u64,
            trail_capacity: DEFAULT_TRAIL_CAPACITY,
            position_feed: PositionFeed::default(),
            position_url: None,
            geolocation: GeolocationProvider::default(),
            ip_api_url: None,
            ipify_url: None,
            ipapi_co_url: None,
            request_timeout_ms: 10_000,
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
            local_textures: None,
            report_interval_ms: 5_000,
        }
    }
}

impl TrackerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading tracker config {}", path_ref.display()))?;
        let config: TrackerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing tracker config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn position_interval(&self) -> Duration {
        Duration::from_millis(self.position_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms.max(1))
    }

    pub fn position_url(&self) -> String {
        self.position_url
            .clone()
            .unwrap_or_else(|| self.position_feed.default_url().to_string())
    }

    pub fn texture_set(&self) -> TextureSet {
        match &self.local_textures {
            Some(base) => TextureSet::under(base),
            None => TextureSet::remote(),
        }
    }
}
