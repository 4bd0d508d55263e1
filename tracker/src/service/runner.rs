use crate::service::config::TrackerConfig;
use crate::sources::{http_client, GeolocationClient, HttpPositionSource};
use anyhow::Context;
use isscore::scene::TextureSet;
use isscore::scheduler::{spawn_geolocation_lookup, spawn_position_poll, TaskHandle};
use isscore::telemetry::PollMetrics;
use isscore::tracking::{SharedSession, TrackingSession};
use log::{debug, info};
use std::sync::Arc;

/// Owns the session and starts the polling tasks that feed it.
#[derive(Clone)]
pub struct TrackerService {
    config: TrackerConfig,
    session: SharedSession,
    metrics: Arc<PollMetrics>,
}

/// Handles of the running polling tasks.
pub struct RunningTasks {
    position: TaskHandle,
    geolocation: TaskHandle,
}

impl RunningTasks {
    pub async fn shutdown(self) {
        for handle in [self.position, self.geolocation] {
            let name = handle.name();
            handle.shutdown().await;
            debug!("[{name}] stopped");
        }
        info!("polling tasks stopped");
    }
}

impl TrackerService {
    pub fn new(config: TrackerConfig) -> Self {
        let session = TrackingSession::shared(config.trail_capacity);
        Self {
            config,
            session,
            metrics: Arc::new(PollMetrics::new()),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    pub fn metrics(&self) -> Arc<PollMetrics> {
        self.metrics.clone()
    }

    pub fn textures(&self) -> TextureSet {
        self.config.texture_set()
    }

    /// Spawns both polling tasks on the current runtime.
    pub fn start(&self) -> anyhow::Result<RunningTasks> {
        let client = http_client(self.config.request_timeout())
            .context("building HTTP client for upstream feeds")?;

        let position_source = HttpPositionSource::new(
            client.clone(),
            self.config.position_feed,
            self.config.position_url(),
        );
        let geolocation_source = GeolocationClient::from_config(client, &self.config);

        info!(
            "polling {:?} every {:?}, geolocation via {:?}",
            self.config.position_feed,
            self.config.position_interval(),
            self.config.geolocation
        );

        let position = spawn_position_poll(
            Arc::new(position_source),
            self.session(),
            self.metrics(),
            self.config.position_interval(),
        );
        let geolocation =
            spawn_geolocation_lookup(Arc::new(geolocation_source), self.session(), self.metrics());

        Ok(RunningTasks {
            position,
            geolocation,
        })
    }
}
