use crate::bridge::model::{DashboardModel, Diagnostics, RenderMode, SCENE_UNAVAILABLE};
use anyhow::Context;
use chrono::Utc;
use isscore::environment::is_development_host;
use isscore::scene::{SceneSnapshot, TextureSet};
use isscore::telemetry::PollMetrics;
use isscore::tracking::SharedSession;
use log::{info, warn};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::http::StatusCode;
use warp::Filter;

/// Read-only view of the tracker shared with the HTTP routes.
#[derive(Clone)]
pub struct BridgeState {
    session: SharedSession,
    metrics: Arc<PollMetrics>,
    textures: TextureSet,
    mode: RenderMode,
}

impl BridgeState {
    pub fn new(
        session: SharedSession,
        metrics: Arc<PollMetrics>,
        textures: TextureSet,
        mode: RenderMode,
    ) -> Self {
        Self {
            session,
            metrics,
            textures,
            mode,
        }
    }

    fn dashboard(&self) -> Option<DashboardModel> {
        let guard = self.session.read().ok()?;
        Some(DashboardModel::capture(
            &guard,
            &self.textures,
            self.mode,
            Utc::now(),
        ))
    }

    fn scene(&self) -> Option<SceneSnapshot> {
        if self.mode == RenderMode::TextOnly {
            return None;
        }
        let guard = self.session.read().ok()?;
        Some(SceneSnapshot::compose(&guard, &self.textures))
    }

    fn diagnostics(&self) -> Option<Diagnostics> {
        let guard = self.session.read().ok()?;
        Some(Diagnostics::capture(
            &guard,
            self.metrics.snapshot(),
            Utc::now(),
        ))
    }
}

/// Builds the bridge routes: `/state`, `/scene` and the development-only
/// `/diagnostics`.
pub fn routes(
    state: BridgeState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let state_route = warp::path("state")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: BridgeState| match state.dashboard() {
            Some(model) => warp::reply::with_status(warp::reply::json(&model), StatusCode::OK),
            None => unavailable("session state unavailable"),
        });

    let scene_route = warp::path("scene")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: BridgeState| match state.scene() {
            Some(scene) => warp::reply::with_status(warp::reply::json(&scene), StatusCode::OK),
            None => warp::reply::with_status(
                warp::reply::json(&json!({ "fallback": SCENE_UNAVAILABLE })),
                StatusCode::NOT_FOUND,
            ),
        });

    let diagnostics_route = warp::path("diagnostics")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::header::optional::<String>("host"))
        .and(state_filter)
        .map(|host: Option<String>, state: BridgeState| {
            if !host.as_deref().is_some_and(is_development_host) {
                return warp::reply::with_status(
                    warp::reply::json(&json!({ "error": "not found" })),
                    StatusCode::NOT_FOUND,
                );
            }
            match state.diagnostics() {
                Some(diagnostics) => {
                    warp::reply::with_status(warp::reply::json(&diagnostics), StatusCode::OK)
                }
                None => unavailable("session state unavailable"),
            }
        });

    state_route.or(scene_route).or(diagnostics_route)
}

fn unavailable(message: &str) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({ "error": message })),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

/// Local HTTP server exposing the tracker state to the dashboard.
pub struct HttpBridge {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<()>,
}

impl HttpBridge {
    /// Binds `addr` and serves the routes on the current runtime.
    pub fn start(state: BridgeState, addr: SocketAddr) -> anyhow::Result<Self> {
        let (shutdown, signal) = oneshot::channel::<()>();
        let (bound, server) = warp::serve(routes(state))
            .try_bind_with_graceful_shutdown(addr, async move {
                signal.await.ok();
            })
            .with_context(|| format!("binding HTTP bridge on {addr}"))?;
        info!("HTTP bridge listening on http://{}", bound);

        Ok(Self {
            addr: bound,
            shutdown: Some(shutdown),
            server: tokio::spawn(server),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn publish_status(&self, message: &str) {
        println!("[BRIDGE] {}", message);
    }

    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(err) = self.server.await {
            warn!("HTTP bridge ended abnormally: {}", err);
        }
    }
}
