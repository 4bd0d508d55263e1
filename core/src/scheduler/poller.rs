use crate::prelude::PositionFix;
use crate::scheduler::sources::{GeolocationSource, PositionSource};
use crate::scheduler::task::{Liveness, TaskHandle};
use crate::telemetry::{PollMetrics, TaskLog};
use crate::tracking::session::SharedSession;
use chrono::Utc;
use log::{debug, info};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POSITION_INTERVAL: Duration = Duration::from_millis(5_000);

const POSITION_TASK: &str = "iss-position";
const GEOLOCATION_TASK: &str = "viewer-geolocation";

/// Polls `source` immediately and then every `interval`.
///
/// Every tick issues its own request, so a slow response never delays the
/// next tick. Failed ticks leave the session untouched.
pub fn spawn_position_poll<S>(
    source: Arc<S>,
    session: SharedSession,
    metrics: Arc<PollMetrics>,
    interval: Duration,
) -> TaskHandle
where
    S: PositionSource + Send + Sync + 'static,
{
    TaskHandle::spawn(POSITION_TASK, move |mut liveness| async move {
        let guard = liveness.clone();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = liveness.cancelled() => break,
                _ = ticker.tick() => {
                    let source = source.clone();
                    let session = session.clone();
                    let metrics = metrics.clone();
                    let guard = guard.clone();
                    tokio::spawn(async move {
                        poll_position_once(source.as_ref(), &session, &metrics, &guard).await;
                    });
                }
            }
        }
        debug!("[{}] poll loop exited", POSITION_TASK);
    })
}

async fn poll_position_once<S>(
    source: &S,
    session: &SharedSession,
    metrics: &PollMetrics,
    liveness: &Liveness,
) where
    S: PositionSource + Sync,
{
    let log = TaskLog::new(POSITION_TASK);
    let result = source.fetch_position().await;

    if !liveness.is_alive() {
        metrics.record_discarded();
        log.discarded("position response");
        return;
    }

    match result {
        Ok(coordinate) => {
            let fix = PositionFix::at(coordinate, Utc::now());
            let mut guard = session.write().unwrap_or_else(PoisonError::into_inner);
            if guard.record_fix(fix) {
                metrics.record_fix();
            } else {
                metrics.record_duplicate();
            }
            debug!(
                "[{}] lat {:.4} lon {:.4}, trail {}",
                POSITION_TASK,
                coordinate.latitude,
                coordinate.longitude,
                guard.history().len()
            );
        }
        Err(err) => {
            metrics.record_failure();
            log.recovered("error fetching ISS position", &err);
        }
    }
}

/// Resolves the viewer's location once. On failure the session keeps the
/// default coordinates and leaves the loading state.
pub fn spawn_geolocation_lookup<G>(
    source: Arc<G>,
    session: SharedSession,
    metrics: Arc<PollMetrics>,
) -> TaskHandle
where
    G: GeolocationSource + Send + Sync + 'static,
{
    TaskHandle::spawn(GEOLOCATION_TASK, move |liveness| async move {
        let log = TaskLog::new(GEOLOCATION_TASK);
        if !liveness.is_alive() {
            return;
        }

        let result = source.locate().await;
        if !liveness.is_alive() {
            metrics.record_discarded();
            log.discarded("geolocation response");
            return;
        }

        // A poisoned lock must still leave the loading state.
        let mut guard = session.write().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(location) => {
                guard.resolve_viewer(&location);
                metrics.record_geolocation(true);
                info!(
                    "User location detected: {}",
                    guard
                        .viewer()
                        .place_label()
                        .unwrap_or_else(|| "unknown place".into())
                );
            }
            Err(err) => {
                guard.fail_viewer();
                metrics.record_geolocation(false);
                log.recovered("error fetching user location", &err);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{GeoCoordinate, TrackerError, TrackerResult};
    use crate::scheduler::sources::{ChainedGeolocation, IpGeolocator, IpLookup};
    use crate::tracking::session::TrackingSession;
    use crate::tracking::viewer::{
        ResolvedLocation, DEFAULT_VIEWER_LATITUDE, DEFAULT_VIEWER_LONGITUDE,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Replays a scripted sequence of responses, then keeps failing.
    struct ScriptedFeed {
        responses: Mutex<VecDeque<TrackerResult<GeoCoordinate>>>,
    }

    impl ScriptedFeed {
        fn new(responses: Vec<TrackerResult<GeoCoordinate>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }
    }

    impl PositionSource for ScriptedFeed {
        async fn fetch_position(&self) -> TrackerResult<GeoCoordinate> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TrackerError::Transport("script exhausted".into())))
        }
    }

    /// Holds every request until released.
    struct GatedFeed {
        gate: Notify,
    }

    impl PositionSource for GatedFeed {
        async fn fetch_position(&self) -> TrackerResult<GeoCoordinate> {
            self.gate.notified().await;
            Ok(GeoCoordinate::new(10.0, 10.0))
        }
    }

    struct FailingLookup;

    impl IpLookup for FailingLookup {
        async fn public_ip(&self) -> TrackerResult<String> {
            Err(TrackerError::Transport("connection refused".into()))
        }
    }

    struct FailingGeolocator;

    impl IpGeolocator for FailingGeolocator {
        async fn locate_ip(&self, _ip: &str) -> TrackerResult<ResolvedLocation> {
            Err(TrackerError::Upstream("rate limited".into()))
        }
    }

    struct FixedLocation(ResolvedLocation);

    impl GeolocationSource for FixedLocation {
        async fn locate(&self) -> TrackerResult<ResolvedLocation> {
            Ok(self.0.clone())
        }
    }

    async fn settle(handle: &TaskHandle) {
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }
    }

    fn session() -> SharedSession {
        TrackingSession::shared(100)
    }

    fn step(i: usize) -> GeoCoordinate {
        GeoCoordinate::new(-40.0 + i as f64 * 2.0, 150.0 - i as f64 * 3.0)
    }

    #[tokio::test(start_paused = true)]
    async fn twelve_polls_build_a_twelve_point_trail() {
        let feed = ScriptedFeed::new((0..12).map(|i| Ok(step(i))).collect());
        let session = session();
        let metrics = Arc::new(PollMetrics::new());

        let handle = spawn_position_poll(
            feed,
            session.clone(),
            metrics.clone(),
            DEFAULT_POSITION_INTERVAL,
        );
        // Ticks at 0s, 5s, ... 55s.
        tokio::time::sleep(Duration::from_millis(55_100)).await;
        handle.shutdown().await;

        let guard = session.read().unwrap();
        assert_eq!(guard.history().len(), 12);
        let latest = guard.history().latest().unwrap();
        assert_eq!(latest.coordinate(), step(11));
        assert_eq!(guard.current_position().coordinate(), step(11));
        assert_eq!(metrics.snapshot().position_fixes, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_ticks_keep_previous_position() {
        let feed = ScriptedFeed::new(vec![
            Ok(step(0)),
            Err(TrackerError::Malformed("truncated body".into())),
            Ok(step(0)),
        ]);
        let session = session();
        let metrics = Arc::new(PollMetrics::new());

        let handle = spawn_position_poll(
            feed,
            session.clone(),
            metrics.clone(),
            DEFAULT_POSITION_INTERVAL,
        );
        tokio::time::sleep(Duration::from_millis(10_100)).await;
        handle.shutdown().await;

        let guard = session.read().unwrap();
        assert_eq!(guard.history().len(), 1);
        assert_eq!(guard.current_position().coordinate(), step(0));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.position_failures, 1);
        assert_eq!(snapshot.duplicates_skipped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_cancel() {
        let feed = ScriptedFeed::new((0..20).map(|i| Ok(step(i))).collect());
        let session = session();
        let metrics = Arc::new(PollMetrics::new());

        let handle = spawn_position_poll(feed, session.clone(), metrics, DEFAULT_POSITION_INTERVAL);
        tokio::time::sleep(Duration::from_millis(5_100)).await;
        handle.cancel();
        tokio::time::sleep(Duration::from_millis(60_000)).await;

        assert_eq!(session.read().unwrap().history().len(), 2);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn response_after_cancel_is_discarded() {
        let feed = Arc::new(GatedFeed {
            gate: Notify::new(),
        });
        let session = session();
        let metrics = Arc::new(PollMetrics::new());

        let handle = spawn_position_poll(
            feed.clone(),
            session.clone(),
            metrics.clone(),
            DEFAULT_POSITION_INTERVAL,
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown().await;

        feed.gate.notify_waiters();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let guard = session.read().unwrap();
        assert!(guard.history().is_empty());
        assert!(guard.last_fetched().is_none());
        assert_eq!(metrics.snapshot().discarded_after_cancel, 1);
    }

    #[tokio::test]
    async fn geolocation_failure_at_both_stages_keeps_defaults() {
        let session = session();
        let metrics = Arc::new(PollMetrics::new());
        let chain = Arc::new(ChainedGeolocation::new(FailingLookup, FailingGeolocator));

        let handle = spawn_geolocation_lookup(chain, session.clone(), metrics.clone());
        settle(&handle).await;

        let guard = session.read().unwrap();
        assert!(!guard.viewer().is_loading);
        assert_eq!(guard.viewer().latitude, DEFAULT_VIEWER_LATITUDE);
        assert_eq!(guard.viewer().longitude, DEFAULT_VIEWER_LONGITUDE);
        assert_eq!(metrics.snapshot().geolocation_failed, 1);
    }

    #[tokio::test]
    async fn geolocation_success_updates_viewer() {
        let session = session();
        let metrics = Arc::new(PollMetrics::new());
        let source = Arc::new(FixedLocation(ResolvedLocation {
            latitude: 59.33,
            longitude: 18.07,
            country: Some("Sweden".into()),
            city: Some("Stockholm".into()),
            ip: Some("203.0.113.50".into()),
        }));

        let handle = spawn_geolocation_lookup(source, session.clone(), metrics);
        settle(&handle).await;

        let guard = session.read().unwrap();
        assert!(!guard.viewer().is_loading);
        assert_eq!(guard.viewer().latitude, 59.33);
        assert_eq!(guard.viewer_ip(), Some("203.0.113.50"));
    }

    #[tokio::test]
    async fn geolocation_failure_clears_loading_on_poisoned_lock() {
        let session = session();
        let poisoner = session.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("writer panicked while holding the session");
        })
        .join();
        assert!(session.is_poisoned());

        let metrics = Arc::new(PollMetrics::new());
        let chain = Arc::new(ChainedGeolocation::new(FailingLookup, FailingGeolocator));
        let handle = spawn_geolocation_lookup(chain, session.clone(), metrics.clone());
        settle(&handle).await;

        let guard = session.read().unwrap_or_else(PoisonError::into_inner);
        assert!(!guard.viewer().is_loading);
        assert_eq!(guard.viewer().latitude, DEFAULT_VIEWER_LATITUDE);
        assert_eq!(metrics.snapshot().geolocation_failed, 1);
    }
}
