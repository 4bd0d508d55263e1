//! Cancellable background tasks that feed the tracking session.

pub mod poller;
pub mod sources;
pub mod task;

pub use poller::{
    spawn_geolocation_lookup, spawn_position_poll, DEFAULT_POSITION_INTERVAL,
};
pub use sources::{ChainedGeolocation, GeolocationSource, IpGeolocator, IpLookup, PositionSource};
pub use task::{Liveness, TaskHandle};
