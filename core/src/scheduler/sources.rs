use crate::prelude::{GeoCoordinate, TrackerResult};
use crate::tracking::viewer::ResolvedLocation;
use log::debug;
use std::future::Future;

/// Something that can report where the station is right now.
pub trait PositionSource {
    fn fetch_position(&self) -> impl Future<Output = TrackerResult<GeoCoordinate>> + Send;
}

/// Resolves the viewer's location in one call.
pub trait GeolocationSource {
    fn locate(&self) -> impl Future<Output = TrackerResult<ResolvedLocation>> + Send;
}

/// First stage of a two-step lookup: the caller's public address.
pub trait IpLookup {
    fn public_ip(&self) -> impl Future<Output = TrackerResult<String>> + Send;
}

/// Second stage of a two-step lookup: geolocate a given address.
pub trait IpGeolocator {
    fn locate_ip(&self, ip: &str) -> impl Future<Output = TrackerResult<ResolvedLocation>> + Send;
}

/// Runs an [`IpLookup`] and feeds its result to an [`IpGeolocator`]. A
/// failure at either stage fails the whole lookup.
pub struct ChainedGeolocation<A, B> {
    lookup: A,
    geolocator: B,
}

impl<A, B> ChainedGeolocation<A, B> {
    pub fn new(lookup: A, geolocator: B) -> Self {
        Self { lookup, geolocator }
    }
}

impl<A, B> GeolocationSource for ChainedGeolocation<A, B>
where
    A: IpLookup + Sync,
    B: IpGeolocator + Sync,
{
    async fn locate(&self) -> TrackerResult<ResolvedLocation> {
        let ip = self.lookup.public_ip().await?;
        debug!("public address resolved, geolocating {}", ip);
        self.geolocator.locate_ip(&ip).await
    }
}
