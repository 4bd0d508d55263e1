//! Tracking core for the Rust ISS tracker.
//!
//! The modules cover the whole data path from upstream payloads to renderable
//! state: decoding the position and geolocation feeds, the bounded trail
//! history, the cancellable polling tasks, status formatting and the globe
//! scene composition.

pub mod environment;
pub mod math;
pub mod prelude;
pub mod scene;
pub mod scheduler;
pub mod telemetry;
pub mod tracking;
pub mod upstream;

pub use prelude::{GeoCoordinate, PositionFix, TrackerError, TrackerResult};
