pub mod history;
pub mod session;
pub mod status;
pub mod viewer;

pub use history::{PositionHistory, DEFAULT_TRAIL_CAPACITY, MOVEMENT_EPSILON_DEG};
pub use session::{SharedSession, TrackingSession, DEFAULT_ISS_POSITION};
pub use status::{format_coordinate, CoordinateAxis, StatusReport};
pub use viewer::{ResolvedLocation, ViewerLocation};
