pub mod projection;

pub use projection::{lat_long_to_vector3, Vec3};
