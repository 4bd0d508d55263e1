use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Cartesian point in scene space, Y pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Rotates the point about the vertical (Y) axis by `angle` radians.
    pub fn rotate_y(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos + self.z * sin,
            y: self.y,
            z: -self.x * sin + self.z * cos,
        }
    }
}

/// Projects a latitude/longitude (degrees) onto a sphere of `radius`.
///
/// Longitude -180 maps onto the +X axis and the north pole onto +Y. Inputs
/// outside the valid band are projected as-is.
pub fn lat_long_to_vector3(latitude: f64, longitude: f64, radius: f64) -> Vec3 {
    let phi = (90.0 - latitude) * (PI / 180.0);
    let theta = (longitude + 180.0) * (PI / 180.0);

    Vec3 {
        x: -radius * phi.sin() * theta.cos(),
        y: radius * phi.cos(),
        z: radius * phi.sin() * theta.sin(),
    }
}
