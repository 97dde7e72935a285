use std::f64::consts::PI;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Radii of the tube profile. Fixed for the lifetime of a mesh.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeConstants {
    pub r: f64,
    pub a: f64,
}

impl Default for ShapeConstants {
    fn default() -> Self {
        Self { r: 1.0, a: 0.5 }
    }
}

impl ShapeConstants {
    pub const fn new(r: f64, a: f64) -> Self {
        Self { r, a }
    }

    /// Evaluates the surface. The first argument plays the `v` role, the
    /// second the `u` role; every caller keeps this order.
    pub fn position(&self, v: f64, u: f64) -> DVec3 {
        DVec3::new(self.x(v, u), self.y(v, u), self.z(v, u))
    }

    pub fn x(&self, v: f64, u: f64) -> f64 {
        (self.r + self.a * (u / 2.0).cos()) * (u / 3.0).cos()
            + self.a * (u / 3.0).cos() * (v - PI).cos()
    }

    pub fn y(&self, v: f64, u: f64) -> f64 {
        (self.r + self.a * (u / 2.0).cos()) * (u / 3.0).sin()
            + self.a * (u / 3.0).sin() * (v - PI).cos()
    }

    pub fn z(&self, v: f64, u: f64) -> f64 {
        self.a + (u / 2.0).sin() + self.a * (v - PI).sin()
    }
}

/// Maps a normalized grid coordinate in [0, 1] onto the `u` angle range [0, 12π].
pub fn u_domain(t: f64) -> f64 {
    t * PI * 12.0
}

/// Maps a normalized grid coordinate in [0, 1] onto the `v` angle range [0, 2π].
pub fn v_domain(t: f64) -> f64 {
    t * PI * 2.0
}

pub fn deg_to_rad(angle: f64) -> f64 {
    angle * PI / 180.0
}
