use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::math::{SampleGrid, ShapeConstants, ShapeParams, StepScaling};
use crate::math::surface::deg_to_rad;
use crate::renderer::stereo::StereoParams;
use crate::sensor::SphereController;

/// Rotation applied to the surface texture around the user point.
pub const TEXTURE_ANGLE_DEG: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    pub light_position: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            light_position: [0.0, 0.0, 5.0],
            ambient: [0.2, 0.1, 0.0],
            diffuse: [0.5, 1.0, 0.0],
            specular: [0.5, 1.0, 1.0],
            shininess: 1.0,
        }
    }
}

/// Arrow-key controlled point, in degrees, that anchors the surface texture
/// rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UserPoint {
    pub x_deg: f64,
    pub y_deg: f64,
}

impl Default for UserPoint {
    fn default() -> Self {
        Self {
            x_deg: 100.0,
            y_deg: 100.0,
        }
    }
}

impl UserPoint {
    pub fn nudge(&mut self, dx: f64, dy: f64) {
        self.x_deg += dx;
        self.y_deg += dy;
    }

    /// Point on the texture plane swept by the user point around the
    /// profile: radius `a + v·cos30° + r·v²·sin30°`, angle `u`.
    pub fn texture_anchor(&self, shape: &ShapeConstants) -> [f32; 2] {
        let u = deg_to_rad(self.x_deg);
        let v = deg_to_rad(self.y_deg);
        let tilt = deg_to_rad(30.0);
        let radius = shape.a + v * tilt.cos() + shape.r * v * v * tilt.sin();
        [(radius * u.cos()) as f32, (radius * u.sin()) as f32]
    }
}

/// Render context: every piece of mutable per-session state the frame loop
/// reads. Owned by the app and handed to the renderer by reference.
pub struct SceneState {
    pub stereo: StereoParams,
    pub lighting: Lighting,
    pub user_point: UserPoint,
    pub shape: ShapeParams,
    pub marker: SphereController,
    pub show_background: bool,
    pub show_marker: bool,
    pub texture_weight: f32,
}

impl SceneState {
    pub fn new(stereo: StereoParams, lighting: Lighting, shape: ShapeParams) -> Self {
        Self {
            stereo,
            lighting,
            user_point: UserPoint::default(),
            shape,
            marker: SphereController::default(),
            show_background: true,
            show_marker: false,
            texture_weight: 0.6,
        }
    }

    pub fn texture_angle(&self) -> f32 {
        deg_to_rad(TEXTURE_ANGLE_DEG) as f32
    }

    pub fn texture_anchor(&self) -> [f32; 2] {
        self.user_point.texture_anchor(&self.shape.constants)
    }

    pub fn marker_position(&self) -> Option<DVec3> {
        self.show_marker.then(|| self.marker.world_position())
    }
}

impl Default for SceneState {
    fn default() -> Self {
        let shape = ShapeParams {
            constants: ShapeConstants::default(),
            grid: SampleGrid::default(),
            scale: 3.0,
            scaling: StepScaling::default(),
        };
        Self::new(StereoParams::default(), Lighting::default(), shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn anchor_at_origin_of_user_point() {
        let point = UserPoint {
            x_deg: 0.0,
            y_deg: 0.0,
        };
        let anchor = point.texture_anchor(&ShapeConstants::new(1.0, 0.5));
        assert_relative_eq!(anchor[0], 0.5);
        assert_relative_eq!(anchor[1], 0.0);
    }

    #[test]
    fn nudging_moves_the_anchor_angle() {
        let shape = ShapeConstants::default();
        let mut point = UserPoint {
            x_deg: 0.0,
            y_deg: 10.0,
        };
        let before = point.texture_anchor(&shape);
        point.nudge(90.0, 0.0);
        let after = point.texture_anchor(&shape);

        assert_relative_eq!(before[0], after[1], epsilon = 1e-5);
        assert_relative_eq!(after[0], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn marker_hidden_by_default() {
        let scene = SceneState::default();
        assert!(scene.marker_position().is_none());
        assert_eq!(scene.shape.grid.n(), 300);
        assert_relative_eq!(scene.texture_angle(), 100.0_f32.to_radians(), epsilon = 1e-6);
    }
}
