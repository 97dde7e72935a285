//! Parallel-axis stereo with off-axis projection.
//!
//! Both eyes share the base view; only the asymmetric frustum and a small
//! horizontal eye offset differ, so the pair converges at `convergence`.

use glam::{DMat4, DVec3, DVec4};
use serde::{Deserialize, Serialize};

pub const EYE_OFFSET_X: f64 = 0.03;
pub const EYE_OFFSET_Z: f64 = -20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// User-adjustable stereo controls. Nothing here is validated: out of range
/// values produce degenerate or inverted frustums.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoParams {
    pub convergence: f64,
    pub eye_separation: f64,
    pub field_of_view: f64,
    pub near_plane: f64,
    pub far_plane: f64,
    pub aspect_ratio: f64,
}

impl Default for StereoParams {
    fn default() -> Self {
        Self {
            convergence: 2000.0,
            eye_separation: 70.0,
            field_of_view: 2.2,
            near_plane: 10.0,
            far_plane: 20000.0,
            aspect_ratio: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EyeFrustum {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub near: f64,
    pub far: f64,
}

impl EyeFrustum {
    /// Right-handed off-axis perspective mapping depth to [0, 1].
    pub fn projection(&self) -> DMat4 {
        let Self {
            left: l,
            right: r,
            bottom: b,
            top: t,
            near: n,
            far: f,
        } = *self;

        DMat4::from_cols(
            DVec4::new(2.0 * n / (r - l), 0.0, 0.0, 0.0),
            DVec4::new(0.0, 2.0 * n / (t - b), 0.0, 0.0),
            DVec4::new((r + l) / (r - l), (t + b) / (t - b), f / (n - f), -1.0),
            DVec4::new(0.0, 0.0, n * f / (n - f), 0.0),
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct EyeView {
    pub eye: Eye,
    pub projection: DMat4,
    pub model_view: DMat4,
}

#[derive(Clone, Copy, Debug)]
pub struct StereoPair {
    pub left: EyeView,
    pub right: EyeView,
}

pub fn eye_frustums(params: &StereoParams) -> (EyeFrustum, EyeFrustum) {
    let half_tan = (params.field_of_view / 2.0).tan();
    let near = params.near_plane;
    let conv = params.convergence;

    let a = params.aspect_ratio * half_tan * conv;
    let b = a - params.eye_separation / 2.0;
    let c = a + params.eye_separation / 2.0;

    let top = near * half_tan;
    let bottom = -top;

    let left_eye = EyeFrustum {
        left: -b * near / conv,
        right: c * near / conv,
        bottom,
        top,
        near,
        far: params.far_plane,
    };
    let right_eye = EyeFrustum {
        left: -c * near / conv,
        right: b * near / conv,
        bottom,
        top,
        near,
        far: params.far_plane,
    };

    (left_eye, right_eye)
}

pub fn eye_offset(eye: Eye) -> DMat4 {
    let x = match eye {
        Eye::Left => -EYE_OFFSET_X,
        Eye::Right => EYE_OFFSET_X,
    };
    DMat4::from_translation(DVec3::new(x, 0.0, EYE_OFFSET_Z))
}

pub fn stereo_pair(params: &StereoParams, base_view: DMat4) -> StereoPair {
    let (left, right) = eye_frustums(params);

    let view = |eye: Eye, frustum: EyeFrustum| EyeView {
        eye,
        projection: frustum.projection(),
        model_view: eye_offset(eye) * base_view,
    };

    StereoPair {
        left: view(Eye::Left, left),
        right: view(Eye::Right, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn params(eye_separation: f64) -> StereoParams {
        StereoParams {
            convergence: 2000.0,
            eye_separation,
            field_of_view: 2.2,
            near_plane: 10.0,
            far_plane: 20000.0,
            aspect_ratio: 1.0,
        }
    }

    #[test]
    fn zero_separation_is_mono() {
        let (l, r) = eye_frustums(&params(0.0));
        assert_eq!(l, r);
        assert_relative_eq!(l.right, -r.left);
    }

    #[test]
    fn reference_scenario() {
        let (l, r) = eye_frustums(&params(70.0));
        let top = 10.0 * 1.1_f64.tan();

        assert_relative_eq!(l.top, top);
        assert_relative_eq!(l.top, 19.6476, epsilon = 1e-3);
        assert_relative_eq!(l.bottom, -top);
        assert_eq!((l.top, l.bottom), (r.top, r.bottom));

        for edge in [l.left, l.right, r.left, r.right] {
            assert!(edge.is_finite());
        }
        assert_relative_eq!(r.left, -l.right);
        assert_relative_eq!(r.right, -l.left);

        // left eye sees further to the right than the right eye does
        assert!(l.right > r.right);
        assert!(l.left > r.left);
        assert_relative_eq!(l.right - l.left, r.right - r.left);
    }

    #[test]
    fn separation_shifts_edges_by_half_separation_scaled() {
        let (l0, _) = eye_frustums(&params(0.0));
        let (l, r) = eye_frustums(&params(70.0));
        let shift = 35.0 * 10.0 / 2000.0;

        assert_relative_eq!(l.left, l0.left + shift, epsilon = 1e-12);
        assert_relative_eq!(l.right, l0.right + shift, epsilon = 1e-12);
        assert_relative_eq!(r.left, l0.left - shift, epsilon = 1e-12);
        assert_relative_eq!(r.right, l0.right - shift, epsilon = 1e-12);
    }

    #[test]
    fn symmetric_frustum_matches_perspective() {
        let p = StereoParams {
            aspect_ratio: 1.6,
            field_of_view: 1.0,
            ..params(0.0)
        };
        let (l, _) = eye_frustums(&p);
        let expected = DMat4::perspective_rh(p.field_of_view, p.aspect_ratio, p.near_plane, p.far_plane);
        let actual = l.projection();

        for (a, e) in actual.to_cols_array().iter().zip(expected.to_cols_array()) {
            assert_relative_eq!(*a, e, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn projection_maps_planes_to_depth_range() {
        let (l, _) = eye_frustums(&params(70.0));
        let proj = l.projection();

        let near = proj * DVec4::new(l.left, l.bottom, -l.near, 1.0);
        assert_abs_diff_eq!(near.x / near.w, -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(near.y / near.w, -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(near.z / near.w, 0.0, epsilon = 1e-9);

        let far = proj * DVec4::new(0.0, 0.0, -l.far, 1.0);
        assert_abs_diff_eq!(far.z / far.w, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn convergence_plane_points_coincide() {
        // a point on the screen plane, seen from eyes separated by the same
        // amount the frustums assume, lands at the same NDC x in both eyes
        let p = params(70.0);
        let (l, r) = eye_frustums(&p);
        let half = p.eye_separation / 2.0;
        let x = 123.0;
        let z = -p.convergence;

        let left = l.projection() * DVec4::new(x + half, 0.0, z, 1.0);
        let right = r.projection() * DVec4::new(x - half, 0.0, z, 1.0);
        assert_relative_eq!(left.x / left.w, right.x / right.w, epsilon = 1e-9);
    }

    #[test]
    fn eye_matrices_share_base_view() {
        let base = DMat4::from_rotation_y(0.4) * DMat4::from_rotation_x(-0.2);
        let pair = stereo_pair(&params(70.0), base);

        let origin = DVec3::ZERO;
        let l = pair.left.model_view.transform_point3(origin);
        let r = pair.right.model_view.transform_point3(origin);
        assert_relative_eq!(l.x, -EYE_OFFSET_X);
        assert_relative_eq!(r.x, EYE_OFFSET_X);
        assert_relative_eq!(l.z, EYE_OFFSET_Z);
        assert_relative_eq!(r.z, EYE_OFFSET_Z);

        let dir = DVec3::new(1.0, 2.0, 3.0);
        let dl = pair.left.model_view.transform_vector3(dir);
        let dr = pair.right.model_view.transform_vector3(dir);
        assert_abs_diff_eq!(dl.distance(dr), 0.0, epsilon = 1e-12);
        assert_eq!(pair.left.eye, Eye::Left);
        assert_eq!(pair.right.eye, Eye::Right);
    }
}
