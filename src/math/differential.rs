use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::math::surface::{ShapeConstants, deg_to_rad};

pub const DEFAULT_STEP: f64 = 0.001;

/// How a forward difference is divided by its step.
///
/// `Degrees` treats the step as an angle in degrees and divides by its radian
/// value, which inflates every tangent by 180/π. Directions are unaffected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepScaling {
    #[default]
    Degrees,
    Raw,
}

impl StepScaling {
    pub fn divisor(self, step: f64) -> f64 {
        match self {
            StepScaling::Degrees => deg_to_rad(step),
            StepScaling::Raw => step,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StepScaling::Degrees => "Degree divisor",
            StepScaling::Raw => "Raw step",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifferentialEstimator {
    pub shape: ShapeConstants,
    pub u_step: f64,
    pub v_step: f64,
    pub scaling: StepScaling,
}

impl DifferentialEstimator {
    pub fn new(shape: ShapeConstants, scaling: StepScaling) -> Self {
        Self {
            shape,
            u_step: DEFAULT_STEP,
            v_step: DEFAULT_STEP,
            scaling,
        }
    }

    /// Forward difference along the first evaluator slot.
    ///
    /// Arguments are handed to [`ShapeConstants::position`] exactly as given,
    /// so `u` lands in the evaluator's first slot.
    pub fn tangent_u(&self, u: f64, v: f64) -> DVec3 {
        let base = self.shape.position(u, v);
        let moved = self.shape.position(u + self.u_step, v);
        (moved - base) / self.scaling.divisor(self.u_step)
    }

    /// Forward difference along the second evaluator slot.
    pub fn tangent_v(&self, u: f64, v: f64) -> DVec3 {
        let base = self.shape.position(u, v);
        let moved = self.shape.position(u, v + self.v_step);
        (moved - base) / self.scaling.divisor(self.v_step)
    }

    /// `tangent_v × tangent_u`. The operand order fixes the winding the
    /// triangle strip is drawn with; swapping it flips every normal.
    pub fn normal(&self, u: f64, v: f64) -> DVec3 {
        self.tangent_v(u, v).cross(self.tangent_u(u, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::surface::{u_domain, v_domain};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn samples() -> impl Iterator<Item = (f64, f64)> {
        (0..=12).flat_map(|j| (0..=12).map(move |i| (u_domain(j as f64 / 12.0), v_domain(i as f64 / 12.0))))
    }

    #[test]
    fn normals_are_orthogonal_to_tangents() {
        let est = DifferentialEstimator::new(ShapeConstants::default(), StepScaling::Degrees);
        for (u, v) in samples() {
            let tu = est.tangent_u(u, v);
            let tv = est.tangent_v(u, v);
            let n = est.normal(u, v);
            let scale = n.length() * tu.length().max(tv.length());
            if scale < 1e-9 {
                continue;
            }
            assert_abs_diff_eq!(n.dot(tu) / scale, 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(n.dot(tv) / scale, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn degree_divisor_only_rescales() {
        let shape = ShapeConstants::new(1.0, 0.5);
        let deg = DifferentialEstimator::new(shape, StepScaling::Degrees);
        let raw = DifferentialEstimator::new(shape, StepScaling::Raw);
        let factor = 180.0 / std::f64::consts::PI;

        for (u, v) in samples() {
            let a = deg.tangent_u(u, v);
            let b = raw.tangent_u(u, v);
            assert_relative_eq!(a.x, b.x * factor, max_relative = 1e-9, epsilon = 1e-12);
            assert_relative_eq!(a.y, b.y * factor, max_relative = 1e-9, epsilon = 1e-12);
            assert_relative_eq!(a.z, b.z * factor, max_relative = 1e-9, epsilon = 1e-12);

            let na = deg.normal(u, v);
            let nb = raw.normal(u, v);
            if nb.length() > 1e-9 {
                let cos = na.normalize().dot(nb.normalize());
                assert_relative_eq!(cos, 1.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn raw_tangent_approximates_analytic_derivative() {
        // the first slot is the v-role of the evaluator: ∂/∂v of the profile term
        let shape = ShapeConstants::new(1.0, 0.5);
        let est = DifferentialEstimator::new(shape, StepScaling::Raw);
        let (first, second) = (0.7, 1.9);
        let t = est.tangent_u(first, second);

        let d = first - std::f64::consts::PI;
        let expected = DVec3::new(
            -shape.a * (second / 3.0).cos() * d.sin(),
            -shape.a * (second / 3.0).sin() * d.sin(),
            shape.a * d.cos(),
        );
        assert_abs_diff_eq!(t.distance(expected), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn normal_order_is_v_cross_u() {
        let est = DifferentialEstimator::new(ShapeConstants::default(), StepScaling::Raw);
        let (u, v) = (1.1, 0.4);
        let flipped = est.tangent_u(u, v).cross(est.tangent_v(u, v));
        assert_abs_diff_eq!((est.normal(u, v) + flipped).length(), 0.0, epsilon = 1e-12);
    }
}
