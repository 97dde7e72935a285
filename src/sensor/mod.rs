//! Rotation-sensor input driving the marker sphere and the audio source.

pub mod gyro;
pub mod panner;

pub use gyro::{GyroReading, GyroStream, SimulatedGyro};
pub use panner::{AudioPanner, PannerSink};

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Width of the scene-space box the sphere moves in, per axis.
pub const MARKER_SPAN: f64 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorBounds {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub z: (f64, f64),
}

impl Default for SensorBounds {
    fn default() -> Self {
        Self {
            x: (25.0, 75.0),
            y: (25.0, 75.0),
            z: (-10.0, 10.0),
        }
    }
}

impl SensorBounds {
    pub fn clamp(&self, p: DVec3) -> DVec3 {
        DVec3::new(
            p.x.clamp(self.x.0, self.x.1),
            p.y.clamp(self.y.0, self.y.1),
            p.z.clamp(self.z.0, self.z.1),
        )
    }

    pub fn mid(&self) -> DVec3 {
        DVec3::new(
            (self.x.0 + self.x.1) / 2.0,
            (self.y.0 + self.y.1) / 2.0,
            (self.z.0 + self.z.1) / 2.0,
        )
    }

    fn half_extent(&self) -> DVec3 {
        DVec3::new(
            (self.x.1 - self.x.0) / 2.0,
            (self.y.1 - self.y.0) / 2.0,
            (self.z.1 - self.z.0) / 2.0,
        )
        .max(DVec3::splat(f64::EPSILON))
    }
}

/// Sphere center accumulated from sensor deltas, always inside `bounds`.
#[derive(Clone, Copy, Debug)]
pub struct SphereController {
    center: DVec3,
    bounds: SensorBounds,
}

impl Default for SphereController {
    fn default() -> Self {
        Self::new(SensorBounds::default())
    }
}

impl SphereController {
    pub fn new(bounds: SensorBounds) -> Self {
        Self {
            center: DVec3::new(bounds.mid().x, bounds.mid().y, 0.0_f64.clamp(bounds.z.0, bounds.z.1)),
            bounds,
        }
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn apply(&mut self, reading: &GyroReading) -> DVec3 {
        self.center = self.bounds.clamp(self.center + reading.delta);
        self.center
    }

    /// Applies every reading, then forwards the final center to `sink`.
    /// Returns whether any reading arrived.
    pub fn apply_all(&mut self, readings: &[GyroReading], sink: &mut dyn PannerSink) -> bool {
        for reading in readings {
            self.apply(reading);
        }
        if readings.is_empty() {
            return false;
        }
        sink.set_position(self.center);
        true
    }

    pub fn reset(&mut self, sink: &mut dyn PannerSink) {
        *self = Self::new(self.bounds);
        sink.set_position(self.center);
    }

    /// Scene-space position: the bounds box mapped onto a cube of side
    /// [`MARKER_SPAN`] centered on the origin.
    pub fn world_position(&self) -> DVec3 {
        let normalized = (self.center - self.bounds.mid()) / self.bounds.half_extent();
        normalized * (MARKER_SPAN / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Recorder(Vec<DVec3>);

    impl PannerSink for Recorder {
        fn set_position(&mut self, position: DVec3) {
            self.0.push(position);
        }
    }

    #[test]
    fn starts_in_the_middle() {
        let sphere = SphereController::default();
        assert_eq!(sphere.center(), DVec3::new(50.0, 50.0, 0.0));
        assert_eq!(sphere.world_position(), DVec3::ZERO);
    }

    #[test]
    fn center_is_clamped_per_axis() {
        let mut sphere = SphereController::default();
        let c = sphere.apply(&GyroReading::new(100.0, -100.0, 3.0));
        assert_eq!(c, DVec3::new(75.0, 25.0, 3.0));

        let c = sphere.apply(&GyroReading::new(-10.0, 5.0, 50.0));
        assert_eq!(c, DVec3::new(65.0, 30.0, 10.0));

        let c = sphere.apply(&GyroReading::new(0.0, 0.0, -500.0));
        assert_eq!(c.z, -10.0);
    }

    #[test]
    fn panner_receives_clamped_center() {
        let mut sphere = SphereController::default();
        let mut sink = Recorder::default();

        let readings = [GyroReading::new(10.0, 0.0, 0.0), GyroReading::new(30.0, 1.0, 0.0)];
        assert!(sphere.apply_all(&readings, &mut sink));
        assert_eq!(sink.0, vec![DVec3::new(75.0, 51.0, 0.0)]);

        assert!(!sphere.apply_all(&[], &mut sink));
        assert_eq!(sink.0.len(), 1);

        sphere.reset(&mut sink);
        assert_eq!(sink.0.last(), Some(&DVec3::new(50.0, 50.0, 0.0)));
    }

    #[test]
    fn world_position_spans_the_marker_box() {
        let mut sphere = SphereController::default();
        sphere.apply(&GyroReading::new(1000.0, -1000.0, 1000.0));
        let p = sphere.world_position();
        assert_relative_eq!(p.x, MARKER_SPAN / 2.0);
        assert_relative_eq!(p.y, -MARKER_SPAN / 2.0);
        assert_relative_eq!(p.z, MARKER_SPAN / 2.0);
    }
}
