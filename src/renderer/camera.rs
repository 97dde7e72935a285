use glam::{DMat4, DVec3, Vec2};

/// Trackball-style rotator producing the shared base view for both eyes.
/// Dragging spins the model, the wheel scales it.
pub struct ViewRotator {
    pub yaw: f32,
    pub pitch: f32,
    pub zoom: f32,

    pub mouse_sensitivity: f32,
    pub zoom_speed: f32,
}

impl Default for ViewRotator {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            zoom: 1.0,

            mouse_sensitivity: 0.005,
            zoom_speed: 0.1,
        }
    }
}

impl ViewRotator {
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::from_scale(DVec3::splat(self.zoom as f64))
            * DMat4::from_rotation_x(self.pitch as f64)
            * DMat4::from_rotation_y(self.yaw as f64)
    }

    pub fn process_mouse_movement(&mut self, delta: Vec2) {
        self.yaw += delta.x * self.mouse_sensitivity;
        self.pitch += delta.y * self.mouse_sensitivity;

        let max_pitch = 89.0_f32.to_radians();
        self.pitch = self.pitch.clamp(-max_pitch, max_pitch);
    }

    pub fn process_scroll(&mut self, delta: f32) {
        self.zoom = (self.zoom * (1.0 + delta * self.zoom_speed)).clamp(0.2, 5.0);
    }

    pub fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.zoom = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_view_is_identity() {
        let rotator = ViewRotator::default();
        assert_eq!(rotator.view_matrix(), DMat4::IDENTITY);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut rotator = ViewRotator::default();
        rotator.process_mouse_movement(Vec2::new(0.0, 1.0e6));
        assert_relative_eq!(rotator.pitch, 89.0_f32.to_radians());
    }

    #[test]
    fn rotation_preserves_lengths() {
        let mut rotator = ViewRotator::default();
        rotator.process_mouse_movement(Vec2::new(120.0, -40.0));
        let v = rotator.view_matrix().transform_vector3(DVec3::new(1.0, 2.0, 2.0));
        assert_relative_eq!(v.length(), 3.0, epsilon = 1e-6);
    }

    #[test]
    fn zoom_stays_in_range() {
        let mut rotator = ViewRotator::default();
        for _ in 0..100 {
            rotator.process_scroll(5.0);
        }
        assert_relative_eq!(rotator.zoom, 5.0);
        rotator.reset();
        assert_relative_eq!(rotator.zoom, 1.0);
    }
}
