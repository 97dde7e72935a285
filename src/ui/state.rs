use crate::config::AppConfig;
use crate::math::presets::SHAPE_PRESETS;
use crate::math::{SampleGrid, ShapeConstants, ShapeParams, StepScaling};

/// Shape controls as edited in the panel. Turned into [`ShapeParams`] once per
/// frame; the mesh engine ignores requests that did not change.
pub struct UiState {
    pub shape_r: f64,
    pub shape_a: f64,
    pub resolution: u32,
    pub scale: f64,
    pub step_scaling: StepScaling,
    pub selected_preset: Option<usize>,

    pub vsync_enabled: bool,
    pub show_stats: bool,
    pub show_help: bool,
    pub simulate_gyro: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl UiState {
    pub fn from_config(config: &AppConfig) -> Self {
        let mut state = Self {
            shape_r: config.shape.r,
            shape_a: config.shape.a,
            resolution: config.shape.resolution,
            scale: config.shape.scale,
            step_scaling: config.shape.step_scaling,
            selected_preset: None,
            vsync_enabled: config.window.vsync,
            show_stats: true,
            show_help: true,
            simulate_gyro: config.sensor.simulate,
        };
        if let Some(name) = &config.shape.preset {
            if let Some(index) = SHAPE_PRESETS.iter().position(|p| p.name.eq_ignore_ascii_case(name)) {
                state.apply_preset(index);
            }
        }
        state
    }

    pub fn apply_preset(&mut self, index: usize) {
        let Some(preset) = SHAPE_PRESETS.get(index) else {
            return;
        };
        self.shape_r = preset.constants.r;
        self.shape_a = preset.constants.a;
        self.resolution = preset.resolution;
        self.selected_preset = Some(index);
    }

    pub fn shape_params(&self) -> Option<ShapeParams> {
        let grid = SampleGrid::new(self.resolution).ok()?;
        Some(ShapeParams {
            constants: ShapeConstants::new(self.shape_r, self.shape_a),
            grid,
            scale: self.scale,
            scaling: self.step_scaling,
        })
    }
}
