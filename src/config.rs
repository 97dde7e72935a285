use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::background::BackgroundConfig;
use crate::math::presets::{ShapePreset, find_preset};
use crate::math::{SampleGrid, ShapeConstants, ShapeParams, StepScaling};
use crate::renderer::stereo::StereoParams;
use crate::scene::Lighting;

/// Accepted value ranges. `AppConfig::validate` enforces them and the panel
/// sliders use them as bounds.
pub mod limits {
    use std::ops::RangeInclusive;

    /// `2·(n+1)²` position vertices stay under wgpu's default 256 MiB buffer.
    pub const RESOLUTION: RangeInclusive<u32> = 1..=2000;
    pub const SHAPE_R: RangeInclusive<f64> = 0.05..=5.0;
    pub const SHAPE_A: RangeInclusive<f64> = 0.01..=5.0;
    pub const SCALE: RangeInclusive<f64> = 0.1..=20.0;

    pub const CONVERGENCE: RangeInclusive<f64> = 1.0..=10_000.0;
    pub const EYE_SEPARATION: RangeInclusive<f64> = 0.0..=500.0;
    pub const FIELD_OF_VIEW: RangeInclusive<f64> = 0.01..=3.14;
    pub const NEAR_PLANE: RangeInclusive<f64> = 0.1..=1000.0;

    pub const LIGHT_POSITION: RangeInclusive<f32> = -100.0..=100.0;
    pub const SHININESS: RangeInclusive<f32> = 1.0..=128.0;
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Anaglyph 3D".into(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Named preset; overrides `r`, `a` and `resolution` when set.
    pub preset: Option<String>,
    pub r: f64,
    pub a: f64,
    pub resolution: u32,
    pub scale: f64,
    pub step_scaling: StepScaling,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        let constants = ShapeConstants::default();
        Self {
            preset: None,
            r: constants.r,
            a: constants.a,
            resolution: SampleGrid::DEFAULT_RESOLUTION,
            scale: 3.0,
            step_scaling: StepScaling::default(),
        }
    }
}

impl ShapeConfig {
    pub fn preset(&self) -> Result<Option<&'static ShapePreset>, ConfigError> {
        match &self.preset {
            None => Ok(None),
            Some(name) => find_preset(name)
                .map(Some)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown shape preset {name:?}"))),
        }
    }

    pub fn params(&self) -> Result<ShapeParams, ConfigError> {
        let (constants, resolution) = match self.preset()? {
            Some(preset) => (preset.constants, preset.resolution),
            None => (ShapeConstants::new(self.r, self.a), self.resolution),
        };
        let grid = SampleGrid::new(resolution)
            .map_err(|e| ConfigError::Invalid(format!("shape.resolution: {e}")))?;
        Ok(ShapeParams {
            constants,
            grid,
            scale: self.scale,
            scaling: self.step_scaling,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub simulate: bool,
    pub rate_hz: f64,
    pub amplitude: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            simulate: false,
            rate_hz: 60.0,
            amplitude: 20.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub shape: ShapeConfig,
    pub stereo: StereoParams,
    pub lighting: Lighting,
    pub background: BackgroundConfig,
    pub sensor: SensorConfig,
}

/// Command-line values that take precedence over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub resolution: Option<u32>,
    pub background: Option<PathBuf>,
    pub simulate_gyro: bool,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(n) = overrides.resolution {
            // keep the preset's shape but not its resolution
            if let Ok(Some(preset)) = self.shape.preset() {
                self.shape.r = preset.constants.r;
                self.shape.a = preset.constants.a;
                self.shape.preset = None;
            }
            self.shape.resolution = n;
        }
        if let Some(path) = &overrides.background {
            self.background.image = Some(path.clone());
        }
        if overrides.simulate_gyro {
            self.sensor.simulate = true;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check<T: PartialOrd + std::fmt::Display>(
            name: &str,
            value: T,
            range: RangeInclusive<T>,
        ) -> Result<(), ConfigError> {
            if range.contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{name} = {value} is outside [{}, {}]",
                    range.start(),
                    range.end()
                )))
            }
        }

        self.shape.preset()?;
        check("shape.resolution", self.shape.resolution, limits::RESOLUTION)?;
        check("shape.r", self.shape.r, limits::SHAPE_R)?;
        check("shape.a", self.shape.a, limits::SHAPE_A)?;
        check("shape.scale", self.shape.scale, limits::SCALE)?;

        let stereo = &self.stereo;
        check("stereo.convergence", stereo.convergence, limits::CONVERGENCE)?;
        check("stereo.eye_separation", stereo.eye_separation, limits::EYE_SEPARATION)?;
        check("stereo.field_of_view", stereo.field_of_view, limits::FIELD_OF_VIEW)?;
        check("stereo.near_plane", stereo.near_plane, limits::NEAR_PLANE)?;
        if !(stereo.far_plane > stereo.near_plane) {
            return Err(ConfigError::Invalid(
                "stereo.far_plane must exceed stereo.near_plane".into(),
            ));
        }

        for (axis, value) in ["x", "y", "z"].iter().zip(self.lighting.light_position) {
            check(&format!("lighting.light_position.{axis}"), value, limits::LIGHT_POSITION)?;
        }
        check("lighting.shininess", self.lighting.shininess, limits::SHININESS)?;

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".into()));
        }
        if !(self.sensor.rate_hz > 0.0) {
            return Err(ConfigError::Invalid("sensor.rate_hz must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.shape.resolution, 300);
        assert_relative_eq!(config.stereo.convergence, 2000.0);
        assert_relative_eq!(config.stereo.eye_separation, 70.0);
        assert_eq!(config.shape.step_scaling, StepScaling::Degrees);
        assert!(config.background.image.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "shape": { "a": 0.25, "step_scaling": "raw" },
                "stereo": { "eye_separation": 0.0 },
                "sensor": { "simulate": true }
            }"#,
        )
        .unwrap();

        assert_relative_eq!(config.shape.a, 0.25);
        assert_relative_eq!(config.shape.r, 1.0);
        assert_eq!(config.shape.step_scaling, StepScaling::Raw);
        assert_relative_eq!(config.stereo.eye_separation, 0.0);
        assert_relative_eq!(config.stereo.near_plane, 10.0);
        assert!(config.sensor.simulate);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            r#"{ "shape": { "resolution": 0 } }"#,
            r#"{ "shape": { "scale": -1.0 } }"#,
            r#"{ "stereo": { "near_plane": 0.0 } }"#,
            r#"{ "stereo": { "convergence": 0.0 } }"#,
            r#"{ "stereo": { "far_plane": 5.0 } }"#,
            r#"{ "stereo": { "field_of_view": 3.5 } }"#,
            r#"{ "stereo": { "eye_separation": -1.0 } }"#,
            r#"{ "shape": { "resolution": 2001 } }"#,
            r#"{ "shape": { "r": 0.0 } }"#,
            r#"{ "lighting": { "light_position": [0.0, 500.0, 5.0] } }"#,
            r#"{ "lighting": { "shininess": 0.0 } }"#,
        ];
        for case in cases {
            let config = AppConfig::from_json(case).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "accepted {case}"
            );
        }
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let path = std::env::temp_dir().join(format!("anaglyph3d-cfg-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse { .. })));
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            AppConfig::load("/nonexistent/anaglyph3d.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn preset_names_are_resolved() {
        let config = AppConfig::from_json(r#"{ "shape": { "preset": "thin coil" } }"#).unwrap();
        config.validate().unwrap();
        let params = config.shape.params().unwrap();
        assert_relative_eq!(params.constants.a, 0.2);

        let config = AppConfig::from_json(r#"{ "shape": { "preset": "mobius" } }"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = AppConfig::default();
        config.apply(&Overrides {
            resolution: Some(40),
            background: Some(PathBuf::from("room.png")),
            simulate_gyro: true,
        });
        assert_eq!(config.shape.resolution, 40);
        assert_eq!(config.background.image, Some(PathBuf::from("room.png")));
        assert!(config.sensor.simulate);

        let params = config.shape.params().unwrap();
        assert_eq!(params.grid.n(), 40);
        assert_relative_eq!(params.scale, 3.0);
    }

    #[test]
    fn resolution_override_survives_a_preset() {
        let mut config = AppConfig::from_json(r#"{ "shape": { "preset": "Wide Ribbon" } }"#).unwrap();
        config.apply(&Overrides {
            resolution: Some(12),
            ..Default::default()
        });
        let params = config.shape.params().unwrap();
        assert_eq!(params.grid.n(), 12);
        assert_relative_eq!(params.constants.a, 0.9);
    }

    #[test]
    fn largest_resolution_fits_default_buffer_limit() {
        let n = u64::from(*limits::RESOLUTION.end());
        let position_bytes = 2 * (n + 1) * (n + 1) * 12;
        assert!(position_bytes <= 256 << 20);
    }
}
