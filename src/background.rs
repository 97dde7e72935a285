//! Frames shown behind the stereo surface.
//!
//! The live camera feed is a [`FrameSource`]; the app polls it once per frame and
//! uploads whatever new image it yields. Two sources ship with the crate: a still
//! image loaded from disk and an animated test pattern.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("failed to open background image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("test pattern needs a non-zero size, got {0}x{1}")]
    EmptyPattern(u32, u32),
}

pub trait FrameSource: Send {
    /// Returns a new frame when one is ready, `None` when the previous frame
    /// is still current.
    fn poll_frame(&mut self) -> Option<RgbaImage>;

    fn describe(&self) -> String;
}

pub struct StillImageSource {
    path: PathBuf,
    image: Option<RgbaImage>,
}

impl StillImageSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackgroundError> {
        let path = path.as_ref().to_path_buf();
        let image = image::open(&path)
            .map_err(|source| BackgroundError::Image {
                path: path.clone(),
                source,
            })?
            .to_rgba8();
        log::info!(
            "background image {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self {
            path,
            image: Some(image),
        })
    }
}

impl FrameSource for StillImageSource {
    fn poll_frame(&mut self) -> Option<RgbaImage> {
        self.image.take()
    }

    fn describe(&self) -> String {
        format!("image {}", self.path.display())
    }
}

/// Scrolling diagonal bands, regenerated at a fixed frame rate.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    frame_interval: Duration,
    started: Instant,
    last_frame: Option<Instant>,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32, fps: f64) -> Result<Self, BackgroundError> {
        if width == 0 || height == 0 {
            return Err(BackgroundError::EmptyPattern(width, height));
        }
        Ok(Self {
            width,
            height,
            frame_interval: Duration::from_secs_f64(1.0 / fps.max(1.0)),
            started: Instant::now(),
            last_frame: None,
        })
    }

    pub fn render_at(&self, seconds: f32) -> RgbaImage {
        let shift = seconds * 40.0;
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let band = ((x as f32 + y as f32 + shift) / 32.0).floor() as i64;
            let shade = if band.rem_euclid(2) == 0 { 70 } else { 40 };
            let glow = (255.0 * y as f32 / self.height as f32) as u8 / 4;
            Rgba([shade + glow, shade, shade + glow / 2, 255])
        })
    }
}

impl FrameSource for TestPatternSource {
    fn poll_frame(&mut self) -> Option<RgbaImage> {
        let now = Instant::now();
        if let Some(last) = self.last_frame {
            if now.duration_since(last) < self.frame_interval {
                return None;
            }
        }
        self.last_frame = Some(now);
        Some(self.render_at(now.duration_since(self.started).as_secs_f32()))
    }

    fn describe(&self) -> String {
        format!("test pattern {}x{}", self.width, self.height)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub image: Option<PathBuf>,
    pub pattern_width: u32,
    pub pattern_height: u32,
    pub pattern_fps: f64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            image: None,
            pattern_width: 320,
            pattern_height: 240,
            pattern_fps: 30.0,
        }
    }
}

pub fn open_source(config: &BackgroundConfig) -> Result<Box<dyn FrameSource>, BackgroundError> {
    let source: Box<dyn FrameSource> = match &config.image {
        Some(path) => Box::new(StillImageSource::open(path)?),
        None => Box::new(TestPatternSource::new(
            config.pattern_width,
            config.pattern_height,
            config.pattern_fps,
        )?),
    };
    log::info!("background source: {}", source.describe());
    Ok(source)
}

/// Mottled green surface texture; stands in for a photographic moss tile.
pub fn surface_texture(size: u32) -> RgbaImage {
    let size = size.max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        let fx = x as f32 / size as f32 * std::f32::consts::TAU;
        let fy = y as f32 / size as f32 * std::f32::consts::TAU;
        let n = (fx * 3.0).sin() * (fy * 5.0).cos()
            + 0.5 * (fx * 11.0 + fy * 7.0).sin()
            + 0.25 * (fx * 23.0 - fy * 19.0).cos();
        let t = (n / 1.75 * 0.5 + 0.5).clamp(0.0, 1.0);
        Rgba([
            (30.0 + 40.0 * t) as u8,
            (70.0 + 110.0 * t) as u8,
            (20.0 + 30.0 * t) as u8,
            255,
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_image_yields_once() {
        let dir = std::env::temp_dir().join(format!("anaglyph3d-bg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("still.png");
        RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut source = StillImageSource::open(&path).unwrap();
        let frame = source.poll_frame().unwrap();
        assert_eq!(frame.dimensions(), (4, 3));
        assert_eq!(frame.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert!(source.poll_frame().is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_image_is_an_error() {
        let err = StillImageSource::open("/nonexistent/background.png").err();
        assert!(matches!(err, Some(BackgroundError::Image { .. })));
    }

    #[test]
    fn pattern_is_throttled() {
        let mut source = TestPatternSource::new(16, 8, 1.0).unwrap();
        let first = source.poll_frame().unwrap();
        assert_eq!(first.dimensions(), (16, 8));
        assert!(source.poll_frame().is_none());
    }

    #[test]
    fn pattern_rejects_zero_size() {
        assert!(matches!(
            TestPatternSource::new(0, 10, 30.0),
            Err(BackgroundError::EmptyPattern(0, 10))
        ));
    }

    #[test]
    fn pattern_moves_over_time() {
        let source = TestPatternSource::new(64, 64, 30.0).unwrap();
        assert_ne!(source.render_at(0.0), source.render_at(0.5));
    }

    #[test]
    fn default_config_opens_pattern() {
        let source = open_source(&BackgroundConfig::default()).unwrap();
        assert!(source.describe().starts_with("test pattern"));
    }

    #[test]
    fn surface_texture_is_opaque_green() {
        let tex = surface_texture(32);
        assert_eq!(tex.dimensions(), (32, 32));
        assert!(tex.pixels().all(|p| p[3] == 255 && p[1] > p[0] && p[1] > p[2]));
    }
}
