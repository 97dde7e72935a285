//! Per-frame pass ordering for anaglyph output.
//!
//! Each eye is drawn into the same color target through a channel mask, so
//! depth must be reset before every eye or the second eye would be occluded
//! by the first one's depth values.

use crate::renderer::stereo::Eye;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl ColorMask {
    pub const ALL: Self = Self {
        red: true,
        green: true,
        blue: true,
    };

    pub fn for_eye(eye: Eye) -> Self {
        match eye {
            Eye::Left => Self {
                red: true,
                green: false,
                blue: false,
            },
            Eye::Right => Self {
                red: false,
                green: true,
                blue: true,
            },
        }
    }

    pub fn write_mask(self) -> wgpu::ColorWrites {
        let mut mask = wgpu::ColorWrites::empty();
        if self.red {
            mask |= wgpu::ColorWrites::RED;
        }
        if self.green {
            mask |= wgpu::ColorWrites::GREEN;
        }
        if self.blue {
            mask |= wgpu::ColorWrites::BLUE;
        }
        mask
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStep {
    ClearAll,
    ClearDepth,
    Background,
    Surface { eye: Eye, mask: ColorMask },
    Marker { eye: Eye, mask: ColorMask },
    RestoreColorMask,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePlan {
    steps: Vec<FrameStep>,
}

impl FramePlan {
    pub fn anaglyph(background: bool, marker: bool) -> Self {
        let mut steps = vec![FrameStep::ClearAll];

        if background {
            steps.push(FrameStep::Background);
        }

        steps.push(FrameStep::ClearDepth);
        steps.push(FrameStep::Surface {
            eye: Eye::Left,
            mask: ColorMask::for_eye(Eye::Left),
        });

        steps.push(FrameStep::ClearDepth);
        steps.push(FrameStep::Surface {
            eye: Eye::Right,
            mask: ColorMask::for_eye(Eye::Right),
        });
        if marker {
            steps.push(FrameStep::Marker {
                eye: Eye::Right,
                mask: ColorMask::for_eye(Eye::Right),
            });
        }

        steps.push(FrameStep::RestoreColorMask);

        Self { steps }
    }

    pub fn steps(&self) -> &[FrameStep] {
        &self.steps
    }

    pub fn passes(&self) -> Vec<PassDesc> {
        let mut passes = Vec::new();
        let mut clear_color = false;
        let mut clear_depth = false;
        let mut mask = ColorMask::ALL;

        for step in &self.steps {
            match *step {
                FrameStep::ClearAll => {
                    clear_color = true;
                    clear_depth = true;
                }
                FrameStep::ClearDepth => clear_depth = true,
                FrameStep::RestoreColorMask => mask = ColorMask::ALL,
                FrameStep::Background => {
                    passes.push(PassDesc {
                        draw: PassDraw::Background,
                        clear_color,
                        clear_depth: false,
                        mask,
                    });
                    clear_color = false;
                }
                FrameStep::Surface { eye, mask: m } | FrameStep::Marker { eye, mask: m } => {
                    let draw = match step {
                        FrameStep::Surface { .. } => PassDraw::Surface(eye),
                        _ => PassDraw::Marker(eye),
                    };
                    mask = m;
                    passes.push(PassDesc {
                        draw,
                        clear_color,
                        clear_depth,
                        mask,
                    });
                    clear_color = false;
                    clear_depth = false;
                }
            }
        }

        passes
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassDraw {
    Background,
    Surface(Eye),
    Marker(Eye),
}

/// One GPU render pass: pending clears become load operations, the mask
/// selects the pipeline variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassDesc {
    pub draw: PassDraw,
    pub clear_color: bool,
    pub clear_depth: bool,
    pub mask: ColorMask,
}
