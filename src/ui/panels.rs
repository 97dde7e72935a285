use egui::{Color32, Context, RichText, ScrollArea, Ui};
use glam::DVec3;

use crate::config::limits;
use crate::math::StepScaling;
use crate::math::engine::BuildStats;
use crate::math::presets::SHAPE_PRESETS;
use crate::scene::SceneState;
use crate::ui::state::UiState;
use crate::ui::theme::*;

#[derive(Default)]
pub struct UiActions {
    pub reset_view: bool,
    pub reset_marker: bool,
    pub reset_user_point: bool,
}

/// Read-only numbers shown in the statistics block.
pub struct PanelStats {
    pub fps: f32,
    pub build: BuildStats,
    pub building: bool,
    pub background: String,
    pub sphere_center: DVec3,
    pub panner_position: Option<DVec3>,
    pub panner_updates: u64,
}

pub fn draw_side_panel(
    ctx: &Context,
    state: &mut UiState,
    scene: &mut SceneState,
    stats: &PanelStats,
) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("control_panel")
        .min_width(300.0)
        .max_width(400.0)
        .default_width(320.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("ANA").strong().color(ACCENT_RED));
                    ui.heading(RichText::new("GLYPH").strong().color(ACCENT_CYAN));
                });
                ui.label(RichText::new("Red / cyan stereo surface").color(TEXT_MUTED).size(11.0));
                ui.add_space(16.0);

                stereo_controls(ui, scene);
                ui.add_space(16.0);

                shape_controls(ui, state);
                ui.add_space(16.0);

                lighting_controls(ui, scene);
                ui.add_space(16.0);

                section_header(ui, "SCENE");
                ui.checkbox(&mut scene.show_background, "Background feed");
                ui.checkbox(&mut scene.show_marker, "Sensor sphere");
                ui.checkbox(&mut state.simulate_gyro, "Simulated gyroscope");
                ui.horizontal(|ui| {
                    if ui.button("Reset view").clicked() {
                        actions.reset_view = true;
                    }
                    if ui.button("Center sphere").clicked() {
                        actions.reset_marker = true;
                    }
                    if ui.button("Reset point").clicked() {
                        actions.reset_user_point = true;
                    }
                });
                ui.add_space(16.0);

                section_header(ui, "DISPLAY");
                ui.horizontal(|ui| {
                    ui.checkbox(&mut state.vsync_enabled, "VSync");
                    ui.checkbox(&mut state.show_stats, "Stats");
                    ui.checkbox(&mut state.show_help, "Help");
                });
                ui.add_space(16.0);

                if state.show_stats {
                    ui.separator();
                    ui.add_space(12.0);
                    stats_panel(ui, scene, stats);
                }
            });
        });

    actions
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

fn labeled<T: egui::emath::Numeric>(
    ui: &mut Ui,
    label: &str,
    value: &mut T,
    range: std::ops::RangeInclusive<T>,
) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::Slider::new(value, range)).changed()
    })
    .inner
}

fn stereo_controls(ui: &mut Ui, scene: &mut SceneState) {
    section_header(ui, "STEREO");
    let stereo = &mut scene.stereo;
    labeled(ui, "Convergence", &mut stereo.convergence, limits::CONVERGENCE);
    labeled(ui, "Eye separation", &mut stereo.eye_separation, limits::EYE_SEPARATION);
    labeled(ui, "Field of view", &mut stereo.field_of_view, limits::FIELD_OF_VIEW);
    labeled(ui, "Near plane", &mut stereo.near_plane, limits::NEAR_PLANE);
}

fn shape_controls(ui: &mut Ui, state: &mut UiState) {
    section_header(ui, "SHAPE");

    let selected = state
        .selected_preset
        .and_then(|i| SHAPE_PRESETS.get(i))
        .map_or("Custom", |p| p.name);
    let mut chosen = None;
    egui::ComboBox::from_id_salt("shape_presets")
        .selected_text(selected)
        .width(ui.available_width())
        .show_ui(ui, |ui| {
            for (i, preset) in SHAPE_PRESETS.iter().enumerate() {
                if ui
                    .selectable_label(state.selected_preset == Some(i), preset.name)
                    .on_hover_text(preset.description)
                    .clicked()
                {
                    chosen = Some(i);
                }
            }
        });
    if let Some(i) = chosen {
        state.apply_preset(i);
    }

    let mut edited = false;
    edited |= labeled(ui, "Core radius r", &mut state.shape_r, limits::SHAPE_R);
    edited |= labeled(ui, "Profile a", &mut state.shape_a, limits::SHAPE_A);
    edited |= labeled(ui, "Resolution", &mut state.resolution, limits::RESOLUTION);
    labeled(ui, "Scale", &mut state.scale, limits::SCALE);
    if edited {
        state.selected_preset = None;
    }

    ui.horizontal(|ui| {
        ui.label("Tangent step:");
        for mode in [StepScaling::Degrees, StepScaling::Raw] {
            if ui
                .selectable_label(state.step_scaling == mode, mode.label())
                .clicked()
            {
                state.step_scaling = mode;
            }
        }
    });
}

fn lighting_controls(ui: &mut Ui, scene: &mut SceneState) {
    section_header(ui, "LIGHTING");
    egui::Grid::new("light_position")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            for (axis, value) in ["X", "Y", "Z"].iter().zip(scene.lighting.light_position.iter_mut()) {
                ui.label(format!("Light {axis}"));
                ui.add(egui::Slider::new(value, limits::LIGHT_POSITION));
                ui.end_row();
            }
        });
    labeled(ui, "Shininess", &mut scene.lighting.shininess, limits::SHININESS);
    labeled(ui, "Texture", &mut scene.texture_weight, 0.0..=1.0);
}

fn stats_panel(ui: &mut Ui, scene: &SceneState, stats: &PanelStats) {
    section_header(ui, "STATISTICS");
    egui::Frame::default()
        .fill(BG_WIDGET)
        .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));

            let fps_color = if stats.fps >= 60.0 {
                ACCENT_GREEN
            } else if stats.fps >= 30.0 {
                ACCENT_ORANGE
            } else {
                ACCENT_RED
            };

            egui::Grid::new("stats").num_columns(2).spacing([20.0, 4.0]).show(ui, |ui| {
                row(ui, "FPS", format!("{:.0}", stats.fps), fps_color);
                row(ui, "Vertices", fmt_num(stats.build.last_vertex_count), TEXT_PRIMARY);
                let build = if stats.building {
                    "building...".to_string()
                } else {
                    format!("{:.1} ms", stats.build.last_build_ms)
                };
                row(ui, "Mesh build", build, ACCENT_CYAN);
                row(ui, "Builds", stats.build.builds.to_string(), TEXT_PRIMARY);
                row(ui, "Background", stats.background.clone(), TEXT_PRIMARY);
                let c = stats.sphere_center;
                row(ui, "Sphere", format!("{:.1}, {:.1}, {:.1}", c.x, c.y, c.z), ACCENT_RED);
                let panner = stats
                    .panner_position
                    .map_or("-".to_string(), |p| format!("{:.1}, {:.1}, {:.1}", p.x, p.y, p.z));
                row(ui, "Panner", panner, TEXT_PRIMARY);
                row(ui, "Panner updates", stats.panner_updates.to_string(), TEXT_PRIMARY);
                let p = scene.user_point;
                row(ui, "User point", format!("{:.0}, {:.0}", p.x_deg, p.y_deg), TEXT_PRIMARY);
            });
        });
}

fn row(ui: &mut Ui, label: &str, value: String, color: Color32) {
    ui.label(RichText::new(label).color(TEXT_MUTED));
    ui.label(RichText::new(value).color(color));
    ui.end_row();
}

pub fn draw_help_overlay(ctx: &Context) {
    egui::Area::new(egui::Id::new("help_overlay"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(Color32::from_black_alpha(180))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
                    ui.label(RichText::new("LMB+Drag - Rotate | Scroll - Zoom | R - Reset view").color(TEXT_MUTED));
                    ui.label(RichText::new("Arrows - Texture point | I/K J/L U/O - Sphere").color(TEXT_MUTED));
                });
        });
}

fn fmt_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::AppConfig;

    fn draw_once(state: &mut UiState, scene: &mut SceneState) {
        let stats = PanelStats {
            fps: 60.0,
            build: BuildStats::default(),
            building: false,
            background: "test pattern".into(),
            sphere_center: DVec3::ZERO,
            panner_position: None,
            panner_updates: 0,
        };
        let ctx = Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            draw_side_panel(ctx, state, scene, &stats);
        });
    }

    #[test]
    fn drawing_keeps_valid_config_values() {
        let config = AppConfig::from_json(
            r#"{
                "shape": { "resolution": 1000, "scale": 15.0, "r": 4.0 },
                "stereo": { "convergence": 8000.0, "near_plane": 400.0, "field_of_view": 3.1 },
                "lighting": { "light_position": [0.0, -60.0, 90.0] }
            }"#,
        )
        .unwrap();
        config.validate().unwrap();

        let mut state = UiState::from_config(&config);
        let mut scene = SceneState::new(config.stereo, config.lighting, config.shape.params().unwrap());
        draw_once(&mut state, &mut scene);

        assert_eq!(state.resolution, 1000);
        assert_eq!(state.scale, 15.0);
        assert_eq!(state.shape_r, 4.0);
        assert_eq!(scene.stereo, config.stereo);
        assert_eq!(scene.lighting, config.lighting);
    }

    #[test]
    fn smallest_resolution_survives_drawing() {
        let mut state = UiState::default();
        state.resolution = 1;
        let mut scene = SceneState::default();
        draw_once(&mut state, &mut scene);
        assert_eq!(state.resolution, 1);
    }

    #[test]
    fn large_counts_are_abbreviated() {
        assert_eq!(fmt_num(999), "999");
        assert_eq!(fmt_num(181_202), "181.2K");
        assert_eq!(fmt_num(2_500_000), "2.50M");
    }
}
