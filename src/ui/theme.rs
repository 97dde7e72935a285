use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

pub const BG_PURE_BLACK: Color32 = Color32::from_rgb(0, 0, 0);
pub const BG_PANEL: Color32 = Color32::from_rgb(8, 8, 10);
pub const BG_WIDGET: Color32 = Color32::from_rgb(20, 20, 24);
pub const BG_WIDGET_HOVER: Color32 = Color32::from_rgb(30, 30, 36);
pub const BG_WIDGET_ACTIVE: Color32 = Color32::from_rgb(42, 42, 50);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(176, 176, 180);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(110, 110, 116);
pub const TEXT_BRIGHT: Color32 = Color32::from_rgb(225, 225, 230);

// the two anaglyph filter colors
pub const ACCENT_RED: Color32 = Color32::from_rgb(214, 48, 49);
pub const ACCENT_CYAN: Color32 = Color32::from_rgb(0, 190, 200);
pub const ACCENT_GREEN: Color32 = Color32::from_rgb(46, 172, 35);
pub const ACCENT_ORANGE: Color32 = Color32::from_rgb(200, 130, 35);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgba_premultiplied(60, 60, 70, 77);

fn widget(bg: Color32, stroke: Stroke, fg: Color32, expansion: f32) -> egui::style::WidgetVisuals {
    egui::style::WidgetVisuals {
        bg_fill: bg,
        weak_bg_fill: bg,
        bg_stroke: stroke,
        rounding: Rounding::same(4.0),
        fg_stroke: Stroke::new(1.0, fg),
        expansion,
    }
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut style = Style::default();

    let mut noninteractive = widget(BG_WIDGET, Stroke::new(1.0, BORDER_SUBTLE), TEXT_MUTED, 0.0);
    noninteractive.weak_bg_fill = BG_PANEL;

    style.visuals = Visuals {
        dark_mode: true,
        override_text_color: Some(TEXT_PRIMARY),
        widgets: egui::style::Widgets {
            noninteractive,
            inactive: widget(BG_WIDGET, Stroke::new(1.0, BORDER_SUBTLE), TEXT_PRIMARY, 0.0),
            hovered: widget(BG_WIDGET_HOVER, Stroke::new(1.0, ACCENT_CYAN), TEXT_BRIGHT, 1.0),
            active: widget(BG_WIDGET_ACTIVE, Stroke::new(2.0, ACCENT_RED), TEXT_BRIGHT, 1.0),
            open: widget(BG_WIDGET_ACTIVE, Stroke::new(1.0, ACCENT_CYAN), TEXT_BRIGHT, 0.0),
        },
        selection: egui::style::Selection {
            bg_fill: ACCENT_RED.gamma_multiply(0.4),
            stroke: Stroke::new(1.0, ACCENT_RED),
        },
        hyperlink_color: ACCENT_CYAN,
        faint_bg_color: BG_PANEL,
        extreme_bg_color: BG_PURE_BLACK,
        code_bg_color: BG_PURE_BLACK,
        warn_fg_color: ACCENT_ORANGE,
        error_fg_color: ACCENT_RED,
        window_rounding: Rounding::same(6.0),
        window_fill: BG_PANEL,
        window_stroke: Stroke::new(1.0, BORDER_SUBTLE),
        panel_fill: BG_PANEL,
        slider_trailing_fill: true,
        handle_shape: egui::style::HandleShape::Circle,
        ..Visuals::dark()
    };

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(12.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.slider_width = 180.0;

    style.text_styles = [
        (TextStyle::Small, FontId::new(11.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace)),
    ]
    .into();

    ctx.set_style(style);
}
