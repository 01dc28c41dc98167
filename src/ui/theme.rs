use egui::style::WidgetVisuals;
use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use gantt_timeline::engine::BarKind;

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(21, 23, 30);
pub const BG_PANEL: Color32 = Color32::from_rgb(27, 30, 38);
pub const BG_HEADER: Color32 = Color32::from_rgb(33, 37, 47);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(56, 150, 190, 48);
pub const BG_STATUS: Color32 = Color32::from_rgb(17, 19, 25);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(46, 51, 63);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(72, 170, 205);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(226, 230, 238);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(150, 158, 176);
pub const TEXT_DIM: Color32 = Color32::from_rgb(96, 104, 122);
pub const TEXT_ON_BAR: Color32 = Color32::WHITE;

pub const ACCENT: Color32 = Color32::from_rgb(64, 160, 200);
pub const TODAY_LINE: Color32 = Color32::from_rgb(232, 84, 72);
pub const GRID_LINE: Color32 = Color32::from_rgb(40, 44, 56);

pub const PARENT_COLOR: Color32 = Color32::from_rgb(118, 128, 152);
pub const BASELINE_COLOR: Color32 = Color32::from_rgb(88, 96, 116);
pub const MILESTONE_COLOR: Color32 = Color32::from_rgb(246, 186, 40);
pub const PROGRESS_SHADE: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 60);

pub const CONNECTOR_COLOR: Color32 = Color32::from_rgb(136, 144, 164);
pub const CONNECTOR_SELECTED: Color32 = Color32::from_rgb(96, 196, 236);
pub const PREVIEW_STROKE: Color32 = Color32::from_rgba_premultiplied(196, 212, 232, 200);
pub const PREVIEW_FILL: Color32 = Color32::from_rgba_premultiplied(56, 150, 190, 60);

// ── Sizes ────────────────────────────────────────────────────────────────────

/// Height of the date strip above the chart and the row list.
pub const HEADER_HEIGHT: f32 = 40.0;
pub const BAR_ROUNDING: f32 = 3.0;
pub const ROW_INDENT: f32 = 14.0;
pub const ROW_LIST_WIDTH: f32 = 240.0;
pub const STATUS_BAR_HEIGHT: f32 = 24.0;
/// Pointer distance at which a connector counts as clicked.
pub const CONNECTOR_PICK_TOLERANCE: f32 = 4.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.5)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.0)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.0)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.0)
}

pub fn font_menu() -> FontId {
    FontId::proportional(13.0)
}

pub fn font_status() -> FontId {
    FontId::proportional(11.0)
}

// ── Bar colors ───────────────────────────────────────────────────────────────

/// Leaf bars cycle through these by row.
const ROW_COLORS: [Color32; 6] = [
    Color32::from_rgb(64, 160, 200),
    Color32::from_rgb(90, 176, 110),
    Color32::from_rgb(160, 110, 200),
    Color32::from_rgb(230, 140, 60),
    Color32::from_rgb(214, 88, 120),
    Color32::from_rgb(60, 186, 170),
];

/// Fill for a bar of `kind` drawn in `row`.
pub fn bar_fill(kind: BarKind, row: usize) -> Color32 {
    match kind {
        BarKind::Base | BarKind::Period => ROW_COLORS[row % ROW_COLORS.len()],
        BarKind::Parent => PARENT_COLOR,
        BarKind::Baseline => BASELINE_COLOR,
        BarKind::Milestone => MILESTONE_COLOR,
        BarKind::Progress => PROGRESS_SHADE,
    }
}

pub fn row_background(row: usize) -> Color32 {
    if row % 2 == 0 {
        BG_PANEL
    } else {
        BG_DARK
    }
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

fn style_widget(widget: &mut WidgetVisuals, fill: Color32, border: Color32, text: Stroke) {
    widget.bg_fill = fill;
    widget.weak_bg_fill = fill;
    widget.bg_stroke = Stroke::new(1.0, border);
    widget.fg_stroke = text;
    widget.rounding = Rounding::same(3.0);
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = BG_STATUS;
    visuals.window_rounding = Rounding::same(6.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    let widgets = &mut visuals.widgets;
    style_widget(
        &mut widgets.noninteractive,
        BG_PANEL,
        BORDER_SUBTLE,
        Stroke::new(1.0, TEXT_SECONDARY),
    );
    style_widget(
        &mut widgets.inactive,
        Color32::from_rgb(38, 42, 54),
        BORDER_SUBTLE,
        Stroke::new(1.0, TEXT_PRIMARY),
    );
    style_widget(
        &mut widgets.hovered,
        Color32::from_rgb(48, 54, 68),
        ACCENT,
        Stroke::new(1.0, TEXT_PRIMARY),
    );
    style_widget(
        &mut widgets.active,
        Color32::from_rgb(56, 62, 78),
        ACCENT,
        Stroke::new(1.5, TEXT_ON_BAR),
    );
    ctx.set_visuals(visuals);

    ctx.style_mut(|style| {
        style.spacing.item_spacing = egui::vec2(8.0, 4.0);
        style.spacing.button_padding = egui::vec2(8.0, 3.0);
    });
}
