use std::time::Duration;

use chrono::{DateTime, Utc};
use egui::{pos2, vec2, Align2, Color32, CursorIcon, Painter, Pos2, Rect, Rounding, Sense, Shape, Stroke, Ui};
use uuid::Uuid;

use gantt_timeline::config::TimelineConfig;
use gantt_timeline::engine::connector::ConnectorKey;
use gantt_timeline::engine::geometry::{diamond, parent_outline, BarKind};
use gantt_timeline::engine::{
    Bar, DragEngine, DragOutcome, GestureKind, LayoutParams, TimeScale, TimelineLayout,
};
use gantt_timeline::model::ItemStore;

use crate::ui::theme;

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;
/// Minimum pixels between two header ticks.
const MIN_TICK_SPACING: f32 = 60.0;

/// Tick step, label format, and format of the coarser label above it.
const TICK_STEPS: &[(i64, &str, &str)] = &[
    (HOUR_MS, "%H:%M", "%a %d %b"),
    (6 * HOUR_MS, "%H:%M", "%a %d %b"),
    (DAY_MS, "%d", "%b %Y"),
    (7 * DAY_MS, "%d %b", "%Y"),
    (30 * DAY_MS, "%b", "%Y"),
    (365 * DAY_MS, "%Y", ""),
];

/// Result details from interactions in the timeline.
#[derive(Debug, Clone, Default)]
pub struct TimelineInteraction {
    pub changed: bool,
    pub status: Option<String>,
}

/// The chart area: owns the per-frame layout and the drag engine.
pub struct TimelineView {
    pub layout: TimelineLayout,
    pub drag: DragEngine,
    pub selected_item: Option<Uuid>,
    pub selected_connector: Option<ConnectorKey>,
}

impl TimelineView {
    pub fn new(config: &TimelineConfig) -> Self {
        Self {
            layout: TimelineLayout::new(),
            drag: DragEngine::new(config.autoscroll_step, config.autoscroll_interval_ms),
            selected_item: None,
            selected_connector: None,
        }
    }

    /// Render the chart and feed pointer input to the drag engine.
    pub fn show(
        &mut self,
        store: &mut ItemStore,
        scale: &mut TimeScale,
        config: &TimelineConfig,
        ui: &mut Ui,
    ) -> TimelineInteraction {
        let mut interaction = TimelineInteraction::default();
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let full = response.rect;
        let header = Rect::from_min_size(full.min, vec2(full.width(), theme::HEADER_HEIGHT));
        let viewport = Rect::from_min_max(pos2(full.left(), header.bottom()), full.max);

        // Zoom with Ctrl+scroll, pan otherwise
        if response.hovered() && !self.drag.is_active() {
            let (scroll, ctrl) = ui.input(|i| (i.smooth_scroll_delta, i.modifiers.ctrl));
            if ctrl {
                if scroll.y > 0.0 {
                    scale.zoom_in(config.zoom_factor);
                } else if scroll.y < 0.0 {
                    scale.zoom_out(config.zoom_factor);
                }
            } else {
                if scroll.y != 0.0 {
                    store.set_vertical_offset(store.vertical_offset() - scroll.y, viewport.height());
                }
                if scroll.x != 0.0 && viewport.width() > 0.0 {
                    scale.ratio_scroll(f64::from(-scroll.x / viewport.width()));
                }
            }
        }

        if self.drag.is_active() && ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.drag.cancel();
            interaction.status = Some("Drag cancelled".to_string());
        }

        if self.drag.wants_autoscroll() {
            let now = ui.input(|i| i.time);
            self.drag.tick(now, scale, store, viewport);
            ui.ctx()
                .request_repaint_after(Duration::from_secs_f64(self.drag.interval_secs()));
        }

        self.layout.rebuild(
            store,
            scale,
            &LayoutParams {
                viewport,
                elements: &config.elements,
                baseline_above: config.baseline_above,
                edit_enabled: config.edit_enabled,
            },
        );

        self.handle_pointer(&response, store, scale, viewport, &mut interaction);

        // Background, rows and grid
        painter.rect_filled(full, 0.0, theme::BG_DARK);
        let body = painter.with_clip_rect(viewport);
        for row in store.visible_window(viewport.height()) {
            let top = viewport.top() - store.vertical_offset() + store.row_top(row);
            let row_rect = Rect::from_min_size(pos2(viewport.left(), top), vec2(viewport.width(), store.row_height(row)));
            body.rect_filled(row_rect, 0.0, theme::row_background(row));
            body.line_segment(
                [row_rect.left_bottom(), row_rect.right_bottom()],
                Stroke::new(0.5, theme::BORDER_SUBTLE),
            );
        }
        draw_timeline_header(&painter, header, viewport, scale);
        draw_today_line(&body, viewport, scale);

        // Bars, then connectors on top
        for bar in self.layout.bars().iter().filter(|b| b.visible) {
            let selected = self.selected_item == Some(bar.owner);
            draw_bar(&body, bar, config, selected);
        }
        for bar in self.layout.bars().iter().filter(|b| b.visible) {
            if let Some(item) = store.item(bar.owner) {
                draw_label(&body, bar, &item.name);
            }
        }
        for shape in self.layout.connectors() {
            let color = if self.selected_connector == Some(shape.key) {
                theme::CONNECTOR_SELECTED
            } else {
                theme::CONNECTOR_COLOR
            };
            let width = if self.selected_connector == Some(shape.key) { 2.0 } else { 1.0 };
            if shape.clipped.path.len() >= 2 {
                body.add(Shape::line(shape.clipped.path.clone(), Stroke::new(width, color)));
            }
            if let Some(arrow) = shape.clipped.arrow {
                body.add(Shape::convex_polygon(arrow.to_vec(), color, Stroke::NONE));
            }
        }

        self.draw_drag_preview(&painter, viewport);
        self.show_hover(&response, store, ui);

        interaction
    }

    fn handle_pointer(
        &mut self,
        response: &egui::Response,
        store: &mut ItemStore,
        scale: &TimeScale,
        viewport: Rect,
        interaction: &mut TimelineInteraction,
    ) {
        let pointer = response.interact_pointer_pos();

        if response.drag_started() {
            if let Some(pos) = pointer {
                if let Some((hit, bar)) = self.layout.hit_test(pos) {
                    let bar = *bar;
                    match self.drag.pointer_down(hit.gesture, &bar, pos, store, scale, viewport) {
                        Ok(()) => {
                            self.selected_item = Some(bar.owner);
                            self.selected_connector = None;
                        }
                        Err(err) => log::warn!("cannot start drag: {err}"),
                    }
                }
            }
        }

        if response.dragged() {
            if let Some(pos) = pointer {
                self.drag.pointer_move(pos, scale, viewport);
            }
        }

        if response.drag_stopped() && self.drag.is_active() {
            let Some(pos) = pointer.or_else(|| self.drag.session().map(|s| s.pointer)) else {
                self.drag.cancel();
                return;
            };
            let target = self.layout.bar_at(pos).copied();
            match self.drag.pointer_up(pos, target.as_ref(), scale, viewport) {
                Ok(DragOutcome::Committed(commit)) => match commit.apply(store) {
                    Ok(true) => {
                        interaction.changed = true;
                        interaction.status = Some(describe_change(store, self.selected_item));
                    }
                    Ok(false) => interaction.status = Some("Dependency already exists".to_string()),
                    Err(err) => {
                        log::warn!("commit rejected: {err}");
                        interaction.status = Some(format!("Edit failed: {err}"));
                    }
                },
                Ok(DragOutcome::Dropped) => {}
                Err(err) => log::warn!("drag ended without a session: {err}"),
            }
            response.ctx.request_repaint();
        }

        if response.clicked() {
            if let Some(pos) = pointer {
                if let Some(shape) = self.layout.connector_at(pos, theme::CONNECTOR_PICK_TOLERANCE) {
                    self.selected_connector = Some(shape.key);
                    self.selected_item = None;
                } else {
                    self.selected_connector = None;
                    self.selected_item = self.layout.bar_at(pos).map(|bar| bar.owner);
                }
            }
        }
    }

    fn draw_drag_preview(&self, painter: &Painter, viewport: Rect) {
        let Some(session) = self.drag.session() else {
            return;
        };
        if let Some((from, to)) = session.rubber_band() {
            painter.extend(Shape::dashed_line(
                &[from, to],
                Stroke::new(1.5, theme::PREVIEW_STROKE),
                4.0,
                3.0,
            ));
            painter.circle_filled(from, 3.0, theme::PREVIEW_STROKE);
            return;
        }

        let preview = session.preview;
        if !preview.is_finite() {
            return;
        }
        let painter = painter.with_clip_rect(viewport);
        let stroke = Stroke::new(1.5, theme::PREVIEW_STROKE);
        match (session.gesture, session.bar.kind) {
            (GestureKind::Progress, _) => {
                painter.rect_filled(preview, Rounding::same(theme::BAR_ROUNDING), theme::PREVIEW_FILL);
                painter.line_segment([preview.right_top(), preview.right_bottom()], stroke);
            }
            (_, BarKind::Milestone) => {
                painter.add(Shape::convex_polygon(diamond(preview).to_vec(), theme::PREVIEW_FILL, stroke));
            }
            _ => {
                painter.rect_filled(preview, Rounding::same(theme::BAR_ROUNDING), theme::PREVIEW_FILL);
                painter.rect_stroke(preview, Rounding::same(theme::BAR_ROUNDING), stroke);
            }
        }
    }

    fn show_hover(&self, response: &egui::Response, store: &ItemStore, ui: &Ui) {
        if self.drag.is_active() {
            let icon = match self.drag.session().map(|s| s.gesture) {
                Some(GestureKind::Move) => CursorIcon::Grabbing,
                Some(GestureKind::ResizeLeft | GestureKind::ResizeRight) => CursorIcon::ResizeHorizontal,
                Some(GestureKind::Progress) => CursorIcon::ResizeColumn,
                _ => CursorIcon::Crosshair,
            };
            ui.ctx().set_cursor_icon(icon);
            return;
        }
        let Some(pos) = response.hover_pos() else {
            return;
        };
        if let Some((hit, _)) = self.layout.hit_test(pos) {
            ui.ctx().set_cursor_icon(match hit.gesture {
                GestureKind::Move => CursorIcon::Grab,
                GestureKind::ResizeLeft | GestureKind::ResizeRight => CursorIcon::ResizeHorizontal,
                GestureKind::Progress => CursorIcon::ResizeColumn,
                GestureKind::ConnectFromStart | GestureKind::ConnectFromFinish => CursorIcon::Crosshair,
            });
        }

        let Some(bar) = self.layout.bar_at(pos) else {
            return;
        };
        let Some(item) = store.item(bar.owner) else {
            return;
        };
        let (start, end) = match bar.period.and_then(|index| item.period(index)) {
            Some(period) => (period.start, period.end),
            None => (item.actual_start, item.actual_end),
        };
        egui::show_tooltip_at_pointer(
            ui.ctx(),
            ui.layer_id(),
            egui::Id::new(("bar-tip", bar.target_id)),
            |ui| {
                ui.strong(&item.name);
                match (start.map(format_date), end.map(format_date)) {
                    (Some(start), Some(end)) if bar.kind != BarKind::Milestone => {
                        ui.label(format!("{start} → {end}"));
                    }
                    (Some(start), _) => {
                        ui.label(start);
                    }
                    _ => {}
                }
                if let Some(progress) = item.progress {
                    ui.label(format!("Progress: {progress}"));
                }
                if item.has_baseline() {
                    if let Some((bs, be)) = item.baseline_range() {
                        ui.label(format!("Baseline: {} → {}", format_date(bs), format_date(be)));
                    }
                }
            },
        );
    }
}

fn describe_change(store: &ItemStore, selected: Option<Uuid>) -> String {
    match selected.and_then(|id| store.item(id)) {
        Some(item) => match item.actual_range() {
            Some((start, end)) => format!("Updated '{}' ({} → {})", item.name, format_date(start), format_date(end)),
            None => format!("Updated '{}'", item.name),
        },
        None => "Timeline updated".to_string(),
    }
}

pub fn format_date(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn draw_bar(painter: &Painter, bar: &Bar, config: &TimelineConfig, selected: bool) {
    let rect = bar.rect;
    let fill = theme::bar_fill(bar.kind, bar.row);
    let stroke_width = config.elements.for_kind(bar.kind).stroke_width;
    let stroke = Stroke::new(stroke_width, fill.gamma_multiply(0.6));
    let rounding = Rounding::same(theme::BAR_ROUNDING);

    match bar.kind {
        BarKind::Base | BarKind::Period => {
            painter.rect_filled(rect.translate(vec2(1.0, 2.0)), rounding, Color32::from_black_alpha(35));
            painter.rect_filled(rect, rounding, fill);
            let highlight = Rect::from_min_size(rect.min, vec2(rect.width(), (rect.height() * 0.45).max(2.0)));
            painter.rect_filled(
                highlight,
                Rounding {
                    nw: theme::BAR_ROUNDING,
                    ne: theme::BAR_ROUNDING,
                    sw: 0.0,
                    se: 0.0,
                },
                Color32::from_white_alpha(25),
            );
            if stroke_width > 0.0 {
                painter.rect_stroke(rect, rounding, stroke);
            }
        }
        BarKind::Baseline => {
            painter.rect_filled(rect, rounding, fill);
            if stroke_width > 0.0 {
                painter.rect_stroke(rect, rounding, stroke);
            }
        }
        BarKind::Parent => {
            let outline = parent_outline(rect);
            painter.rect_filled(rect, 0.0, fill);
            // Notches: left and right corners below the bar
            painter.add(Shape::convex_polygon(
                vec![outline[4], outline[5], rect.left_bottom()],
                fill,
                Stroke::NONE,
            ));
            painter.add(Shape::convex_polygon(
                vec![rect.right_bottom(), outline[2], outline[3]],
                fill,
                Stroke::NONE,
            ));
            if stroke_width > 0.0 {
                painter.add(Shape::line(outline.to_vec(), stroke));
            }
        }
        BarKind::Milestone => {
            let shadow: Vec<Pos2> = diamond(rect).iter().map(|p| *p + vec2(1.0, 1.5)).collect();
            painter.add(Shape::convex_polygon(shadow, Color32::from_black_alpha(40), Stroke::NONE));
            let outline = if stroke_width > 0.0 { stroke } else { Stroke::NONE };
            painter.add(Shape::convex_polygon(diamond(rect).to_vec(), fill, outline));
        }
        BarKind::Progress => {
            painter.rect_filled(rect, rounding, fill);
        }
    }

    if selected && bar.kind != BarKind::Progress {
        let glow = Stroke::new(2.0, theme::BORDER_ACCENT);
        if bar.kind == BarKind::Milestone {
            painter.add(Shape::closed_line(diamond(rect.expand(1.5)).to_vec(), glow));
        } else {
            painter.rect_stroke(rect.expand(1.5), Rounding::same(theme::BAR_ROUNDING + 1.5), glow);
        }
    }
}

fn draw_label(painter: &Painter, bar: &Bar, name: &str) {
    match bar.kind {
        BarKind::Base | BarKind::Period if bar.rect.width() > 30.0 => {
            let galley = painter.layout_no_wrap(name.to_string(), theme::font_bar(), theme::TEXT_ON_BAR);
            let clipped = painter.with_clip_rect(bar.rect.intersect(painter.clip_rect()));
            let y = bar.rect.center().y - galley.size().y / 2.0;
            clipped.galley(pos2(bar.rect.left() + 6.0, y), galley, Color32::TRANSPARENT);
        }
        BarKind::Milestone => {
            painter.text(
                pos2(bar.rect.right() + 6.0, bar.rect.center().y),
                Align2::LEFT_CENTER,
                name,
                theme::font_bar(),
                theme::TEXT_SECONDARY,
            );
        }
        _ => {}
    }
}

fn draw_timeline_header(painter: &Painter, header: Rect, viewport: Rect, scale: &TimeScale) {
    painter.rect_filled(header, 0.0, theme::BG_HEADER);
    painter.line_segment(
        [header.left_bottom(), header.right_bottom()],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
    if scale.is_empty() || viewport.width() <= 0.0 {
        return;
    }

    let (min, max) = scale.visible_range();
    let px_per_ms = f64::from(viewport.width()) / (max - min);
    let &(step, label_fmt, top_fmt) = TICK_STEPS
        .iter()
        .find(|(step, _, _)| *step as f64 * px_per_ms >= f64::from(MIN_TICK_SPACING))
        .unwrap_or(&TICK_STEPS[TICK_STEPS.len() - 1]);

    let header_painter = painter.with_clip_rect(header);
    let grid_painter = painter.with_clip_rect(viewport);
    let mut last_top = String::new();
    let mut t = (min / step as f64).floor() as i64 * step;
    while (t as f64) <= max {
        let x = viewport.left() + (scale.timestamp_to_ratio(t as f64) * f64::from(viewport.width())) as f32;
        grid_painter.line_segment(
            [pos2(x, viewport.top()), pos2(x, viewport.bottom())],
            Stroke::new(0.5, theme::GRID_LINE),
        );
        if let Some(time) = DateTime::<Utc>::from_timestamp_millis(t) {
            header_painter.text(
                pos2(x + 3.0, header.top() + 30.0),
                Align2::LEFT_CENTER,
                time.format(label_fmt).to_string(),
                theme::font_sub(),
                theme::TEXT_SECONDARY,
            );
            let top = time.format(top_fmt).to_string();
            if !top.is_empty() && top != last_top {
                header_painter.text(
                    pos2(x + 3.0, header.top() + 12.0),
                    Align2::LEFT_CENTER,
                    &top,
                    theme::font_header(),
                    theme::TEXT_PRIMARY,
                );
                last_top = top;
            }
        }
        t += step;
    }
}

fn draw_today_line(painter: &Painter, viewport: Rect, scale: &TimeScale) {
    let ratio = scale.timestamp_to_ratio(Utc::now().timestamp_millis() as f64);
    if !(0.0..=1.0).contains(&ratio) {
        return;
    }
    let x = viewport.left() + (ratio * f64::from(viewport.width())) as f32;
    painter.line_segment(
        [pos2(x, viewport.top()), pos2(x, viewport.bottom())],
        Stroke::new(1.5, theme::TODAY_LINE),
    );
    let badge = Rect::from_min_size(pos2(x - 21.0, viewport.top()), vec2(42.0, 14.0));
    painter.rect_filled(badge, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge.center(),
        Align2::CENTER_CENTER,
        "Today",
        theme::font_small(),
        Color32::WHITE,
    );
}
