use egui::{pos2, vec2, Align2, Rect, Sense, Stroke, Ui};
use uuid::Uuid;

use gantt_timeline::model::{ChartMode, ItemStore};

use crate::ui::theme;

/// Actions the row list can request.
pub enum RowListAction {
    None,
    Select(Uuid),
    ToggleCollapse(Uuid),
}

/// Render the row names beside the chart, scrolled in step with it.
pub fn show_row_list(store: &mut ItemStore, selected: Option<Uuid>, ui: &mut Ui) -> RowListAction {
    let mut action = RowListAction::None;
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click());
    let full = response.rect;
    let header = Rect::from_min_size(full.min, vec2(full.width(), theme::HEADER_HEIGHT));
    let body = Rect::from_min_max(pos2(full.left(), header.bottom()), full.max);

    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            store.set_vertical_offset(store.vertical_offset() - scroll, body.height());
        }
    }

    painter.rect_filled(full, 0.0, theme::BG_DARK);
    painter.rect_filled(header, 0.0, theme::BG_HEADER);
    let title = match store.mode() {
        ChartMode::Project => "Tasks",
        ChartMode::Resource => "Resources",
    };
    painter.text(
        pos2(header.left() + 10.0, header.center().y),
        Align2::LEFT_CENTER,
        format!("{title}  ({})", store.row_count()),
        theme::font_header(),
        theme::TEXT_PRIMARY,
    );
    painter.line_segment(
        [header.left_bottom(), header.right_bottom()],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let painter = painter.with_clip_rect(body);
    let click = response.clicked().then(|| response.interact_pointer_pos()).flatten();

    for row in store.visible_window(body.height()) {
        let Some(item) = store.row_item(row) else {
            continue;
        };
        let top = body.top() - store.vertical_offset() + store.row_top(row);
        let row_rect = Rect::from_min_size(pos2(body.left(), top), vec2(body.width(), store.row_height(row)));
        let is_selected = selected == Some(item.id);

        painter.rect_filled(
            row_rect,
            0.0,
            if is_selected {
                theme::BG_SELECTED
            } else {
                theme::row_background(row)
            },
        );

        let indent = row_rect.left() + 8.0 + store.depth(row) as f32 * theme::ROW_INDENT;
        let caret_rect = Rect::from_center_size(pos2(indent + 6.0, row_rect.center().y), vec2(14.0, 14.0));
        if store.has_children(item.id) {
            let caret = if item.collapsed {
                egui_phosphor::regular::CARET_RIGHT
            } else {
                egui_phosphor::regular::CARET_DOWN
            };
            painter.text(
                caret_rect.center(),
                Align2::CENTER_CENTER,
                caret,
                theme::font_sub(),
                theme::TEXT_SECONDARY,
            );
        }

        let name = if item.is_milestone() {
            format!("{} {}", egui_phosphor::regular::DIAMOND, item.name)
        } else {
            item.name.clone()
        };
        painter.text(
            pos2(caret_rect.right() + 4.0, row_rect.center().y),
            Align2::LEFT_CENTER,
            name,
            theme::font_bar(),
            if is_selected {
                theme::TEXT_ON_BAR
            } else {
                theme::TEXT_PRIMARY
            },
        );
        if let Some(progress) = item.progress {
            painter.text(
                pos2(row_rect.right() - 8.0, row_rect.center().y),
                Align2::RIGHT_CENTER,
                progress.to_string(),
                theme::font_small(),
                theme::TEXT_DIM,
            );
        }

        if let Some(pos) = click.filter(|pos| row_rect.contains(*pos)) {
            action = if store.has_children(item.id) && caret_rect.contains(pos) {
                RowListAction::ToggleCollapse(item.id)
            } else {
                RowListAction::Select(item.id)
            };
        }
    }

    action
}
