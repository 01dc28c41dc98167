use egui::{menu, RichText, Ui};

use gantt_timeline::model::ChartMode;

use crate::app::TimelineApp;
use crate::ui::theme;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut TimelineApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            if ui.button("  Zoom In        Ctrl+Scroll ↑").clicked() {
                app.zoom_in();
                ui.close_menu();
            }
            if ui.button("  Zoom Out      Ctrl+Scroll ↓").clicked() {
                app.zoom_out();
                ui.close_menu();
            }
            if ui.button("  Fit All").clicked() {
                app.fit_all();
                ui.close_menu();
            }
            ui.separator();
            ui.label(RichText::new("Chart").small().weak());
            let mut mode = app.store.mode();
            let project = ui.radio_value(&mut mode, ChartMode::Project, "Tasks").clicked();
            let resource = ui.radio_value(&mut mode, ChartMode::Resource, "Resources").clicked();
            if project || resource {
                app.set_mode(mode);
                ui.close_menu();
            }
            ui.separator();
            if ui.checkbox(&mut app.config.baseline_above, "Baselines above bars").changed() {
                app.settings_changed();
            }
        });

        ui.menu_button(RichText::new("  Edit  ").font(theme::font_menu()), |ui| {
            if ui.checkbox(&mut app.config.edit_enabled, "Allow dragging").changed() {
                app.settings_changed();
            }
            ui.separator();
            let can_delete = app.view.selected_connector.is_some();
            let delete = ui.add_enabled(
                can_delete,
                egui::Button::new(format!("{}  Delete Dependency", egui_phosphor::regular::TRASH)),
            );
            if delete.clicked() {
                app.delete_selected_connector();
                ui.close_menu();
            }
            if ui
                .button(format!("{}  Save Settings", egui_phosphor::regular::FLOPPY_DISK))
                .clicked()
            {
                app.save_settings();
                ui.close_menu();
            }
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let mode = match app.store.mode() {
                ChartMode::Project => "tasks",
                ChartMode::Resource => "resources",
            };
            ui.label(
                RichText::new(format!("{} rows · {mode}", app.store.row_count()))
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
