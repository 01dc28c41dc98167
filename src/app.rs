use std::cell::Cell;
use std::rc::Rc;

use chrono::{Duration, Local};
use uuid::Uuid;

use gantt_timeline::config::TimelineConfig;
use gantt_timeline::engine::{ConnectorType, TimeScale};
use gantt_timeline::model::{ChartMode, ConnectorRecord, Item, ItemStore, Period, Progress};

use crate::ui;

/// Main application state.
pub struct TimelineApp {
    pub store: ItemStore,
    pub scale: TimeScale,
    pub config: TimelineConfig,
    pub view: ui::timeline::TimelineView,
    pub status_message: String,
    data_changed: Rc<Cell<bool>>,
}

impl TimelineApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: TimelineConfig) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let mut store = match ItemStore::from_json(&Self::sample_json(), config.row_height) {
            Ok(store) => store,
            Err(err) => {
                log::warn!("sample data rejected: {err}");
                ItemStore::new(Vec::new(), config.row_height)
            }
        };

        let data_changed = Rc::new(Cell::new(true));
        let flag = Rc::clone(&data_changed);
        store.subscribe(move |event| {
            log::debug!("store changed, revision {}", event.revision);
            flag.set(true);
        });

        let scale = TimeScale::with_gaps(config.minimum_gap, config.maximum_gap);
        log::info!("loaded {} items", store.items().len());

        Self {
            store,
            scale,
            view: ui::timeline::TimelineView::new(&config),
            config,
            status_message: "Ready".to_string(),
            data_changed,
        }
    }

    /// Sample project seeded as JSON, the way saved data arrives.
    fn sample_json() -> String {
        let day = Duration::days(1).num_milliseconds();
        let today = Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map_or(0, |midnight| midnight.and_utc().timestamp_millis());
        let at = |days: i64| today + days * day;

        let planning = Item::new("Planning", at(-5), at(8));
        let kickoff = Item::new("Project Kickoff", at(-5), at(-2))
            .child_of(planning.id)
            .with_progress(Progress::COMPLETE);
        let requirements = Item::new("Requirements Gathering", at(-2), at(5))
            .child_of(planning.id)
            .with_baseline(at(-3), at(3))
            .with_progress(Progress::from_ratio(0.6).unwrap_or_default());
        let planned = Item::milestone("Planning Complete", at(8)).child_of(planning.id);

        let execution = Item::new("Execution", at(6), at(30));
        let design = Item::new("UI Design", at(6), at(18)).child_of(execution.id);
        let backend = Item::new("Backend Development", at(6), at(28))
            .child_of(execution.id)
            .with_baseline(at(6), at(24));
        let testing = Item::new("Testing & QA", at(22), at(30)).child_of(execution.id);
        let launch = Item::milestone("Launch", at(32));

        let kickoff = kickoff.with_connector(requirements.id, ConnectorType::FinishStart);
        let requirements = requirements.with_connector(design.id, ConnectorType::FinishStart);
        let design = design.with_connector(backend.id, ConnectorType::StartStart);
        let backend = backend.with_connector(testing.id, ConnectorType::FinishFinish);
        let planned = planned.with_connector(design.id, ConnectorType::FinishStart);

        let design_team = Period::new(at(-4), at(4));
        let mut ux_review = Period::new(at(10), at(16));
        let dev_sprint = Period::new(at(6), at(20));
        ux_review
            .connectors
            .push(ConnectorRecord::new(dev_sprint.id, ConnectorType::StartStart));
        let designers = Item::resource("Design Team", vec![design_team, ux_review]);
        let developers = Item::resource("Dev Team", vec![dev_sprint, Period::new(at(24), at(30))]);

        let items = vec![
            planning,
            kickoff,
            requirements,
            planned,
            execution,
            design,
            backend,
            designers,
            developers,
        ];
        let mut json = match serde_json::to_value(&items) {
            Ok(serde_json::Value::Array(values)) => values,
            _ => Vec::new(),
        };

        // Older files store a single connector on the item itself.
        json.push(serde_json::json!({
            "id": testing.id,
            "name": testing.name,
            "parent": testing.parent,
            "actualStart": testing.actual_start,
            "actualEnd": testing.actual_end,
            "progressValue": "10%",
            "connectTo": launch.id,
            "connectorType": "finish-start",
        }));
        if let Ok(value) = serde_json::to_value(&launch) {
            json.push(value);
        }
        serde_json::Value::Array(json).to_string()
    }

    // --- Actions ---

    pub fn zoom_in(&mut self) {
        self.scale.zoom_in(self.config.zoom_factor);
    }

    pub fn zoom_out(&mut self) {
        self.scale.zoom_out(self.config.zoom_factor);
    }

    pub fn fit_all(&mut self) {
        self.scale.fit_all();
    }

    pub fn set_mode(&mut self, mode: ChartMode) {
        self.store.set_mode(mode);
        self.view.selected_connector = None;
        self.status_message = match mode {
            ChartMode::Project => "Showing tasks".to_string(),
            ChartMode::Resource => "Showing resources".to_string(),
        };
    }

    pub fn settings_changed(&mut self) {
        self.view.drag.cancel();
        self.status_message = "Settings changed".to_string();
    }

    pub fn save_settings(&mut self) {
        let path = TimelineConfig::default_path();
        self.status_message = match self.config.save_to(&path) {
            Ok(()) => format!("Settings saved to {}", path.display()),
            Err(err) => {
                log::warn!("{err}");
                format!("Could not save settings: {err}")
            }
        };
    }

    pub fn delete_selected_connector(&mut self) {
        let Some(key) = self.view.selected_connector.take() else {
            return;
        };
        let Some(shape) = self.view.layout.connectors().iter().find(|s| s.key == key).cloned() else {
            return;
        };
        let removed = self
            .store
            .edit(|store| store.remove_connector(shape.source, shape.source_period, shape.record));
        self.status_message = match removed {
            Ok(true) => format!("Removed {} dependency", shape.record.kind.short_name()),
            Ok(false) => "Dependency already gone".to_string(),
            Err(err) => format!("Could not remove dependency: {err}"),
        };
    }

    pub fn toggle_collapsed(&mut self, id: Uuid) {
        if let Err(err) = self.store.toggle_collapsed(id) {
            log::warn!("{err}");
        }
    }

    /// Feeds the data extent to the scale after the store changed.
    fn sync_scale(&mut self) {
        if !self.data_changed.replace(false) {
            return;
        }
        if let Some((min, max)) = self.store.data_extent() {
            self.scale.set_data_range(min as f64, max as f64);
        }
    }
}

impl eframe::App for TimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);
        self.sync_scale();

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_STATUS)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_status())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if !self.scale.is_empty() {
                            let (min, max) = self.scale.visible_range();
                            ui.label(
                                egui::RichText::new(format!(
                                    "{}  →  {}",
                                    ui::timeline::format_date(min as i64),
                                    ui::timeline::format_date(max as i64),
                                ))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                            );
                        }
                    });
                });
            });

        // Left panel: row names
        let mut row_action = ui::row_list::RowListAction::None;
        egui::SidePanel::left("row_list")
            .default_width(ui::theme::ROW_LIST_WIDTH)
            .resizable(true)
            .frame(egui::Frame::default().fill(ui::theme::BG_PANEL))
            .show(ctx, |ui| {
                row_action = ui::row_list::show_row_list(&mut self.store, self.view.selected_item, ui);
            });
        match row_action {
            ui::row_list::RowListAction::Select(id) => self.view.selected_item = Some(id),
            ui::row_list::RowListAction::ToggleCollapse(id) => self.toggle_collapsed(id),
            ui::row_list::RowListAction::None => {}
        }

        // Central panel: timeline
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            let interaction = self.view.show(&mut self.store, &mut self.scale, &self.config, ui);
            if let Some(status) = interaction.status {
                self.status_message = status;
            }
            if interaction.changed {
                ctx.request_repaint();
            }
        });
    }
}
