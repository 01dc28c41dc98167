//! Pointer-driven editing of bars.
//!
//! A [`DragEngine`] holds at most one [`DragSession`]. The session keeps the
//! exact timestamps of the range being edited, so its preview can be
//! re-projected against a scale that scrolls underneath it.

use egui::{pos2, Pos2, Rect, Vec2};
use uuid::Uuid;

use crate::engine::connector::ConnectorType;
use crate::engine::geometry::BarKind;
use crate::engine::pool::Bar;
use crate::engine::scale::TimeScale;
use crate::error::{Result, TimelineError};
use crate::model::{ConnectorRecord, ItemStore, Progress};

/// Pixels scrolled per autoscroll tick.
pub const SCROLL_STEP: f32 = 30.0;
/// Minimum time between autoscroll ticks.
pub const SCROLL_INTERVAL_MS: u64 = 100;

/// What a drag does, chosen by the hit region it started on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Move,
    ResizeLeft,
    ResizeRight,
    Progress,
    ConnectFromStart,
    ConnectFromFinish,
}

impl GestureKind {
    pub fn is_connect(self) -> bool {
        matches!(self, GestureKind::ConnectFromStart | GestureKind::ConnectFromFinish)
    }

    fn scrolls_horizontally(self) -> bool {
        self != GestureKind::Progress
    }

    fn scrolls_vertically(self) -> bool {
        self == GestureKind::Move || self.is_connect()
    }
}

/// Which range of an item a drag edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    Actual,
    Baseline,
    Period(usize),
}

/// A data change produced by a finished drag.
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    Range {
        item: Uuid,
        field: RangeField,
        start: i64,
        end: i64,
    },
    Milestone {
        item: Uuid,
        field: RangeField,
        at: i64,
    },
    /// `field` is [`RangeField::Actual`] or [`RangeField::Baseline`].
    Progress {
        item: Uuid,
        field: RangeField,
        value: Progress,
    },
    Connector {
        item: Uuid,
        period: Option<usize>,
        record: ConnectorRecord,
    },
}

impl Commit {
    /// Writes the change as one notification batch. Returns false when the
    /// store already held it.
    pub fn apply(&self, store: &mut ItemStore) -> Result<bool> {
        store.edit(|store| match *self {
            Commit::Range {
                item,
                field,
                start,
                end,
            } => {
                match field {
                    RangeField::Actual => store.set_actual_range(item, start, end)?,
                    RangeField::Baseline => store.set_baseline_range(item, start, end)?,
                    RangeField::Period(index) => store.set_period_range(item, index, start, end)?,
                }
                Ok(true)
            }
            Commit::Milestone { item, field, at } => {
                match field {
                    RangeField::Actual => store.set_actual_milestone(item, at)?,
                    RangeField::Baseline => store.set_baseline_range(item, at, at)?,
                    RangeField::Period(index) => store.set_period_milestone(item, index, at)?,
                }
                Ok(true)
            }
            Commit::Progress { item, field, value } => {
                match field {
                    RangeField::Baseline => store.set_baseline_progress(item, value)?,
                    _ => store.set_progress(item, value)?,
                }
                Ok(true)
            }
            Commit::Connector {
                item,
                period,
                record,
            } => store.add_connector(item, period, record),
        })
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Committed(Commit),
    /// No change: invalid geometry, no drop target, or a self-link.
    Dropped,
}

/// The live state of one drag.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub gesture: GestureKind,
    pub bar: Bar,
    pub origin: Rect,
    pub preview: Rect,
    pub pointer_origin: Pos2,
    pub pointer: Pos2,
    pub pointer_delta: Vec2,
    pub scroll_accumulator: Vec2,
    field: RangeField,
    start_ms: f64,
    end_ms: f64,
    progress: f32,
    preview_left: f64,
    preview_right: f64,
}

impl DragSession {
    /// Clamps a pointer displacement to what this gesture allows.
    pub fn limit(&self, delta: Vec2) -> Vec2 {
        let w = self.origin.width();
        match self.gesture {
            GestureKind::Move => Vec2::new(delta.x, 0.0),
            GestureKind::ResizeLeft => Vec2::new(delta.x.min(w), 0.0),
            GestureKind::ResizeRight => Vec2::new(delta.x.max(-w), 0.0),
            GestureKind::Progress => {
                let done = self.progress * w;
                Vec2::new(delta.x.clamp(-done, w - done), 0.0)
            }
            GestureKind::ConnectFromStart | GestureKind::ConnectFromFinish => delta,
        }
    }

    pub fn is_milestone(&self) -> bool {
        self.bar.kind == BarKind::Milestone
    }

    /// Source anchor and pointer of a connector drag.
    pub fn rubber_band(&self) -> Option<(Pos2, Pos2)> {
        if !self.gesture.is_connect() {
            return None;
        }
        let y = self.preview.center().y;
        let x = if self.is_milestone() {
            self.preview.center().x
        } else if self.gesture == GestureKind::ConnectFromStart {
            self.preview.left()
        } else {
            self.preview.right()
        };
        Some((pos2(x, y), self.pointer))
    }

    fn limited(&self) -> Vec2 {
        self.limit(self.pointer_delta + self.scroll_accumulator)
    }

    fn track(&mut self, pointer: Pos2) {
        self.pointer = pointer;
        self.pointer_delta = pointer - self.pointer_origin;
    }

    fn refresh(&mut self, scale: &TimeScale, viewport: Rect) {
        let dx = f64::from(self.limited().x);
        let x_start = project(scale, viewport, self.start_ms);
        let x_end = project(scale, viewport, self.end_ms);

        let (left, right) = match self.gesture {
            GestureKind::Move => (x_start + dx, x_end + dx),
            GestureKind::ResizeLeft => ((x_start + dx).min(x_end), x_end),
            GestureKind::ResizeRight => (x_start, (x_end + dx).max(x_start)),
            GestureKind::Progress => {
                let done = (x_end - x_start) * f64::from(self.progress);
                (x_start, x_start + done + dx)
            }
            GestureKind::ConnectFromStart | GestureKind::ConnectFromFinish => (x_start, x_end),
        };
        self.preview_left = left;
        self.preview_right = right;

        let shift_y = -self.scroll_accumulator.y;
        self.preview = if self.is_milestone() {
            Rect::from_center_size(
                pos2(left as f32, self.origin.center().y + shift_y),
                self.origin.size(),
            )
        } else {
            let top = self.origin.top() + shift_y;
            Rect::from_min_max(
                pos2(left as f32, top),
                pos2(right as f32, top + self.origin.height()),
            )
        };
    }

    fn commit(&self, drop_target: Option<&Bar>, scale: &TimeScale, viewport: Rect) -> Option<Commit> {
        let item = self.bar.owner;
        match self.gesture {
            GestureKind::Move => {
                let delta = f64::from(self.limited().x) / f64::from(viewport.width()) * scale.visible_span();
                if self.is_milestone() {
                    let at = to_stamp(self.start_ms + delta)?;
                    Some(Commit::Milestone {
                        item,
                        field: self.field,
                        at,
                    })
                } else {
                    Some(Commit::Range {
                        item,
                        field: self.field,
                        start: to_stamp(self.start_ms + delta)?,
                        end: to_stamp(self.end_ms + delta)?,
                    })
                }
            }
            GestureKind::ResizeLeft | GestureKind::ResizeRight => Some(Commit::Range {
                item,
                field: self.field,
                start: to_stamp(unproject(scale, viewport, self.preview_left))?,
                end: to_stamp(unproject(scale, viewport, self.preview_right))?,
            }),
            GestureKind::Progress => {
                if matches!(self.field, RangeField::Period(_)) {
                    return None;
                }
                let x_start = project(scale, viewport, self.start_ms);
                let x_end = project(scale, viewport, self.end_ms);
                let ratio = (self.preview_right - x_start) / (x_end - x_start);
                Some(Commit::Progress {
                    item,
                    field: self.field,
                    value: Progress::from_ratio(ratio)?,
                })
            }
            GestureKind::ConnectFromStart | GestureKind::ConnectFromFinish => {
                let target = drop_target.filter(|t| accepts_connector(t))?;
                if target.target_id == self.bar.target_id {
                    return None;
                }
                let drop_ratio = (self.pointer.x - target.rect.left()) / target.rect.width();
                let kind = ConnectorType::from_ends(
                    self.gesture == GestureKind::ConnectFromStart,
                    drop_ratio < 0.5,
                );
                Some(Commit::Connector {
                    item,
                    period: self.bar.period,
                    record: ConnectorRecord::new(target.target_id, kind),
                })
            }
        }
    }
}

/// Bars a connector may be dropped on.
pub fn accepts_connector(bar: &Bar) -> bool {
    bar.visible
        && matches!(
            bar.kind,
            BarKind::Base | BarKind::Parent | BarKind::Milestone | BarKind::Period
        )
}

fn project(scale: &TimeScale, viewport: Rect, t: f64) -> f64 {
    f64::from(viewport.left()) + scale.timestamp_to_ratio(t) * f64::from(viewport.width())
}

fn unproject(scale: &TimeScale, viewport: Rect, x: f64) -> f64 {
    scale.ratio_to_timestamp((x - f64::from(viewport.left())) / f64::from(viewport.width()))
}

fn to_stamp(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.round() as i64)
}

/// Drives drag sessions and the autoscroll that runs while one is active.
#[derive(Debug)]
pub struct DragEngine {
    session: Option<DragSession>,
    scroll_direction: Vec2,
    last_tick: Option<f64>,
    step: f32,
    interval: f64,
}

impl Default for DragEngine {
    fn default() -> Self {
        Self::new(SCROLL_STEP, SCROLL_INTERVAL_MS)
    }
}

impl DragEngine {
    pub fn new(step: f32, interval_ms: u64) -> Self {
        Self {
            session: None,
            scroll_direction: Vec2::ZERO,
            last_tick: None,
            step,
            interval: interval_ms as f64 / 1000.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn preview(&self) -> Option<Rect> {
        self.session.as_ref().map(|s| s.preview)
    }

    /// True while the pointer sits outside the viewport during a drag.
    pub fn wants_autoscroll(&self) -> bool {
        self.session.is_some() && self.scroll_direction != Vec2::ZERO
    }

    pub fn interval_secs(&self) -> f64 {
        self.interval
    }

    /// Starts a session on `bar`.
    pub fn pointer_down(
        &mut self,
        gesture: GestureKind,
        bar: &Bar,
        pointer: Pos2,
        store: &ItemStore,
        scale: &TimeScale,
        viewport: Rect,
    ) -> Result<()> {
        if self.session.is_some() {
            return Err(TimelineError::DragInProgress);
        }
        let item = store.item(bar.owner).ok_or(TimelineError::ItemNotFound(bar.owner))?;
        let (field, start, end) = match (bar.kind, bar.period) {
            (_, Some(index)) => {
                let period = item.period(index).ok_or(TimelineError::PeriodNotFound {
                    item: item.id,
                    index,
                })?;
                (RangeField::Period(index), period.start, period.end.or(period.start))
            }
            (BarKind::Baseline, None) => (RangeField::Baseline, item.baseline_start, item.baseline_end),
            (BarKind::Milestone, None) => (RangeField::Actual, item.actual_start, item.actual_start),
            _ => (RangeField::Actual, item.actual_start, item.actual_end),
        };
        let as_ms = |t: Option<i64>| t.map_or(f64::NAN, |t| t as f64);

        let mut session = DragSession {
            gesture,
            bar: *bar,
            origin: bar.rect,
            preview: bar.rect,
            pointer_origin: pointer,
            pointer,
            pointer_delta: Vec2::ZERO,
            scroll_accumulator: Vec2::ZERO,
            field,
            start_ms: as_ms(start),
            end_ms: as_ms(end),
            progress: bar.progress.unwrap_or(0.0),
            preview_left: f64::from(bar.rect.left()),
            preview_right: f64::from(bar.rect.right()),
        };
        session.refresh(scale, viewport);
        log::debug!("drag started: {gesture:?} on {} ({:?})", item.name, bar.kind);

        self.session = Some(session);
        self.scroll_direction = Vec2::ZERO;
        self.last_tick = None;
        Ok(())
    }

    /// Updates the preview for a new pointer position.
    pub fn pointer_move(&mut self, pointer: Pos2, scale: &TimeScale, viewport: Rect) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.track(pointer);
        session.refresh(scale, viewport);

        let mut direction = Vec2::ZERO;
        if session.gesture.scrolls_horizontally() {
            if pointer.x < viewport.left() {
                direction.x = -1.0;
            } else if pointer.x > viewport.right() {
                direction.x = 1.0;
            }
        }
        if session.gesture.scrolls_vertically() {
            if pointer.y < viewport.top() {
                direction.y = -1.0;
            } else if pointer.y > viewport.bottom() {
                direction.y = 1.0;
            }
        }
        if direction == Vec2::ZERO {
            self.last_tick = None;
        }
        self.scroll_direction = direction;
    }

    /// Scrolls one step toward the pointer when it is outside the viewport
    /// and at least one interval has passed since the previous step.
    ///
    /// `now` is in seconds. Returns true when anything scrolled.
    pub fn tick(&mut self, now: f64, scale: &mut TimeScale, store: &mut ItemStore, viewport: Rect) -> bool {
        let direction = self.scroll_direction;
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if direction == Vec2::ZERO {
            return false;
        }
        if self.last_tick.is_some_and(|last| now - last < self.interval) {
            return false;
        }
        self.last_tick = Some(now);

        let mut scrolled = false;
        if direction.x != 0.0 && viewport.width() > 0.0 {
            let (before, _) = scale.visible_range();
            scale.ratio_force_scroll(f64::from(direction.x * self.step / viewport.width()));
            let (after, _) = scale.visible_range();
            let shift = (after - before) / scale.visible_span() * f64::from(viewport.width());
            if shift.is_finite() && shift != 0.0 {
                session.scroll_accumulator.x += shift as f32;
                scrolled = true;
            }
        }
        if direction.y != 0.0 {
            let before = store.vertical_offset();
            store.set_vertical_offset(before + direction.y * self.step, viewport.height());
            let shift = store.vertical_offset() - before;
            if shift != 0.0 {
                session.scroll_accumulator.y += shift;
                scrolled = true;
            }
        }
        session.refresh(scale, viewport);
        scrolled
    }

    /// Ends the session and turns it into a commit.
    ///
    /// `drop_target` is the bar under the pointer, used by connector drags.
    pub fn pointer_up(
        &mut self,
        pointer: Pos2,
        drop_target: Option<&Bar>,
        scale: &TimeScale,
        viewport: Rect,
    ) -> Result<DragOutcome> {
        let mut session = self.session.take().ok_or(TimelineError::NoActiveSession)?;
        self.scroll_direction = Vec2::ZERO;
        self.last_tick = None;

        session.track(pointer);
        session.refresh(scale, viewport);
        let outcome = match session.commit(drop_target, scale, viewport) {
            Some(commit) => {
                log::debug!("drag committed: {commit:?}");
                DragOutcome::Committed(commit)
            }
            None => {
                log::debug!("drag on {} dropped without a change", session.bar.owner);
                DragOutcome::Dropped
            }
        };
        Ok(outcome)
    }

    /// Abandons the active session, if any.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!("drag cancelled: {:?}", session.gesture);
        }
        self.scroll_direction = Vec2::ZERO;
        self.last_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use egui::vec2;

    use crate::model::{Item, Period};

    use super::*;

    const VIEWPORT: Rect = Rect {
        min: Pos2 { x: 0.0, y: 0.0 },
        max: Pos2 { x: 1000.0, y: 200.0 },
    };

    fn scale() -> TimeScale {
        let mut scale = TimeScale::with_gaps(0.0, 0.0);
        scale.set_data_range(0.0, 1000.0);
        scale.set_range(0.0, 1000.0);
        scale
    }

    fn bar_for(item: &Item, kind: BarKind, start: i64, end: i64, row: usize) -> Bar {
        Bar {
            rect: Rect::from_min_max(
                pos2(start as f32, row as f32 * 20.0 + 3.0),
                pos2(end as f32, row as f32 * 20.0 + 17.0),
            ),
            kind,
            owner: item.id,
            target_id: item.id,
            row,
            period: None,
            progress: item.progress.map(Progress::ratio),
            visible: true,
        }
    }

    fn drag(
        engine: &mut DragEngine,
        gesture: GestureKind,
        bar: &Bar,
        store: &ItemStore,
        dx: f32,
    ) -> DragOutcome {
        let scale = scale();
        let from = bar.rect.center();
        engine
            .pointer_down(gesture, bar, from, store, &scale, VIEWPORT)
            .unwrap();
        engine.pointer_move(from + vec2(dx, 0.0), &scale, VIEWPORT);
        engine
            .pointer_up(from + vec2(dx, 0.0), None, &scale, VIEWPORT)
            .unwrap()
    }

    #[test]
    fn zero_move_keeps_range() {
        let item = Item::new("a", 123, 457);
        let bar = bar_for(&item, BarKind::Base, 123, 457, 0);
        let store = ItemStore::new(vec![item.clone()], 20.0);
        let outcome = drag(&mut DragEngine::default(), GestureKind::Move, &bar, &store, 0.0);
        assert_eq!(
            outcome,
            DragOutcome::Committed(Commit::Range {
                item: item.id,
                field: RangeField::Actual,
                start: 123,
                end: 457,
            })
        );
    }

    #[test]
    fn move_shifts_both_ends_and_ignores_vertical_motion() {
        let item = Item::new("a", 100, 200);
        let bar = bar_for(&item, BarKind::Base, 100, 200, 0);
        let mut store = ItemStore::new(vec![item.clone()], 20.0);
        let scale = scale();
        let mut engine = DragEngine::default();

        engine
            .pointer_down(GestureKind::Move, &bar, pos2(150.0, 10.0), &store, &scale, VIEWPORT)
            .unwrap();
        engine.pointer_move(pos2(190.0, 80.0), &scale, VIEWPORT);
        let preview = engine.preview().unwrap();
        assert_eq!(preview.left(), 140.0);
        assert_eq!(preview.top(), bar.rect.top());

        let DragOutcome::Committed(commit) = engine
            .pointer_up(pos2(190.0, 80.0), None, &scale, VIEWPORT)
            .unwrap()
        else {
            panic!("expected a commit");
        };
        assert!(commit.apply(&mut store).unwrap());
        assert_eq!(store.item(item.id).unwrap().actual_range(), Some((140, 240)));
        assert!(!engine.is_active());
    }

    #[test]
    fn milestone_move_mirrors_end() {
        let item = Item::milestone("m", 300);
        let bar = bar_for(&item, BarKind::Milestone, 293, 307, 0);
        let mut store = ItemStore::new(vec![item.clone()], 20.0);
        let outcome = drag(&mut DragEngine::default(), GestureKind::Move, &bar, &store, 50.0);
        let DragOutcome::Committed(commit) = outcome else {
            panic!("expected a commit");
        };
        assert_eq!(
            commit,
            Commit::Milestone {
                item: item.id,
                field: RangeField::Actual,
                at: 350,
            }
        );
        commit.apply(&mut store).unwrap();
        let moved = store.item(item.id).unwrap();
        assert_eq!((moved.actual_start, moved.actual_end), (Some(350), Some(350)));
    }

    #[test]
    fn baseline_move_touches_baseline_only() {
        let item = Item::new("a", 100, 200).with_baseline(80, 180);
        let bar = bar_for(&item, BarKind::Baseline, 80, 180, 0);
        let store = ItemStore::new(vec![item.clone()], 20.0);
        let outcome = drag(&mut DragEngine::default(), GestureKind::Move, &bar, &store, -30.0);
        assert_eq!(
            outcome,
            DragOutcome::Committed(Commit::Range {
                item: item.id,
                field: RangeField::Baseline,
                start: 50,
                end: 150,
            })
        );
    }

    #[test]
    fn resize_left_cannot_cross_right_edge() {
        let item = Item::new("a", 100, 200);
        let bar = bar_for(&item, BarKind::Base, 100, 200, 0);
        let store = ItemStore::new(vec![item.clone()], 20.0);
        let outcome = drag(&mut DragEngine::default(), GestureKind::ResizeLeft, &bar, &store, 500.0);
        assert_eq!(
            outcome,
            DragOutcome::Committed(Commit::Range {
                item: item.id,
                field: RangeField::Actual,
                start: 200,
                end: 200,
            })
        );
    }

    #[test]
    fn resize_right_keeps_start() {
        let item = Item::new("a", 100, 200);
        let bar = bar_for(&item, BarKind::Base, 100, 200, 0);
        let store = ItemStore::new(vec![item.clone()], 20.0);
        let outcome = drag(&mut DragEngine::default(), GestureKind::ResizeRight, &bar, &store, 75.0);
        assert_eq!(
            outcome,
            DragOutcome::Committed(Commit::Range {
                item: item.id,
                field: RangeField::Actual,
                start: 100,
                end: 275,
            })
        );
    }

    #[test]
    fn period_resize_targets_period() {
        let resource = Item::resource("r", vec![Period::new(0, 50), Period::new(100, 200)]);
        let mut bar = bar_for(&resource, BarKind::Period, 100, 200, 0);
        bar.period = Some(1);
        bar.target_id = resource.periods[1].id;
        let mut store = ItemStore::new(vec![resource.clone()], 20.0);
        let outcome = drag(&mut DragEngine::default(), GestureKind::ResizeLeft, &bar, &store, -20.0);
        let DragOutcome::Committed(commit) = outcome else {
            panic!("expected a commit");
        };
        commit.apply(&mut store).unwrap();
        let period = &store.item(resource.id).unwrap().periods[1];
        assert_eq!((period.start, period.end), (Some(80), Some(200)));
    }

    #[test]
    fn progress_clamps_to_complete() {
        let item = Item::new("a", 100, 300).with_progress(Progress::from_ratio(0.3).unwrap());
        let bar = bar_for(&item, BarKind::Base, 100, 300, 0);
        let store = ItemStore::new(vec![item.clone()], 20.0);

        let mut engine = DragEngine::default();
        let outcome = drag(&mut engine, GestureKind::Progress, &bar, &store, 900.0);
        assert_eq!(
            outcome,
            DragOutcome::Committed(Commit::Progress {
                item: item.id,
                field: RangeField::Actual,
                value: Progress::COMPLETE,
            })
        );

        let outcome = drag(&mut engine, GestureKind::Progress, &bar, &store, 40.0);
        assert_eq!(
            outcome,
            DragOutcome::Committed(Commit::Progress {
                item: item.id,
                field: RangeField::Actual,
                value: Progress::from_ratio(0.5).unwrap(),
            })
        );

        let outcome = drag(&mut engine, GestureKind::Progress, &bar, &store, -900.0);
        assert_eq!(
            outcome,
            DragOutcome::Committed(Commit::Progress {
                item: item.id,
                field: RangeField::Actual,
                value: Progress::from_ratio(0.0).unwrap(),
            })
        );
    }

    #[test]
    fn baseline_progress_writes_baseline_field() {
        let item = Item::new("a", 100, 300).with_baseline(100, 300);
        let bar = bar_for(&item, BarKind::Baseline, 100, 300, 0);
        let mut store = ItemStore::new(vec![item.clone()], 20.0);

        let outcome = drag(&mut DragEngine::default(), GestureKind::Progress, &bar, &store, 50.0);
        let DragOutcome::Committed(commit) = outcome else {
            panic!("progress drag should commit");
        };
        assert_eq!(
            commit,
            Commit::Progress {
                item: item.id,
                field: RangeField::Baseline,
                value: Progress::from_ratio(0.25).unwrap(),
            }
        );
        assert!(commit.apply(&mut store).unwrap());
        let stored = store.item(item.id).unwrap();
        assert_eq!(stored.baseline_progress, Progress::from_ratio(0.25));
        assert_eq!(stored.progress, None);
    }

    #[test]
    fn progress_limit_is_relative_to_bar() {
        let item = Item::new("a", 0, 200).with_progress(Progress::from_ratio(0.25).unwrap());
        let bar = bar_for(&item, BarKind::Base, 0, 200, 0);
        let store = ItemStore::new(vec![item], 20.0);
        let mut engine = DragEngine::default();
        engine
            .pointer_down(GestureKind::Progress, &bar, pos2(50.0, 10.0), &store, &scale(), VIEWPORT)
            .unwrap();
        let session = engine.session().unwrap();
        assert_eq!(session.limit(vec2(500.0, 9.0)), vec2(150.0, 0.0));
        assert_eq!(session.limit(vec2(-500.0, 0.0)), vec2(-50.0, 0.0));
    }

    #[test]
    fn connector_type_follows_drop_half() {
        let a = Item::new("a", 0, 100);
        let b = Item::new("b", 200, 400);
        let a_bar = bar_for(&a, BarKind::Base, 0, 100, 0);
        let b_bar = bar_for(&b, BarKind::Base, 200, 400, 1);
        let mut store = ItemStore::new(vec![a.clone(), b.clone()], 20.0);
        let scale = scale();
        let mut engine = DragEngine::default();

        let cases = [
            (GestureKind::ConnectFromFinish, 250.0, ConnectorType::FinishStart),
            (GestureKind::ConnectFromFinish, 350.0, ConnectorType::FinishFinish),
            (GestureKind::ConnectFromStart, 250.0, ConnectorType::StartStart),
            (GestureKind::ConnectFromStart, 350.0, ConnectorType::StartFinish),
        ];
        for (gesture, drop_x, expected) in cases {
            engine
                .pointer_down(gesture, &a_bar, pos2(100.0, 10.0), &store, &scale, VIEWPORT)
                .unwrap();
            engine.pointer_move(pos2(drop_x, 30.0), &scale, VIEWPORT);
            let (anchor, pointer) = engine.session().unwrap().rubber_band().unwrap();
            assert_eq!(pointer, pos2(drop_x, 30.0));
            assert_eq!(anchor.y, a_bar.rect.center().y);

            let outcome = engine
                .pointer_up(pos2(drop_x, 30.0), Some(&b_bar), &scale, VIEWPORT)
                .unwrap();
            let DragOutcome::Committed(commit) = outcome else {
                panic!("expected a commit for {gesture:?}");
            };
            assert_eq!(
                commit,
                Commit::Connector {
                    item: a.id,
                    period: None,
                    record: ConnectorRecord::new(b.id, expected),
                }
            );
            assert!(commit.apply(&mut store).unwrap());
        }
        assert_eq!(store.item(a.id).unwrap().connectors.len(), 4);
    }

    #[test]
    fn connector_without_valid_target_is_dropped() {
        let a = Item::new("a", 0, 100);
        let a_bar = bar_for(&a, BarKind::Base, 0, 100, 0);
        let store = ItemStore::new(vec![a.clone()], 20.0);
        let scale = scale();
        let mut engine = DragEngine::default();

        engine
            .pointer_down(GestureKind::ConnectFromFinish, &a_bar, pos2(100.0, 10.0), &store, &scale, VIEWPORT)
            .unwrap();
        let outcome = engine.pointer_up(pos2(50.0, 10.0), Some(&a_bar), &scale, VIEWPORT);
        assert_eq!(outcome.unwrap(), DragOutcome::Dropped);

        engine
            .pointer_down(GestureKind::ConnectFromFinish, &a_bar, pos2(100.0, 10.0), &store, &scale, VIEWPORT)
            .unwrap();
        let outcome = engine.pointer_up(pos2(500.0, 10.0), None, &scale, VIEWPORT);
        assert_eq!(outcome.unwrap(), DragOutcome::Dropped);
    }

    #[test]
    fn nan_geometry_drops_commit() {
        let item = Item::new("a", 100, 200);
        let bar = bar_for(&item, BarKind::Base, 100, 200, 0);
        let store = ItemStore::new(vec![item], 20.0);
        let empty = TimeScale::new();
        let mut engine = DragEngine::default();
        engine
            .pointer_down(GestureKind::Move, &bar, pos2(150.0, 10.0), &store, &empty, VIEWPORT)
            .unwrap();
        let outcome = engine.pointer_up(pos2(170.0, 10.0), None, &empty, VIEWPORT).unwrap();
        assert_eq!(outcome, DragOutcome::Dropped);
        assert!(engine.preview().is_none());
    }

    #[test]
    fn only_one_session_at_a_time() {
        let item = Item::new("a", 100, 200);
        let bar = bar_for(&item, BarKind::Base, 100, 200, 0);
        let store = ItemStore::new(vec![item], 20.0);
        let scale = scale();
        let mut engine = DragEngine::default();
        engine
            .pointer_down(GestureKind::Move, &bar, pos2(150.0, 10.0), &store, &scale, VIEWPORT)
            .unwrap();
        assert!(matches!(
            engine.pointer_down(GestureKind::ResizeLeft, &bar, pos2(100.0, 10.0), &store, &scale, VIEWPORT),
            Err(TimelineError::DragInProgress)
        ));
        engine.cancel();
        assert!(!engine.is_active());
        assert!(matches!(
            engine.pointer_up(pos2(0.0, 0.0), None, &scale, VIEWPORT),
            Err(TimelineError::NoActiveSession)
        ));
    }

    #[test]
    fn autoscroll_steps_on_interval_and_moves_preview() {
        let item = Item::new("a", 900, 980);
        let bar = bar_for(&item, BarKind::Base, 900, 980, 0);
        let mut store = ItemStore::new(vec![item.clone()], 20.0);
        let mut scale = scale();
        let mut engine = DragEngine::default();

        engine
            .pointer_down(GestureKind::Move, &bar, pos2(950.0, 10.0), &store, &scale, VIEWPORT)
            .unwrap();
        engine.pointer_move(pos2(1010.0, 10.0), &scale, VIEWPORT);
        assert!(engine.wants_autoscroll());

        assert!(engine.tick(0.0, &mut scale, &mut store, VIEWPORT));
        assert!(!engine.tick(0.05, &mut scale, &mut store, VIEWPORT));
        assert!(engine.tick(0.1, &mut scale, &mut store, VIEWPORT));
        assert_eq!(scale.visible_range(), (60.0, 1060.0));

        // The pointer has not moved, the bar stays under it.
        let preview = engine.preview().unwrap();
        assert!((preview.left() - 960.0).abs() < 1e-3);

        let outcome = engine.pointer_up(pos2(1010.0, 10.0), None, &scale, VIEWPORT).unwrap();
        assert_eq!(
            outcome,
            DragOutcome::Committed(Commit::Range {
                item: item.id,
                field: RangeField::Actual,
                start: 1020,
                end: 1100,
            })
        );
    }

    #[test]
    fn progress_drag_never_autoscrolls() {
        let item = Item::new("a", 100, 200);
        let bar = bar_for(&item, BarKind::Base, 100, 200, 0);
        let mut store = ItemStore::new(vec![item], 20.0);
        let mut scale = scale();
        let mut engine = DragEngine::default();
        engine
            .pointer_down(GestureKind::Progress, &bar, pos2(100.0, 10.0), &store, &scale, VIEWPORT)
            .unwrap();
        engine.pointer_move(pos2(1200.0, 300.0), &scale, VIEWPORT);
        assert!(!engine.wants_autoscroll());
        assert!(!engine.tick(0.0, &mut scale, &mut store, VIEWPORT));
    }
}
