//! One layout pass: bars for the rows on screen, connector routes between them and
//! the hit regions the drag engine starts from.

use std::ops::Range;

use egui::{pos2, vec2, Pos2, Rect};
use uuid::Uuid;

use crate::engine::connector::{clip_route, route, ClippedRoute, ConnectorKey, Route, Segment};
use crate::engine::drag::{accepts_connector, GestureKind};
use crate::engine::geometry::{
    clamp_progress, fix_baseline_pairing, milestone_bounds, progress_bounds, resolve, snap,
    widen_degenerate_parent, BarKind, ElementOptions, Pairing, RowRect, TimeRect,
};
use crate::engine::pool::{AnchorKey, Bar, BarPool};
use crate::engine::scale::TimeScale;
use crate::model::{ChartMode, ConnectorRecord, Item, ItemStore, Period};

/// Width of the resize strips at both ends of a bar.
pub const EDGE_HANDLE_WIDTH: f32 = 7.0;
/// Radius of the connector handles drawn just outside each end.
pub const CONNECT_HANDLE_RADIUS: f32 = 5.0;

/// Inputs of a layout pass besides the data and the scale.
#[derive(Debug, Clone, Copy)]
pub struct LayoutParams<'a> {
    pub viewport: Rect,
    pub elements: &'a ElementOptions,
    pub baseline_above: bool,
    pub edit_enabled: bool,
}

/// Area of the screen that starts a gesture on a bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRegion {
    pub rect: Rect,
    pub gesture: GestureKind,
    /// Slot of the bar in the pool.
    pub slot: usize,
}

/// A routed dependency ready to paint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorShape {
    pub key: ConnectorKey,
    pub source: Uuid,
    pub source_period: Option<usize>,
    pub record: ConnectorRecord,
    pub route: Route,
    pub clipped: ClippedRoute,
}

impl ConnectorShape {
    /// Distance from `pos` to the visible part of the path.
    pub fn distance_to(&self, pos: Pos2) -> f32 {
        self.clipped
            .path
            .windows(2)
            .map(|pair| {
                Segment {
                    from: pair[0],
                    to: pair[1],
                }
                .distance_to(pos)
            })
            .fold(f32::INFINITY, f32::min)
    }
}

#[derive(Debug, Default)]
pub struct TimelineLayout {
    pool: BarPool,
    connectors: Vec<ConnectorShape>,
    hits: Vec<HitRegion>,
    pruned: usize,
    laid_out: Vec<bool>,
}

impl TimelineLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[Bar] {
        self.pool.bars()
    }

    pub fn bar(&self, slot: usize) -> Option<&Bar> {
        self.pool.get(slot)
    }

    pub fn pool(&self) -> &BarPool {
        &self.pool
    }

    pub fn connectors(&self) -> &[ConnectorShape] {
        &self.connectors
    }

    pub fn hit_regions(&self) -> &[HitRegion] {
        &self.hits
    }

    /// Connectors skipped in the last pass because their target had no bar.
    pub fn pruned(&self) -> usize {
        self.pruned
    }

    /// Lays out the rows inside the viewport against `scale`. Rows outside it
    /// are laid out only when a connector from the window needs their anchor.
    pub fn rebuild(&mut self, store: &ItemStore, scale: &TimeScale, params: &LayoutParams<'_>) {
        self.pool.reset();
        self.connectors.clear();
        self.hits.clear();
        self.pruned = 0;
        self.laid_out.clear();
        self.laid_out.resize(store.row_count(), false);

        let window = store.visible_window(params.viewport.height());
        for row in window.clone() {
            self.layout_row(store, scale, params, row, true);
        }

        self.route_connectors(store, scale, params, &window);
        if self.pruned > 0 {
            log::trace!("pruned {} connectors without a drawn target", self.pruned);
        }
    }

    /// The top-most hit region under `pos` and its bar.
    pub fn hit_test(&self, pos: Pos2) -> Option<(HitRegion, &Bar)> {
        self.hits
            .iter()
            .rev()
            .find(|hit| hit.rect.contains(pos))
            .and_then(|hit| self.pool.get(hit.slot).map(|bar| (*hit, bar)))
    }

    /// The top-most bar under `pos` that accepts a connector drop.
    pub fn bar_at(&self, pos: Pos2) -> Option<&Bar> {
        self.pool
            .bars()
            .iter()
            .rev()
            .find(|bar| accepts_connector(bar) && bar.rect.contains(pos))
    }

    /// The closest connector within `tolerance` px of `pos`.
    pub fn connector_at(&self, pos: Pos2, tolerance: f32) -> Option<&ConnectorShape> {
        self.connectors
            .iter()
            .map(|shape| (shape.distance_to(pos), shape))
            .filter(|(distance, _)| *distance <= tolerance)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, shape)| shape)
    }

    /// Lays out `row` once per pass. Bars outside the window stay invisible.
    fn layout_row(
        &mut self,
        store: &ItemStore,
        scale: &TimeScale,
        params: &LayoutParams<'_>,
        row: usize,
        in_window: bool,
    ) {
        match self.laid_out.get_mut(row) {
            Some(done) if !*done => *done = true,
            _ => return,
        }
        let Some(item) = store.row_item(row) else {
            return;
        };
        let row_rect = RowRect {
            top: screen_row_top(store, params.viewport, row),
            height: store.row_height(row),
        };
        match store.mode() {
            ChartMode::Project => self.layout_item(store, scale, params, row, item, row_rect, in_window),
            ChartMode::Resource => {
                for (index, period) in item.periods.iter().enumerate() {
                    self.layout_period(scale, params, row, item, index, period, row_rect, in_window);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn layout_item(
        &mut self,
        store: &ItemStore,
        scale: &TimeScale,
        params: &LayoutParams<'_>,
        row: usize,
        item: &Item,
        row_rect: RowRect,
        in_window: bool,
    ) {
        let viewport = params.viewport;
        let elements = params.elements;
        let has_children = store.has_children(item.id);
        let pairing = if item.has_baseline() {
            Pairing::paired(params.baseline_above)
        } else {
            Pairing::NONE
        };
        let bar_kind = if has_children {
            BarKind::Parent
        } else {
            BarKind::Base
        };

        let mut actual = if item.is_milestone() && !has_children {
            item.actual_start.and_then(|at| {
                let ratio = scale.timestamp_to_ratio(at as f64);
                let cx = screen_x(scale, viewport, at)?;
                let rect = milestone_bounds(cx, row_rect, &elements.milestone, pairing);
                let visible = in_window && (0.0..=1.0).contains(&ratio);
                Some((BarKind::Milestone, rect, visible))
            })
        } else {
            item.actual_range()
                .and_then(|(start, end)| span(scale, viewport, start, end))
                .map(|time| {
                    let mut rect = resolve(bar_kind, time, row_rect, elements.for_kind(bar_kind), pairing);
                    if bar_kind == BarKind::Parent {
                        rect = widen_degenerate_parent(rect);
                    }
                    (bar_kind, rect, false)
                })
        };

        let mut baseline = item
            .baseline_range()
            .and_then(|(start, end)| span(scale, viewport, start, end))
            .map(|time| resolve(BarKind::Baseline, time, row_rect, &elements.baseline, pairing));

        if let (Some((kind, rect, _)), Some(base)) = (actual.as_mut(), baseline.as_mut()) {
            fix_baseline_pairing(
                rect,
                base,
                *kind,
                elements.for_kind(*kind),
                &elements.baseline,
                pairing,
            );
        }

        if let Some(rect) = baseline.map(snap) {
            let bar = Bar {
                rect,
                kind: BarKind::Baseline,
                owner: item.id,
                target_id: item.id,
                row,
                period: None,
                progress: item.baseline_progress.map(|p| clamp_progress(p.ratio())),
                visible: in_window && overlaps_x(rect, viewport),
            };
            let slot = self.push(bar, params);
            self.push_progress(slot, params);
        }

        if let Some((kind, rect, milestone_visible)) = actual {
            let rect = snap(rect);
            let visible = if kind == BarKind::Milestone {
                milestone_visible
            } else {
                in_window && overlaps_x(rect, viewport)
            };
            let bar = Bar {
                rect,
                kind,
                owner: item.id,
                target_id: item.id,
                row,
                period: None,
                progress: (kind != BarKind::Milestone)
                    .then(|| item.progress.map(|p| clamp_progress(p.ratio())))
                    .flatten(),
                visible,
            };
            let slot = self.push(bar, params);
            self.pool.set_anchor(AnchorKey { row, period: None }, slot);
            self.push_progress(slot, params);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn layout_period(
        &mut self,
        scale: &TimeScale,
        params: &LayoutParams<'_>,
        row: usize,
        item: &Item,
        index: usize,
        period: &Period,
        row_rect: RowRect,
        in_window: bool,
    ) {
        let viewport = params.viewport;
        let placed = if period.is_milestone() {
            period.start.and_then(|at| {
                let ratio = scale.timestamp_to_ratio(at as f64);
                let cx = screen_x(scale, viewport, at)?;
                let rect = milestone_bounds(cx, row_rect, &params.elements.milestone, Pairing::NONE);
                Some((BarKind::Milestone, snap(rect), in_window && (0.0..=1.0).contains(&ratio)))
            })
        } else {
            period
                .start
                .zip(period.end)
                .and_then(|(start, end)| span(scale, viewport, start, end))
                .map(|time| {
                    let rect = snap(resolve(
                        BarKind::Period,
                        time,
                        row_rect,
                        &params.elements.period,
                        Pairing::NONE,
                    ));
                    (BarKind::Period, rect, in_window && overlaps_x(rect, viewport))
                })
        };
        let Some((kind, rect, visible)) = placed else {
            return;
        };

        let slot = self.push(
            Bar {
                rect,
                kind,
                owner: item.id,
                target_id: period.id,
                row,
                period: Some(index),
                progress: None,
                visible,
            },
            params,
        );
        self.pool.set_anchor(
            AnchorKey {
                row,
                period: Some(index),
            },
            slot,
        );
    }

    fn push(&mut self, bar: Bar, params: &LayoutParams<'_>) -> usize {
        let slot = self.pool.push(bar);
        if params.edit_enabled && bar.visible {
            self.push_hits(slot, &bar);
        }
        slot
    }

    fn push_progress(&mut self, host_slot: usize, params: &LayoutParams<'_>) {
        let Some(host) = self.pool.get(host_slot).copied() else {
            return;
        };
        let Some(ratio) = host.progress else {
            return;
        };
        let rect = snap(progress_bounds(host.rect, ratio, &params.elements.progress));
        self.pool.push(Bar {
            rect,
            kind: BarKind::Progress,
            ..host
        });
    }

    fn push_hits(&mut self, slot: usize, bar: &Bar) {
        let rect = bar.rect;
        let region = |rect: Rect, gesture: GestureKind| HitRegion { rect, gesture, slot };

        self.hits.push(region(rect, GestureKind::Move));
        if bar.kind.is_editable_range() {
            let edge = EDGE_HANDLE_WIDTH.min(rect.width() / 3.0);
            self.hits.push(region(
                Rect::from_min_max(rect.min, pos2(rect.left() + edge, rect.bottom())),
                GestureKind::ResizeLeft,
            ));
            self.hits.push(region(
                Rect::from_min_max(pos2(rect.right() - edge, rect.top()), rect.max),
                GestureKind::ResizeRight,
            ));
        }
        if matches!(bar.kind, BarKind::Base | BarKind::Parent | BarKind::Baseline) {
            let x = rect.left() + rect.width() * bar.progress.unwrap_or(0.0);
            self.hits.push(region(
                Rect::from_center_size(pos2(x, rect.bottom()), vec2(EDGE_HANDLE_WIDTH, EDGE_HANDLE_WIDTH)),
                GestureKind::Progress,
            ));
        }
        if accepts_connector(bar) {
            let r = CONNECT_HANDLE_RADIUS;
            let y = rect.center().y;
            let size = vec2(2.0 * r, 2.0 * r);
            self.hits.push(region(
                Rect::from_center_size(pos2(rect.left() - r - 1.0, y), size),
                GestureKind::ConnectFromStart,
            ));
            self.hits.push(region(
                Rect::from_center_size(pos2(rect.right() + r + 1.0, y), size),
                GestureKind::ConnectFromFinish,
            ));
        }
    }

    fn route_connectors(
        &mut self,
        store: &ItemStore,
        scale: &TimeScale,
        params: &LayoutParams<'_>,
        window: &Range<usize>,
    ) {
        for (row, item) in store.visible_rows().enumerate() {
            match store.mode() {
                ChartMode::Project => {
                    self.route_from(store, scale, params, window, row, None, item.id, &item.connectors)
                }
                ChartMode::Resource => {
                    for (index, period) in item.periods.iter().enumerate() {
                        self.route_from(
                            store,
                            scale,
                            params,
                            window,
                            row,
                            Some(index),
                            item.id,
                            &period.connectors,
                        );
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn route_from(
        &mut self,
        store: &ItemStore,
        scale: &TimeScale,
        params: &LayoutParams<'_>,
        window: &Range<usize>,
        row: usize,
        period: Option<usize>,
        source: Uuid,
        records: &[ConnectorRecord],
    ) {
        let viewport = params.viewport;
        for record in records {
            let target = match store.mode() {
                ChartMode::Project => store.row_of(record.to).map(|row| AnchorKey { row, period: None }),
                ChartMode::Resource => store
                    .locate_period(record.to)
                    .map(|(row, index)| AnchorKey {
                        row,
                        period: Some(index),
                    }),
            };
            let Some(target) = target else {
                self.pruned += 1;
                continue;
            };
            // Both ends on the same side of the window: nothing to see.
            let above = |r: usize| r < window.start;
            let below = |r: usize| r >= window.end;
            if (above(row) && above(target.row)) || (below(row) && below(target.row)) {
                continue;
            }

            self.layout_row(store, scale, params, row, false);
            self.layout_row(store, scale, params, target.row, false);
            let Some(from) = self.pool.anchor(AnchorKey { row, period }).copied() else {
                break;
            };
            let Some(to) = self.pool.anchor(target).copied() else {
                self.pruned += 1;
                continue;
            };

            let route = route(
                from.rect,
                to.rect,
                screen_row_top(store, viewport, from.row),
                screen_row_top(store, viewport, to.row),
                store.row_height(to.row),
                record.kind,
            );
            let clipped = clip_route(&route, viewport);
            if clipped.is_empty() {
                continue;
            }
            self.connectors.push(ConnectorShape {
                key: ConnectorKey {
                    from_row: from.row,
                    to_row: to.row,
                    kind: record.kind,
                    from_period: from.period,
                    to_period: to.period,
                },
                source,
                source_period: period,
                record: *record,
                route,
                clipped,
            });
        }
    }
}

fn screen_row_top(store: &ItemStore, viewport: Rect, row: usize) -> f32 {
    viewport.top() - store.vertical_offset() + store.row_top(row)
}

fn screen_x(scale: &TimeScale, viewport: Rect, t: i64) -> Option<f32> {
    let x = f64::from(viewport.left()) + scale.timestamp_to_ratio(t as f64) * f64::from(viewport.width());
    x.is_finite().then_some(x as f32)
}

fn span(scale: &TimeScale, viewport: Rect, start: i64, end: i64) -> Option<TimeRect> {
    let left = screen_x(scale, viewport, start)?;
    let right = screen_x(scale, viewport, end)?;
    Some(TimeRect {
        left,
        width: right - left,
    })
}

fn overlaps_x(rect: Rect, viewport: Rect) -> bool {
    rect.right() >= viewport.left() && rect.left() <= viewport.right()
}
