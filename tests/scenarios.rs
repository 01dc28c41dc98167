use egui::{pos2, vec2, Pos2, Rect};
use uuid::Uuid;

use gantt_timeline::engine::connector::{self, ConnectorType, Orientation};
use gantt_timeline::engine::geometry::{self, Pairing, RowRect, TimeRect};
use gantt_timeline::engine::{
    Bar, BarKind, BarOptions, Commit, DragEngine, DragOutcome, ElementOptions, GestureKind, LayoutParams,
    TimeScale, TimelineLayout,
};
use gantt_timeline::model::{Item, ItemStore, Progress};

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

fn layout(store: &ItemStore) -> TimelineLayout {
    let elements = ElementOptions::default();
    let mut layout = TimelineLayout::new();
    layout.rebuild(
        store,
        &scale(),
        &LayoutParams {
            viewport: VIEWPORT,
            elements: &elements,
            baseline_above: false,
            edit_enabled: true,
        },
    );
    layout
}

fn bar_of(layout: &TimelineLayout, owner: Uuid, kind: BarKind) -> Bar {
    *layout
        .bars()
        .iter()
        .find(|b| b.owner == owner && b.kind == kind)
        .unwrap()
}

/// Runs one gesture from `from` to `to` and applies whatever it commits.
fn drag_and_apply(store: &mut ItemStore, gesture: GestureKind, bar: &Bar, from: Pos2, to: Pos2) -> DragOutcome {
    let scale = scale();
    let mut engine = DragEngine::default();
    engine.pointer_down(gesture, bar, from, store, &scale, VIEWPORT).unwrap();
    engine.pointer_move(to, &scale, VIEWPORT);
    let outcome = engine.pointer_up(to, None, &scale, VIEWPORT).unwrap();
    if let DragOutcome::Committed(commit) = &outcome {
        commit.apply(store).unwrap();
    }
    outcome
}

#[test]
fn quarter_of_the_window_maps_to_quarter_ratio() {
    let scale = scale();
    assert_eq!(scale.timestamp_to_ratio(250.0), 0.25);
}

#[test]
fn ratio_round_trips_inside_the_window() {
    let mut scale = TimeScale::with_gaps(0.0, 0.0);
    scale.set_data_range(1_700_000_000_000.0, 1_700_900_000_000.0);
    scale.set_range(1_700_100_000_000.0, 1_700_400_000_000.0);
    let (min, max) = scale.visible_range();
    for step in 0..=20 {
        let t = min + (max - min) * f64::from(step) / 20.0;
        let back = scale.ratio_to_timestamp(scale.timestamp_to_ratio(t));
        assert!((back - t).abs() < 0.01, "{t} came back as {back}");
    }
}

#[test]
fn leaf_bar_is_centred_at_seventy_percent() {
    let rect = geometry::resolve(
        BarKind::Base,
        TimeRect {
            left: 100.0,
            width: 100.0,
        },
        RowRect {
            top: 0.0,
            height: 20.0,
        },
        &BarOptions::default(),
        Pairing::NONE,
    );
    assert_eq!(rect.height(), 14.0);
    assert_eq!(rect.top(), 3.0);
    assert_eq!(rect.left(), 100.0);
}

#[test]
fn anchored_bars_stay_inside_their_row() {
    use gantt_timeline::engine::{Anchor, Position, Size};

    let row = RowRect {
        top: 40.0,
        height: 30.0,
    };
    let time = TimeRect {
        left: 0.0,
        width: 50.0,
    };
    for position in [Position::LeftTop, Position::LeftCenter, Position::LeftBottom] {
        for anchor in [Anchor::Auto, position.as_anchor()] {
            for height in [10.0, 50.0, 100.0] {
                let options = BarOptions {
                    height: Size::Percent(height),
                    anchor,
                    position,
                    ..BarOptions::default()
                };
                let rect = geometry::resolve(BarKind::Base, time, row, &options, Pairing::NONE);
                assert!(rect.top() >= row.top - 1e-3, "{anchor:?} {position:?} {height}");
                assert!(
                    rect.bottom() <= row.top + row.height + 1e-3,
                    "{anchor:?} {position:?} {height}"
                );
            }
        }
    }
}

#[test]
fn paired_bar_and_baseline_never_overlap() {
    let task = Item::new("a", 100, 400).with_baseline(150, 450);
    let milestone = Item::milestone("m", 300).with_baseline(250, 450);
    for baseline_above in [false, true] {
        for (item, kind) in [(&task, BarKind::Base), (&milestone, BarKind::Milestone)] {
            let store = ItemStore::new(vec![item.clone()], 20.0);
            let elements = ElementOptions::default();
            let mut layout = TimelineLayout::new();
            layout.rebuild(
                &store,
                &scale(),
                &LayoutParams {
                    viewport: VIEWPORT,
                    elements: &elements,
                    baseline_above,
                    edit_enabled: false,
                },
            );
            let actual = bar_of(&layout, item.id, kind).rect;
            let baseline = bar_of(&layout, item.id, BarKind::Baseline).rect;
            if baseline_above {
                assert!(baseline.bottom() <= actual.top(), "{kind:?} above");
            } else {
                assert!(actual.bottom() <= baseline.top(), "{kind:?} below");
            }
        }
    }
}

#[test]
fn finish_start_two_rows_down_routes_in_three_segments() {
    let b = Item::new("b", 400, 600);
    let a = Item::new("a", 100, 300).with_connector(b.id, ConnectorType::FinishStart);
    let between = Item::new("between", 0, 50);
    let store = ItemStore::new(vec![a.clone(), between, b.clone()], 20.0);
    let layout = layout(&store);

    let [shape] = layout.connectors() else {
        panic!("expected one connector");
    };
    assert_eq!(shape.key.from_row, 0);
    assert_eq!(shape.key.to_row, 2);
    assert_eq!(shape.route.segments.len(), 3);
    assert!(matches!(
        shape.route.orientation,
        Orientation::Right | Orientation::Bottom
    ));
    let target = bar_of(&layout, b.id, BarKind::Base).rect;
    assert_eq!(shape.route.end.x, target.left().round());
}

#[test]
fn segment_counts_follow_relative_placement() {
    let row = |top: f32, left: f32, right: f32| Rect::from_min_max(pos2(left, top + 3.0), pos2(right, top + 17.0));

    let same_row = connector::route(
        row(0.0, 100.0, 200.0),
        row(0.0, 300.0, 400.0),
        0.0,
        0.0,
        20.0,
        ConnectorType::FinishStart,
    );
    assert_eq!(same_row.segments.len(), 1);

    let ahead = connector::route(
        row(0.0, 100.0, 200.0),
        row(40.0, 300.0, 400.0),
        0.0,
        40.0,
        20.0,
        ConnectorType::FinishStart,
    );
    assert!(ahead.segments.len() <= 3);

    let behind = connector::route(
        row(0.0, 300.0, 400.0),
        row(40.0, 100.0, 200.0),
        0.0,
        40.0,
        20.0,
        ConnectorType::FinishStart,
    );
    assert_eq!(behind.segments.len(), 5);
}

#[test]
fn milestone_drag_moves_start_and_end_together() {
    let milestone = Item::milestone("ship", 500);
    let mut store = ItemStore::new(vec![milestone.clone()], 20.0);
    let bar = bar_of(&layout(&store), milestone.id, BarKind::Milestone);
    let from = bar.rect.center();

    let outcome = drag_and_apply(&mut store, GestureKind::Move, &bar, from, from + vec2(50.0, 0.0));

    assert!(matches!(outcome, DragOutcome::Committed(Commit::Milestone { at: 550, .. })));
    let moved = store.item(milestone.id).unwrap();
    assert_eq!(moved.actual_start, Some(550));
    assert_eq!(moved.actual_end, Some(550));
}

#[test]
fn zero_delta_move_leaves_range_unchanged() {
    let item = Item::new("a", 120, 480);
    let mut store = ItemStore::new(vec![item.clone()], 20.0);
    let bar = bar_of(&layout(&store), item.id, BarKind::Base);
    let from = bar.rect.center();

    drag_and_apply(&mut store, GestureKind::Move, &bar, from, from);

    assert_eq!(store.item(item.id).unwrap().actual_range(), Some((120, 480)));
}

#[test]
fn progress_drag_past_the_end_clamps_to_complete() {
    let item = Item::new("a", 100, 300).with_progress(Progress::from_ratio(0.5).unwrap());
    let mut store = ItemStore::new(vec![item.clone()], 20.0);
    let layout = layout(&store);
    let (hit, bar) = layout.hit_test(pos2(200.0, 17.0)).unwrap();
    assert_eq!(hit.gesture, GestureKind::Progress);
    let bar = *bar;

    drag_and_apply(
        &mut store,
        GestureKind::Progress,
        &bar,
        pos2(200.0, 17.0),
        pos2(900.0, 17.0),
    );

    assert_eq!(store.item(item.id).unwrap().progress, Some(Progress::COMPLETE));
}

#[test]
fn baseline_progress_drag_edits_the_baseline_only() {
    let item = Item::new("a", 100, 400).with_baseline(100, 300);
    let mut store = ItemStore::new(vec![item.clone()], 20.0);
    let before = store.revision();
    let layout = layout(&store);
    let baseline = bar_of(&layout, item.id, BarKind::Baseline);
    let from = pos2(baseline.rect.left(), baseline.rect.bottom());
    let (hit, bar) = layout.hit_test(from).unwrap();
    assert_eq!(hit.gesture, GestureKind::Progress);
    assert_eq!(bar.kind, BarKind::Baseline);
    let bar = *bar;

    drag_and_apply(&mut store, GestureKind::Progress, &bar, from, from + vec2(50.0, 0.0));

    let stored = store.item(item.id).unwrap();
    assert_eq!(stored.baseline_progress, Progress::from_ratio(0.25));
    assert_eq!(stored.progress, None);
    assert_eq!(store.revision(), before + 1);
}

#[test]
fn dragged_connector_lands_in_the_store_and_routes() {
    let a = Item::new("a", 100, 300);
    let b = Item::new("b", 500, 700);
    let mut store = ItemStore::new(vec![a.clone(), b.clone()], 20.0);
    let before = store.revision();
    let first = layout(&store);

    let (hit, source) = first.hit_test(pos2(306.0, 10.0)).unwrap();
    assert_eq!(hit.gesture, GestureKind::ConnectFromFinish);
    let source = *source;
    let drop_at = pos2(520.0, 30.0);
    let target = *first.bar_at(drop_at).unwrap();

    let scale = scale();
    let mut engine = DragEngine::default();
    engine
        .pointer_down(hit.gesture, &source, pos2(306.0, 10.0), &store, &scale, VIEWPORT)
        .unwrap();
    engine.pointer_move(drop_at, &scale, VIEWPORT);
    let DragOutcome::Committed(commit) = engine.pointer_up(drop_at, Some(&target), &scale, VIEWPORT).unwrap() else {
        panic!("connector drop should commit");
    };
    assert!(commit.apply(&mut store).unwrap());
    assert!(store.revision() > before);

    let record = store.item(a.id).unwrap().connectors[0];
    assert_eq!(record.to, b.id);
    assert_eq!(record.kind, ConnectorType::FinishStart);

    let second = layout(&store);
    assert_eq!(second.connectors().len(), 1);
}
