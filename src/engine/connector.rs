//! Orthogonal routing of dependency arrows between two bars.

use egui::{pos2, Pos2, Rect};
use serde::{Deserialize, Serialize};

/// Horizontal clearance kept between a bar edge and a vertical run.
pub const ARROW_MARGIN: f32 = 5.0;
/// Length and half-width of the arrowhead.
pub const ARROW_SIZE: f32 = 4.0;

/// Which edges of the two bars a dependency links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorType {
    #[default]
    FinishStart,
    StartStart,
    FinishFinish,
    StartFinish,
}

impl ConnectorType {
    /// Builds the type from which ends of the source and target are linked.
    pub fn from_ends(from_start: bool, to_start: bool) -> Self {
        match (from_start, to_start) {
            (true, true) => ConnectorType::StartStart,
            (true, false) => ConnectorType::StartFinish,
            (false, true) => ConnectorType::FinishStart,
            (false, false) => ConnectorType::FinishFinish,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            ConnectorType::FinishStart => "FS",
            ConnectorType::StartStart => "SS",
            ConnectorType::FinishFinish => "FF",
            ConnectorType::StartFinish => "SF",
        }
    }
}

/// Direction an arrowhead points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Left,
    Right,
    Top,
    Bottom,
}

impl Orientation {
    fn horizontal(from_x: f32, to_x: f32) -> Self {
        if to_x >= from_x {
            Orientation::Right
        } else {
            Orientation::Left
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Pos2,
    pub to: Pos2,
}

impl Segment {
    fn bounds(&self) -> Rect {
        Rect::from_two_pos(self.from, self.to)
    }

    pub fn length(&self) -> f32 {
        self.from.distance(self.to)
    }

    /// Distance from `point` to the closest point of the segment.
    pub fn distance_to(&self, point: Pos2) -> f32 {
        let dir = self.to - self.from;
        let len_sq = dir.length_sq();
        if len_sq <= f32::EPSILON {
            return self.from.distance(point);
        }
        let t = ((point - self.from).dot(dir) / len_sq).clamp(0.0, 1.0);
        (self.from + dir * t).distance(point)
    }
}

/// An unclipped orthogonal route plus where and how its arrow lands.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub segments: Vec<Segment>,
    pub end: Pos2,
    pub orientation: Orientation,
}

impl Route {
    fn through(points: &[Pos2], orientation: Orientation) -> Self {
        let segments = points
            .windows(2)
            .map(|pair| Segment {
                from: pair[0],
                to: pair[1],
            })
            .collect();
        let end = points.last().copied().unwrap_or(Pos2::ZERO);
        Self {
            segments,
            end,
            orientation,
        }
    }
}

/// Computes the route for a dependency from `from` to `to`.
///
/// Bars sharing a row top are joined by one straight segment. Otherwise the
/// route turns through the margin around the bars, detouring through the lane
/// at the edge of the target row when the target lies behind the source.
pub fn route(
    from: Rect,
    to: Rect,
    from_row_top: f32,
    to_row_top: f32,
    to_row_height: f32,
    kind: ConnectorType,
) -> Route {
    let from_y = from.center().y.round();
    let to_y = to.center().y.round();
    let target_below = to_row_top > from_row_top;
    let lane = if target_below {
        to_row_top
    } else {
        to_row_top + to_row_height
    }
    .round();

    let (from_x, to_x) = match kind {
        ConnectorType::FinishStart => (from.right(), to.left()),
        ConnectorType::StartStart => (from.left(), to.left()),
        ConnectorType::FinishFinish => (from.right(), to.right()),
        ConnectorType::StartFinish => (from.left(), to.right()),
    };
    let from_x = from_x.round();
    let to_x = to_x.round();
    let start = pos2(from_x, from_y);

    if from_row_top == to_row_top {
        let end = pos2(to_x, from_y);
        return Route::through(&[start, end], Orientation::horizontal(from_x, to_x));
    }

    match kind {
        ConnectorType::FinishStart => {
            if to_x >= from_x + ARROW_MARGIN + ARROW_SIZE {
                let x0 = from_x + ARROW_MARGIN;
                Route::through(
                    &[start, pos2(x0, from_y), pos2(x0, to_y), pos2(to_x, to_y)],
                    Orientation::Right,
                )
            } else if to_x >= from_x {
                let x = (to_x + ARROW_MARGIN).min(to.center().x.round());
                if target_below {
                    let end = pos2(x, to.top().round());
                    Route::through(&[start, pos2(x, from_y), end], Orientation::Bottom)
                } else {
                    let end = pos2(x, to.bottom().round());
                    Route::through(&[start, pos2(x, from_y), end], Orientation::Top)
                }
            } else {
                let x0 = from_x + ARROW_MARGIN;
                let x1 = to_x - ARROW_MARGIN - ARROW_SIZE;
                Route::through(
                    &[
                        start,
                        pos2(x0, from_y),
                        pos2(x0, lane),
                        pos2(x1, lane),
                        pos2(x1, to_y),
                        pos2(to_x, to_y),
                    ],
                    Orientation::Right,
                )
            }
        }
        ConnectorType::StartStart => {
            let x0 = from_x.min(to_x) - ARROW_SIZE - ARROW_MARGIN;
            Route::through(
                &[start, pos2(x0, from_y), pos2(x0, to_y), pos2(to_x, to_y)],
                Orientation::Right,
            )
        }
        ConnectorType::FinishFinish => {
            let x0 = from_x.max(to_x) + ARROW_SIZE + ARROW_MARGIN;
            Route::through(
                &[start, pos2(x0, from_y), pos2(x0, to_y), pos2(to_x, to_y)],
                Orientation::Left,
            )
        }
        ConnectorType::StartFinish => {
            if from_x - 2.0 * ARROW_MARGIN - ARROW_SIZE > to_x {
                let x0 = to_x + ARROW_MARGIN + ARROW_SIZE;
                Route::through(
                    &[start, pos2(x0, from_y), pos2(x0, to_y), pos2(to_x, to_y)],
                    Orientation::Left,
                )
            } else {
                let x0 = from_x - ARROW_MARGIN;
                let x1 = to_x + ARROW_MARGIN + ARROW_SIZE;
                Route::through(
                    &[
                        start,
                        pos2(x0, from_y),
                        pos2(x0, lane),
                        pos2(x1, lane),
                        pos2(x1, to_y),
                        pos2(to_x, to_y),
                    ],
                    Orientation::Left,
                )
            }
        }
    }
}

/// The drawable part of a route inside one viewport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClippedRoute {
    /// Points of one continuous path, empty when nothing is visible.
    pub path: Vec<Pos2>,
    pub arrow: Option<[Pos2; 3]>,
}

impl ClippedRoute {
    pub fn is_empty(&self) -> bool {
        self.path.is_empty() && self.arrow.is_none()
    }
}

/// Keeps the part of `route` that can be seen through `viewport`.
///
/// The path starts at the first segment touching the viewport and, once
/// started, keeps every later segment so it stays continuous.
pub fn clip_route(route: &Route, viewport: Rect) -> ClippedRoute {
    let mut path: Vec<Pos2> = Vec::new();
    for segment in &route.segments {
        if path.is_empty() {
            if touches(segment.bounds(), viewport) {
                path.push(segment.from);
                path.push(segment.to);
            }
        } else {
            path.push(segment.to);
        }
    }

    let arrow = viewport
        .contains(route.end)
        .then(|| arrow_head(route.end, route.orientation));

    ClippedRoute { path, arrow }
}

fn touches(bounds: Rect, viewport: Rect) -> bool {
    bounds.left() < viewport.right()
        && bounds.right() > viewport.left()
        && bounds.top() < viewport.bottom()
        && bounds.bottom() > viewport.top()
}

/// The wedge drawn at `tip`, pulled back one pixel along its direction.
pub fn arrow_head(tip: Pos2, orientation: Orientation) -> [Pos2; 3] {
    let s = ARROW_SIZE;
    match orientation {
        Orientation::Left => {
            let t = pos2(tip.x + 1.0, tip.y);
            [t, pos2(t.x + s, t.y - s), pos2(t.x + s, t.y + s)]
        }
        Orientation::Right => {
            let t = pos2(tip.x - 1.0, tip.y);
            [t, pos2(t.x - s, t.y - s), pos2(t.x - s, t.y + s)]
        }
        Orientation::Top => {
            let t = pos2(tip.x, tip.y + 1.0);
            [t, pos2(t.x - s, t.y + s), pos2(t.x + s, t.y + s)]
        }
        Orientation::Bottom => {
            let t = pos2(tip.x, tip.y - 1.0);
            [t, pos2(t.x - s, t.y - s), pos2(t.x + s, t.y - s)]
        }
    }
}

/// Logical identity of a drawn connector, stable across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectorKey {
    pub from_row: usize,
    pub to_row: usize,
    pub kind: ConnectorType,
    pub from_period: Option<usize>,
    pub to_period: Option<usize>,
}
