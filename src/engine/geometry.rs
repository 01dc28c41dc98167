//! Pixel bounds for every bar shape the timeline draws.
//!
//! Everything here is a pure function of a time span (already converted to
//! pixels), a row rectangle and per-kind [`BarOptions`].

use std::fmt;
use std::str::FromStr;

use egui::{pos2, vec2, Pos2, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Share of a parent bar's height that its end notches hang below it.
pub const PARENT_NOTCH_RATIO: f32 = 0.4;

/// What a bar represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarKind {
    Base,
    Parent,
    Baseline,
    Milestone,
    Progress,
    Period,
}

impl BarKind {
    /// Kinds with two edges the user can resize.
    pub fn is_editable_range(self) -> bool {
        matches!(
            self,
            BarKind::Base | BarKind::Parent | BarKind::Baseline | BarKind::Period
        )
    }
}

/// Point on the bar used as its vertical origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    #[default]
    Auto,
    LeftTop,
    LeftCenter,
    LeftBottom,
}

impl Anchor {
    pub fn is_top(self) -> bool {
        self == Anchor::LeftTop
    }

    /// Offset from the anchor point to the bar top.
    fn shift(self, height: f32) -> f32 {
        match self {
            Anchor::LeftTop => 0.0,
            Anchor::LeftBottom => -height,
            Anchor::LeftCenter | Anchor::Auto => -height / 2.0,
        }
    }
}

/// Point on the row the bar is placed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    LeftTop,
    #[default]
    LeftCenter,
    LeftBottom,
}

impl Position {
    pub fn is_top(self) -> bool {
        self == Position::LeftTop
    }

    pub fn as_anchor(self) -> Anchor {
        match self {
            Position::LeftTop => Anchor::LeftTop,
            Position::LeftCenter => Anchor::LeftCenter,
            Position::LeftBottom => Anchor::LeftBottom,
        }
    }

    fn y_on(self, row: RowRect) -> f32 {
        match self {
            Position::LeftTop => row.top,
            Position::LeftCenter => row.top + row.height / 2.0,
            Position::LeftBottom => row.top + row.height,
        }
    }
}

/// A length given in pixels or as a percentage of a reference length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSize", into = "RawSize")]
pub enum Size {
    Pixels(f32),
    Percent(f32),
}

impl Size {
    pub fn normalize(self, reference: f32) -> f32 {
        match self {
            Size::Pixels(px) => px,
            Size::Percent(pct) => reference * pct / 100.0,
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Size::Pixels(0.0)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Pixels(px) => write!(f, "{px}"),
            Size::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid size {0:?}: expected a number or a percentage such as \"70%\"")]
pub struct ParseSizeError(String);

impl FromStr for Size {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed.strip_suffix('%') {
            Some(pct) => pct.trim().parse().map(Size::Percent),
            None => trimmed.parse().map(Size::Pixels),
        };
        match parsed {
            Ok(size) if size_is_finite(size) => Ok(size),
            _ => Err(ParseSizeError(s.to_string())),
        }
    }
}

fn size_is_finite(size: Size) -> bool {
    match size {
        Size::Pixels(v) | Size::Percent(v) => v.is_finite(),
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawSize {
    Number(f32),
    Text(String),
}

impl TryFrom<RawSize> for Size {
    type Error = ParseSizeError;

    fn try_from(raw: RawSize) -> Result<Self, Self::Error> {
        match raw {
            RawSize::Number(px) => Ok(Size::Pixels(px)),
            RawSize::Text(text) => text.parse(),
        }
    }
}

impl From<Size> for RawSize {
    fn from(size: Size) -> Self {
        match size {
            Size::Pixels(px) => RawSize::Number(px),
            Size::Percent(_) => RawSize::Text(size.to_string()),
        }
    }
}

/// Placement options for one bar kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarOptions {
    pub height: Size,
    pub anchor: Anchor,
    pub position: Position,
    pub offset: Size,
    pub stroke_width: f32,
}

impl Default for BarOptions {
    fn default() -> Self {
        Self {
            height: Size::Percent(70.0),
            anchor: Anchor::Auto,
            position: Position::LeftCenter,
            offset: Size::Pixels(0.0),
            stroke_width: 1.0,
        }
    }
}

impl BarOptions {
    /// Progress overlays fill the bar they sit in.
    pub fn progress() -> Self {
        Self {
            height: Size::Percent(100.0),
            anchor: Anchor::LeftCenter,
            stroke_width: 0.0,
            ..Self::default()
        }
    }
}

/// Options for every bar kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementOptions {
    pub base: BarOptions,
    pub parent: BarOptions,
    pub baseline: BarOptions,
    pub milestone: BarOptions,
    pub progress: BarOptions,
    pub period: BarOptions,
}

impl Default for ElementOptions {
    fn default() -> Self {
        Self {
            base: BarOptions::default(),
            parent: BarOptions::default(),
            baseline: BarOptions::default(),
            milestone: BarOptions::default(),
            progress: BarOptions::progress(),
            period: BarOptions::default(),
        }
    }
}

impl ElementOptions {
    pub fn for_kind(&self, kind: BarKind) -> &BarOptions {
        match kind {
            BarKind::Base => &self.base,
            BarKind::Parent => &self.parent,
            BarKind::Baseline => &self.baseline,
            BarKind::Milestone => &self.milestone,
            BarKind::Progress => &self.progress,
            BarKind::Period => &self.period,
        }
    }
}

/// Horizontal extent of a bar in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRect {
    pub left: f32,
    pub width: f32,
}

/// Vertical extent of a row in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowRect {
    pub top: f32,
    pub height: f32,
}

/// Whether a row splits its height between an actual bar and its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pairing {
    pub paired: bool,
    pub baseline_above: bool,
}

impl Pairing {
    pub const NONE: Pairing = Pairing {
        paired: false,
        baseline_above: false,
    };

    pub fn paired(baseline_above: bool) -> Self {
        Self {
            paired: true,
            baseline_above,
        }
    }
}

/// Resolves bar bounds inside a row.
pub fn resolve(
    kind: BarKind,
    time: TimeRect,
    row: RowRect,
    options: &BarOptions,
    pairing: Pairing,
) -> Rect {
    let halved = kind == BarKind::Parent
        || (pairing.paired
            && matches!(
                kind,
                BarKind::Base | BarKind::Baseline | BarKind::Period | BarKind::Milestone
            ));
    let reference = if halved { row.height / 2.0 } else { row.height };
    let height = options.height.normalize(reference);

    let anchor = resolve_anchor(options.anchor, options.position, kind, pairing);
    let top = options.position.y_on(row) + anchor.shift(height) + options.offset.normalize(row.height);

    Rect::from_min_size(pos2(time.left, top), vec2(time.width, height))
}

/// Turns [`Anchor::Auto`] into a concrete anchor for the given bar kind.
pub fn resolve_anchor(anchor: Anchor, position: Position, kind: BarKind, pairing: Pairing) -> Anchor {
    if anchor != Anchor::Auto {
        return anchor;
    }
    let paired_center = pairing.paired && position == Position::LeftCenter;
    let toward_baseline = if pairing.baseline_above {
        Anchor::LeftTop
    } else {
        Anchor::LeftBottom
    };

    match kind {
        BarKind::Base | BarKind::Period | BarKind::Milestone if paired_center => toward_baseline,
        BarKind::Parent if paired_center => toward_baseline,
        BarKind::Parent if position.is_top() => Anchor::LeftTop,
        BarKind::Parent => Anchor::LeftBottom,
        BarKind::Baseline if position == Position::LeftCenter => {
            if pairing.baseline_above {
                Anchor::LeftBottom
            } else {
                Anchor::LeftTop
            }
        }
        _ => position.as_anchor(),
    }
}

/// Separates an actual bar and its baseline when both are placed the same way.
///
/// Returns true when either rectangle moved.
pub fn fix_baseline_pairing(
    bar: &mut Rect,
    baseline: &mut Rect,
    bar_kind: BarKind,
    bar_options: &BarOptions,
    baseline_options: &BarOptions,
    pairing: Pairing,
) -> bool {
    if bar_options.anchor != baseline_options.anchor
        || bar_options.position != baseline_options.position
    {
        return false;
    }
    let bar_anchor = resolve_anchor(bar_options.anchor, bar_options.position, bar_kind, pairing);
    let baseline_anchor = resolve_anchor(
        baseline_options.anchor,
        baseline_options.position,
        BarKind::Baseline,
        pairing,
    );
    if bar_anchor != baseline_anchor {
        return false;
    }

    let stroke = (bar_options.stroke_width + baseline_options.stroke_width) / 2.0;
    match (pairing.baseline_above, bar_anchor.is_top()) {
        (true, true) => set_top(bar, baseline.bottom() + stroke),
        (true, false) => set_top(baseline, bar.top() - baseline.height() - stroke),
        (false, true) => set_top(baseline, bar.bottom() + stroke),
        (false, false) => set_top(bar, baseline.top() - bar.height() - stroke),
    }
    true
}

fn set_top(rect: &mut Rect, top: f32) {
    *rect = Rect::from_min_size(pos2(rect.left(), top), rect.size());
}

/// A parent spanning zero time still gets a square footprint.
pub fn widen_degenerate_parent(rect: Rect) -> Rect {
    if rect.width() > 0.0 {
        return rect;
    }
    let h = rect.height();
    Rect::from_min_size(pos2(rect.left() - h / 2.0, rect.top()), vec2(h, h))
}

/// Bracket outline for parent bars: a flat top with a slanted notch hanging
/// below each end. The path is closed, its last point repeats the first.
pub fn parent_outline(rect: Rect) -> [Pos2; 7] {
    let left = rect.left();
    let right = rect.right();
    let top = rect.top();
    let bottom = rect.bottom();
    let depth = rect.height() * PARENT_NOTCH_RATIO;
    let inset = depth.min(rect.width() / 2.0);
    [
        pos2(left, top),
        pos2(right, top),
        pos2(right, bottom + depth),
        pos2(right - inset, bottom),
        pos2(left + inset, bottom),
        pos2(left, bottom + depth),
        pos2(left, top),
    ]
}

/// Square bounds of a milestone diamond centred on `center_x`.
pub fn milestone_bounds(center_x: f32, row: RowRect, options: &BarOptions, pairing: Pairing) -> Rect {
    let column = resolve(
        BarKind::Milestone,
        TimeRect {
            left: center_x,
            width: 0.0,
        },
        row,
        options,
        pairing,
    );
    let h = column.height();
    Rect::from_min_size(pos2(center_x - h / 2.0, column.top()), vec2(h, h))
}

pub fn diamond(rect: Rect) -> [Pos2; 4] {
    let c = rect.center();
    [
        pos2(c.x, rect.top()),
        pos2(rect.right(), c.y),
        pos2(c.x, rect.bottom()),
        pos2(rect.left(), c.y),
    ]
}

/// Progress overlay inside an actual or baseline bar.
pub fn progress_bounds(bar: Rect, ratio: f32, options: &BarOptions) -> Rect {
    resolve(
        BarKind::Progress,
        TimeRect {
            left: bar.left(),
            width: bar.width() * ratio,
        },
        RowRect {
            top: bar.top(),
            height: bar.height(),
        },
        options,
        Pairing::NONE,
    )
}

/// Clamps a progress ratio to `[0, 1]`; unusable values count as no progress.
pub fn clamp_progress(ratio: f32) -> f32 {
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Rounds every edge to a whole pixel.
pub fn snap(rect: Rect) -> Rect {
    Rect::from_min_max(rect.min.round(), rect.max.round())
}
