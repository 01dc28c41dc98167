/// Default padding added on each side of the data extent, as a share of it.
pub const DEFAULT_GAP: f64 = 0.01;

/// Default multiplier used by [`TimeScale::zoom_in`] / [`TimeScale::zoom_out`].
pub const DEFAULT_ZOOM_FACTOR: f64 = 1.25;

/// Share of the total range shown after the first data range arrives.
const INITIAL_ZOOM_SHARE: f64 = 0.1;

/// Padding on each side of a data extent that is a single instant (12 h).
const DEGENERATE_PAD_MS: f64 = 12.0 * 3_600_000.0;

/// Maps millisecond timestamps to ratios of the visible window and back.
///
/// All bounds are `NaN` until the first [`TimeScale::set_data_range`] call,
/// in which case every conversion yields `NaN` too.
#[derive(Debug, Clone)]
pub struct TimeScale {
    data_min: f64,
    data_max: f64,
    total_min: f64,
    total_max: f64,
    visible_min: f64,
    visible_max: f64,
    minimum_gap: f64,
    maximum_gap: f64,
    zoomed: bool,
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeScale {
    pub fn new() -> Self {
        Self {
            data_min: f64::NAN,
            data_max: f64::NAN,
            total_min: f64::NAN,
            total_max: f64::NAN,
            visible_min: f64::NAN,
            visible_max: f64::NAN,
            minimum_gap: DEFAULT_GAP,
            maximum_gap: DEFAULT_GAP,
            zoomed: false,
        }
    }

    /// Builds a scale with the given gaps applied before any data arrives.
    pub fn with_gaps(minimum_gap: f64, maximum_gap: f64) -> Self {
        Self {
            minimum_gap: sanitize_gap(minimum_gap),
            maximum_gap: sanitize_gap(maximum_gap),
            ..Self::new()
        }
    }

    /// True until a finite visible window exists.
    pub fn is_empty(&self) -> bool {
        !(self.visible_min.is_finite() && self.visible_max.is_finite())
    }

    // ── Conversions ─────────────────────────────────────────────

    /// Linear map of `t` into the visible window. Not clamped: values outside
    /// `[0, 1]` mean the timestamp is off-screen.
    pub fn timestamp_to_ratio(&self, t: f64) -> f64 {
        (t - self.visible_min) / (self.visible_max - self.visible_min)
    }

    pub fn ratio_to_timestamp(&self, ratio: f64) -> f64 {
        self.visible_min + ratio * (self.visible_max - self.visible_min)
    }

    // ── Ranges ──────────────────────────────────────────────────

    pub fn visible_range(&self) -> (f64, f64) {
        (self.visible_min, self.visible_max)
    }

    pub fn total_range(&self) -> (f64, f64) {
        (self.total_min, self.total_max)
    }

    pub fn data_range(&self) -> (f64, f64) {
        (self.data_min, self.data_max)
    }

    pub fn visible_span(&self) -> f64 {
        self.visible_max - self.visible_min
    }

    pub fn minimum_gap(&self) -> f64 {
        self.minimum_gap
    }

    pub fn maximum_gap(&self) -> f64 {
        self.maximum_gap
    }

    /// Records the extent discovered in the dataset.
    ///
    /// The visible window only changes on the very first call with a finite
    /// extent: the scale then shows the leading tenth of the total range.
    pub fn set_data_range(&mut self, min: f64, max: f64) {
        if min.is_finite() && max.is_finite() {
            self.data_min = min.min(max);
            self.data_max = min.max(max);
        } else {
            self.data_min = f64::NAN;
            self.data_max = f64::NAN;
        }
        self.recalculate_total();

        if !self.zoomed && self.total_min.is_finite() && self.total_max.is_finite() {
            let span = self.total_max - self.total_min;
            self.visible_min = self.total_min;
            self.visible_max = self.total_min + span * INITIAL_ZOOM_SHARE;
            self.zoomed = true;
        } else if self.zoomed {
            self.extend_total_to_visible();
        }
    }

    pub fn set_minimum_gap(&mut self, gap: f64) {
        self.minimum_gap = sanitize_gap(gap);
        self.recalculate_total();
        self.extend_total_to_visible();
    }

    pub fn set_maximum_gap(&mut self, gap: f64) {
        self.maximum_gap = sanitize_gap(gap);
        self.recalculate_total();
        self.extend_total_to_visible();
    }

    /// Sets the visible window as given. No clamping is applied; see
    /// [`TimeScale::clamped_window`] for callers that want it.
    pub fn zoom_to(&mut self, min: f64, max: f64) {
        if !(min.is_finite() && max.is_finite()) || min > max {
            return;
        }
        self.visible_min = min;
        self.visible_max = max;
        self.zoomed = true;
        self.extend_total_to_visible();
    }

    pub fn set_range(&mut self, min: f64, max: f64) {
        self.zoom_to(min, max);
    }

    /// Fits a requested window inside the total range, keeping its width
    /// where possible.
    pub fn clamped_window(&self, min: f64, max: f64) -> (f64, f64) {
        if !(self.total_min.is_finite() && self.total_max.is_finite())
            || !(min.is_finite() && max.is_finite())
            || min > max
        {
            return (min, max);
        }
        let total_span = self.total_max - self.total_min;
        let span = (max - min).min(total_span);
        let start = min.clamp(self.total_min, self.total_max - span);
        (start, start + span)
    }

    /// Pans by `delta` visible widths, stopping at the total range edges.
    pub fn ratio_scroll(&mut self, delta: f64) {
        if self.is_empty() || !delta.is_finite() {
            return;
        }
        let shift = (self.visible_span() * delta).round();
        let interval = if shift >= 0.0 {
            shift.min(self.total_max - self.visible_max).max(0.0)
        } else {
            shift.max(self.total_min - self.visible_min).min(0.0)
        };
        self.visible_min += interval;
        self.visible_max += interval;
    }

    /// Pans by `delta` visible widths regardless of the total range, growing
    /// it when the window moves past either edge.
    pub fn ratio_force_scroll(&mut self, delta: f64) {
        if self.is_empty() || !delta.is_finite() {
            return;
        }
        let shift = (self.visible_span() * delta).round();
        self.visible_min += shift;
        self.visible_max += shift;
        self.extend_total_to_visible();
    }

    /// Narrows the window around its centre.
    pub fn zoom_in(&mut self, factor: f64) {
        if factor > 0.0 {
            self.zoom_around_center(1.0 / factor);
        }
    }

    /// Widens the window around its centre, never past the total range.
    pub fn zoom_out(&mut self, factor: f64) {
        if self.is_empty() || factor <= 0.0 {
            return;
        }
        self.zoom_around_center(factor);
        let (min, max) = self.clamped_window(self.visible_min, self.visible_max);
        self.visible_min = min;
        self.visible_max = max;
    }

    /// Shows the whole total range.
    pub fn fit_all(&mut self) {
        if self.total_min.is_finite() && self.total_max.is_finite() {
            self.visible_min = self.total_min;
            self.visible_max = self.total_max;
            self.zoomed = true;
        }
    }

    fn zoom_around_center(&mut self, multiplier: f64) {
        if self.is_empty() {
            return;
        }
        let center = (self.visible_min + self.visible_max) / 2.0;
        let half = self.visible_span() * multiplier / 2.0;
        self.visible_min = center - half;
        self.visible_max = center + half;
    }

    fn recalculate_total(&mut self) {
        let (min, max) = if self.data_max > self.data_min {
            (self.data_min, self.data_max)
        } else {
            (self.data_min - DEGENERATE_PAD_MS, self.data_max + DEGENERATE_PAD_MS)
        };
        let span = max - min;
        self.total_min = min - span * self.minimum_gap;
        self.total_max = max + span * self.maximum_gap;
    }

    fn extend_total_to_visible(&mut self) {
        if self.is_empty() {
            return;
        }
        if !self.total_min.is_finite() || self.visible_min < self.total_min {
            self.total_min = self.visible_min;
        }
        if !self.total_max.is_finite() || self.visible_max > self.total_max {
            self.total_max = self.visible_max;
        }
    }
}

fn sanitize_gap(gap: f64) -> f64 {
    if gap.is_finite() && gap >= 0.0 {
        gap
    } else {
        DEFAULT_GAP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale_0_1000() -> TimeScale {
        let mut scale = TimeScale::with_gaps(0.0, 0.0);
        scale.set_data_range(0.0, 1000.0);
        scale.set_range(0.0, 1000.0);
        scale
    }

    #[test]
    fn empty_scale_yields_nan() {
        let scale = TimeScale::new();
        assert!(scale.is_empty());
        assert!(scale.timestamp_to_ratio(10.0).is_nan());
        assert!(scale.ratio_to_timestamp(0.5).is_nan());
    }

    #[test]
    fn first_data_range_shows_leading_tenth() {
        let mut scale = TimeScale::with_gaps(0.0, 0.0);
        scale.set_data_range(0.0, 1000.0);
        assert_eq!(scale.visible_range(), (0.0, 100.0));

        // Later updates keep the window.
        scale.set_data_range(0.0, 5000.0);
        assert_eq!(scale.visible_range(), (0.0, 100.0));
        assert_eq!(scale.total_range(), (0.0, 5000.0));
    }

    #[test]
    fn single_instant_gets_a_day_of_room() {
        let mut scale = TimeScale::with_gaps(0.0, 0.0);
        scale.set_data_range(5_000.0, 5_000.0);
        let (min, max) = scale.total_range();
        assert_eq!(min, 5_000.0 - DEGENERATE_PAD_MS);
        assert_eq!(max, 5_000.0 + DEGENERATE_PAD_MS);

        assert!(!scale.is_empty());
        let (vmin, vmax) = scale.visible_range();
        assert!(vmax > vmin);
        assert!(scale.timestamp_to_ratio(5_000.0).is_finite());
    }

    #[test]
    fn gaps_pad_the_total_range() {
        let mut scale = TimeScale::new();
        scale.set_data_range(0.0, 1000.0);
        assert_eq!(scale.total_range(), (-10.0, 1010.0));
    }

    #[test]
    fn ratio_is_not_clamped() {
        let scale = scale_0_1000();
        assert_eq!(scale.timestamp_to_ratio(250.0), 0.25);
        assert_eq!(scale.timestamp_to_ratio(-500.0), -0.5);
        assert_eq!(scale.timestamp_to_ratio(1500.0), 1.5);
    }

    #[test]
    fn ratio_round_trip() {
        let mut scale = TimeScale::with_gaps(0.0, 0.0);
        scale.set_data_range(1.6e12, 1.7e12);
        scale.set_range(1.62e12, 1.63e12);
        for step in 0..=20 {
            let t = 1.62e12 + step as f64 * 5.0e8;
            let back = scale.ratio_to_timestamp(scale.timestamp_to_ratio(t));
            assert!((back - t).abs() < 1e-3, "{t} -> {back}");
        }
    }

    #[test]
    fn zoom_to_does_not_clamp() {
        let mut scale = scale_0_1000();
        scale.zoom_to(-200.0, 300.0);
        assert_eq!(scale.visible_range(), (-200.0, 300.0));
        let (total_min, _) = scale.total_range();
        assert!(total_min <= -200.0);
    }

    #[test]
    fn clamped_window_keeps_width_inside_total() {
        let scale = scale_0_1000();
        assert_eq!(scale.clamped_window(-200.0, 300.0), (0.0, 500.0));
        assert_eq!(scale.clamped_window(900.0, 1400.0), (500.0, 1000.0));
        assert_eq!(scale.clamped_window(-100.0, 5000.0), (0.0, 1000.0));
    }

    #[test]
    fn zoom_to_ignores_nan() {
        let mut scale = scale_0_1000();
        scale.zoom_to(f64::NAN, 10.0);
        assert_eq!(scale.visible_range(), (0.0, 1000.0));
    }

    #[test]
    fn ratio_scroll_stops_at_total_edges() {
        let mut scale = scale_0_1000();
        scale.set_range(0.0, 200.0);
        scale.ratio_scroll(0.5);
        assert_eq!(scale.visible_range(), (100.0, 300.0));
        scale.ratio_scroll(-2.0);
        assert_eq!(scale.visible_range(), (0.0, 200.0));
        scale.ratio_scroll(100.0);
        assert_eq!(scale.visible_range(), (800.0, 1000.0));
    }

    #[test]
    fn force_scroll_extends_total_range() {
        let mut scale = scale_0_1000();
        scale.set_range(800.0, 1000.0);
        scale.ratio_force_scroll(0.5);
        assert_eq!(scale.visible_range(), (900.0, 1100.0));
        assert_eq!(scale.total_range(), (0.0, 1100.0));
    }

    #[test]
    fn zoom_in_and_out_around_center() {
        let mut scale = scale_0_1000();
        scale.set_range(400.0, 600.0);
        scale.zoom_in(2.0);
        assert_eq!(scale.visible_range(), (450.0, 550.0));
        scale.zoom_out(2.0);
        assert_eq!(scale.visible_range(), (400.0, 600.0));
        scale.zoom_out(100.0);
        assert_eq!(scale.visible_range(), (0.0, 1000.0));
    }

    #[test]
    fn fit_all_shows_total() {
        let mut scale = TimeScale::new();
        scale.set_data_range(0.0, 1000.0);
        scale.fit_all();
        assert_eq!(scale.visible_range(), scale.total_range());
    }
}
