use std::collections::{HashMap, HashSet};
use std::ops::Range;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TimelineError};
use crate::model::item::{ConnectorRecord, Item, ItemKind, Progress};

/// Whether rows show their own ranges or a list of resource periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartMode {
    #[default]
    Project,
    Resource,
}

/// Sent to listeners once per batch of changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub revision: u64,
}

type Listener = Box<dyn FnMut(&ChangeEvent)>;

/// Owns the item tree and exposes it as a flat list of visible rows.
///
/// Rows follow tree order and skip descendants of collapsed items. Row tops
/// come from a prefix-sum cache rebuilt whenever the row list changes.
pub struct ItemStore {
    items: Vec<Item>,
    index: HashMap<Uuid, usize>,
    children: HashMap<Uuid, Vec<usize>>,
    rows: Vec<usize>,
    row_of_item: HashMap<Uuid, usize>,
    period_rows: HashMap<Uuid, (usize, usize)>,
    depths: Vec<usize>,
    prefix: Vec<f32>,
    default_row_height: f32,
    vertical_offset: f32,
    mode: ChartMode,
    suspended: u32,
    pending: bool,
    revision: u64,
    listeners: Vec<Listener>,
}

impl ItemStore {
    pub fn new(items: Vec<Item>, default_row_height: f32) -> Self {
        let mut store = Self {
            items,
            index: HashMap::new(),
            children: HashMap::new(),
            rows: Vec::new(),
            row_of_item: HashMap::new(),
            period_rows: HashMap::new(),
            depths: Vec::new(),
            prefix: vec![0.0],
            default_row_height,
            vertical_offset: 0.0,
            mode: ChartMode::default(),
            suspended: 0,
            pending: false,
            revision: 0,
            listeners: Vec::new(),
        };
        store.rebuild();
        store
    }

    /// Parses a JSON array of items. Legacy connector fields are migrated.
    pub fn from_json(json: &str, default_row_height: f32) -> Result<Self> {
        let items: Vec<Item> = serde_json::from_str(json)?;
        Ok(Self::new(items, default_row_height))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.items)?)
    }

    // ── Lookup ──────────────────────────────────────────────────

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: Uuid) -> Option<&Item> {
        self.index.get(&id).map(|&i| &self.items[i])
    }

    pub fn has_children(&self, id: Uuid) -> bool {
        self.children.get(&id).is_some_and(|c| !c.is_empty())
    }

    pub fn kind_of(&self, item: &Item) -> ItemKind {
        ItemKind::classify(item, self.has_children(item.id))
    }

    pub fn mode(&self) -> ChartMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ChartMode) {
        if self.mode != mode {
            self.mode = mode;
            self.mark_changed();
        }
    }

    /// Finds the row and period index of a period id among visible rows.
    pub fn locate_period(&self, period_id: Uuid) -> Option<(usize, usize)> {
        self.period_rows.get(&period_id).copied()
    }

    /// Earliest and latest timestamp across actual, baseline and period data.
    pub fn data_extent(&self) -> Option<(i64, i64)> {
        let stamps = self.items.iter().flat_map(|item| {
            [
                item.actual_start,
                item.actual_end,
                item.baseline_start,
                item.baseline_end,
            ]
            .into_iter()
            .chain(item.periods.iter().flat_map(|p| [p.start, p.end]))
            .flatten()
        });
        stamps.fold(None, |acc, t| match acc {
            None => Some((t, t)),
            Some((min, max)) => Some((min.min(t), max.max(t))),
        })
    }

    // ── Rows ────────────────────────────────────────────────────

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Visible items in row order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Item> + '_ {
        self.rows.iter().map(|&i| &self.items[i])
    }

    pub fn row_item(&self, row: usize) -> Option<&Item> {
        self.rows.get(row).map(|&i| &self.items[i])
    }

    /// Visible row of an item, `None` when it is hidden or unknown.
    pub fn row_of(&self, id: Uuid) -> Option<usize> {
        self.row_of_item.get(&id).copied()
    }

    pub fn depth(&self, row: usize) -> usize {
        self.depths.get(row).copied().unwrap_or(0)
    }

    pub fn row_height(&self, row: usize) -> f32 {
        self.prefix
            .get(row + 1)
            .zip(self.prefix.get(row))
            .map_or(self.default_row_height, |(next, top)| next - top)
    }

    /// Top of `row` in content coordinates (before the vertical offset).
    pub fn row_top(&self, row: usize) -> f32 {
        let last = self.prefix.len() - 1;
        self.prefix[row.min(last)]
    }

    pub fn total_height(&self) -> f32 {
        self.prefix[self.prefix.len() - 1]
    }

    pub fn default_row_height(&self) -> f32 {
        self.default_row_height
    }

    /// Rows intersecting a viewport of `height` px at the current offset.
    pub fn visible_window(&self, height: f32) -> Range<usize> {
        let top = self.vertical_offset;
        let bottom = top + height.max(0.0);
        // prefix[r + 1] is the bottom of row r.
        let start = self.prefix[1..].partition_point(|&b| b <= top);
        let end = self.prefix[..self.rows.len()].partition_point(|&t| t < bottom);
        start..end.max(start)
    }

    pub fn vertical_offset(&self) -> f32 {
        self.vertical_offset
    }

    /// Sets the vertical scroll, clamped so the last row can reach the bottom
    /// of a viewport `viewport_height` px tall.
    pub fn set_vertical_offset(&mut self, offset: f32, viewport_height: f32) {
        let max = (self.total_height() - viewport_height).max(0.0);
        self.vertical_offset = if offset.is_finite() {
            offset.clamp(0.0, max)
        } else {
            0.0
        };
    }

    pub fn toggle_collapsed(&mut self, id: Uuid) -> Result<bool> {
        let index = *self.index.get(&id).ok_or(TimelineError::ItemNotFound(id))?;
        let item = &mut self.items[index];
        item.collapsed = !item.collapsed;
        let collapsed = item.collapsed;
        self.rebuild_rows();
        self.mark_changed();
        Ok(collapsed)
    }

    fn rebuild(&mut self) {
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id, i))
            .collect();

        self.children.clear();
        for (i, item) in self.items.iter().enumerate() {
            if let Some(parent) = item.parent.filter(|p| self.index.contains_key(p)) {
                self.children.entry(parent).or_default().push(i);
            }
        }
        self.rebuild_rows();
    }

    fn rebuild_rows(&mut self) {
        self.rows.clear();
        self.depths.clear();
        let mut seen = HashSet::new();
        let roots: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.parent.map_or(true, |p| !self.index.contains_key(&p)))
            .map(|(i, _)| i)
            .collect();

        let mut stack: Vec<(usize, usize)> = roots.into_iter().rev().map(|i| (i, 0)).collect();
        while let Some((i, depth)) = stack.pop() {
            if !seen.insert(i) {
                continue;
            }
            self.rows.push(i);
            self.depths.push(depth);
            let item = &self.items[i];
            if item.collapsed {
                continue;
            }
            if let Some(children) = self.children.get(&item.id) {
                stack.extend(children.iter().rev().map(|&c| (c, depth + 1)));
            }
        }

        self.row_of_item.clear();
        self.period_rows.clear();
        for (row, &i) in self.rows.iter().enumerate() {
            let item = &self.items[i];
            self.row_of_item.insert(item.id, row);
            for (index, period) in item.periods.iter().enumerate() {
                self.period_rows.entry(period.id).or_insert((row, index));
            }
        }

        self.prefix.clear();
        self.prefix.push(0.0);
        let mut acc = 0.0;
        for &i in &self.rows {
            acc += self.items[i].row_height.unwrap_or(self.default_row_height);
            self.prefix.push(acc);
        }
    }

    // ── Notifications ───────────────────────────────────────────

    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn suspend_notifications(&mut self) {
        self.suspended += 1;
    }

    /// Ends one suspension. With `dispatch`, changes made while suspended
    /// are announced as a single event.
    pub fn resume_notifications(&mut self, dispatch: bool) {
        self.suspended = self.suspended.saturating_sub(1);
        if self.suspended > 0 {
            return;
        }
        if dispatch && self.pending {
            self.dispatch();
        }
        self.pending = false;
    }

    /// Runs `f` with notifications suspended, so observers see its writes as
    /// one change.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.suspend_notifications();
        let result = f(self);
        self.resume_notifications(true);
        result
    }

    fn mark_changed(&mut self) {
        self.revision += 1;
        self.pending = true;
        if self.suspended == 0 {
            self.dispatch();
            self.pending = false;
        }
    }

    fn dispatch(&mut self) {
        let event = ChangeEvent {
            revision: self.revision,
        };
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    // ── Mutation ────────────────────────────────────────────────

    fn item_mut(&mut self, id: Uuid) -> Result<&mut Item> {
        let index = *self.index.get(&id).ok_or(TimelineError::ItemNotFound(id))?;
        Ok(&mut self.items[index])
    }

    pub fn set_actual_range(&mut self, id: Uuid, start: i64, end: i64) -> Result<()> {
        let item = self.item_mut(id)?;
        item.actual_start = Some(start);
        item.actual_end = Some(end);
        self.mark_changed();
        Ok(())
    }

    /// Moves a milestone; its end follows only if it has one.
    pub fn set_actual_milestone(&mut self, id: Uuid, at: i64) -> Result<()> {
        let item = self.item_mut(id)?;
        item.actual_start = Some(at);
        if item.actual_end.is_some() {
            item.actual_end = Some(at);
        }
        self.mark_changed();
        Ok(())
    }

    pub fn set_baseline_range(&mut self, id: Uuid, start: i64, end: i64) -> Result<()> {
        let item = self.item_mut(id)?;
        item.baseline_start = Some(start);
        item.baseline_end = Some(end);
        self.mark_changed();
        Ok(())
    }

    pub fn set_period_range(&mut self, id: Uuid, index: usize, start: i64, end: i64) -> Result<()> {
        let item = self.item_mut(id)?;
        let period = item
            .periods
            .get_mut(index)
            .ok_or(TimelineError::PeriodNotFound { item: id, index })?;
        period.start = Some(start);
        period.end = Some(end);
        self.mark_changed();
        Ok(())
    }

    pub fn set_period_milestone(&mut self, id: Uuid, index: usize, at: i64) -> Result<()> {
        let item = self.item_mut(id)?;
        let period = item
            .periods
            .get_mut(index)
            .ok_or(TimelineError::PeriodNotFound { item: id, index })?;
        if period.start.is_some() || period.end.is_none() {
            period.start = Some(at);
        }
        if period.end.is_some() {
            period.end = Some(at);
        }
        self.mark_changed();
        Ok(())
    }

    pub fn set_progress(&mut self, id: Uuid, progress: Progress) -> Result<()> {
        self.item_mut(id)?.progress = Some(progress);
        self.mark_changed();
        Ok(())
    }

    pub fn set_baseline_progress(&mut self, id: Uuid, progress: Progress) -> Result<()> {
        self.item_mut(id)?.baseline_progress = Some(progress);
        self.mark_changed();
        Ok(())
    }

    fn connectors_mut(&mut self, id: Uuid, period: Option<usize>) -> Result<&mut Vec<ConnectorRecord>> {
        let item = self.item_mut(id)?;
        match period {
            None => Ok(&mut item.connectors),
            Some(index) => item
                .periods
                .get_mut(index)
                .map(|p| &mut p.connectors)
                .ok_or(TimelineError::PeriodNotFound { item: id, index }),
        }
    }

    /// Appends a connector to an item or one of its periods. Returns false
    /// when the same connector already exists.
    pub fn add_connector(&mut self, id: Uuid, period: Option<usize>, record: ConnectorRecord) -> Result<bool> {
        let connectors = self.connectors_mut(id, period)?;
        if connectors.contains(&record) {
            return Ok(false);
        }
        connectors.push(record);
        self.mark_changed();
        Ok(true)
    }

    /// Removes a connector. Returns false when it was not present.
    pub fn remove_connector(&mut self, id: Uuid, period: Option<usize>, record: ConnectorRecord) -> Result<bool> {
        let connectors = self.connectors_mut(id, period)?;
        let before = connectors.len();
        connectors.retain(|c| *c != record);
        let removed = connectors.len() != before;
        if removed {
            self.mark_changed();
        }
        Ok(removed)
    }
}
