use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::connector::ConnectorType;
use crate::model::legacy::LegacyConnectorFields;

/// Completion of a task, stored as a whole percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "RawProgress", into = "String")]
pub struct Progress(u8);

impl Progress {
    pub const COMPLETE: Progress = Progress(100);

    /// Rounds a ratio to whole percent, clamped to `[0, 100]`.
    pub fn from_ratio(ratio: f64) -> Option<Self> {
        if !ratio.is_finite() {
            return None;
        }
        Some(Self((ratio * 100.0).round().clamp(0.0, 100.0) as u8))
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    pub fn ratio(self) -> f32 {
        f32::from(self.0) / 100.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl From<Progress> for String {
    fn from(progress: Progress) -> Self {
        progress.to_string()
    }
}

impl FromStr for Progress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let ratio = match trimmed.strip_suffix('%') {
            Some(pct) => pct.trim().parse::<f64>().map(|v| v / 100.0),
            None => trimmed.parse::<f64>(),
        };
        ratio
            .ok()
            .and_then(Progress::from_ratio)
            .ok_or_else(|| format!("invalid progress value {s:?}"))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProgress {
    Ratio(f64),
    Text(String),
}

impl TryFrom<RawProgress> for Progress {
    type Error = String;

    fn try_from(raw: RawProgress) -> Result<Self, Self::Error> {
        match raw {
            RawProgress::Ratio(ratio) => {
                Progress::from_ratio(ratio).ok_or_else(|| format!("invalid progress ratio {ratio}"))
            }
            RawProgress::Text(text) => text.parse(),
        }
    }
}

/// One dependency stored on its source item or period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectorRecord {
    #[serde(rename = "connectTo")]
    pub to: Uuid,
    #[serde(rename = "connectorType", default)]
    pub kind: ConnectorType,
}

impl ConnectorRecord {
    pub fn new(to: Uuid, kind: ConnectorType) -> Self {
        Self { to, kind }
    }
}

/// A span of a resource row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PeriodRecord", rename_all = "camelCase")]
pub struct Period {
    pub id: Uuid,
    pub start: Option<i64>,
    pub end: Option<i64>,
    #[serde(rename = "connector", skip_serializing_if = "Vec::is_empty")]
    pub connectors: Vec<ConnectorRecord>,
}

impl Period {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            start: Some(start),
            end: Some(end),
            connectors: Vec::new(),
        }
    }

    pub fn is_milestone(&self) -> bool {
        is_milestone(self.start, self.end)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodRecord {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    #[serde(default)]
    start: Option<i64>,
    #[serde(default)]
    end: Option<i64>,
    #[serde(flatten)]
    connectors: LegacyConnectorFields,
}

impl From<PeriodRecord> for Period {
    fn from(record: PeriodRecord) -> Self {
        Self {
            id: record.id,
            start: record.start,
            end: record.end,
            connectors: record.connectors.migrate(),
        }
    }
}

/// A row of the chart: a task, a summary task or a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ItemRecord", rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Uuid>,
    pub actual_start: Option<i64>,
    pub actual_end: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_end: Option<i64>,
    #[serde(rename = "progressValue", skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(rename = "baselineProgressValue", skip_serializing_if = "Option::is_none")]
    pub baseline_progress: Option<Progress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_height: Option<f32>,
    #[serde(rename = "connector", skip_serializing_if = "Vec::is_empty")]
    pub connectors: Vec<ConnectorRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub periods: Vec<Period>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub collapsed: bool,
}

impl Item {
    /// Create a task spanning `start..end` (milliseconds).
    pub fn new(name: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent: None,
            actual_start: Some(start),
            actual_end: Some(end),
            baseline_start: None,
            baseline_end: None,
            progress: None,
            baseline_progress: None,
            row_height: None,
            connectors: Vec::new(),
            periods: Vec::new(),
            collapsed: false,
        }
    }

    /// Create a milestone at `at`.
    pub fn milestone(name: impl Into<String>, at: i64) -> Self {
        Self::new(name, at, at)
    }

    /// Create a resource row holding the given periods.
    pub fn resource(name: impl Into<String>, periods: Vec<Period>) -> Self {
        Self {
            actual_start: None,
            actual_end: None,
            periods,
            ..Self::new(name, 0, 0)
        }
    }

    pub fn child_of(mut self, parent: Uuid) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_baseline(mut self, start: i64, end: i64) -> Self {
        self.baseline_start = Some(start);
        self.baseline_end = Some(end);
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_connector(mut self, to: Uuid, kind: ConnectorType) -> Self {
        self.connectors.push(ConnectorRecord::new(to, kind));
        self
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline_start.is_some() && self.baseline_end.is_some()
    }

    pub fn is_milestone(&self) -> bool {
        is_milestone(self.actual_start, self.actual_end)
    }

    /// Start and end of the actual range when both are known.
    pub fn actual_range(&self) -> Option<(i64, i64)> {
        Some((self.actual_start?, self.actual_end?))
    }

    pub fn baseline_range(&self) -> Option<(i64, i64)> {
        Some((self.baseline_start?, self.baseline_end?))
    }

    pub fn period(&self, index: usize) -> Option<&Period> {
        self.periods.get(index)
    }
}

fn is_milestone(start: Option<i64>, end: Option<i64>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => start == end,
        (Some(_), None) => true,
        _ => false,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    #[serde(default)]
    name: String,
    #[serde(default)]
    parent: Option<Uuid>,
    #[serde(default)]
    actual_start: Option<i64>,
    #[serde(default)]
    actual_end: Option<i64>,
    #[serde(default)]
    baseline_start: Option<i64>,
    #[serde(default)]
    baseline_end: Option<i64>,
    #[serde(default, rename = "progressValue")]
    progress: Option<Progress>,
    #[serde(default, rename = "baselineProgressValue")]
    baseline_progress: Option<Progress>,
    #[serde(default)]
    row_height: Option<f32>,
    #[serde(default)]
    periods: Vec<Period>,
    #[serde(default)]
    collapsed: bool,
    #[serde(flatten)]
    connectors: LegacyConnectorFields,
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            parent: record.parent,
            actual_start: record.actual_start,
            actual_end: record.actual_end,
            baseline_start: record.baseline_start,
            baseline_end: record.baseline_end,
            progress: record.progress,
            baseline_progress: record.baseline_progress,
            row_height: record.row_height,
            connectors: record.connectors.migrate(),
            periods: record.periods,
            collapsed: record.collapsed,
        }
    }
}

/// How a row is drawn, derived from its data every layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Leaf,
    Parent,
    Milestone,
    BaselinePaired,
}

impl ItemKind {
    pub fn classify(item: &Item, has_children: bool) -> Self {
        if item.has_baseline() {
            ItemKind::BaselinePaired
        } else if has_children {
            ItemKind::Parent
        } else if item.is_milestone() {
            ItemKind::Milestone
        } else {
            ItemKind::Leaf
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_rounds_and_clamps() {
        assert_eq!(Progress::from_ratio(0.456).unwrap().percent(), 46);
        assert_eq!(Progress::from_ratio(1.7), Some(Progress::COMPLETE));
        assert_eq!(Progress::from_ratio(-0.2).unwrap().percent(), 0);
        assert!(Progress::from_ratio(f64::NAN).is_none());
        assert_eq!(Progress::from_ratio(0.3).unwrap().to_string(), "30%");
    }

    #[test]
    fn progress_reads_percent_strings_and_ratios() {
        let items: Vec<Item> = serde_json::from_str(
            r#"[{"name": "a", "progressValue": "45%"}, {"name": "b", "progressValue": 0.5}]"#,
        )
        .unwrap();
        assert_eq!(items[0].progress.map(Progress::percent), Some(45));
        assert_eq!(items[1].progress.map(Progress::percent), Some(50));
    }

    #[test]
    fn classify_kinds() {
        let leaf = Item::new("leaf", 0, 10);
        assert_eq!(ItemKind::classify(&leaf, false), ItemKind::Leaf);
        assert_eq!(ItemKind::classify(&leaf, true), ItemKind::Parent);

        let milestone = Item::milestone("m", 5);
        assert_eq!(ItemKind::classify(&milestone, false), ItemKind::Milestone);

        let open_ended = Item {
            actual_end: None,
            ..Item::new("open", 5, 5)
        };
        assert!(open_ended.is_milestone());

        let paired = Item::new("b", 0, 10).with_baseline(0, 8);
        assert_eq!(ItemKind::classify(&paired, true), ItemKind::BaselinePaired);
    }

    #[test]
    fn serializes_canonical_connector_array() {
        let target = Uuid::new_v4();
        let item = Item::new("a", 0, 10).with_connector(target, ConnectorType::StartStart);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["connector"][0]["connectTo"], target.to_string());
        assert_eq!(json["connector"][0]["connectorType"], "start-start");

        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back.connectors, item.connectors);
    }
}
