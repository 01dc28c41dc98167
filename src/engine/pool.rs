use std::collections::HashMap;

use egui::Rect;
use uuid::Uuid;

use crate::engine::geometry::BarKind;

/// One drawn shape of the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub rect: Rect,
    pub kind: BarKind,
    /// Item owning the row.
    pub owner: Uuid,
    /// Id connectors use to reach this bar: the period id in resource rows,
    /// the item id otherwise.
    pub target_id: Uuid,
    pub row: usize,
    pub period: Option<usize>,
    /// Progress ratio drawn on this bar, if any.
    pub progress: Option<f32>,
    /// Whether the bar falls inside the viewport.
    pub visible: bool,
}

/// Key of the bar connectors attach to for a row or a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorKey {
    pub row: usize,
    pub period: Option<usize>,
}

/// Frame-scoped storage for bars.
///
/// Slots are overwritten in place after [`BarPool::reset`], so a steady
/// frame allocates nothing.
#[derive(Debug, Default)]
pub struct BarPool {
    slots: Vec<Bar>,
    len: usize,
    anchors: HashMap<AnchorKey, usize>,
}

impl BarPool {
    pub fn reset(&mut self) {
        self.len = 0;
        self.anchors.clear();
    }

    pub fn push(&mut self, bar: Bar) -> usize {
        let slot = self.len;
        if slot < self.slots.len() {
            self.slots[slot] = bar;
        } else {
            self.slots.push(bar);
        }
        self.len += 1;
        slot
    }

    pub fn bars(&self) -> &[Bar] {
        &self.slots[..self.len]
    }

    pub fn get(&self, slot: usize) -> Option<&Bar> {
        self.bars().get(slot)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots allocated so far, used or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn set_anchor(&mut self, key: AnchorKey, slot: usize) {
        self.anchors.insert(key, slot);
    }

    pub fn anchor(&self, key: AnchorKey) -> Option<&Bar> {
        self.anchors.get(&key).and_then(|&slot| self.get(slot))
    }
}

#[cfg(test)]
mod tests {
    use egui::{pos2, vec2};

    use super::*;

    fn bar(row: usize) -> Bar {
        let id = Uuid::new_v4();
        Bar {
            rect: Rect::from_min_size(pos2(0.0, row as f32 * 20.0), vec2(10.0, 10.0)),
            kind: BarKind::Base,
            owner: id,
            target_id: id,
            row,
            period: None,
            progress: None,
            visible: true,
        }
    }

    #[test]
    fn reset_reuses_slots() {
        let mut pool = BarPool::default();
        for row in 0..4 {
            pool.push(bar(row));
        }
        assert_eq!(pool.capacity(), 4);

        pool.reset();
        assert!(pool.is_empty());
        let slot = pool.push(bar(9));
        assert_eq!(slot, 0);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.bars()[0].row, 9);
    }

    #[test]
    fn anchors_clear_on_reset() {
        let mut pool = BarPool::default();
        let slot = pool.push(bar(2));
        let key = AnchorKey { row: 2, period: None };
        pool.set_anchor(key, slot);
        assert_eq!(pool.anchor(key).map(|b| b.row), Some(2));
        pool.reset();
        assert!(pool.anchor(key).is_none());
    }
}
