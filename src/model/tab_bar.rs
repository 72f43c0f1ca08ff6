//! Render-side state of tab bars.
//!
//! Each tabbed group owns one bar. Entries cache where each tab sits as a
//! fraction of the bar width so that pointer hit-testing does not depend on
//! the renderer. A bar whose group stops being tabbed is flagged for
//! destruction and culled on the next [`TabBarStore::tick`].

use serde::Serialize;
use slotmap::SlotMap;

use crate::sys::host::WindowId;

slotmap::new_key_type! {
    pub struct TabBarId;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TabEntry {
    /// Window shown for this tab, or `None` when the tab's focus target is a
    /// group.
    pub window: Option<WindowId>,
    pub focused: bool,
    /// Fraction of the bar width before this entry.
    pub offset: f64,
    /// Fraction of the bar width taken by this entry.
    pub width: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TabBar {
    pub entries: Vec<TabEntry>,
    pub locked: bool,
    pub hidden: bool,
    pub destroy: bool,
}

impl TabBar {
    /// Replaces the entries, distributing the bar evenly between them.
    pub fn update_entries(&mut self, entries: impl IntoIterator<Item = TabEntry>) {
        self.entries = entries.into_iter().collect();
        let count = self.entries.len();
        if count == 0 {
            return;
        }
        let width = 1.0 / count as f64;
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.offset = i as f64 * width;
            entry.width = width;
        }
    }

    /// Index of the entry covering `fraction` of the bar width. Points on
    /// the border between two entries hit neither.
    pub fn entry_at(&self, fraction: f64) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| fraction > e.offset && fraction < e.offset + e.width)
    }
}

#[derive(Default)]
pub struct TabBarStore {
    bars: SlotMap<TabBarId, TabBar>,
}

impl TabBarStore {
    pub fn new() -> Self { Self::default() }

    pub fn create(&mut self) -> TabBarId { self.bars.insert(TabBar::default()) }

    pub fn get(&self, id: TabBarId) -> Option<&TabBar> { self.bars.get(id) }

    pub fn get_mut(&mut self, id: TabBarId) -> Option<&mut TabBar> { self.bars.get_mut(id) }

    pub fn len(&self) -> usize { self.bars.len() }

    pub fn is_empty(&self) -> bool { self.bars.is_empty() }

    pub fn mark_destroyed(&mut self, id: TabBarId) {
        if let Some(bar) = self.bars.get_mut(id) {
            bar.destroy = true;
        }
    }

    /// Drops every bar flagged for destruction. Returns how many were culled.
    pub fn tick(&mut self) -> usize {
        let before = self.bars.len();
        self.bars.retain(|_, bar| !bar.destroy);
        before - self.bars.len()
    }

    pub fn clear(&mut self) { self.bars.clear(); }
}
