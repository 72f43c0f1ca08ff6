//! Tab bars of tabbed groups and the operations that select tabs.

use tracing::{debug, trace};

use super::{LayoutEngine, TabFocus, TabFocusMousePriority, TabLockMode};
use crate::model::{NodeId, TabEntry};
use crate::sys::geometry::{Point, RectExt};
use crate::sys::host::{Compositor, WorkspaceId};

impl LayoutEngine {
    /// Brings the tab bars under `root` in line with the tree: tabbed groups
    /// get a bar listing their children, any other group loses its bar.
    pub(super) fn update_tab_bars(&mut self, root: NodeId) {
        let groups: Vec<NodeId> =
            root.traverse_preorder(&self.tree).filter(|&n| n.is_group(&self.tree)).collect();
        for id in groups {
            let node = &self.tree[id];
            let hidden = node.hidden;
            let Some(group) = node.as_group() else { continue };

            if !group.layout.is_tabbed() {
                if let Some(bar) = group.tab_bar {
                    trace!(group = ?id, "dropping tab bar");
                    self.tab_bars.mark_destroyed(bar);
                    if let Some(group) = self.tree.group_mut(id) {
                        group.tab_bar = None;
                    }
                }
                continue;
            }

            let locked = group.locked;
            let entries: Vec<TabEntry> = group
                .children
                .iter()
                .map(|&child| TabEntry {
                    window: self.tree[child.focused_node(&self.tree, true, false)].as_window(),
                    focused: group.focused_child == Some(child),
                    ..Default::default()
                })
                .collect();
            let bar_id = match group.tab_bar.filter(|&b| self.tab_bars.get(b).is_some()) {
                Some(bar) => bar,
                None => {
                    let bar = self.tab_bars.create();
                    trace!(group = ?id, ?bar, "created tab bar");
                    if let Some(group) = self.tree.group_mut(id) {
                        group.tab_bar = Some(bar);
                    }
                    bar
                }
            };
            if let Some(bar) = self.tab_bars.get_mut(bar_id) {
                bar.update_entries(entries);
                bar.locked = locked;
                bar.hidden = hidden;
                bar.destroy = false;
            }
        }
    }

    /// Finds the tab under `point` below `node`. Returns the tabbed group
    /// whose bar was hit and the child whose tab it is.
    pub(super) fn find_tab_bar_at(&self, node: NodeId, point: Point) -> Option<(NodeId, NodeId)> {
        let n = &self.tree[node];
        let group = n.as_group()?;
        if n.hidden || !n.rect().contains(point) {
            return None;
        }

        if !group.layout.is_tabbed() {
            return group.children.iter().find_map(|&child| self.find_tab_bar_at(child, point));
        }

        let rect = n.rect();
        if point.y < rect.origin.y + self.settings.tabs.strip() && rect.size.width > 0.0 {
            let bar = group.tab_bar.and_then(|b| self.tab_bars.get(b));
            let fraction = (point.x - rect.origin.x) / rect.size.width;
            if let Some(index) = bar.and_then(|bar| bar.entry_at(fraction)) {
                if let Some(&child) = group.children.get(index) {
                    return Some((node, child));
                }
            }
        }
        group.focused_child.and_then(|child| self.find_tab_bar_at(child, point))
    }

    /// Focuses the tab clicked at `point`. Returns whether a tab was hit.
    pub fn click_tab_bar(&mut self, host: &mut dyn Compositor, point: Point) -> bool {
        let under_pointer = host.window_at(point);
        if under_pointer.is_some_and(|w| host.is_floating(w) || host.is_fullscreen(w)) {
            return false;
        }
        let Some(workspace) = under_pointer
            .or_else(|| host.last_focused_window())
            .and_then(|w| host.window_workspace(w))
        else {
            return false;
        };
        let Some(root) = self.root_of(workspace) else { return false };
        let Some((tab_node, child)) = self.find_tab_bar_at(root, point) else { return false };

        debug!(?tab_node, ?child, ?point, "tab bar clicked");
        self.focus_into(host, child);
        self.recalc(host, tab_node);
        self.evict_unmapped(host);
        true
    }

    /// Focuses `node`, or the node it last focused when it is a group whose
    /// focus was handed down.
    fn focus_into(&mut self, host: &mut dyn Compositor, node: NodeId) {
        let mut focus = node;
        while let Some(group) = self.tree.group(focus) {
            match group.focused_child {
                Some(child) if !group.group_focused => focus = child,
                _ => break,
            }
        }
        self.focus_node(host, focus);
    }

    pub fn focus_tab(
        &mut self,
        host: &mut dyn Compositor,
        workspace: WorkspaceId,
        target: TabFocus,
        mouse: TabFocusMousePriority,
        wrap: bool,
    ) {
        let Some(root) = self.root_of(workspace) else { return };

        let mut hit = None;
        if target == TabFocus::MouseLocation || mouse != TabFocusMousePriority::Ignore {
            let Some(point) = host.pointer_position() else { return };
            if host.window_at(point).is_some_and(|w| host.is_floating(w)) {
                return;
            }
            hit = self.find_tab_bar_at(root, point);
            if hit.is_none()
                && (target == TabFocus::MouseLocation || mouse == TabFocusMousePriority::Require)
            {
                return;
            }
        }

        let (tab_node, child) = match hit {
            Some((tab_node, child)) if target == TabFocus::MouseLocation => (tab_node, child),
            Some((tab_node, _)) => {
                let Some(child) = self.pick_tab(tab_node, target, wrap) else { return };
                (tab_node, child)
            }
            None => {
                let Some(focused) = self.focused_of(workspace, false, false) else { return };
                let Some(tab_node) = focused.ancestors(&self.tree).find(|&n| {
                    self.tree.group(n).is_some_and(|g| g.layout.is_tabbed())
                }) else {
                    return;
                };
                let Some(child) = self.pick_tab(tab_node, target, wrap) else { return };
                (tab_node, child)
            }
        };

        debug!(?tab_node, ?child, ?target, "focusing tab");
        self.focus_into(host, child);
        self.recalc(host, tab_node);
        self.evict_unmapped(host);
    }

    /// The child of `tab_node` that `target` selects relative to its
    /// focused tab.
    fn pick_tab(&self, tab_node: NodeId, target: TabFocus, wrap: bool) -> Option<NodeId> {
        let group = self.tree.group(tab_node)?;
        let focused = group.focused_child?;
        let children = &group.children;
        if children.len() < 2 {
            return None;
        }
        let current = group.position_of(focused)?;
        let last = children.len() - 1;
        let index = match target {
            TabFocus::MouseLocation => current,
            TabFocus::Index(i) => i.checked_sub(1).filter(|&i| i <= last)?,
            TabFocus::Left if current == 0 => wrap.then_some(last)?,
            TabFocus::Left => current - 1,
            TabFocus::Right if current == last => wrap.then_some(0)?,
            TabFocus::Right => current + 1,
        };
        Some(children[index])
    }

    /// Locks or unlocks the tabbed group nearest above the focused node. A
    /// locked tab group is never swallowed by its only child.
    pub fn set_tab_lock(&mut self, workspace: WorkspaceId, mode: TabLockMode) {
        let Some(focused) = self.focused_of(workspace, false, false) else { return };
        let Some(parent) = focused.parent(&self.tree) else { return };
        let Some(tab_node) = parent
            .ancestors(&self.tree)
            .find(|&n| self.tree.group(n).is_some_and(|g| g.layout.is_tabbed()))
        else {
            return;
        };
        let Some(group) = self.tree.group_mut(tab_node) else { return };
        group.locked = mode.apply(group.locked);
        debug!(?tab_node, locked = group.locked, "tab lock changed");
        let root = tab_node.root(&self.tree);
        self.update_tab_bars(root);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::common::config::LayoutSettings;
    use crate::layout_engine::FocusShift;
    use crate::model::GroupLayout;
    use crate::sys::geometry::Size;
    use crate::sys::headless::HeadlessCompositor;
    use crate::sys::host::WindowId;

    const WS: WorkspaceId = WorkspaceId(1);

    fn tabbed_engine() -> (LayoutEngine, HeadlessCompositor) {
        let mut settings = LayoutSettings::default();
        settings.gaps.outer = Default::default();
        settings.gaps.inner = Default::default();
        let mut engine = LayoutEngine::new(settings);
        let mut host = HeadlessCompositor::with_workspace(WS, Size::new(800.0, 600.0));
        for id in 1..=3 {
            host.add_window(WindowId(id), WS);
            engine.add_window(&mut host, WindowId(id)).unwrap();
            host.focused = Some(WindowId(id));
        }
        engine.change_group(&mut host, WS, GroupLayout::Tabbed);
        (engine, host)
    }

    #[test]
    fn tabbed_root_gets_a_bar_with_one_entry_per_child() {
        let (engine, _host) = tabbed_engine();
        let root = engine.root_of(WS).unwrap();
        let bar = engine.tree.group(root).unwrap().tab_bar.unwrap();
        let bar = engine.tab_bars.get(bar).unwrap();
        let windows: Vec<_> = bar.entries.iter().map(|e| e.window).collect();
        assert_eq!(windows, vec![Some(WindowId(1)), Some(WindowId(2)), Some(WindowId(3))]);
        assert_eq!(bar.entries.iter().filter(|e| e.focused).count(), 1);
        assert!(bar.entries[2].focused);
    }

    #[test]
    fn untabbing_flags_bar_for_culling() {
        let (mut engine, mut host) = tabbed_engine();
        engine.untab_group(&mut host, WS);
        let root = engine.root_of(WS).unwrap();
        assert_eq!(engine.tree.group(root).unwrap().tab_bar, None);
        assert_eq!(engine.tick(), 1);
        assert!(engine.tab_bars.is_empty());
    }

    #[test]
    fn click_in_strip_focuses_tab() {
        let (mut engine, mut host) = tabbed_engine();
        assert!(engine.click_tab_bar(&mut host, Point::new(100.0, 10.0)));
        assert_eq!(host.focused, Some(WindowId(1)));
        assert!(!host.is_hidden(WindowId(1)));
        assert!(host.is_hidden(WindowId(3)));

        // Below the strip is window content.
        assert!(!engine.click_tab_bar(&mut host, Point::new(700.0, 300.0)));
        assert_eq!(host.focused, Some(WindowId(1)));
    }

    #[test]
    fn focus_tab_moves_and_wraps() {
        let (mut engine, mut host) = tabbed_engine();
        let ignore = TabFocusMousePriority::Ignore;
        engine.focus_tab(&mut host, WS, TabFocus::Right, ignore, false);
        assert_eq!(host.focused, Some(WindowId(3)));
        engine.focus_tab(&mut host, WS, TabFocus::Right, ignore, true);
        assert_eq!(host.focused, Some(WindowId(1)));
        engine.focus_tab(&mut host, WS, TabFocus::Index(2), ignore, false);
        assert_eq!(host.focused, Some(WindowId(2)));
        engine.focus_tab(&mut host, WS, TabFocus::Index(9), ignore, false);
        assert_eq!(host.focused, Some(WindowId(2)));
    }

    #[test]
    fn tab_focus_shift_reaches_tabbed_root() {
        let (mut engine, mut host) = tabbed_engine();
        let root = engine.root_of(WS).unwrap();
        engine.change_focus(&mut host, WS, FocusShift::Tab);
        assert_eq!(engine.focused_of(WS, false, false), Some(root));
        assert_eq!(host.focused, None);

        // A split root has no tabbed ancestor to move to.
        engine.on_window_focus_change(&mut host, WindowId(2));
        host.focused = Some(WindowId(2));
        engine.change_group(&mut host, WS, GroupLayout::SplitH);
        engine.change_focus(&mut host, WS, FocusShift::Tab);
        assert_eq!(host.focused, Some(WindowId(2)));
    }

    #[test]
    fn tab_lock_applies_to_tabbed_ancestor_only() {
        let (mut engine, _host) = tabbed_engine();
        let root = engine.root_of(WS).unwrap();
        engine.set_tab_lock(WS, TabLockMode::Toggle);
        assert!(engine.tree.group(root).unwrap().locked);
        let bar = engine.tree.group(root).unwrap().tab_bar.unwrap();
        assert!(engine.tab_bars.get(bar).unwrap().locked);
        engine.set_tab_lock(WS, TabLockMode::Unlock);
        assert!(!engine.tree.group(root).unwrap().locked);
    }
}
