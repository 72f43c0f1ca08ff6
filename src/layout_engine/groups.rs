//! Creating groups around the focused node and changing the layout of the
//! group it sits in.

use tracing::{debug, trace};

use super::LayoutEngine;
use crate::model::{GroupEphemerality, GroupLayout, NodeId};
use crate::sys::host::{Compositor, WindowId, WorkspaceId};

impl LayoutEngine {
    fn focused_placement(&self, workspace: WorkspaceId) -> Option<NodeId> {
        let node = self.focused_of(workspace, false, false)?;
        Some(node.placement_actor(&self.tree))
    }

    /// Puts the focused node into a new group of `layout`. A node that is
    /// already the only child of its group just changes that group. With
    /// `toggle`, a single-child group that already has `layout` is dissolved
    /// instead.
    pub fn make_group(
        &mut self,
        host: &mut dyn Compositor,
        workspace: WorkspaceId,
        layout: GroupLayout,
        ephemerality: GroupEphemerality,
        toggle: bool,
    ) {
        let Some(node) = self.focused_placement(workspace) else { return };
        if toggle {
            let parent = node.parent(&self.tree);
            let dissolve = parent
                .and_then(|p| self.tree.group(p))
                .is_some_and(|g| g.children.len() == 1 && g.layout == layout);
            if let Some(parent) = parent.filter(|_| dissolve) {
                debug!(?parent, %layout, "toggling group off");
                if let Some(survivor) = self.dissolve(parent) {
                    let refresh = survivor.parent(&self.tree).unwrap_or(survivor);
                    self.recalc(host, refresh);
                }
                self.evict_unmapped(host);
                return;
            }
        }
        self.make_group_on(host, node, layout, ephemerality);
        self.evict_unmapped(host);
    }

    fn make_group_on(
        &mut self,
        host: &mut dyn Compositor,
        node: NodeId,
        layout: GroupLayout,
        ephemerality: GroupEphemerality,
    ) {
        if let Some(parent) = node.parent(&self.tree) {
            if let Some(group) = self.tree.group_mut(parent) {
                if group.children.len() == 1 {
                    group.set_layout(layout);
                    group.set_ephemeral(ephemerality);
                    trace!(?parent, %layout, "reusing single-child group");
                    self.recalc(host, parent);
                    return;
                }
            }
        }
        let group = node.into_group(&mut self.tree, layout, ephemerality);
        debug!(?node, ?group, %layout, "made group");
        self.recalc(host, group);
    }

    /// Like [`make_group`](Self::make_group) with the split perpendicular to
    /// the current parent's.
    pub fn make_opposite_group(
        &mut self,
        host: &mut dyn Compositor,
        workspace: WorkspaceId,
        ephemerality: GroupEphemerality,
    ) {
        let Some(node) = self.focused_placement(workspace) else { return };
        let layout = match node.parent(&self.tree).and_then(|p| self.tree.group(p)) {
            None => GroupLayout::SplitH,
            Some(group) if group.layout == GroupLayout::SplitH => GroupLayout::SplitV,
            Some(_) => GroupLayout::SplitH,
        };
        self.make_group_on(host, node, layout, ephemerality);
        self.evict_unmapped(host);
    }

    /// Sets the layout of the focused node's group. A root node gets an
    /// ephemeral group of its own.
    pub fn change_group(
        &mut self,
        host: &mut dyn Compositor,
        workspace: WorkspaceId,
        layout: GroupLayout,
    ) {
        let Some(node) = self.focused_placement(workspace) else { return };
        self.change_group_on(host, node, layout);
        self.evict_unmapped(host);
    }

    fn change_group_on(&mut self, host: &mut dyn Compositor, node: NodeId, layout: GroupLayout) {
        let Some(parent) = node.parent(&self.tree) else {
            self.make_group_on(host, node, layout, GroupEphemerality::Ephemeral);
            return;
        };
        if let Some(group) = self.tree.group_mut(parent) {
            group.set_layout(layout);
        }
        debug!(?parent, %layout, "changed group layout");
        self.recalc(host, parent);
    }

    pub fn untab_group(&mut self, host: &mut dyn Compositor, workspace: WorkspaceId) {
        if let Some((node, Some(previous))) = self.untab_layout(workspace) {
            self.change_group_on(host, node, previous);
            self.evict_unmapped(host);
        }
    }

    pub fn toggle_tab_group(&mut self, host: &mut dyn Compositor, workspace: WorkspaceId) {
        let Some((node, untabbed)) = self.untab_layout(workspace) else { return };
        self.change_group_on(host, node, untabbed.unwrap_or(GroupLayout::Tabbed));
        self.evict_unmapped(host);
    }

    /// Flips the focused node's group between the two splits. A tabbed group
    /// goes back to the split it had before.
    pub fn change_group_to_opposite(&mut self, host: &mut dyn Compositor, workspace: WorkspaceId) {
        let Some(node) = self.focused_placement(workspace) else { return };
        let Some(parent) = node.parent(&self.tree) else { return };
        let Some(group) = self.tree.group_mut(parent) else { return };
        let layout = match group.layout {
            GroupLayout::Tabbed => group.previous_nontab_layout,
            layout => layout.opposite(),
        };
        group.set_layout(layout);
        self.recalc(host, parent);
        self.evict_unmapped(host);
    }

    /// Forces the focused node's group to be ephemeral, or makes it standard.
    pub fn set_ephemeral(&mut self, workspace: WorkspaceId, ephemeral: bool) {
        let Some(node) = self.focused_placement(workspace) else { return };
        let Some(group) = node.parent(&self.tree).and_then(|p| self.tree.group_mut(p)) else {
            return;
        };
        group.set_ephemeral(if ephemeral {
            GroupEphemerality::ForceEphemeral
        } else {
            GroupEphemerality::Standard
        });
    }

    /// Flips the split direction of the focused window's group. Tab groups
    /// are left alone.
    pub fn toggle_split(&mut self, host: &mut dyn Compositor) {
        let Some(window) = host.last_focused_window() else { return };
        let Some(node) = self.tree.window_node(window) else { return };
        let Some(parent) = node.parent(&self.tree) else { return };
        let Some(group) = self.tree.group_mut(parent) else { return };
        if group.layout.is_tabbed() {
            return;
        }
        let layout = group.layout.opposite();
        group.set_layout(layout);
        debug!(%window, ?parent, %layout, "toggled split");
        self.recalc(host, parent);
        self.evict_unmapped(host);
    }

    /// Exchanges the positions of two tiled windows.
    pub fn swap_windows(&mut self, host: &mut dyn Compositor, a: WindowId, b: WindowId) {
        if a == b {
            return;
        }
        let (Some(node_a), Some(node_b)) = (self.tree.window_node(a), self.tree.window_node(b))
        else {
            return;
        };
        if !self.tree.swap_windows(node_a, node_b) {
            return;
        }
        debug!(%a, %b, "swapped windows");
        let root_a = node_a.root(&self.tree);
        let root_b = node_b.root(&self.tree);
        self.recalc(host, root_a);
        if root_b != root_a {
            self.recalc(host, root_b);
        }
        self.evict_unmapped(host);
    }

    /// The focused node's placement actor and, when its parent is tabbed,
    /// the split that parent had before.
    fn untab_layout(&self, workspace: WorkspaceId) -> Option<(NodeId, Option<GroupLayout>)> {
        let node = self.focused_placement(workspace)?;
        let group = self.tree.group(node.parent(&self.tree)?)?;
        Some((node, group.layout.is_tabbed().then_some(group.previous_nontab_layout)))
    }
}
