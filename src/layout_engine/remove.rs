//! Detaching nodes and collapsing the groups they leave behind.

use tracing::{debug, error, trace};

use super::LayoutEngine;
use crate::common::config::NodeCollapsePolicy;
use crate::model::{GroupLayout, NodeId};
use crate::sys::host::{Compositor, WindowId};

pub(super) struct Detached {
    /// Closest ancestor that still has children.
    pub(super) parent: Option<NodeId>,
    /// Expanded group the node was standing in for, now collapsed.
    pub(super) expand_actor: Option<NodeId>,
}

impl LayoutEngine {
    /// Removes a window's node from its tree and collapses what is left.
    pub fn remove_window(&mut self, host: &mut dyn Compositor, window: WindowId) {
        self.detach_window(host, window);
        self.evict_unmapped(host);
    }

    pub(super) fn detach_window(&mut self, host: &mut dyn Compositor, window: WindowId) {
        let Some(node) = self.tree.window_node(window) else { return };
        let workspace = self.tree[node].workspace;
        debug!(%window, ?node, parent = ?node.parent(&self.tree), "removing window");

        if host.is_fullscreen(window) {
            host.set_fullscreen(window, false);
        }

        let detached = self.detach_recursive(node);
        self.delete_node(node);
        if let Some(actor) = detached.expand_actor {
            self.recalc(host, actor);
        }
        if let Some(parent) = detached.parent {
            self.recalc(host, parent);
            self.collapse_after_detach(host, parent);
        }
        host.update_windows(workspace);
    }

    /// Unlinks `node` from its parent, deleting every ancestor left without
    /// children. Focus passes to a neighbour when the node held it, and the
    /// node's share of the split is spread over the remaining siblings.
    pub(super) fn detach_recursive(&mut self, node: NodeId) -> Detached {
        let mut detached = Detached { parent: None, expand_actor: None };
        if node.parent(&self.tree).is_none() {
            return detached;
        }
        let actor = node.expand_actor(&self.tree);
        if actor.is_group(&self.tree) {
            actor.collapse_expansions(&mut self.tree);
            detached.expand_actor = Some(actor);
        }

        let mut child = node;
        loop {
            let Some(parent) = child.parent(&self.tree) else {
                // Every ancestor up to the root emptied out.
                trace!(root = ?child, "removing empty root");
                self.delete_node(child);
                return detached;
            };
            let Some(group) = self.tree.group_mut(parent) else {
                error!(?parent, "parent of {child:?} is not a group");
                return detached;
            };
            if group.focused_child == Some(child) && group.children.len() > 2 {
                if let Some(index) = group.position_of(child) {
                    let next = if index == 0 { 1 } else { index - 1 };
                    group.focused_child = Some(group.children[next]);
                }
            }
            let ratio = self.tree[child].size_ratio;
            self.tree.unlink(child);
            if child != node {
                self.delete_node(child);
            }

            let Some(group) = self.tree.group_mut(parent) else { return detached };
            group.group_focused = false;
            match group.children.len() {
                0 => group.focused_child = None,
                1 => group.focused_child = Some(group.children[0]),
                _ => {}
            }
            let remaining = group.children.clone();
            if remaining.is_empty() {
                child = parent;
                continue;
            }

            let adjustment = -(1.0 - ratio) / remaining.len() as f64;
            for sibling in remaining {
                self.tree[sibling].size_ratio += adjustment;
            }
            detached.parent = Some(parent);
            return detached;
        }
    }

    /// After a child left `parent`, dissolves single-child groups upwards as
    /// far as the collapse policy and ephemerality allow.
    pub(super) fn collapse_after_detach(&mut self, host: &mut dyn Compositor, parent: NodeId) {
        let Some(group) = self.tree.group(parent) else { return };
        if group.children.len() != 1 {
            return;
        }
        let survivor = group.children[0];
        if !group.is_ephemeral() && !self.is_collapsible(survivor) {
            return;
        }

        let mut target = Some(parent);
        let mut swallowed = false;
        while let Some(current) = target {
            let up = current.parent(&self.tree);
            if !self.swallow(current) {
                break;
            }
            swallowed = true;
            target = up;
        }
        if swallowed {
            self.recalc(host, target.unwrap_or(survivor));
        }
    }

    fn is_collapsible(&self, node: NodeId) -> bool {
        if node.is_window(&self.tree) {
            return false;
        }
        match self.settings.node_collapse_policy {
            NodeCollapsePolicy::Always => true,
            NodeCollapsePolicy::Never => false,
            NodeCollapsePolicy::UnlessParentTabbed => node
                .parent(&self.tree)
                .and_then(|p| self.tree.group(p))
                .is_none_or(|g| g.layout != GroupLayout::Tabbed),
        }
    }

    /// Replaces a group holding exactly one child by that child. Locked tab
    /// groups are kept, and a root only gives way to a window when it is
    /// ephemeral.
    pub(super) fn swallow(&mut self, into: NodeId) -> bool {
        let Some(group) = self.tree.group(into) else { return false };
        if group.children.len() != 1 || (group.locked && group.layout.is_tabbed()) {
            return false;
        }
        let child = group.children[0];
        if into.parent(&self.tree).is_none()
            && child.is_window(&self.tree)
            && !group.is_ephemeral()
        {
            return false;
        }
        trace!(?into, ?child, "swallowing group");
        self.dissolve(into).is_some()
    }

    /// Puts the only child of `group` in the group's place, with the group's
    /// ratio and rectangle, and deletes the group. Returns the child.
    pub(super) fn dissolve(&mut self, group: NodeId) -> Option<NodeId> {
        let &[child] = group.children(&self.tree) else { return None };
        let (ratio, rect) = (self.tree[group].size_ratio, self.tree[group].rect());
        self.tree.unlink(child);
        if group.parent(&self.tree).is_some() {
            self.tree.replace_in_parent(group, child);
        }
        let node = &mut self.tree[child];
        node.size_ratio = ratio;
        node.set_rect(rect);
        self.delete_node(group);
        Some(child)
    }
}
