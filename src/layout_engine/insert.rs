//! Placing nodes into a workspace tree.

use tracing::{debug, error, warn};

use super::{LayoutEngine, LayoutError};
use crate::common::config::WorkspaceFilter;
use crate::model::{GroupEphemerality, GroupLayout, NodeId};
use crate::sys::host::{Compositor, WindowId, WorkspaceId};

/// Parsed form of the autotile workspace list, refreshed only when the
/// configured string changes.
#[derive(Default)]
pub(super) struct AutotileFilter {
    raw: Option<String>,
    filter: WorkspaceFilter,
}

impl AutotileFilter {
    fn update(&mut self, raw: &str) {
        if self.raw.as_deref() == Some(raw) {
            return;
        }
        let (filter, invalid) = WorkspaceFilter::parse(raw);
        for id in invalid {
            error!("autotile.workspaces: invalid workspace id: {id}");
        }
        self.raw = Some(raw.to_owned());
        self.filter = filter;
    }
}

/// Where a node ends up once the anchor has been resolved.
enum Target {
    /// Insert after `anchor` in its parent, wrapping the anchor first when it
    /// is a root.
    After(NodeId),
    /// Append to an existing root group.
    Root(NodeId),
    /// Create the workspace's first group.
    NewRoot,
}

impl LayoutEngine {
    /// Tiles a newly mapped window. Floating windows are left alone and
    /// yield `Ok(None)`, as does a window the host already reports unmapped,
    /// which is evicted again once placed.
    pub fn add_window(
        &mut self,
        host: &mut dyn Compositor,
        window: WindowId,
    ) -> Result<Option<NodeId>, LayoutError> {
        if host.is_floating(window) {
            debug!(%window, "not tiling floating window");
            return Ok(None);
        }
        if let Some(existing) = self.tree.window_node(window) {
            error!(%window, ?existing, "window is already tiled");
            return Err(LayoutError::WindowAlreadyTiled(window, existing));
        }
        let Some(workspace) = host.window_workspace(window) else {
            error!(%window, "window has no workspace");
            return Err(LayoutError::UnknownWindow(window));
        };

        let node = self.tree.mk_window(window, workspace);
        if let Err(err) = self.insert_node(host, node) {
            self.delete_node(node);
            return Err(err);
        }
        host.update_windows(workspace);
        self.evict_unmapped(host);
        Ok(self.tree.contains(node).then_some(node))
    }

    /// Inserts an unattached node into its workspace's tree next to the
    /// current anchor. On error nothing was changed.
    pub(super) fn insert_node(
        &mut self,
        host: &mut dyn Compositor,
        node: NodeId,
    ) -> Result<(), LayoutError> {
        if let Some(parent) = node.parent(&self.tree) {
            error!(?node, ?parent, "insert called for a node which already has a parent");
            return Err(LayoutError::NodeAlreadyParented(node, parent));
        }
        let workspace = self.tree[node].workspace;
        if !host.is_workspace_valid(workspace) {
            error!(?node, %workspace, "insert called with an invalid workspace");
            return Err(LayoutError::InvalidWorkspace(workspace));
        }

        self.tree[node].reparenting = true;
        let target = match self.resolve_target(host, node, workspace) {
            Ok(target) => target,
            Err(err) => {
                self.tree[node].reparenting = false;
                return Err(err);
            }
        };
        self.tree[node].size_ratio = 1.0;

        let (mut opening_into, mut opening_after) = match target {
            Target::After(anchor) => {
                let parent = match anchor.parent(&self.tree) {
                    Some(parent) => parent,
                    None => anchor.into_group(
                        &mut self.tree,
                        GroupLayout::SplitH,
                        GroupEphemerality::Standard,
                    ),
                };
                (parent, Some(anchor))
            }
            Target::Root(root) => (root, None),
            Target::NewRoot => (self.create_root(host, workspace), None),
        };

        if self.tree[opening_into].workspace != workspace {
            warn!(
                ?opening_into,
                into = %self.tree[opening_into].workspace,
                node = %workspace,
                "insertion target is on a different workspace than the new node"
            );
        }

        if let Some(anchor) = opening_after {
            if let Some(group) = self.autotile_group(opening_into, anchor) {
                opening_into = group;
                opening_after = Some(anchor);
            }
        }

        self.tree[node].reparenting = false;
        let index = match opening_after {
            Some(after) => self
                .tree
                .group(opening_into)
                .and_then(|g| g.position_of(after))
                .map_or(usize::MAX, |i| i + 1),
            None => usize::MAX,
        };
        self.tree.insert_child(opening_into, index, node);
        debug!(?node, ?opening_after, ?opening_into, "tiled node inserted");

        node.mark_focused(&mut self.tree);
        self.recalc(host, opening_into);
        Ok(())
    }

    fn resolve_target(
        &self,
        host: &mut dyn Compositor,
        node: NodeId,
        workspace: WorkspaceId,
    ) -> Result<Target, LayoutError> {
        let root = self.root_of(workspace);
        let anchor = match root {
            Some(root) => {
                Some(root.focused_node(&self.tree, false, false).placement_actor(&self.tree))
            }
            None => self.fallback_anchor(host, node, workspace),
        };
        let anchor = anchor.filter(|&a| {
            a != node && !node.has_descendant(&self.tree, a) && !self.tree[a].reparenting
        });
        if let Some(anchor) = anchor {
            return Ok(Target::After(anchor));
        }

        match root {
            Some(root) if root.is_group(&self.tree) => Ok(Target::Root(root)),
            Some(root) => {
                error!(?root, "insertion target was not a group node");
                host.notify_error("tiletree: insertion target was not a group");
                Err(LayoutError::InsertTargetNotGroup(root))
            }
            None if host.workspace_monitor(workspace).is_none() => {
                error!(%workspace, "cannot create a root on a workspace without a monitor");
                Err(LayoutError::NoMonitor(workspace))
            }
            None => Ok(Target::NewRoot),
        }
    }

    /// Without a tree to consult, the last focused window on the workspace
    /// or the window under the pointer decides where the node goes.
    fn fallback_anchor(
        &self,
        host: &dyn Compositor,
        node: NodeId,
        workspace: WorkspaceId,
    ) -> Option<NodeId> {
        let own = self.tree[node].as_window();
        let last_focused = host.last_focused_window().filter(|&w| {
            host.window_workspace(w) == Some(workspace)
                && !host.is_floating(w)
                && Some(w) != own
                && host.is_mapped(w)
        });
        let anchor = match last_focused {
            Some(window) => self.tree.window_node(window),
            None => host
                .pointer_position()
                .and_then(|p| host.window_at(p))
                .filter(|&w| host.window_workspace(w) == Some(workspace))
                .and_then(|w| self.tree.window_node(w)),
        };
        anchor.map(|a| a.placement_actor(&self.tree))
    }

    /// Builds the first group of a workspace on its monitor's usable area.
    fn create_root(&mut self, host: &dyn Compositor, workspace: WorkspaceId) -> NodeId {
        let area = host
            .workspace_monitor(workspace)
            .map(|monitor| self.workspace_area(&monitor))
            .unwrap_or_default();
        let layout = if area.size.height > area.size.width {
            GroupLayout::SplitV
        } else {
            GroupLayout::SplitH
        };
        let root = self.tree.mk_group(layout, workspace, area);
        debug!(?root, %workspace, %layout, "created workspace root");
        if !self.settings.tab_first_window {
            return root;
        }
        let tabs = self.tree.mk_group(GroupLayout::Tabbed, workspace, area);
        self.tree.push_child(root, tabs);
        tabs
    }

    /// Splits `anchor` into a perpendicular sub-group when adding another
    /// sibling to `group` would make its tiles thinner than the trigger size.
    /// Returns the new sub-group.
    fn autotile_group(&mut self, group: NodeId, anchor: NodeId) -> Option<NodeId> {
        let settings = self.settings.autotile.clone();
        if !settings.enable {
            return None;
        }
        let node = &self.tree[group];
        let workspace = node.workspace;
        let g = node.as_group()?;
        if g.children.len() <= 1 || g.layout.is_tabbed() {
            return None;
        }
        let horizontal = g.layout == GroupLayout::SplitH;
        let trigger = if horizontal { settings.trigger_width } else { settings.trigger_height };
        let size = if horizontal { node.size.width } else { node.size.height };
        let size_after = size / (g.children.len() + 1) as f64;
        let opposite = g.layout.opposite();

        let instance = self.instance_mut(workspace);
        instance.autotile.update(&settings.workspaces);
        if !instance.autotile.filter.allows(workspace) {
            return None;
        }
        if trigger < 0 || (trigger != 0 && size_after >= trigger as f64) {
            return None;
        }

        let ephemerality = if settings.ephemeral_groups {
            GroupEphemerality::Ephemeral
        } else {
            GroupEphemerality::Standard
        };
        let sub_group = anchor.into_group(&mut self.tree, opposite, ephemerality);
        debug!(?anchor, ?sub_group, size_after, trigger, "autotile split");
        Some(sub_group)
    }

    /// Moves the focused node of `origin` to `destination`. Floating and
    /// fullscreen windows are handed to the compositor instead.
    pub fn move_node_to_workspace(
        &mut self,
        host: &mut dyn Compositor,
        origin: WorkspaceId,
        destination: WorkspaceId,
        follow: bool,
    ) -> Result<(), LayoutError> {
        if !host.is_workspace_valid(destination) {
            error!(%destination, "cannot move a node to an invalid workspace");
            return Err(LayoutError::InvalidWorkspace(destination));
        }
        if origin == destination {
            return Ok(());
        }

        let node = self.focused_of(origin, false, false);
        let focused_window = host.last_focused_window();
        let focused_window_node = focused_window.and_then(|w| self.tree.window_node(w));

        if let Some(window) = focused_window {
            if focused_window_node.is_none() || host.is_fullscreen(window) {
                debug!(%window, %destination, "handing untiled window to the compositor");
                host.move_window_to_workspace(window, destination);
                if follow {
                    host.activate_workspace(destination);
                }
                return Ok(());
            }
        }

        let Some(node) = node else { return Ok(()) };
        if self.root_of(destination).is_none() && host.workspace_monitor(destination).is_none() {
            error!(%destination, "destination workspace has no monitor");
            return Err(LayoutError::NoMonitor(destination));
        }
        debug!(?node, %origin, %destination, follow, "moving node");

        let detached = self.detach_recursive(node);
        if let Some(actor) = detached.expand_actor {
            self.recalc(host, actor);
        }
        if let Some(parent) = detached.parent {
            self.recalc(host, parent);
            self.collapse_after_detach(host, parent);
        }

        let subtree: Vec<NodeId> = node.traverse_preorder(&self.tree).collect();
        for id in subtree {
            self.tree[id].workspace = destination;
            if let Some(window) = self.tree[id].as_window() {
                host.move_window_to_workspace(window, destination);
            }
        }
        let inserted = self.insert_node(host, node);
        host.update_windows(origin);
        host.update_windows(destination);

        if inserted.is_ok() && follow {
            host.activate_workspace(destination);
            if let Some(parent) = node.parent(&self.tree) {
                self.recalc(host, parent);
            }
            self.focus_node(host, node);
        }
        self.evict_unmapped(host);
        inserted
    }
}
