//! Turning the tree into rectangles and pushing them to the compositor.
//!
//! Node rectangles are kept unrounded so that ratios survive repeated
//! layouts; frames are rounded only when they are handed to the host.

use tracing::{debug, error, trace, warn};

use super::{Axis, LayoutEngine, ResizeCorner, ShiftDirection};
use crate::model::{GroupLayout, NodeId};
use crate::sys::geometry::{Insets, Point, Rect, Round, sticks};
use crate::sys::host::{Compositor, Monitor, WindowId, WorkspaceId};

/// Ratios below this make a tile effectively invisible.
const MIN_SIZE_RATIO: f64 = 0.05;

impl LayoutEngine {
    /// Places the workspace root on its monitor and lays out the whole tree.
    pub fn recalculate(&mut self, host: &mut dyn Compositor, workspace: WorkspaceId) {
        let Some(root) = self.root_of(workspace) else { return };
        let Some(monitor) = host.workspace_monitor(workspace) else {
            error!(%workspace, "cannot lay out a workspace without a monitor");
            host.notify_error(&format!("{workspace} has no monitor"));
            return;
        };
        let area = self.workspace_area(&monitor);
        self.tree[root].set_rect(area);
        self.recalc(host, root);
        self.evict_unmapped(host);
    }

    /// The rectangle a workspace root occupies: the monitor's usable area
    /// minus the outer gaps.
    pub(super) fn workspace_area(&self, monitor: &Monitor) -> Rect {
        let outer = &self.settings.gaps.outer;
        monitor.usable_area().inset(Insets::new(outer.top, outer.left, outer.bottom, outer.right))
    }

    pub(super) fn recalc(&mut self, host: &mut dyn Compositor, node: NodeId) {
        self.recalc_with(host, node, true);
    }

    /// Lays out the subtree under `node` within the node's current rectangle
    /// and applies the resulting frames.
    pub(super) fn recalc_with(&mut self, host: &mut dyn Compositor, node: NodeId, animate: bool) {
        if !self.tree.contains(node) {
            return;
        }
        trace!(?node, "recalc");
        self.layout_subtree(node);
        self.update_tab_bars(node.root(&self.tree));
        self.apply_frames(host, node, animate);
    }

    fn layout_subtree(&mut self, node: NodeId) {
        if node.parent(&self.tree).is_none() {
            self.tree[node].hidden = false;
        }
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            for (child, rect, hidden) in self.child_frames(node) {
                let child_node = &mut self.tree[child];
                child_node.set_rect(rect);
                child_node.hidden = hidden;
                stack.push(child);
            }
        }
    }

    /// Rectangle and visibility of each child of `node`; empty for windows.
    fn child_frames(&self, node: NodeId) -> Vec<(NodeId, Rect, bool)> {
        let parent = &self.tree[node];
        let Some(group) = parent.as_group() else { return Vec::new() };
        let hidden = parent.hidden;

        if group.is_expanded() {
            let rect = parent.rect();
            return group
                .children
                .iter()
                .map(|&child| (child, rect, hidden || group.focused_child != Some(child)))
                .collect();
        }

        let mut rect = parent.rect();
        if group.children.len() == 1 && parent.parent().is_some() {
            rect.size.width = (rect.size.width - self.settings.group_inset).max(0.0);
        }

        match group.layout {
            GroupLayout::Tabbed => {
                let strip = self.settings.tabs.strip();
                let rect = Rect::from_xywh(
                    rect.origin.x,
                    rect.origin.y + strip,
                    rect.size.width,
                    (rect.size.height - strip).max(0.0),
                );
                group
                    .children
                    .iter()
                    .map(|&child| (child, rect, hidden || group.focused_child != Some(child)))
                    .collect()
            }
            GroupLayout::SplitH | GroupLayout::SplitV => {
                let horizontal = group.layout == GroupLayout::SplitH;
                let inner_gap = if horizontal {
                    self.settings.gaps.inner.horizontal
                } else {
                    self.settings.gaps.inner.vertical
                };
                let axis_len = if horizontal { rect.size.width } else { rect.size.height };
                let total_gap = group.children.len().saturating_sub(1) as f64 * inner_gap;
                let usable_axis = (axis_len - total_gap).max(0.0);
                let total: f64 = group.children.iter().map(|&c| self.tree[c].size_ratio).sum();

                let mut offset = if horizontal { rect.origin.x } else { rect.origin.y };
                let mut frames = Vec::with_capacity(group.children.len());
                for &child in &group.children {
                    let share = if total > 0.0 { self.tree[child].size_ratio / total } else { 0.0 };
                    let seg_len = usable_axis * share;
                    let child_rect = if horizontal {
                        Rect::from_xywh(offset, rect.origin.y, seg_len, rect.size.height)
                    } else {
                        Rect::from_xywh(rect.origin.x, offset, rect.size.width, seg_len)
                    };
                    frames.push((child, child_rect, hidden));
                    offset += seg_len + inner_gap;
                }
                frames
            }
        }
    }

    /// True when the workspace shows exactly one tiled window directly under
    /// (or as) its root.
    fn is_only_window(&self, workspace: WorkspaceId) -> bool {
        let Some(root) = self.root_of(workspace) else { return false };
        match self.tree[root].as_group() {
            None => true,
            Some(group) => {
                group.children.len() == 1 && group.children[0].is_window(&self.tree)
            }
        }
    }

    fn apply_frames(&mut self, host: &mut dyn Compositor, node: NodeId, animate: bool) {
        let workspace = self.tree[node].workspace;
        let Some(monitor) = host.workspace_monitor(workspace) else {
            error!(%workspace, ?node, "cannot apply node geometry without a monitor");
            host.notify_error(&format!("{workspace} has no monitor"));
            return;
        };
        let ungapped = self.settings.no_gaps_when_only
            && !host.is_special_workspace(workspace)
            && self.is_only_window(workspace);

        let leaves: Vec<(WindowId, Rect, bool)> = node
            .traverse_preorder(&self.tree)
            .filter_map(|id| {
                let n = &self.tree[id];
                Some((n.as_window()?, n.rect(), n.hidden))
            })
            .collect();

        for (window, rect, hidden) in leaves {
            if !host.is_mapped(window) {
                if !self.unmapped.contains(&window) {
                    self.unmapped.push(window);
                }
                continue;
            }
            let frame = if ungapped { monitor.usable_area() } else { rect };
            host.set_window_frame(window, frame.round(), hidden, animate);
        }
        host.update_windows(workspace);
    }

    /// Removes the windows `apply_frames` found unmapped. Called at the end
    /// of every public operation, once no node id it holds is used again.
    pub(super) fn evict_unmapped(&mut self, host: &mut dyn Compositor) {
        while let Some(window) = self.unmapped.pop() {
            if self.tree.window_node(window).is_none() || host.is_mapped(window) {
                continue;
            }
            error!(%window, "node has an unmapped window, evicting it from the layout");
            host.notify_error(&format!("{window} was unmapped and removed from the layout"));
            self.detach_window(host, window);
        }
    }

    /// Resizes the tile holding `window` by moving the edges facing its
    /// neighbours. Without a corner the trailing edges move, unless the tile
    /// touches the trailing side of the workspace.
    pub fn resize_window(
        &mut self,
        host: &mut dyn Compositor,
        window: WindowId,
        delta: Point,
        corner: Option<ResizeCorner>,
    ) {
        let Some(node) = self.tree.window_node(window) else { return };
        let node = node.expand_actor(&self.tree);
        let workspace = self.tree[node].workspace;
        let Some(bounds) = self.root_of(workspace).map(|root| self.tree[root].rect()) else {
            return;
        };

        let rect = self.tree[node].rect();
        let left = sticks(rect.min().x, bounds.min().x);
        let right = sticks(rect.max().x, bounds.max().x);
        let top = sticks(rect.min().y, bounds.min().y);
        let bottom = sticks(rect.max().y, bounds.max().y);

        let mut delta = delta;
        let is_root = match node.parent(&self.tree) {
            None => true,
            Some(parent) => self.tree[node].is_window() && parent.parent(&self.tree).is_none(),
        };
        if is_root {
            if left && right {
                delta.x = 0.0;
            }
            if top && bottom {
                delta.y = 0.0;
            }
        }

        let (edge_x, edge_y) = match corner {
            None => {
                let edge_x = if right { ShiftDirection::Left } else { ShiftDirection::Right };
                let edge_y = if bottom { ShiftDirection::Up } else { ShiftDirection::Down };
                if right {
                    delta.x = -delta.x;
                }
                if bottom {
                    delta.y = -delta.y;
                }
                (edge_x, edge_y)
            }
            Some(corner) => (corner.horizontal_edge(), corner.vertical_edge()),
        };
        debug!(%window, ?delta, ?edge_x, ?edge_y, "resizing");

        let animate = self.settings.animate_manual_resizes;
        for (edge, amount) in [(edge_x, delta.x), (edge_y, delta.y)] {
            if amount == 0.0 {
                continue;
            }
            if let Some(neighbor) = node.find_neighbor(&self.tree, edge) {
                self.move_edge(host, neighbor, edge.opposite(), amount, animate);
            }
        }
        self.evict_unmapped(host);
    }

    /// Moves the `edge` of `node` by `delta` pixels along the screen axis,
    /// trading size with the sibling on that side.
    fn move_edge(
        &mut self,
        host: &mut dyn Compositor,
        node: NodeId,
        edge: ShiftDirection,
        delta: f64,
        animate: bool,
    ) {
        let forward = edge.is_forward();
        let resizing = node.ancestors(&self.tree).find(|&n| {
            let Some(group) = n.parent(&self.tree).and_then(|p| self.tree.group(p)) else {
                return false;
            };
            !group.layout.is_tabbed()
                && group.layout.matches(edge)
                && self.sibling_towards(n, forward).is_some()
        });
        let Some(resizing) = resizing else { return };
        let (Some(parent), Some(sibling)) =
            (resizing.parent(&self.tree), self.sibling_towards(resizing, forward))
        else {
            return;
        };

        let children = parent.children(&self.tree);
        let horizontal = edge.axis() == Axis::Horizontal;
        let gap = if horizontal {
            self.settings.gaps.inner.horizontal
        } else {
            self.settings.gaps.inner.vertical
        };
        let rect = self.tree[parent].rect();
        let axis_len = if horizontal { rect.size.width } else { rect.size.height };
        let available = axis_len - gap * children.len().saturating_sub(1) as f64;
        if available <= 0.0 {
            return;
        }
        let total: f64 = children.iter().map(|&c| self.tree[c].size_ratio).sum();
        // Moving a leading edge forward shrinks the tile.
        let amount = delta * total / available * if forward { 1.0 } else { -1.0 };

        let own = self.tree[resizing].size_ratio + amount;
        let other = self.tree[sibling].size_ratio - amount;
        if own < MIN_SIZE_RATIO || other < MIN_SIZE_RATIO {
            warn!(?resizing, ?sibling, own, other, "resize would shrink a tile below the minimum");
            return;
        }
        self.tree[resizing].size_ratio = own;
        self.tree[sibling].size_ratio = other;
        self.recalc_with(host, parent, animate);
    }

    fn sibling_towards(&self, node: NodeId, forward: bool) -> Option<NodeId> {
        if forward { node.next_sibling(&self.tree) } else { node.prev_sibling(&self.tree) }
    }
}
