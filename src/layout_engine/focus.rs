//! Focus bookkeeping that does not walk directionally: the focus ladder,
//! expansion, and the queries the host makes about focus.

use tracing::{debug, trace};

use super::{ExpandFullscreenOption, ExpandOption, FocusShift, LayoutEngine, SetSwallowOption};
use crate::model::{ExpandFocus, NodeId};
use crate::sys::host::{Compositor, WindowId, WorkspaceId};

impl LayoutEngine {
    /// Follows a focus change made by the host.
    pub fn on_window_focus_change(&mut self, host: &mut dyn Compositor, window: WindowId) {
        let Some(node) = self.tree.window_node(window) else { return };
        trace!(%window, ?node, "focus changed");
        node.mark_focused(&mut self.tree);
        let root = node.root(&self.tree);
        self.recalc(host, root);
        self.evict_unmapped(host);
    }

    pub fn change_focus(
        &mut self,
        host: &mut dyn Compositor,
        workspace: WorkspaceId,
        shift: FocusShift,
    ) {
        let Some(node) = self.focused_of(workspace, false, false) else { return };
        let target = match shift {
            FocusShift::Top => Some(node.root(&self.tree)),
            FocusShift::Bottom => Some(self.bottom_of(node)),
            FocusShift::Raise => match node.parent(&self.tree) {
                Some(parent) => Some(parent),
                None => Some(self.bottom_of(node)),
            },
            FocusShift::Lower => self.tree.group(node).and_then(|g| g.focused_child),
            FocusShift::Tab => {
                let start = node.parent(&self.tree).unwrap_or(node);
                start
                    .ancestors(&self.tree)
                    .find(|&n| self.tree.group(n).is_some_and(|g| g.layout.is_tabbed()))
            }
            FocusShift::TabNode => {
                let start = node.parent(&self.tree).unwrap_or(node);
                start.ancestors(&self.tree).find(|&n| {
                    n.parent(&self.tree)
                        .and_then(|p| self.tree.group(p))
                        .is_some_and(|g| g.layout.is_tabbed())
                })
            }
        };
        let Some(target) = target else { return };
        debug!(?node, ?target, %shift, "changing focus");
        self.focus_node(host, target);
        let root = target.root(&self.tree);
        self.recalc(host, root);
        self.evict_unmapped(host);
    }

    fn bottom_of(&self, node: NodeId) -> NodeId { node.focused_node(&self.tree, true, false) }

    pub fn expand(
        &mut self,
        host: &mut dyn Compositor,
        workspace: WorkspaceId,
        option: ExpandOption,
        fullscreen: ExpandFullscreenOption,
    ) {
        let Some(node) = self.focused_of(workspace, false, true) else { return };
        match option {
            ExpandOption::Expand => {
                let Some(parent) = node.parent(&self.tree) else {
                    trace!(?node, %fullscreen, "root cannot expand");
                    return;
                };
                if let Some(group) = self.tree.group_mut(node) {
                    if !group.group_focused {
                        group.expand_focused = ExpandFocus::Stack;
                    }
                }
                if let Some(group) = self.tree.group_mut(parent) {
                    group.focused_child = Some(node);
                    group.expand_focused = ExpandFocus::Latch;
                }
                debug!(?node, ?parent, "expanded");
                self.recalc(host, parent);
            }
            ExpandOption::Shrink => {
                let Some(group) = self.tree.group_mut(node) else { return };
                group.expand_focused = ExpandFocus::NotExpanded;
                let focused = group.focused_child;
                if let Some(child) = focused.and_then(|c| self.tree.group_mut(c)) {
                    child.expand_focused = ExpandFocus::Latch;
                }
                self.recalc(host, node);
            }
            ExpandOption::Base => {
                if node.is_group(&self.tree) {
                    node.collapse_expansions(&mut self.tree);
                    self.recalc(host, node);
                }
            }
            ExpandOption::Maximize | ExpandOption::Fullscreen => {}
        }
        self.evict_unmapped(host);
    }

    /// Sets whether the focused node's group keeps new windows inside it.
    pub fn set_swallow(&mut self, workspace: WorkspaceId, option: SetSwallowOption) {
        let Some(node) = self.focused_of(workspace, false, false) else { return };
        let Some(parent) = node.parent(&self.tree) else { return };
        if let Some(group) = self.tree.group_mut(parent) {
            group.containment = option.apply(group.containment);
        }
    }

    /// Closes the focused floating window, or every window under the focused
    /// tiled node.
    pub fn kill_focused_node(&mut self, host: &mut dyn Compositor, workspace: WorkspaceId) {
        if let Some(window) = host.last_focused_window().filter(|&w| host.is_floating(w)) {
            host.close_window(window);
            return;
        }
        let Some(node) = self.focused_of(workspace, false, false) else { return };
        let windows = node.windows(&self.tree);
        debug!(?node, count = windows.len(), "closing windows");
        for window in windows {
            host.close_window(window);
        }
    }

    /// Resets size ratios to 1: those of the focused node's siblings, or
    /// with `recursive` every ratio in the workspace.
    pub fn equalize(
        &mut self,
        host: &mut dyn Compositor,
        workspace: WorkspaceId,
        recursive: bool,
    ) {
        let Some(focused) = self.focused_of(workspace, false, false) else { return };
        let target = if recursive {
            let Some(root) = self.root_of(workspace) else { return };
            let nodes: Vec<NodeId> = root.traverse_preorder(&self.tree).collect();
            for node in nodes {
                self.tree[node].size_ratio = 1.0;
            }
            root
        } else {
            let Some(parent) = focused.parent(&self.tree) else { return };
            let siblings = parent.children(&self.tree).to_vec();
            for node in siblings {
                self.tree[node].size_ratio = 1.0;
            }
            parent
        };
        self.recalc(host, target);
        self.evict_unmapped(host);
    }

    /// The window the focused node resolves to when group focus is ignored.
    pub fn find_tiled_window_candidate(&self, workspace: WorkspaceId) -> Option<WindowId> {
        let node = self.focused_of(workspace, true, false)?;
        self.tree[node].as_window()
    }

    /// The tiled window that should take focus once `window` goes away.
    pub fn next_candidate(&self, host: &dyn Compositor, window: WindowId) -> Option<WindowId> {
        let workspace = host.window_workspace(window)?;
        if host.has_fullscreen_window(workspace) {
            return None;
        }
        self.tree.window_node(window)?;
        self.find_tiled_window_candidate(workspace).filter(|&w| w != window)
    }

    /// Whether `window` is drawn as selected: it is the focused window, or
    /// it sits inside the focused group.
    pub fn should_render_selected(&self, host: &dyn Compositor, window: WindowId) -> bool {
        let Some(workspace) = host.window_workspace(window) else { return false };
        let Some(root) = self.root_of(workspace) else { return false };
        if self.tree.group(root).is_none_or(|g| g.focused_child.is_none()) {
            return false;
        }
        let focused = root.focused_node(&self.tree, false, false);
        match self.tree[focused].as_window() {
            Some(focused_window) => {
                focused_window == window && host.last_focused_window() == Some(window)
            }
            None => {
                self.tree.window_node(window).is_some_and(|n| focused.has_descendant(&self.tree, n))
            }
        }
    }
}
