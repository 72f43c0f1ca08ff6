//! Directional movement and directional focus lookup.
//!
//! Both are the same walk: climb out of groups until one runs along the
//! direction of travel, step to the neighbouring child, then descend into it
//! until a window (or a group that must be treated as a unit) is reached.
//! Moving splices the node in at the point the walk ends; focusing returns
//! the node found there.

use tracing::{debug, trace};

use super::{LayoutEngine, ShiftDirection};
use crate::model::{GroupEphemerality, GroupLayout, NodeId};
use crate::sys::host::{Compositor, WorkspaceId};

/// Outcome of one level of a directional walk.
enum Step<T> {
    /// Keep walking from this node.
    Continue(NodeId),
    Resolved(T),
    NotFound,
}

/// Where a walk into a neighbouring subtree ends.
enum Landing {
    /// Insert at this index of the group.
    Insert(NodeId, usize),
    Focus(NodeId),
}

struct Walk {
    direction: ShiftDirection,
    shift: bool,
    once: bool,
    visible: bool,
    shift_actor: NodeId,
    has_broken_once: bool,
}

impl LayoutEngine {
    /// Moves the focused node of `workspace` one step in `direction`.
    pub fn shift_window(
        &mut self,
        host: &mut dyn Compositor,
        workspace: WorkspaceId,
        direction: ShiftDirection,
        once: bool,
        visible: bool,
    ) {
        let Some(node) = self.focused_of(workspace, false, false) else { return };
        self.shift_node(host, node, direction, once, visible);
        self.evict_unmapped(host);
    }

    /// With `once`, a node that is the only child of its group leaves the
    /// group instead of moving: a root just becomes a horizontal split, any
    /// other group is replaced by the node.
    pub(super) fn shift_node(
        &mut self,
        host: &mut dyn Compositor,
        node: NodeId,
        direction: ShiftDirection,
        once: bool,
        visible: bool,
    ) {
        if once {
            let actor = node.placement_actor(&self.tree);
            if let Some(parent) = actor.parent(&self.tree) {
                if parent.children(&self.tree).len() == 1 {
                    if parent.parent(&self.tree).is_none() {
                        if let Some(group) = self.tree.group_mut(parent) {
                            group.set_layout(GroupLayout::SplitH);
                        }
                        self.recalc(host, parent);
                    } else if let Some(survivor) = self.dissolve(parent) {
                        self.recalc(host, survivor);
                    }
                    return;
                }
            }
        }
        self.shift_or_get_focus(host, node, direction, true, once, visible);
    }

    /// Focuses whatever lies in `direction` from the focused node, crossing
    /// to the next monitor at the edge of the workspace.
    pub fn shift_focus(
        &mut self,
        host: &mut dyn Compositor,
        workspace: WorkspaceId,
        direction: ShiftDirection,
        visible: bool,
    ) {
        if let Some(current) = host.last_focused_window() {
            let current_workspace = host.window_workspace(current);
            if current_workspace.is_some_and(|ws| host.has_fullscreen_window(ws)) {
                return;
            }
            if host.is_floating(current) {
                if let Some(next) = host.window_in_direction(current, direction) {
                    host.focus_window(Some(next));
                }
                return;
            }
        }

        let Some(node) = self.focused_of(workspace, false, false) else {
            self.focus_monitor(host, direction);
            return;
        };
        if let Some(target) = self.shift_or_get_focus(host, node, direction, false, false, visible)
        {
            debug!(?node, ?target, ?direction, "shifting focus");
            self.focus_node(host, target);
            let root = target.root(&self.tree);
            self.recalc(host, root);
        }
        self.evict_unmapped(host);
    }

    fn focus_monitor(
        &mut self,
        host: &mut dyn Compositor,
        direction: ShiftDirection,
    ) -> Option<NodeId> {
        let window = host.focus_monitor_in_direction(direction)?;
        let node = self.tree.window_node(window)?;
        self.focus_node(host, node);
        Some(node)
    }

    /// Moves `node` one step in `direction` when `shift`, otherwise returns
    /// the node lying in that direction without changing the tree.
    pub(super) fn shift_or_get_focus(
        &mut self,
        host: &mut dyn Compositor,
        node: NodeId,
        direction: ShiftDirection,
        shift: bool,
        once: bool,
        visible: bool,
    ) -> Option<NodeId> {
        let node = node.expand_actor(&self.tree);
        let shift_actor = node.placement_actor(&self.tree);
        shift_actor.parent(&self.tree)?;
        let mut walk = Walk {
            direction,
            shift,
            once,
            visible,
            shift_actor,
            has_broken_once: false,
        };

        let mut origin = shift_actor;
        let (origin, parent) = loop {
            match self.break_out_step(origin, &mut walk) {
                Step::Continue(next) => origin = next,
                Step::Resolved(found) => break found,
                Step::NotFound => return self.focus_monitor(host, direction),
            }
        };

        let children = parent.children(&self.tree).to_vec();
        let index = children.iter().position(|&c| c == origin)?;
        let forward = direction.is_forward();

        let (target, insert) = if !forward && index == 0 {
            if !shift {
                return None;
            }
            (parent, 0)
        } else if forward && index + 1 == children.len() {
            if !shift {
                return None;
            }
            (parent, children.len())
        } else {
            let sibling_index = if forward { index + 1 } else { index - 1 };
            let sibling = children[sibling_index];
            let sibling_is_unit = match self.tree.group(sibling) {
                None => true,
                Some(group) => group.is_expanded() || group.locked,
            };
            if sibling_is_unit || (shift && once && walk.has_broken_once) {
                if !shift {
                    return Some(sibling.focused_node(&self.tree, false, false));
                }
                // A node coming from deeper down lands on the near side of
                // the sibling; a direct child jumps over it.
                let same_parent = shift_actor.parent(&self.tree) == Some(parent);
                let insert =
                    if same_parent == forward { sibling_index + 1 } else { sibling_index };
                (parent, insert)
            } else {
                let mut next = sibling;
                loop {
                    match self.break_into_step(next, &walk) {
                        Step::Continue(child) => next = child,
                        Step::Resolved(Landing::Insert(group, index)) => break (group, index),
                        Step::Resolved(Landing::Focus(found)) => return Some(found),
                        Step::NotFound => return None,
                    }
                }
            }
        };

        if shift {
            self.move_to_slot(host, node, shift_actor, target, insert);
        }
        None
    }

    /// One level of climbing out of groups that cannot carry the movement.
    /// Resolves to the origin and the group the walk continues in.
    fn break_out_step(&mut self, origin: NodeId, walk: &mut Walk) -> Step<(NodeId, NodeId)> {
        let Some(parent) = origin.parent(&self.tree) else { return Step::NotFound };
        let Some(group) = self.tree.group(parent) else { return Step::NotFound };
        let layout = group.layout;
        let direction = walk.direction;

        if layout.matches(direction) && !(walk.visible && layout.is_tabbed()) {
            if walk.once && walk.shift && walk.has_broken_once {
                return Step::Resolved((origin, parent));
            }
            if origin != walk.shift_actor {
                walk.has_broken_once = true;
            }
            let at_edge = if direction.is_forward() {
                group.children.last() == Some(&origin)
            } else {
                group.children.first() == Some(&origin)
            };
            if (walk.has_broken_once && walk.once && walk.shift) || !at_edge {
                return Step::Resolved((origin, parent));
            }
        }

        if parent.parent(&self.tree).is_some() {
            return Step::Continue(parent);
        }

        // The root could not carry the movement either.
        if !walk.shift {
            return Step::NotFound;
        }
        if !layout.is_tabbed() && layout.matches(direction) {
            return Step::Resolved((origin, parent));
        }
        let axis_layout = GroupLayout::for_axis(direction.axis());
        let flip = !layout.is_tabbed()
            && group.children.len() == 2
            && group.children.contains(&walk.shift_actor);
        if flip {
            trace!(root = ?parent, %axis_layout, "flipping root layout");
            if let Some(group) = self.tree.group_mut(parent) {
                group.set_layout(axis_layout);
            }
            Step::Resolved((origin, parent))
        } else {
            let wrapper =
                parent.into_group(&mut self.tree, axis_layout, GroupEphemerality::Standard);
            trace!(old_root = ?parent, new_root = ?wrapper, "wrapping root");
            Step::Resolved((parent, wrapper))
        }
    }

    /// One level of descending into the neighbouring subtree `target`.
    fn break_into_step(&self, target: NodeId, walk: &Walk) -> Step<Landing> {
        let Some(group) = self.tree.group(target) else { return Step::NotFound };
        if group.children.is_empty() {
            return Step::NotFound;
        }
        let tabbed = group.layout.is_tabbed();
        let focused = group.focused_child.and_then(|f| group.position_of(f));
        let last = group.children.len() - 1;

        let (index, shift_after) = match focused {
            Some(i) if tabbed && !walk.shift => (i, false),
            // Going by visible nodes enters a tab group at its current tab.
            Some(i) if tabbed && walk.visible => (i, true),
            _ if group.layout.matches(walk.direction) || (walk.visible && tabbed) => {
                if walk.direction.is_forward() { (0, false) } else { (last, true) }
            }
            Some(i) => (i, true),
            None => (0, false),
        };
        let insert = index + usize::from(shift_after);

        if walk.shift && walk.once {
            return Step::Resolved(Landing::Insert(target, insert));
        }
        let child = group.children[index];
        let is_unit = self.tree.group(child).is_none_or(|g| g.is_expanded());
        if !is_unit {
            return Step::Continue(child);
        }
        if walk.shift {
            Step::Resolved(Landing::Insert(target, insert))
        } else {
            Step::Resolved(Landing::Focus(child.focused_node(&self.tree, false, false)))
        }
    }

    /// Puts `shift_actor` at `index` of `target`, counted before the actor
    /// leaves its current parent, and cleans up both ends.
    fn move_to_slot(
        &mut self,
        host: &mut dyn Compositor,
        node: NodeId,
        shift_actor: NodeId,
        target: NodeId,
        index: usize,
    ) {
        if shift_actor.parent(&self.tree) == Some(target) {
            let Some(group) = self.tree.group_mut(target) else { return };
            let Some(old) = group.position_of(shift_actor) else { return };
            group.children.remove(old);
            let index = if index > old { index - 1 } else { index };
            let index = index.min(group.children.len());
            group.children.insert(index, shift_actor);
            debug!(?shift_actor, old, index, "reordered node");
            self.recalc(host, target);
            return;
        }

        // Reserve the slot first so that pruning the old parent cannot shift
        // the index.
        self.tree.reserve_slot(target, index, shift_actor);
        let detached = self.detach_recursive(shift_actor);
        self.tree.adopt(target, shift_actor);
        self.tree[shift_actor].size_ratio = 1.0;
        debug!(?shift_actor, ?target, index, old_parent = ?detached.parent, "moved node");

        if let Some(old_parent) = detached.parent {
            let collapse = old_parent.parent(&self.tree).is_some()
                && !old_parent.has_descendant(&self.tree, shift_actor)
                && self
                    .tree
                    .group(old_parent)
                    .is_some_and(|g| g.is_ephemeral() && g.children.len() == 1);
            let mut refresh = old_parent;
            if collapse {
                let survivor = old_parent.first_child(&self.tree);
                if self.swallow(old_parent) {
                    refresh = survivor.unwrap_or(refresh);
                }
            }
            self.recalc(host, refresh);
        }
        self.recalc(host, target);

        let mut target_parent = target.parent(&self.tree);
        let mut swallowed = false;
        while let Some(current) = target_parent {
            let up = current.parent(&self.tree);
            if !self.swallow(current) {
                break;
            }
            swallowed = true;
            target_parent = up;
        }

        self.focus_node(host, node);
        if swallowed {
            let top = target_parent.unwrap_or_else(|| target.root(&self.tree));
            self.recalc(host, top);
        }
    }
}
