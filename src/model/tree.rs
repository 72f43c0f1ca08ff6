use std::ops::{Index, IndexMut};

use slotmap::SlotMap;

use super::node::{Group, GroupLayout, Node, NodeData};
use crate::common::collections::HashMap;
use crate::sys::geometry::Rect;
use crate::sys::host::{WindowId, WorkspaceId};

/// Arena holding every node of every workspace tree.
///
/// Multiple trees live side by side in one map, which makes moving a branch
/// from one workspace to another a matter of relinking ids. Parent and
/// focused-child links are plain ids; the ordered child list is owned by the
/// group.
#[derive(Default)]
pub struct NodeMap {
    map: SlotMap<NodeId, Node>,
    windows: HashMap<WindowId, NodeId>,
}

slotmap::new_key_type! {
    /// Represents a node somewhere in the forest.
    pub struct NodeId;
}

impl NodeMap {
    pub fn new() -> NodeMap { NodeMap::default() }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    pub fn contains(&self, id: NodeId) -> bool { self.map.contains_key(id) }

    pub fn get(&self, id: NodeId) -> Option<&Node> { self.map.get(id) }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> { self.map.get_mut(id) }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> { self.map.iter() }

    pub fn group(&self, id: NodeId) -> Option<&Group> { self.map.get(id)?.as_group() }

    pub fn group_mut(&mut self, id: NodeId) -> Option<&mut Group> {
        self.map.get_mut(id)?.as_group_mut()
    }

    pub fn window_node(&self, window: WindowId) -> Option<NodeId> {
        self.windows.get(&window).copied()
    }

    /// Creates an unattached leaf for `window`.
    pub fn mk_window(&mut self, window: WindowId, workspace: WorkspaceId) -> NodeId {
        let id = self.map.insert(Node::new(NodeData::Window(window), workspace));
        self.windows.insert(window, id);
        id
    }

    /// Creates an unattached, empty group occupying `rect`.
    pub fn mk_group(&mut self, layout: GroupLayout, workspace: WorkspaceId, rect: Rect) -> NodeId {
        let mut node = Node::new(NodeData::Group(Group::new(layout)), workspace);
        node.position = rect.origin;
        node.size = rect.size;
        self.map.insert(node)
    }

    /// Appends `child` to `parent`'s children. `child` must be unattached.
    #[track_caller]
    pub(crate) fn push_child(&mut self, parent: NodeId, child: NodeId) {
        let index = parent.children(self).len();
        self.insert_child(parent, index, child);
    }

    /// Inserts `child` at `index` in `parent`'s children. `child` must be
    /// unattached and `parent` must be a group.
    #[track_caller]
    pub(crate) fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(child.parent(self).is_none(), "insert_child: {child:?} already has a parent");
        debug_assert!(child != parent && !child.has_descendant(self, parent));
        let Some(group) = self.group_mut(parent) else {
            debug_assert!(false, "insert_child: {parent:?} is not a group");
            return;
        };
        let index = index.min(group.children.len());
        group.children.insert(index, child);
        self.map[child].parent = Some(parent);
    }

    /// Puts `child` into `parent`'s child list without linking it back, so a
    /// node can claim its new slot before leaving its old parent. Must be
    /// followed by [`NodeMap::adopt`].
    pub(crate) fn reserve_slot(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let Some(group) = self.group_mut(parent) {
            let index = index.min(group.children.len());
            group.children.insert(index, child);
        }
    }

    /// Points `child` at a parent whose list already holds it.
    pub(crate) fn adopt(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(parent.children(self).contains(&child));
        self.map[child].parent = Some(parent);
    }

    /// Removes `child` from its parent's children without touching focus or
    /// ratios. Returns the old parent and position.
    pub(crate) fn unlink(&mut self, child: NodeId) -> Option<(NodeId, usize)> {
        let parent = child.parent(self)?;
        let group = self.group_mut(parent)?;
        let index = group.position_of(child)?;
        group.children.remove(index);
        self.map[child].parent = None;
        Some((parent, index))
    }

    /// Puts `new` in the slot `old` occupies in its parent, leaving `old`
    /// unattached. `new` must be unattached.
    pub(crate) fn replace_in_parent(&mut self, old: NodeId, new: NodeId) {
        debug_assert!(new.parent(self).is_none());
        let Some(parent) = old.parent(self) else { return };
        if let Some(group) = self.group_mut(parent) {
            if let Some(index) = group.position_of(old) {
                group.children[index] = new;
            }
            if group.focused_child == Some(old) {
                group.focused_child = Some(new);
            }
        }
        self.map[new].parent = Some(parent);
        self.map[old].parent = None;
    }

    /// Removes `id` and its whole subtree from the arena, unlinking it from its
    /// parent first. Returns the removed nodes.
    pub(crate) fn remove_subtree(&mut self, id: NodeId) -> Vec<Node> {
        self.unlink(id);
        let ids = id.traverse_preorder(self).collect::<Vec<_>>();
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(node) = self.map.remove(id) {
                if let NodeData::Window(window) = node.data {
                    if self.windows.get(&window) == Some(&id) {
                        self.windows.remove(&window);
                    }
                }
                removed.push(node);
            }
        }
        removed
    }

    /// Exchanges the windows wrapped by two leaves.
    pub(crate) fn swap_windows(&mut self, a: NodeId, b: NodeId) -> bool {
        let wa = self.map.get(a).and_then(Node::as_window);
        let wb = self.map.get(b).and_then(Node::as_window);
        let (Some(wa), Some(wb)) = (wa, wb) else { return false };
        self.map[a].data = NodeData::Window(wb);
        self.map[b].data = NodeData::Window(wa);
        self.windows.insert(wa, b);
        self.windows.insert(wb, a);
        true
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.windows.clear();
    }
}

impl Index<NodeId> for NodeMap {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output { &self.map[index] }
}

impl IndexMut<NodeId> for NodeMap {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output { &mut self.map[index] }
}

impl NodeId {
    #[track_caller]
    pub fn parent(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.parent)
    }

    /// The ordered children of a group; empty for leaves and unknown ids.
    #[track_caller]
    pub fn children(self, map: &NodeMap) -> &[NodeId] {
        map.group(self).map(|g| g.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_window(self, map: &NodeMap) -> bool { map.get(self).is_some_and(Node::is_window) }

    pub fn is_group(self, map: &NodeMap) -> bool { map.group(self).is_some() }

    pub fn index_in_parent(self, map: &NodeMap) -> Option<usize> {
        map.group(self.parent(map)?)?.position_of(self)
    }

    #[track_caller]
    pub fn next_sibling(self, map: &NodeMap) -> Option<NodeId> {
        let index = self.index_in_parent(map)?;
        self.parent(map)?.children(map).get(index + 1).copied()
    }

    #[track_caller]
    pub fn prev_sibling(self, map: &NodeMap) -> Option<NodeId> {
        let index = self.index_in_parent(map)?;
        let parent = self.parent(map)?;
        index.checked_sub(1).map(|i| parent.children(map)[i])
    }

    #[track_caller]
    pub fn first_child(self, map: &NodeMap) -> Option<NodeId> {
        self.children(map).first().copied()
    }

    #[track_caller]
    pub fn last_child(self, map: &NodeMap) -> Option<NodeId> { self.children(map).last().copied() }

    /// Returns an iterator over all ancestors of the current node, including itself.
    #[track_caller]
    pub fn ancestors(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let node = next;
            next = node.and_then(|n| map.map.get(n).and_then(|nd| nd.parent));
            node
        })
    }

    pub fn root(self, map: &NodeMap) -> NodeId {
        self.ancestors(map).last().unwrap_or(self)
    }

    /// True when `other` is a strict descendant of this node.
    pub fn has_descendant(self, map: &NodeMap, other: NodeId) -> bool {
        other != self && other.ancestors(map).any(|a| a == self)
    }

    #[track_caller]
    pub fn traverse_preorder(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        PreorderTraversal { stack: vec![self], map }
    }

    /// Windows under this node in tree order.
    pub fn windows(self, map: &NodeMap) -> Vec<WindowId> {
        self.traverse_preorder(map).filter_map(|n| map.get(n)?.as_window()).collect()
    }
}

struct PreorderTraversal<'a> {
    stack: Vec<NodeId>,
    map: &'a NodeMap,
}

impl<'a> Iterator for PreorderTraversal<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children(self.map).iter().rev());
        Some(node)
    }
}
