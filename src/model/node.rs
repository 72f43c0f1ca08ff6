//! The node type of the tiling tree and the per-node behaviour that only
//! needs the arena: focus chains, expansion actors, neighbours and wrapping.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::tab_bar::TabBarId;
use super::tree::{NodeId, NodeMap};
use crate::layout_engine::{Axis, ShiftDirection};
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::host::{WindowId, WorkspaceId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupLayout {
    SplitH,
    SplitV,
    Tabbed,
}

impl GroupLayout {
    pub fn for_axis(axis: Axis) -> Self {
        match axis {
            Axis::Horizontal => GroupLayout::SplitH,
            Axis::Vertical => GroupLayout::SplitV,
        }
    }

    /// Axis used when matching directional movement. Tabs read left to
    /// right, so a tabbed group counts as horizontal.
    pub fn axis(self) -> Axis {
        match self {
            GroupLayout::SplitV => Axis::Vertical,
            GroupLayout::SplitH | GroupLayout::Tabbed => Axis::Horizontal,
        }
    }

    pub fn matches(self, direction: ShiftDirection) -> bool { self.axis() == direction.axis() }

    /// The split perpendicular to this one; tabbed groups flip to SplitH.
    pub fn opposite(self) -> Self {
        match self {
            GroupLayout::SplitH => GroupLayout::SplitV,
            GroupLayout::SplitV | GroupLayout::Tabbed => GroupLayout::SplitH,
        }
    }

    pub fn is_tabbed(self) -> bool { self == GroupLayout::Tabbed }
}

/// Whether a group dissolves once it is left with a single child.
///
/// When applied to an existing group, `Ephemeral` leaves the group's policy
/// as it was while `ForceEphemeral` and `Standard` overwrite it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupEphemerality {
    #[default]
    Standard,
    Ephemeral,
    ForceEphemeral,
}

impl GroupEphemerality {
    pub fn is_ephemeral(self) -> bool { self != GroupEphemerality::Standard }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExpandFocus {
    #[default]
    NotExpanded,
    /// The focused child fills the group until focus moves elsewhere.
    Latch,
    /// The focused child stays expanded across focus changes.
    Stack,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub layout: GroupLayout,
    pub previous_nontab_layout: GroupLayout,
    pub ephemerality: GroupEphemerality,
    pub locked: bool,
    pub containment: bool,
    pub children: Vec<NodeId>,
    pub focused_child: Option<NodeId>,
    /// The group itself, not a descendant, is the focus target.
    pub group_focused: bool,
    pub expand_focused: ExpandFocus,
    pub tab_bar: Option<TabBarId>,
}

impl Group {
    pub fn new(layout: GroupLayout) -> Self {
        Group {
            layout,
            previous_nontab_layout: if layout.is_tabbed() { GroupLayout::SplitH } else { layout },
            ephemerality: GroupEphemerality::Standard,
            locked: false,
            containment: false,
            children: Vec::new(),
            focused_child: None,
            group_focused: true,
            expand_focused: ExpandFocus::NotExpanded,
            tab_bar: None,
        }
    }

    pub fn set_layout(&mut self, layout: GroupLayout) {
        self.layout = layout;
        if !layout.is_tabbed() {
            self.previous_nontab_layout = layout;
        }
    }

    pub fn set_ephemeral(&mut self, option: GroupEphemerality) {
        match option {
            GroupEphemerality::Standard | GroupEphemerality::ForceEphemeral => {
                self.ephemerality = option
            }
            GroupEphemerality::Ephemeral => {}
        }
    }

    pub fn is_ephemeral(&self) -> bool { self.ephemerality.is_ephemeral() }

    pub fn is_expanded(&self) -> bool { self.expand_focused != ExpandFocus::NotExpanded }

    pub fn position_of(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    Window(WindowId),
    Group(Group),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub data: NodeData,
    /// Relative weight among siblings along the split axis.
    pub size_ratio: f64,
    pub position: Point,
    pub size: Size,
    pub workspace: WorkspaceId,
    /// Set while the node is being placed; such a node is never an anchor.
    pub reparenting: bool,
    pub hidden: bool,
}

impl Node {
    pub fn new(data: NodeData, workspace: WorkspaceId) -> Self {
        Node {
            parent: None,
            data,
            size_ratio: 1.0,
            position: Point::default(),
            size: Size::default(),
            workspace,
            reparenting: false,
            hidden: false,
        }
    }

    pub fn parent(&self) -> Option<NodeId> { self.parent }

    pub fn rect(&self) -> Rect { Rect::new(self.position, self.size) }

    pub fn set_rect(&mut self, rect: Rect) {
        self.position = rect.origin;
        self.size = rect.size;
    }

    pub fn is_window(&self) -> bool { matches!(self.data, NodeData::Window(_)) }

    pub fn as_window(&self) -> Option<WindowId> {
        match self.data {
            NodeData::Window(window) => Some(window),
            NodeData::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match &self.data {
            NodeData::Group(group) => Some(group),
            NodeData::Window(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match &mut self.data {
            NodeData::Group(group) => Some(group),
            NodeData::Window(_) => None,
        }
    }
}

impl NodeId {
    /// Follows `focused_child` links down from this node.
    ///
    /// Stops at a group that is itself focused unless `ignore_group_focus`,
    /// and at an expanded group when `stop_at_expanded`.
    pub fn focused_node(
        self,
        map: &NodeMap,
        ignore_group_focus: bool,
        stop_at_expanded: bool,
    ) -> NodeId {
        let mut node = self;
        while let Some(group) = map.group(node) {
            let Some(child) = group.focused_child else { break };
            if (!ignore_group_focus && group.group_focused)
                || (stop_at_expanded && group.is_expanded())
            {
                break;
            }
            node = child;
        }
        node
    }

    /// Makes this node the focus target of every ancestor.
    ///
    /// A latched expansion collapses when focus moves to another of the
    /// group's children.
    pub fn mark_focused(self, map: &mut NodeMap) {
        if let Some(group) = map.group_mut(self) {
            group.group_focused = true;
        }
        let mut node = self;
        while let Some(parent) = node.parent(map) {
            let Some(group) = map.group_mut(parent) else { break };
            let changed = group.focused_child != Some(node);
            group.focused_child = Some(node);
            group.group_focused = false;
            if changed && group.expand_focused == ExpandFocus::Latch {
                parent.collapse_expansions(map);
            }
            node = parent;
        }
    }

    /// Clears this group's expansion and any stacked expansions below it.
    pub fn collapse_expansions(self, map: &mut NodeMap) {
        let Some(group) = map.group_mut(self) else { return };
        if !group.is_expanded() {
            return;
        }
        group.expand_focused = ExpandFocus::NotExpanded;
        let mut next = group.focused_child;
        while let Some(node) = next {
            let Some(group) = map.group_mut(node) else { break };
            if group.expand_focused != ExpandFocus::Stack {
                break;
            }
            group.expand_focused = ExpandFocus::NotExpanded;
            next = group.focused_child;
        }
    }

    /// The node visually standing in for this one: climbs through expanded
    /// parents for which this chain is the expanded child.
    pub fn expand_actor(self, map: &NodeMap) -> NodeId {
        let mut node = self;
        while let Some(parent) = node.parent(map) {
            match map.group(parent) {
                Some(group) if group.is_expanded() && group.focused_child == Some(node) => {
                    node = parent
                }
                _ => break,
            }
        }
        node
    }

    /// The node new siblings are placed next to: the outermost ancestor
    /// reachable through expanded parents.
    pub fn placement_actor(self, map: &NodeMap) -> NodeId {
        let mut node = self;
        while let Some(parent) = node.parent(map) {
            match map.group(parent) {
                Some(group) if group.is_expanded() => node = parent,
                _ => break,
            }
        }
        node
    }

    /// The sibling of the nearest ancestor (or self) lying beyond `direction`
    /// in a split along the same axis.
    pub fn find_neighbor(self, map: &NodeMap, direction: ShiftDirection) -> Option<NodeId> {
        for (node, parent) in self.ancestors(map).filter_map(|n| Some((n, n.parent(map)?))) {
            let Some(group) = map.group(parent) else { continue };
            if group.layout.is_tabbed() || group.layout.axis() != direction.axis() {
                continue;
            }
            let sibling = if direction.is_forward() {
                node.next_sibling(map)
            } else {
                node.prev_sibling(map)
            };
            if sibling.is_some() {
                return sibling;
            }
        }
        None
    }

    /// Wraps this node in a new group that takes over its slot, ratio and
    /// geometry. Returns the new group.
    pub fn into_group(
        self,
        map: &mut NodeMap,
        layout: GroupLayout,
        ephemerality: GroupEphemerality,
    ) -> NodeId {
        let node = &map[self];
        let (workspace, rect, ratio) = (node.workspace, node.rect(), node.size_ratio);
        let group_id = map.mk_group(layout, workspace, rect);
        map[group_id].size_ratio = ratio;
        if let Some(group) = map.group_mut(group_id) {
            group.ephemerality = ephemerality;
            group.group_focused = false;
            group.focused_child = Some(self);
        }
        if self.parent(map).is_some() {
            map.replace_in_parent(self, group_id);
        }
        map[self].size_ratio = 1.0;
        map.push_child(group_id, self);
        group_id
    }
}
