use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, info};

use super::insert::AutotileFilter;
use super::{
    ExpandFullscreenOption, ExpandOption, FocusShift, LayoutError, ResizeCorner,
    SetSwallowOption, ShiftDirection, TabFocus, TabFocusMousePriority, TabLockMode,
};
use crate::common::collections::{BTreeMap, HashMap};
use crate::common::config::LayoutSettings;
use crate::model::{GroupEphemerality, GroupLayout, NodeId, NodeMap, TabBarStore};
use crate::sys::geometry::{IsWithin, Point, Rect, SameAs};
use crate::sys::host::{Compositor, WindowId, WorkspaceId};

slotmap::new_key_type! {
    /// One layout instance. Workspaces are attached to instances; a workspace
    /// that was never attached belongs to the default instance.
    pub struct InstanceId;
}

#[derive(Default)]
pub(super) struct Instance {
    pub(super) autotile: AutotileFilter,
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    MakeGroup {
        layout: GroupLayout,
        #[serde(default)]
        ephemerality: GroupEphemerality,
        #[serde(default)]
        toggle: bool,
    },
    MakeOppositeGroup {
        #[serde(default)]
        ephemerality: GroupEphemerality,
    },
    ChangeGroup(GroupLayout),
    UntabGroup,
    ToggleTabGroup,
    ChangeGroupToOpposite,
    SetEphemeral(bool),
    ToggleSplit,

    ShiftWindow {
        direction: ShiftDirection,
        #[serde(default)]
        once: bool,
        #[serde(default)]
        visible: bool,
    },
    ShiftFocus {
        direction: ShiftDirection,
        #[serde(default)]
        visible: bool,
    },
    ChangeFocus(FocusShift),
    FocusTab {
        target: TabFocus,
        #[serde(default)]
        mouse: TabFocusMousePriority,
        #[serde(default)]
        wrap: bool,
    },

    SetSwallow(SetSwallowOption),
    SetTabLock(TabLockMode),
    KillActive,
    Expand {
        option: ExpandOption,
        #[serde(default)]
        fullscreen: ExpandFullscreenOption,
    },
    Equalize {
        #[serde(default)]
        recursive: bool,
    },
    MoveNodeToWorkspace {
        workspace: WorkspaceId,
        #[serde(default)]
        follow: bool,
    },
    Resize {
        dx: f64,
        dy: f64,
        #[serde(default)]
        corner: Option<ResizeCorner>,
    },
}

/// Notifications from the host about state the engine mirrors.
#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutEvent {
    WindowAdded(WindowId),
    WindowRemoved(WindowId),
    WindowFocused(WindowId),
    /// The workspace's monitor or reserved area changed.
    WorkspaceChanged(WorkspaceId),
    TabBarClicked(Point),
}

/// Serializable view of one subtree, for debugging and scripting.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<GroupLayout>,
    pub frame: Rect,
    pub size_ratio: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    /// Whether the parent's focus points at this node.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub focused: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

/// Owns every tiling tree of every workspace.
///
/// Nodes and tab bars live in stores shared by all instances; the registry
/// only decides which instance's per-instance state (the parsed autotile
/// filter) a workspace uses. Every operation that talks to the compositor
/// takes it as `&mut dyn Compositor`.
pub struct LayoutEngine {
    pub(super) tree: NodeMap,
    pub(super) tab_bars: TabBarStore,
    pub(super) settings: LayoutSettings,
    instances: SlotMap<InstanceId, Instance>,
    registry: HashMap<WorkspaceId, InstanceId>,
    default_instance: InstanceId,
    /// Windows found unmapped while applying frames, evicted once the
    /// current operation is done with its node ids.
    pub(super) unmapped: Vec<WindowId>,
}

impl LayoutEngine {
    pub fn new(settings: LayoutSettings) -> Self {
        let mut instances = SlotMap::with_key();
        let default_instance = instances.insert(Instance::default());
        LayoutEngine {
            tree: NodeMap::new(),
            tab_bars: TabBarStore::new(),
            settings,
            instances,
            registry: HashMap::default(),
            default_instance,
            unmapped: Vec::new(),
        }
    }

    pub fn settings(&self) -> &LayoutSettings { &self.settings }

    pub fn set_layout_settings(&mut self, settings: &LayoutSettings) {
        self.settings = settings.clone();
    }

    pub fn tree(&self) -> &NodeMap { &self.tree }

    pub fn tab_bars(&self) -> &TabBarStore { &self.tab_bars }

    /// Binds `workspace` to its own instance, creating one if needed.
    pub fn attach_workspace(&mut self, workspace: WorkspaceId) -> InstanceId {
        if let Some(&id) = self.registry.get(&workspace) {
            return id;
        }
        let id = self.instances.insert(Instance::default());
        self.registry.insert(workspace, id);
        debug!(%workspace, ?id, "attached workspace to new instance");
        id
    }

    /// Drops the workspace's instance. Its nodes stay in the shared store and
    /// the workspace falls back to the default instance.
    pub fn detach_workspace(&mut self, workspace: WorkspaceId) {
        if let Some(id) = self.registry.remove(&workspace) {
            if !self.registry.values().any(|&other| other == id) {
                self.instances.remove(id);
            }
        }
    }

    pub fn instance_of(&self, workspace: WorkspaceId) -> InstanceId {
        self.registry.get(&workspace).copied().unwrap_or(self.default_instance)
    }

    pub(super) fn instance_mut(&mut self, workspace: WorkspaceId) -> &mut Instance {
        let id = self.instance_of(workspace);
        &mut self.instances[id]
    }

    /// Forgets every node, tab bar and instance.
    pub fn teardown(&mut self) {
        info!(nodes = self.tree.len(), "tearing down layout state");
        self.tree.clear();
        self.tab_bars.clear();
        self.registry.clear();
        self.unmapped.clear();
        self.instances.clear();
        self.default_instance = self.instances.insert(Instance::default());
    }

    /// Culls tab bars whose group stopped being tabbed or was removed.
    pub fn tick(&mut self) -> usize { self.tab_bars.tick() }

    pub fn find_by_window(&self, window: WindowId) -> Option<NodeId> {
        self.tree.window_node(window)
    }

    /// The parentless node of `workspace`, ignoring nodes being placed.
    pub fn root_of(&self, workspace: WorkspaceId) -> Option<NodeId> {
        self.tree
            .iter()
            .find(|(_, node)| {
                node.parent().is_none() && node.workspace == workspace && !node.reparenting
            })
            .map(|(id, _)| id)
    }

    pub fn focused_of(
        &self,
        workspace: WorkspaceId,
        ignore_group_focus: bool,
        stop_at_expanded: bool,
    ) -> Option<NodeId> {
        let root = self.root_of(workspace)?;
        Some(root.focused_node(&self.tree, ignore_group_focus, stop_at_expanded))
    }

    /// Marks `node` focused and hands input focus to its window, or clears
    /// input focus when `node` is a group.
    pub(super) fn focus_node(&mut self, host: &mut dyn Compositor, node: NodeId) {
        let Some(window) = self.tree.get(node).map(|n| n.as_window()) else { return };
        node.mark_focused(&mut self.tree);
        host.focus_window(window);
    }

    /// Removes `node` and its subtree, flagging their tab bars for culling.
    pub(super) fn delete_node(&mut self, node: NodeId) {
        for removed in self.tree.remove_subtree(node) {
            if let Some(bar) = removed.as_group().and_then(|g| g.tab_bar) {
                self.tab_bars.mark_destroyed(bar);
            }
        }
    }

    pub fn handle_event(
        &mut self,
        host: &mut dyn Compositor,
        event: LayoutEvent,
    ) -> Result<(), LayoutError> {
        debug!(?event);
        match event {
            LayoutEvent::WindowAdded(window) => {
                self.add_window(host, window)?;
            }
            LayoutEvent::WindowRemoved(window) => self.remove_window(host, window),
            LayoutEvent::WindowFocused(window) => self.on_window_focus_change(host, window),
            LayoutEvent::WorkspaceChanged(workspace) => self.recalculate(host, workspace),
            LayoutEvent::TabBarClicked(point) => {
                self.click_tab_bar(host, point);
            }
        }
        Ok(())
    }

    pub fn handle_command(
        &mut self,
        host: &mut dyn Compositor,
        workspace: WorkspaceId,
        command: LayoutCommand,
    ) -> Result<(), LayoutError> {
        debug!(%workspace, ?command);
        debug!("Tree:\n{}", self.draw_tree(workspace).trim());
        match command {
            LayoutCommand::MakeGroup { layout, ephemerality, toggle } => {
                self.make_group(host, workspace, layout, ephemerality, toggle)
            }
            LayoutCommand::MakeOppositeGroup { ephemerality } => {
                self.make_opposite_group(host, workspace, ephemerality)
            }
            LayoutCommand::ChangeGroup(layout) => self.change_group(host, workspace, layout),
            LayoutCommand::UntabGroup => self.untab_group(host, workspace),
            LayoutCommand::ToggleTabGroup => self.toggle_tab_group(host, workspace),
            LayoutCommand::ChangeGroupToOpposite => self.change_group_to_opposite(host, workspace),
            LayoutCommand::SetEphemeral(ephemeral) => self.set_ephemeral(workspace, ephemeral),
            LayoutCommand::ToggleSplit => self.toggle_split(host),
            LayoutCommand::ShiftWindow { direction, once, visible } => {
                self.shift_window(host, workspace, direction, once, visible)
            }
            LayoutCommand::ShiftFocus { direction, visible } => {
                self.shift_focus(host, workspace, direction, visible)
            }
            LayoutCommand::ChangeFocus(shift) => self.change_focus(host, workspace, shift),
            LayoutCommand::FocusTab { target, mouse, wrap } => {
                self.focus_tab(host, workspace, target, mouse, wrap)
            }
            LayoutCommand::SetSwallow(option) => self.set_swallow(workspace, option),
            LayoutCommand::SetTabLock(mode) => self.set_tab_lock(workspace, mode),
            LayoutCommand::KillActive => self.kill_focused_node(host, workspace),
            LayoutCommand::Expand { option, fullscreen } => {
                self.expand(host, workspace, option, fullscreen)
            }
            LayoutCommand::Equalize { recursive } => self.equalize(host, workspace, recursive),
            LayoutCommand::MoveNodeToWorkspace { workspace: destination, follow } => {
                return self.move_node_to_workspace(host, workspace, destination, follow);
            }
            LayoutCommand::Resize { dx, dy, corner } => {
                let focused = self.focused_of(workspace, true, false);
                if let Some(window) = focused.and_then(|n| self.tree[n].as_window()) {
                    self.resize_window(host, window, Point::new(dx, dy), corner);
                }
            }
        }
        Ok(())
    }

    pub fn draw_tree(&self, workspace: WorkspaceId) -> String {
        let Some(root) = self.root_of(workspace) else {
            return String::new();
        };
        let tree = self.get_ascii_tree(root);
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = ascii_tree::write_tree(&mut out, &tree);
        out
    }

    fn get_ascii_tree(&self, node: NodeId) -> ascii_tree::Tree {
        let status = match node.parent(&self.tree).and_then(|p| self.tree.group(p)) {
            None => "",
            Some(parent) if parent.focused_child == Some(node) => "☒ ",
            Some(_) => "☐ ",
        };
        let n = &self.tree[node];
        let desc = match n.as_group() {
            None => match n.as_window() {
                Some(window) => format!("{status}{window}"),
                None => status.to_owned(),
            },
            Some(group) => {
                let mut desc = format!("{status}{}", group.layout);
                if group.is_ephemeral() {
                    desc.push_str(" ephemeral");
                }
                if group.locked {
                    desc.push_str(" locked");
                }
                if group.is_expanded() {
                    desc.push_str(&format!(" expanded({})", group.expand_focused));
                }
                if group.group_focused && group.focused_child.is_some() {
                    desc.push_str(" *");
                }
                desc
            }
        };
        let children: Vec<_> =
            node.children(&self.tree).iter().map(|&c| self.get_ascii_tree(c)).collect();
        if children.is_empty() {
            ascii_tree::Tree::Leaf(vec![desc])
        } else {
            ascii_tree::Tree::Node(desc, children)
        }
    }

    pub fn snapshot(&self, workspace: WorkspaceId) -> Option<NodeSnapshot> {
        self.root_of(workspace).map(|root| self.snapshot_node(root))
    }

    fn snapshot_node(&self, node: NodeId) -> NodeSnapshot {
        let n = &self.tree[node];
        let focused = node
            .parent(&self.tree)
            .and_then(|p| self.tree.group(p))
            .is_some_and(|p| p.focused_child == Some(node));
        NodeSnapshot {
            window: n.as_window(),
            layout: n.as_group().map(|g| g.layout),
            frame: n.rect(),
            size_ratio: n.size_ratio,
            hidden: n.hidden,
            focused,
            children: node.children(&self.tree).iter().map(|&c| self.snapshot_node(c)).collect(),
        }
    }

    /// Lists every structural problem found across all trees. An empty list
    /// means the forest is well formed and every laid-out group is tiled
    /// exactly by its children.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut roots: BTreeMap<WorkspaceId, usize> = BTreeMap::new();
        let limit = self.tree.len() + 1;

        for (id, node) in self.tree.iter() {
            if node.reparenting {
                issues.push(format!("{id:?} is still marked as reparenting"));
            }
            match node.parent() {
                None => *roots.entry(node.workspace).or_default() += 1,
                Some(parent) => {
                    let count = parent.children(&self.tree).iter().filter(|&&c| c == id).count();
                    if count != 1 {
                        issues.push(format!("{id:?} appears {count} times under {parent:?}"));
                    }
                    if self.tree.get(parent).is_some_and(|p| p.workspace != node.workspace) {
                        issues.push(format!("{id:?} is on another workspace than {parent:?}"));
                    }
                }
            }
            if id.ancestors(&self.tree).take(limit).count() >= limit {
                issues.push(format!("{id:?} is part of a parent cycle"));
                continue;
            }
            if let Some(window) = node.as_window() {
                if self.tree.window_node(window) != Some(id) {
                    issues.push(format!("{window} is not indexed to {id:?}"));
                }
            }
            let Some(group) = node.as_group() else { continue };
            if group.children.is_empty() {
                issues.push(format!("group {id:?} has no children"));
                continue;
            }
            for &child in &group.children {
                if child.parent(&self.tree) != Some(id) {
                    issues.push(format!("{child:?} does not point back to its parent {id:?}"));
                }
            }
            if let Some(focused) = group.focused_child {
                if !group.children.contains(&focused) {
                    issues.push(format!("focused child {focused:?} of {id:?} is not a child"));
                }
            }
            issues.extend(self.check_tiling(id));
        }

        for (workspace, count) in roots {
            if count != 1 {
                issues.push(format!("{workspace} has {count} roots"));
            }
        }
        issues
    }

    fn check_tiling(&self, id: NodeId) -> Vec<String> {
        let node = &self.tree[id];
        let Some(group) = node.as_group() else { return Vec::new() };
        let mut rect = node.rect();
        if group.children.len() == 1 && node.parent().is_some() {
            rect.size.width = (rect.size.width - self.settings.group_inset).max(0.0);
        }
        let rects: Vec<Rect> = group.children.iter().map(|&c| self.tree[c].rect()).collect();
        let mut issues = Vec::new();

        if group.is_expanded() || group.layout.is_tabbed() {
            let expected = if group.is_expanded() {
                node.rect()
            } else {
                let strip = self.settings.tabs.strip();
                Rect::from_xywh(
                    rect.origin.x,
                    rect.origin.y + strip,
                    rect.size.width,
                    (rect.size.height - strip).max(0.0),
                )
            };
            for (child, r) in group.children.iter().zip(&rects) {
                if !r.same_as(expected) {
                    issues.push(format!("{child:?} does not fill stacked group {id:?}"));
                }
            }
            return issues;
        }

        let horizontal = group.layout == GroupLayout::SplitH;
        let gap = if horizontal {
            self.settings.gaps.inner.horizontal
        } else {
            self.settings.gaps.inner.vertical
        };
        let (start, length, cross_start, cross_length) = axis_parts(rect, horizontal);
        if length - gap * (rects.len() - 1) as f64 <= 0.0 {
            return issues;
        }
        let mut cursor = start;
        for (child, r) in group.children.iter().zip(&rects) {
            let (min, len, cmin, clen) = axis_parts(*r, horizontal);
            if !min.is_within(0.1, cursor) {
                issues.push(format!("{child:?} leaves a hole or overlap in {id:?}"));
            }
            if !cmin.is_within(0.1, cross_start) || !clen.is_within(0.1, cross_length) {
                issues.push(format!("{child:?} does not span {id:?} across its axis"));
            }
            cursor = min + len + gap;
        }
        if !(cursor - gap).is_within(0.1, start + length) {
            issues.push(format!("children of {id:?} do not reach its far edge"));
        }
        issues
    }
}

/// Splits a rectangle into (start, length) along the axis and across it.
fn axis_parts(rect: Rect, horizontal: bool) -> (f64, f64, f64, f64) {
    if horizontal {
        (rect.origin.x, rect.size.width, rect.origin.y, rect.size.height)
    } else {
        (rect.origin.y, rect.size.height, rect.origin.x, rect.size.width)
    }
}
