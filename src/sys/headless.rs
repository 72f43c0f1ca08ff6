//! An in-memory [`Compositor`] that records what the engine asked of it.
//!
//! Used by the scenario tests and by the binary's script replay.

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect, RectExt, Size};
use super::host::{Compositor, Monitor, WindowId, WorkspaceId};
use crate::common::collections::BTreeMap;
use crate::layout_engine::ShiftDirection;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadlessWindow {
    pub workspace: WorkspaceId,
    #[serde(default)]
    pub floating: bool,
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default = "yes")]
    pub mapped: bool,
    #[serde(skip)]
    pub frame: Option<Rect>,
    #[serde(skip)]
    pub hidden: bool,
}

impl HeadlessWindow {
    pub fn tiled(workspace: WorkspaceId) -> Self {
        HeadlessWindow { workspace, mapped: true, ..Default::default() }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadlessWorkspace {
    pub monitor: Option<Monitor>,
    pub special: bool,
}

#[derive(Debug, Default)]
pub struct HeadlessCompositor {
    pub windows: BTreeMap<WindowId, HeadlessWindow>,
    pub workspaces: BTreeMap<WorkspaceId, HeadlessWorkspace>,
    pub focused: Option<WindowId>,
    pub pointer: Option<Point>,
    pub active_workspace: Option<WorkspaceId>,
    /// Window reported by `focus_monitor_in_direction`.
    pub neighbor_monitor_window: Option<WindowId>,
    pub closed: Vec<WindowId>,
    pub notifications: Vec<String>,
    pub updated_workspaces: Vec<WorkspaceId>,
}

impl HeadlessCompositor {
    pub fn new() -> Self { Self::default() }

    /// A host with one workspace on a monitor of the given size at the origin.
    pub fn with_workspace(workspace: WorkspaceId, size: Size) -> Self {
        let mut host = Self::new();
        host.add_workspace(workspace, Monitor::new(Point::new(0.0, 0.0), size));
        host
    }

    pub fn add_workspace(&mut self, workspace: WorkspaceId, monitor: Monitor) {
        self.workspaces.insert(workspace, HeadlessWorkspace {
            monitor: Some(monitor),
            special: false,
        });
        self.active_workspace.get_or_insert(workspace);
    }

    pub fn add_window(&mut self, window: WindowId, workspace: WorkspaceId) {
        self.windows.insert(window, HeadlessWindow::tiled(workspace));
    }

    pub fn frame(&self, window: WindowId) -> Option<Rect> {
        self.windows.get(&window).and_then(|w| w.frame)
    }

    pub fn is_hidden(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.hidden)
    }
}

impl Compositor for HeadlessCompositor {
    fn is_floating(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.floating)
    }

    fn is_fullscreen(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.fullscreen)
    }

    fn set_fullscreen(&mut self, window: WindowId, fullscreen: bool) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.fullscreen = fullscreen;
        }
    }

    fn is_mapped(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.mapped)
    }

    fn window_workspace(&self, window: WindowId) -> Option<WorkspaceId> {
        self.windows.get(&window).map(|w| w.workspace)
    }

    fn set_window_frame(&mut self, window: WindowId, frame: Rect, hidden: bool, _animate: bool) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.frame = Some(frame);
            w.hidden = hidden;
        }
    }

    fn close_window(&mut self, window: WindowId) { self.closed.push(window); }

    fn move_window_to_workspace(&mut self, window: WindowId, workspace: WorkspaceId) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.workspace = workspace;
        }
    }

    fn is_workspace_valid(&self, workspace: WorkspaceId) -> bool {
        self.workspaces.contains_key(&workspace)
    }

    fn workspace_monitor(&self, workspace: WorkspaceId) -> Option<Monitor> {
        self.workspaces.get(&workspace).and_then(|ws| ws.monitor)
    }

    fn has_fullscreen_window(&self, workspace: WorkspaceId) -> bool {
        self.windows.values().any(|w| w.workspace == workspace && w.fullscreen)
    }

    fn is_special_workspace(&self, workspace: WorkspaceId) -> bool {
        self.workspaces.get(&workspace).is_some_and(|ws| ws.special)
    }

    fn update_windows(&mut self, workspace: WorkspaceId) {
        self.updated_workspaces.push(workspace);
    }

    fn activate_workspace(&mut self, workspace: WorkspaceId) {
        self.active_workspace = Some(workspace);
    }

    fn focus_window(&mut self, window: Option<WindowId>) { self.focused = window; }

    fn last_focused_window(&self) -> Option<WindowId> { self.focused }

    fn window_at(&self, point: Point) -> Option<WindowId> {
        self.windows.iter().find_map(|(id, w)| {
            let frame = w.frame?;
            (!w.hidden && frame.contains(point)).then_some(*id)
        })
    }

    fn pointer_position(&self) -> Option<Point> { self.pointer }

    fn window_in_direction(&self, window: WindowId, direction: ShiftDirection) -> Option<WindowId> {
        let from = self.windows.get(&window)?;
        let origin = from.frame?.mid();
        self.windows
            .iter()
            .filter(|(id, w)| **id != window && w.workspace == from.workspace && !w.hidden)
            .filter_map(|(id, w)| {
                let delta = w.frame?.mid() - origin;
                let (along, across) = match direction {
                    ShiftDirection::Left => (-delta.x, delta.y),
                    ShiftDirection::Right => (delta.x, delta.y),
                    ShiftDirection::Up => (-delta.y, delta.x),
                    ShiftDirection::Down => (delta.y, delta.x),
                };
                (along > 0.0).then_some((along + across.abs(), *id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }

    fn focus_monitor_in_direction(&mut self, _direction: ShiftDirection) -> Option<WindowId> {
        let window = self.neighbor_monitor_window?;
        self.focused = Some(window);
        Some(window)
    }

    fn notify_error(&mut self, message: &str) { self.notifications.push(message.to_owned()); }
}

fn yes() -> bool { true }

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn default_window_lives_on_the_first_workspace_unmapped() {
        let window = HeadlessWindow::default();
        assert_eq!(window.workspace, WorkspaceId::default());
        assert!(!window.mapped);
        assert!(HeadlessWindow::tiled(WorkspaceId::default()).mapped);
    }

    #[test]
    fn deserialized_window_defaults_to_mapped() {
        let window: HeadlessWindow = serde_json::from_str(r#"{"workspace": 3}"#).unwrap();
        assert_eq!(window, HeadlessWindow::tiled(WorkspaceId(3)));
    }
}
