//! The boundary between the layout engine and the compositor hosting it.
//!
//! The engine never owns windows, workspaces or monitors. It refers to them
//! by opaque ids and asks the host about them through [`Compositor`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::{Insets, Point, Rect, Size};
use crate::layout_engine::ShiftDirection;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "window {}", self.0) }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WorkspaceId(pub i64);

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "workspace {}", self.0) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    pub position: Point,
    pub size: Size,
    /// Area claimed by panels and bars along each edge.
    pub reserved: Insets,
}

impl Monitor {
    pub fn new(position: Point, size: Size) -> Self {
        Monitor { position, size, reserved: Insets::default() }
    }

    pub fn frame(&self) -> Rect { Rect::new(self.position, self.size) }

    /// The monitor's rectangle minus its reserved area.
    pub fn usable_area(&self) -> Rect { self.frame().inset(self.reserved) }
}

/// Capabilities the engine needs from the compositor.
///
/// Every method is expected to be cheap and non-blocking. Queries about
/// unknown ids should answer conservatively (`false`/`None`) rather than
/// fail.
pub trait Compositor {
    fn is_floating(&self, window: WindowId) -> bool;
    fn is_fullscreen(&self, window: WindowId) -> bool;
    fn set_fullscreen(&mut self, window: WindowId, fullscreen: bool);
    fn is_mapped(&self, window: WindowId) -> bool;
    fn window_workspace(&self, window: WindowId) -> Option<WorkspaceId>;
    /// Applies computed geometry. `animate` is false for resizes that must
    /// snap immediately.
    fn set_window_frame(&mut self, window: WindowId, frame: Rect, hidden: bool, animate: bool);
    fn close_window(&mut self, window: WindowId);
    fn move_window_to_workspace(&mut self, window: WindowId, workspace: WorkspaceId);

    fn is_workspace_valid(&self, workspace: WorkspaceId) -> bool;
    fn workspace_monitor(&self, workspace: WorkspaceId) -> Option<Monitor>;
    fn has_fullscreen_window(&self, workspace: WorkspaceId) -> bool;
    fn is_special_workspace(&self, workspace: WorkspaceId) -> bool;
    /// Tells the host the windows of a workspace changed.
    fn update_windows(&mut self, workspace: WorkspaceId);
    fn activate_workspace(&mut self, workspace: WorkspaceId);

    /// Gives input focus to a window, or clears it when focusing a group.
    fn focus_window(&mut self, window: Option<WindowId>);
    fn last_focused_window(&self) -> Option<WindowId>;
    fn window_at(&self, point: Point) -> Option<WindowId>;
    fn pointer_position(&self) -> Option<Point>;
    /// The window beside `window` in `direction`, used for floating windows
    /// which are not part of any tree.
    fn window_in_direction(&self, window: WindowId, direction: ShiftDirection) -> Option<WindowId>;
    /// Moves focus to the monitor in `direction`, returning that monitor's
    /// last focused window.
    fn focus_monitor_in_direction(&mut self, direction: ShiftDirection) -> Option<WindowId>;

    /// Best-effort user-visible notification.
    fn notify_error(&mut self, message: &str);
}
