use thiserror::Error;

use crate::model::NodeId;
use crate::sys::host::{WindowId, WorkspaceId};

/// Reasons an operation was rejected. A rejected operation leaves the tree
/// untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("{0} is already tiled as {1:?}")]
    WindowAlreadyTiled(WindowId, NodeId),
    #[error("node {0:?} already has a parent ({1:?})")]
    NodeAlreadyParented(NodeId, NodeId),
    #[error("{0} is not a valid workspace")]
    InvalidWorkspace(WorkspaceId),
    #[error("insertion target {0:?} is not a group")]
    InsertTargetNotGroup(NodeId),
    #[error("{0} has no monitor")]
    NoMonitor(WorkspaceId),
    #[error("{0} is not known to the host")]
    UnknownWindow(WindowId),
}
