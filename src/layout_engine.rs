pub mod engine;
mod error;
mod focus;
mod geometry;
pub(crate) mod graph;
mod groups;
mod insert;
mod remove;
mod shift;
mod tabs;

pub use engine::{InstanceId, LayoutCommand, LayoutEngine, LayoutEvent, NodeSnapshot};
pub use error::LayoutError;
pub use graph::{
    Axis, ExpandFullscreenOption, ExpandOption, FocusShift, ResizeCorner, SetSwallowOption,
    ShiftDirection, TabFocus, TabFocusMousePriority, TabLockMode,
};

#[cfg(test)]
mod tests;
