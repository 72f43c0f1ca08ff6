//! Tiling layout tree engine.
//!
//! Windows on a workspace are arranged in a tree of nested splits and tab
//! groups. The [`layout_engine::LayoutEngine`] owns every node across all
//! workspaces and implements insertion, directional movement, removal,
//! focus, resizing and tab-bar hit-testing over that tree. The host
//! compositor is reached only through [`sys::host::Compositor`].

pub mod common;
pub mod layout_engine;
pub mod model;
pub mod sys;
