pub mod node;
pub mod tab_bar;
pub mod tree;

pub use node::{ExpandFocus, Group, GroupEphemerality, GroupLayout, Node, NodeData};
pub use tab_bar::{TabBar, TabBarId, TabBarStore, TabEntry};
pub use tree::{NodeId, NodeMap};
