//! Collapsible layered tree layout.
//!
//! A [`TreeLayout`] owns the full hierarchy for its lifetime. Collapsing a node hides its
//! descendants from layout without dropping them, and every recomputation reports which nodes
//! and links entered, moved, or exited so a renderer can animate from stable anchors.

mod config;
mod data;
mod engine;
mod layout;

pub use config::{Margin, Orientation, TreeConfig};
pub use data::{FlatNode, HierarchyData, HierarchyNode, NodeId};
pub use engine::{TreeLayout, TreeLink, TreeTransition};
