#![forbid(unsafe_code)]

//! Headless engines behind the visualization gallery.
//!
//! Every chart in the gallery is a thin renderer over three pieces:
//!
//! - [`reconcile`]: keyed enter/update/exit diffing between two frames of data.
//! - [`force`]: a tick-driven force-directed simulation with drag pinning.
//! - [`tree`]: a layered tree layout with a per-node collapse state machine.
//!
//! Nothing here draws, owns a timer, or performs I/O. Callers drive the engines at whatever
//! cadence they render at and read back position snapshots.

pub mod error;
pub mod force;
pub mod geom;
pub mod reconcile;
pub mod tree;

pub use error::{Error, Result};
pub use force::{
    ForceConfig, ForceSimulation, Link, LinkData, LinkSegment, Network, Node, NodeData, Phase, Tick,
};
pub use geom::{Bounds, Point};
pub use reconcile::{ReconciliationResult, index_by_key, reconcile};
pub use tree::{
    FlatNode, HierarchyData, HierarchyNode, Margin, NodeId, Orientation, TreeConfig, TreeLayout,
    TreeLink, TreeTransition,
};
