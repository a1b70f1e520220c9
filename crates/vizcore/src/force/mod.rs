//! Force-directed layout driven one tick at a time.
//!
//! The model follows the usual d3-force shape: many-body repulsion, degree-weighted link
//! springs and a centering pull, integrated with velocity decay while an `alpha` energy term
//! cools toward zero. Dragging is expressed as [`ForceSimulation::pin`] /
//! [`ForceSimulation::unpin`], which reheat the simulation so motion visibly resumes.

mod config;
mod graph;
mod sim;

pub use config::ForceConfig;
pub use graph::{Link, LinkData, Network, Node, NodeData};
pub use sim::{ForceSimulation, LinkSegment, Phase, Tick};
