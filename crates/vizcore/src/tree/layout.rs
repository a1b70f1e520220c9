use super::config::Orientation;
use super::data::{HierarchyNode, NodeId};
use crate::geom::Point;

/// Positions computed for the active subtree, in preorder.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LayeredLayout {
    pub placed: Vec<(NodeId, usize, Point)>,
    pub max_depth: usize,
}

/// Viewport extents after margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Extent {
    pub depth: f64,
    pub breadth: f64,
}

/// Preorder ids of the subtree reachable from the root without entering a collapsed node.
pub(crate) fn active_preorder(nodes: &[HierarchyNode]) -> Vec<(NodeId, usize)> {
    let mut out = Vec::new();
    if nodes.is_empty() {
        return out;
    }
    let mut stack = vec![(NodeId::ROOT, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        out.push((id, depth));
        let node = &nodes[id.index()];
        if node.collapsed {
            continue;
        }
        for &c in node.children.iter().rev() {
            stack.push((c, depth + 1));
        }
    }
    out
}

/// Layered layout of the active subtree.
///
/// Active leaves take consecutive slots `node_spacing` apart along the breadth axis and every
/// parent is centered over its first and last child. Layers sit `extent.depth / (max + 1)`
/// apart along the depth axis. The root is centered on the breadth axis.
pub(crate) fn layered(
    nodes: &[HierarchyNode],
    extent: Extent,
    node_spacing: f64,
    orientation: Orientation,
) -> LayeredLayout {
    let order = active_preorder(nodes);
    let max_depth = order.iter().map(|&(_, d)| d).max().unwrap_or(0);

    // Slots are indexed by node id; only active entries are ever read.
    let mut slot = vec![0.0f64; nodes.len()];
    let mut next_leaf = 0.0f64;
    for &(id, _) in &order {
        let node = &nodes[id.index()];
        if node.collapsed || node.children.is_empty() {
            slot[id.index()] = next_leaf;
            next_leaf += 1.0;
        }
    }
    for &(id, _) in order.iter().rev() {
        let node = &nodes[id.index()];
        if node.collapsed {
            continue;
        }
        if let (Some(first), Some(last)) = (node.children.first(), node.children.last()) {
            slot[id.index()] = (slot[first.index()] + slot[last.index()]) / 2.0;
        }
    }

    let layer = extent.depth / (max_depth as f64 + 1.0);
    let root_slot = slot.first().copied().unwrap_or(0.0);
    let placed = order
        .into_iter()
        .map(|(id, depth)| {
            let along = depth as f64 * layer;
            let across = (slot[id.index()] - root_slot) * node_spacing + extent.breadth / 2.0;
            let p = match orientation {
                Orientation::Horizontal => Point::new(along, across),
                Orientation::Vertical => Point::new(across, along),
            };
            (id, depth, p)
        })
        .collect();

    LayeredLayout { placed, max_depth }
}
