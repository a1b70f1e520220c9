use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Serialize;

use super::config::{Orientation, TreeConfig, validate_spacing};
use super::data::{FlatNode, HierarchyData, HierarchyNode, NodeId, from_flat, from_nested};
use super::layout::{Extent, layered};
use crate::error::{Error, Result};
use crate::geom::{Bounds, Point};
use crate::reconcile::{ReconciliationResult, index_by_key, reconcile};

/// Parent/child edge of the active tree. Keyed by its child, which has exactly one parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLink {
    pub source: NodeId,
    pub target: NodeId,
    pub source_position: Point,
    pub target_position: Point,
}

/// What changed in one recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeTransition {
    /// Node whose change triggered the recomputation (the root for a plain layout).
    pub source: NodeId,
    /// `source`'s position before the recomputation; entering nodes grow from here.
    pub origin: Point,
    /// `source`'s position after the recomputation; exiting nodes shrink toward here.
    pub anchor: Point,
    pub nodes: ReconciliationResult<HierarchyNode>,
    pub links: ReconciliationResult<TreeLink>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Viewport {
    width: f64,
    height: f64,
    node_spacing: f64,
}

#[derive(Debug, Clone)]
pub struct TreeLayout {
    config: TreeConfig,
    nodes: Vec<HierarchyNode>,
    viewport: Option<Viewport>,
    active: IndexMap<NodeId, HierarchyNode, FxBuildHasher>,
}

impl TreeLayout {
    /// Builds the model from nested data. Every node starts expanded.
    pub fn build(root: &HierarchyData, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let nodes = from_nested(root)?;
        Ok(Self::from_nodes(nodes, config))
    }

    /// Builds the model from flat adjacency records rooted at the first record.
    pub fn build_flat(records: &[FlatNode], config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let nodes = from_flat(records)?;
        Ok(Self::from_nodes(nodes, config))
    }

    fn from_nodes(nodes: Vec<HierarchyNode>, config: TreeConfig) -> Self {
        tracing::debug!(nodes = nodes.len(), "tree built");
        Self {
            config,
            nodes,
            viewport: None,
            active: IndexMap::default(),
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Every node in the model, including hidden ones, in id order.
    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&HierarchyNode> {
        self.nodes.get(id.index())
    }

    /// First node in preorder with the given name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.name == name).map(|n| n.id)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.get(id)?.children)
    }

    /// Height of the full model (deepest depth, collapsed or not).
    pub fn height(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Nodes placed by the last recomputation, in preorder.
    pub fn active_nodes(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.active.values()
    }

    pub fn active_links(&self) -> Vec<TreeLink> {
        links_of(self.active.values(), |id| self.active.get(&id))
    }

    pub fn is_active(&self, id: NodeId) -> bool {
        self.active.contains_key(&id)
    }

    /// True for collapsed nodes that still hold children in the model.
    pub fn has_hidden_children(&self, id: NodeId) -> bool {
        self.node(id)
            .is_some_and(|n| n.collapsed && !n.children.is_empty())
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(self.active.values().map(|n| n.position))
    }

    /// Collapses every parent deeper than `depth`, leaving the top `depth + 1` levels open.
    /// Takes effect at the next recomputation.
    pub fn collapse_below(&mut self, depth: usize) {
        for n in &mut self.nodes {
            if n.depth > depth && !n.children.is_empty() {
                n.collapsed = true;
            }
        }
    }

    /// Recomputes positions for the active subtree inside `width x height` (minus margins).
    pub fn layout(&mut self, width: f64, height: f64, node_spacing: f64) -> Result<TreeTransition> {
        validate_spacing(node_spacing)?;
        if !(width.is_finite() && height.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(Error::InvalidInput {
                reason: format!("viewport {width}x{height} is not a finite, non-negative size"),
            });
        }
        self.viewport = Some(Viewport {
            width,
            height,
            node_spacing,
        });
        self.recompute(NodeId::ROOT)
    }

    /// [`Self::layout`] with the configured node spacing, as a renderer does on resize.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<TreeTransition> {
        self.layout(width, height, self.config.node_spacing)
    }

    /// Flips `collapsed` on a node and recomputes.
    ///
    /// Children are never dropped. Toggling twice yields two transitions. Before any
    /// [`Self::layout`] call the viewport is empty and only the configured spacing applies.
    pub fn toggle(&mut self, id: NodeId) -> Result<TreeTransition> {
        let node = self.get_mut(id)?;
        node.collapsed = !node.collapsed;
        tracing::debug!(node = %id, collapsed = node.collapsed, "tree toggle");
        self.recompute(id)
    }

    /// [`Self::toggle`] by node name.
    pub fn toggle_named(&mut self, name: &str) -> Result<TreeTransition> {
        let id = self.find(name).ok_or_else(|| Error::NotFound {
            id: name.to_string(),
        })?;
        self.toggle(id)
    }

    fn get(&self, id: NodeId) -> Result<&HierarchyNode> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut HierarchyNode> {
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    fn extent(&self) -> (Extent, f64) {
        let vp = self.viewport.unwrap_or(Viewport {
            width: 0.0,
            height: 0.0,
            node_spacing: self.config.node_spacing,
        });
        let m = self.config.margin;
        let inner_w = (vp.width - m.left - m.right).max(0.0);
        let inner_h = (vp.height - m.top - m.bottom).max(0.0);
        let extent = match self.config.orientation {
            Orientation::Horizontal => Extent {
                depth: inner_w,
                breadth: inner_h,
            },
            Orientation::Vertical => Extent {
                depth: inner_h,
                breadth: inner_w,
            },
        };
        (extent, vp.node_spacing)
    }

    /// `id` itself when it is reachable without entering a collapsed node, otherwise the
    /// outermost collapsed ancestor hiding it.
    fn visible_ancestor(&self, id: NodeId) -> NodeId {
        let mut visible = id;
        let mut cur = id;
        while let Some(parent) = self.nodes.get(cur.index()).and_then(|n| n.parent) {
            if self.nodes[parent.index()].collapsed {
                visible = parent;
            }
            cur = parent;
        }
        visible
    }

    fn recompute(&mut self, source: NodeId) -> Result<TreeTransition> {
        let source_was_placed = self.active.contains_key(&source);
        let prior = self.get(source)?.position;

        for n in &mut self.nodes {
            n.previous_position = n.position;
        }

        let (extent, spacing) = self.extent();
        let placed = layered(&self.nodes, extent, spacing, self.config.orientation);
        for &(id, depth, p) in &placed.placed {
            let n = &mut self.nodes[id.index()];
            n.position = p;
            n.depth = depth;
        }

        let anchor = self.nodes[self.visible_ancestor(source).index()].position;
        let origin = if source_was_placed { prior } else { anchor };

        let next: Vec<HierarchyNode> = placed
            .placed
            .iter()
            .map(|&(id, _, _)| {
                let n = &mut self.nodes[id.index()];
                if !self.active.contains_key(&id) {
                    n.previous_position = origin;
                }
                n.clone()
            })
            .collect();

        let nodes = reconcile(&self.active, &next, |n| n.id)?;

        let prev_links = index_by_key(
            links_of(self.active.values(), |id| self.active.get(&id)),
            |l| l.target,
        )?;
        let next_active = index_by_key(next, |n| n.id)?;
        let next_links: Vec<TreeLink> = links_of(next_active.values(), |id| next_active.get(&id));
        let links = reconcile(&prev_links, &next_links, |l| l.target)?;

        tracing::debug!(
            source = %source,
            entering = nodes.entering.len(),
            updating = nodes.updating.len(),
            exiting = nodes.exiting.len(),
            max_depth = placed.max_depth,
            "tree recomputed"
        );

        self.active = next_active;
        Ok(TreeTransition {
            source,
            origin,
            anchor,
            nodes,
            links,
        })
    }
}

fn links_of<'a>(
    nodes: impl Iterator<Item = &'a HierarchyNode>,
    lookup: impl Fn(NodeId) -> Option<&'a HierarchyNode>,
) -> Vec<TreeLink> {
    nodes
        .filter_map(|child| {
            let parent = lookup(child.parent?)?;
            Some(TreeLink {
                source: parent.id,
                target: child.id,
                source_position: parent.position,
                target_position: child.position,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Margin;

    fn tree() -> TreeLayout {
        let root = HierarchyData::with_children(
            "R",
            vec![
                HierarchyData::with_children("A", vec![HierarchyData::leaf("A1")]),
                HierarchyData::leaf("B"),
            ],
        );
        TreeLayout::build(
            &root,
            TreeConfig {
                margin: Margin::ZERO,
                ..Default::default()
            },
        )
        .expect("tree")
    }

    #[test]
    fn first_layout_enters_everything_from_the_root() {
        let mut t = tree();
        let tr = t.layout(300.0, 100.0, 20.0).expect("layout");
        assert_eq!(tr.nodes.entering.len(), 4);
        assert_eq!(tr.links.entering.len(), 3);
        assert_eq!(tr.origin, tr.anchor);
        for n in &tr.nodes.entering {
            assert_eq!(n.previous_position, tr.origin);
        }
    }

    #[test]
    fn relayout_moves_nodes_from_their_previous_positions() {
        let mut t = tree();
        t.layout(300.0, 100.0, 20.0).expect("layout");
        let before: Vec<Point> = t.nodes().iter().map(|n| n.position).collect();
        let tr = t.layout(600.0, 100.0, 20.0).expect("layout");
        assert!(tr.nodes.is_unchanged());
        for (old, new) in &tr.nodes.updating {
            assert_eq!(new.previous_position, before[old.id.index()]);
            assert_eq!(old.position, new.previous_position);
        }
    }

    #[test]
    fn exiting_nodes_anchor_on_the_toggled_node() {
        let mut t = tree();
        t.layout(300.0, 100.0, 20.0).expect("layout");
        let a = t.find("A").expect("A");
        let a_before = t.node(a).expect("node").position;

        let tr = t.toggle(a).expect("toggle");
        assert_eq!(tr.source, a);
        assert_eq!(tr.origin, a_before);
        assert_eq!(tr.anchor, t.node(a).expect("node").position);
        assert_eq!(tr.links.exiting.len(), 1);
        assert_eq!(tr.links.exiting[0].target, t.find("A1").expect("A1"));
        assert!(t.has_hidden_children(a));
    }

    #[test]
    fn reexpanded_nodes_enter_from_the_toggled_nodes_prior_position() {
        let mut t = tree();
        t.layout(300.0, 100.0, 20.0).expect("layout");
        let a = t.find("A").expect("A");
        t.toggle(a).expect("collapse");
        let a_prior = t.node(a).expect("node").position;
        let tr = t.toggle(a).expect("expand");
        assert_eq!(tr.nodes.entering.len(), 1);
        assert_eq!(tr.nodes.entering[0].previous_position, a_prior);
    }

    #[test]
    fn toggling_a_hidden_node_anchors_on_its_visible_ancestor() {
        let mut t = tree();
        t.layout(300.0, 100.0, 20.0).expect("layout");
        let a = t.find("A").expect("A");
        let a1 = t.find("A1").expect("A1");
        t.toggle(a).expect("collapse");
        t.layout(900.0, 100.0, 20.0).expect("relayout");

        let tr = t.toggle(a1).expect("toggle hidden");
        let a_now = t.node(a).expect("A").position;
        assert_eq!(tr.anchor, a_now);
        assert_eq!(tr.origin, a_now);
        assert!(tr.nodes.entering.is_empty());
        assert!(tr.nodes.exiting.is_empty());
        assert!(!t.is_active(a1));
    }

    #[test]
    fn unknown_id_is_not_found_and_state_is_unchanged() {
        let mut t = tree();
        t.layout(300.0, 100.0, 20.0).expect("layout");
        let before = t.nodes().to_vec();
        assert!(matches!(t.toggle(NodeId(99)), Err(Error::NotFound { .. })));
        assert!(matches!(t.toggle_named("nope"), Err(Error::NotFound { .. })));
        assert_eq!(t.nodes(), before.as_slice());
    }

    #[test]
    fn collapse_below_hides_deeper_levels() {
        let mut t = tree();
        t.collapse_below(0);
        let tr = t.layout(300.0, 100.0, 20.0).expect("layout");
        let names: Vec<&str> = tr.nodes.entering.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["R", "A", "B"]);
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn invalid_viewport_is_rejected_before_anything_moves() {
        let mut t = tree();
        assert!(t.layout(f64::NAN, 100.0, 20.0).is_err());
        assert!(t.layout(100.0, 100.0, 0.0).is_err());
        assert_eq!(t.active_nodes().count(), 0);
    }

    #[test]
    fn bounds_cover_the_active_layout() {
        let mut t = tree();
        t.layout(300.0, 100.0, 20.0).expect("layout");
        let b = t.bounds().expect("bounds");
        assert_eq!(b.min_x, 0.0);
        assert_eq!(b.max_x, 300.0 * 2.0 / 3.0);
        assert_eq!(b.max_y - b.min_y, 20.0);
        assert_eq!(b.width(), 200.0);
        assert_eq!(b.height(), 20.0);
        assert_eq!(b.center(), Point::new(100.0, (b.min_y + b.max_y) / 2.0));
    }
}
