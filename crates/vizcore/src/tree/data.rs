use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::Point;

/// Nested hierarchy input, as the tree visualizations declare their data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyData>,
}

impl HierarchyData {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<HierarchyData>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Flat adjacency input: each record lists its children by key. The first record is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatNode {
    pub key: String,
    /// Display name; defaults to `key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default)]
    pub children: Vec<String>,
}

impl FlatNode {
    pub fn new<I, S>(key: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            name: None,
            value: None,
            children: children.into_iter().map(Into::into).collect(),
        }
    }
}

/// Identity of a hierarchy node, assigned once in depth-first order at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub id: NodeId,
    pub name: String,
    pub value: Option<f64>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub collapsed: bool,
    pub depth: usize,
    pub position: Point,
    /// Where the renderer should animate this node from.
    pub previous_position: Point,
}

impl HierarchyNode {
    fn new(
        id: NodeId,
        name: String,
        value: Option<f64>,
        parent: Option<NodeId>,
        depth: usize,
    ) -> Self {
        Self {
            id,
            name,
            value,
            parent,
            children: Vec::new(),
            collapsed: false,
            depth,
            position: Point::ORIGIN,
            previous_position: Point::ORIGIN,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

fn check_value(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() => Err(Error::InvalidInput {
            reason: format!("node {name:?} has a non-finite value {v}"),
        }),
        _ => Ok(()),
    }
}

/// Flattens nested data into preorder nodes; ids are preorder indices.
pub(crate) fn from_nested(root: &HierarchyData) -> Result<Vec<HierarchyNode>> {
    let mut nodes: Vec<HierarchyNode> = Vec::new();
    let mut stack: Vec<(&HierarchyData, Option<NodeId>, usize)> = vec![(root, None, 0)];
    while let Some((data, parent, depth)) = stack.pop() {
        check_value(&data.name, data.value)?;
        let id = NodeId(nodes.len());
        nodes.push(HierarchyNode::new(
            id,
            data.name.clone(),
            data.value,
            parent,
            depth,
        ));
        if let Some(p) = parent {
            nodes[p.index()].children.push(id);
        }
        for child in data.children.iter().rev() {
            stack.push((child, Some(id), depth + 1));
        }
    }
    Ok(nodes)
}

/// Builds preorder nodes from adjacency records, rejecting anything that is not a single tree
/// rooted at the first record.
pub(crate) fn from_flat(records: &[FlatNode]) -> Result<Vec<HierarchyNode>> {
    if records.is_empty() {
        return Err(Error::InvalidInput {
            reason: "hierarchy has no nodes".to_string(),
        });
    }

    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    for (i, r) in records.iter().enumerate() {
        if index.insert(r.key.as_str(), i).is_some() {
            return Err(Error::DuplicateKey { key: r.key.clone() });
        }
        check_value(&r.key, r.value)?;
    }

    let mut child_index: Vec<Vec<usize>> = Vec::with_capacity(records.len());
    let mut in_degree = vec![0usize; records.len()];
    for (i, r) in records.iter().enumerate() {
        let mut out = Vec::with_capacity(r.children.len());
        for c in &r.children {
            let Some(&ci) = index.get(c.as_str()) else {
                return Err(Error::InvalidReference {
                    link: i,
                    from: r.key.clone(),
                    to: c.clone(),
                    missing: c.clone(),
                });
            };
            in_degree[ci] += 1;
            out.push(ci);
        }
        child_index.push(out);
    }

    let mut visited = vec![false; records.len()];
    let order = walk(0, records, &child_index, &mut visited)?;

    if visited.iter().any(|v| !v) {
        // Anything left is either a second root or part of a cycle; walking from the extra
        // roots first tells the two apart.
        for start in 0..records.len() {
            if !visited[start] && in_degree[start] == 0 {
                walk(start, records, &child_index, &mut visited)?;
            }
        }
        if let Some(i) = visited.iter().position(|v| !v) {
            return Err(Error::CyclicHierarchy {
                node: records[i].key.clone(),
            });
        }
        let stray = (1..records.len())
            .find(|&i| in_degree[i] == 0)
            .unwrap_or(0);
        return Err(Error::DisconnectedHierarchy {
            node: records[stray].key.clone(),
        });
    }

    let mut id_of = vec![NodeId::ROOT; records.len()];
    for (pos, &(ri, _, _)) in order.iter().enumerate() {
        id_of[ri] = NodeId(pos);
    }

    let mut nodes = Vec::with_capacity(order.len());
    for &(ri, parent, depth) in &order {
        let r = &records[ri];
        let mut node = HierarchyNode::new(
            id_of[ri],
            r.name.clone().unwrap_or_else(|| r.key.clone()),
            r.value,
            parent.map(|p| id_of[p]),
            depth,
        );
        node.children = child_index[ri].iter().map(|&c| id_of[c]).collect();
        nodes.push(node);
    }
    Ok(nodes)
}

/// Preorder walk from `start`. Reaching a record twice means it has two parents or sits on a
/// cycle.
fn walk(
    start: usize,
    records: &[FlatNode],
    child_index: &[Vec<usize>],
    visited: &mut [bool],
) -> Result<Vec<(usize, Option<usize>, usize)>> {
    let mut order = Vec::new();
    let mut stack = vec![(start, None, 0usize)];
    while let Some((i, parent, depth)) = stack.pop() {
        if visited[i] {
            return Err(Error::CyclicHierarchy {
                node: records[i].key.clone(),
            });
        }
        visited[i] = true;
        order.push((i, parent, depth));
        for &c in child_index[i].iter().rev() {
            stack.push((c, Some(i), depth + 1));
        }
    }
    Ok(order)
}
