use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::Point;

/// Input record for a simulated node. Positions are optional; missing ones are seeded on a
/// phyllotaxis spiral around the configured center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: String,
    #[serde(default)]
    pub group: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl NodeData {
    pub fn new(id: impl Into<String>, group: u32) -> Self {
        Self {
            id: id.into(),
            group,
            x: None,
            y: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkData {
    pub source: String,
    pub target: String,
    #[serde(default = "default_link_value")]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_length: Option<f64>,
}

fn default_link_value() -> f64 {
    1.0
}

impl LinkData {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
            rest_length: None,
        }
    }

    pub fn with_rest_length(mut self, rest_length: f64) -> Self {
        self.rest_length = Some(rest_length);
        self
    }
}

/// A whole node/link data set, as the network visualizations load it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub nodes: Vec<NodeData>,
    pub links: Vec<LinkData>,
}

impl Network {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A simulated node as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub group: u32,
    pub position: Point,
    pub velocity: Point,
    /// Drag pin; overrides physics while set.
    pub fixed: Option<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub source_id: String,
    pub target_id: String,
    pub value: f64,
    pub rest_length: f64,
    #[serde(skip)]
    pub(crate) source: usize,
    #[serde(skip)]
    pub(crate) target: usize,
}

/// Validated, index-resolved simulation input.
#[derive(Debug)]
pub(crate) struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub index: FxHashMap<String, usize>,
}

const INITIAL_RADIUS: f64 = 10.0;

impl Graph {
    pub fn ingest(
        nodes: Vec<NodeData>,
        links: Vec<LinkData>,
        default_rest_length: f64,
        center: Point,
    ) -> Result<Self> {
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        index.reserve(nodes.len());
        for (i, n) in nodes.iter().enumerate() {
            if n.id.is_empty() {
                return Err(Error::InvalidInput {
                    reason: format!("node {i} has an empty id"),
                });
            }
            if index.insert(n.id.clone(), i).is_some() {
                return Err(Error::DuplicateKey { key: n.id.clone() });
            }
        }

        let initial_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        let mut out_nodes = Vec::with_capacity(nodes.len());
        for (i, n) in nodes.into_iter().enumerate() {
            let position = match (n.x, n.y) {
                (Some(x), Some(y)) => Point::new(x, y),
                (None, None) => {
                    let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
                    let angle = i as f64 * initial_angle;
                    Point::new(
                        center.x + radius * angle.cos(),
                        center.y + radius * angle.sin(),
                    )
                }
                _ => {
                    return Err(Error::InvalidInput {
                        reason: format!("node {:?} has only one of x/y", n.id),
                    });
                }
            };
            if !position.is_finite() {
                return Err(Error::InvalidInput {
                    reason: format!("node {:?} has a non-finite position", n.id),
                });
            }
            out_nodes.push(Node {
                id: n.id,
                group: n.group,
                position,
                velocity: Point::ORIGIN,
                fixed: None,
            });
        }

        let mut out_links = Vec::with_capacity(links.len());
        for (i, l) in links.into_iter().enumerate() {
            let resolve = |id: &str| {
                index.get(id).copied().ok_or_else(|| Error::InvalidReference {
                    link: i,
                    from: l.source.clone(),
                    to: l.target.clone(),
                    missing: id.to_string(),
                })
            };
            let source = resolve(&l.source)?;
            let target = resolve(&l.target)?;
            if !l.value.is_finite() || l.value < 0.0 {
                return Err(Error::InvalidInput {
                    reason: format!("link {i} has an invalid value {}", l.value),
                });
            }
            let rest_length = l.rest_length.unwrap_or(default_rest_length);
            if !rest_length.is_finite() || rest_length <= 0.0 {
                return Err(Error::InvalidInput {
                    reason: format!("link {i} has an invalid rest length {rest_length}"),
                });
            }
            out_links.push(Link {
                source_id: l.source,
                target_id: l.target,
                value: l.value,
                rest_length,
                source,
                target,
            });
        }

        Ok(Self {
            nodes: out_nodes,
            links: out_links,
            index,
        })
    }
}
