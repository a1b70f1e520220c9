use rustc_hash::FxHashMap;
use serde::Serialize;

use super::config::ForceConfig;
use super::graph::{Graph, Link, LinkData, Node, NodeData};
use crate::error::{Error, Result};
use crate::geom::Point;

/// Lifecycle of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// No graph has been loaded yet.
    Uninitialized,
    /// Energy is held up, either right after (re)start or by an active interaction.
    Running,
    /// Energy is decaying toward the resting floor.
    Cooling,
    /// Alpha fell below `alpha_min` (or [`ForceSimulation::stop`] was called). `step` is inert
    /// until something reheats the simulation.
    Settled,
}

/// Result of one [`ForceSimulation::step`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub alpha: f64,
    pub phase: Phase,
    pub nodes: Vec<Node>,
}

/// Resolved endpoints of a link, ready to be drawn as a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSegment {
    pub source_id: String,
    pub target_id: String,
    pub value: f64,
    pub source: Point,
    pub target: Point,
}

/// Last finite kinematic state of a node, restored when integration produces NaN/inf.
#[derive(Debug, Clone, Copy)]
struct Kinematics {
    position: Point,
    velocity: Point,
}

#[derive(Debug)]
pub struct ForceSimulation {
    config: ForceConfig,
    phase: Phase,
    alpha: f64,
    alpha_target: f64,
    nodes: Vec<Node>,
    links: Vec<Link>,
    index: FxHashMap<String, usize>,
    degree: Vec<usize>,
    last_finite: Vec<Kinematics>,
    warned_non_finite: Vec<bool>,
    forces: Vec<Point>,
    ticks: u64,
}

impl Default for ForceSimulation {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceSimulation {
    pub fn new() -> Self {
        Self {
            config: ForceConfig::default(),
            phase: Phase::Uninitialized,
            alpha: 0.0,
            alpha_target: 0.0,
            nodes: Vec::new(),
            links: Vec::new(),
            index: FxHashMap::default(),
            degree: Vec::new(),
            last_finite: Vec::new(),
            warned_non_finite: Vec::new(),
            forces: Vec::new(),
            ticks: 0,
        }
    }

    /// Builds and initializes a simulation in one call.
    pub fn with_graph(
        nodes: Vec<NodeData>,
        links: Vec<LinkData>,
        config: ForceConfig,
    ) -> Result<Self> {
        let mut sim = Self::new();
        sim.initialize(nodes, links, config)?;
        Ok(sim)
    }

    /// Loads a graph and enters [`Phase::Running`].
    ///
    /// All input is validated before any state changes: on error the simulation is left
    /// exactly as it was.
    pub fn initialize(
        &mut self,
        nodes: Vec<NodeData>,
        links: Vec<LinkData>,
        config: ForceConfig,
    ) -> Result<()> {
        config.validate()?;
        let center = Point::new(config.center_x, config.center_y);
        let graph = Graph::ingest(nodes, links, config.link_distance, center)?;

        let mut degree = vec![0usize; graph.nodes.len()];
        for l in &graph.links {
            degree[l.source] += 1;
            degree[l.target] += 1;
        }

        self.last_finite = graph
            .nodes
            .iter()
            .map(|n| Kinematics {
                position: n.position,
                velocity: n.velocity,
            })
            .collect();
        self.warned_non_finite = vec![false; graph.nodes.len()];
        self.forces = vec![Point::ORIGIN; graph.nodes.len()];
        self.degree = degree;
        self.nodes = graph.nodes;
        self.links = graph.links;
        self.index = graph.index;
        self.alpha = config.initial_alpha;
        self.alpha_target = config.alpha_target;
        self.config = config;
        self.ticks = 0;
        self.phase = Phase::Running;

        tracing::debug!(
            nodes = self.nodes.len(),
            links = self.links.len(),
            "force simulation initialized"
        );
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn pinned_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.fixed.is_some()).count()
    }

    /// Copies the current state out for the renderer.
    pub fn snapshot(&self) -> Tick {
        Tick {
            alpha: self.alpha,
            phase: self.phase,
            nodes: self.nodes.clone(),
        }
    }

    pub fn link_segments(&self) -> Vec<LinkSegment> {
        self.links
            .iter()
            .map(|l| LinkSegment {
                source_id: l.source_id.clone(),
                target_id: l.target_id.clone(),
                value: l.value,
                source: self.nodes[l.source].position,
                target: self.nodes[l.target].position,
            })
            .collect()
    }

    /// Advances the simulation by exactly one tick.
    ///
    /// Forces are accumulated from a single snapshot of positions and applied afterwards, so
    /// node order never biases the result. In [`Phase::Uninitialized`] and [`Phase::Settled`]
    /// this only returns the current snapshot.
    pub fn step(&mut self) -> Tick {
        if matches!(self.phase, Phase::Uninitialized | Phase::Settled) {
            return self.snapshot();
        }

        self.forces.iter_mut().for_each(|f| *f = Point::ORIGIN);
        self.apply_repulsion();
        self.apply_links();
        self.apply_centering();
        self.integrate();

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.alpha = self.alpha.clamp(0.0, 1.0);
        self.ticks += 1;
        tracing::trace!(tick = self.ticks, alpha = self.alpha, "force tick");

        if self.alpha < self.config.alpha_min {
            self.phase = Phase::Settled;
            tracing::debug!(ticks = self.ticks, alpha = self.alpha, "force simulation settled");
        } else if self.alpha_target >= self.config.alpha_min {
            self.phase = Phase::Running;
        } else {
            self.phase = Phase::Cooling;
        }

        self.snapshot()
    }

    /// Steps until the simulation settles or `max_ticks` ticks have run. Returns the number of
    /// ticks executed.
    pub fn run(&mut self, max_ticks: usize) -> usize {
        let mut n = 0;
        while n < max_ticks && matches!(self.phase, Phase::Running | Phase::Cooling) {
            self.step();
            n += 1;
        }
        n
    }

    /// Pins a node at `(x, y)`, overriding physics until [`Self::unpin`].
    ///
    /// Every pin raises the energy floor to `interaction_alpha_target`; repeated pins during a
    /// drag only reassign the same floor, so alpha itself is never bumped.
    pub fn pin(&mut self, id: &str, x: f64, y: f64) -> Result<()> {
        let i = self.lookup(id)?;
        let at = Point::new(x, y);
        if !at.is_finite() {
            return Err(Error::InvalidInput {
                reason: format!("pin position for {id:?} is not finite"),
            });
        }

        let node = &mut self.nodes[i];
        node.fixed = Some(at);
        node.position = at;
        node.velocity = Point::ORIGIN;
        self.last_finite[i] = Kinematics {
            position: at,
            velocity: Point::ORIGIN,
        };

        self.alpha_target = self.config.interaction_alpha_target;
        if self.phase != Phase::Running {
            tracing::debug!(node = %id, from = ?self.phase, "reheating for interaction");
            self.phase = Phase::Running;
        }
        Ok(())
    }

    /// Releases a pin. Once no node is pinned the energy floor returns to the configured
    /// `alpha_target` and the simulation cools on its own.
    pub fn unpin(&mut self, id: &str) -> Result<()> {
        let i = self.lookup(id)?;
        self.nodes[i].fixed = None;
        if self.pinned_count() == 0 {
            self.alpha_target = self.config.alpha_target;
        }
        Ok(())
    }

    /// Sets alpha directly and resumes ticking.
    pub fn reheat(&mut self, alpha: f64) {
        if self.phase == Phase::Uninitialized {
            return;
        }
        self.alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            self.config.initial_alpha
        };
        self.phase = Phase::Running;
        tracing::debug!(alpha = self.alpha, "force simulation reheated");
    }

    /// Settles immediately regardless of alpha.
    pub fn stop(&mut self) {
        if self.phase != Phase::Uninitialized {
            self.phase = Phase::Settled;
            tracing::debug!(ticks = self.ticks, "force simulation stopped");
        }
    }

    fn lookup(&self, id: &str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    fn apply_repulsion(&mut self) {
        let strength = self.config.repulsion_strength;
        if strength == 0.0 {
            return;
        }
        let min_d = self.config.min_distance;
        let min_d2 = min_d * min_d;
        let n = self.nodes.len();
        for i in 0..n {
            let pi = self.nodes[i].position;
            for j in (i + 1)..n {
                let pj = self.nodes[j].position;
                let (mut dx, mut dy) = (pj.x - pi.x, pj.y - pi.y);
                let mut d2 = dx * dx + dy * dy;
                if d2 == 0.0 {
                    (dx, dy) = separation_direction(i, j, n, min_d);
                    d2 = min_d2;
                }
                let k = strength * self.alpha / d2.max(min_d2);
                self.forces[i].x -= dx * k;
                self.forces[i].y -= dy * k;
                self.forces[j].x += dx * k;
                self.forces[j].y += dy * k;
            }
        }
    }

    fn apply_links(&mut self) {
        let n = self.nodes.len();
        let min_d = self.config.min_distance;
        for l in &self.links {
            let (s, t) = (l.source, l.target);
            if s == t {
                continue;
            }
            let ps = self.nodes[s].position;
            let pt = self.nodes[t].position;
            let (mut dx, mut dy) = (pt.x - ps.x, pt.y - ps.y);
            let mut d = dx.hypot(dy);
            if d == 0.0 {
                (dx, dy) = separation_direction(s, t, n, min_d);
                d = min_d;
            }

            let (ds, dt) = (self.degree[s] as f64, self.degree[t] as f64);
            let strength = self.config.link_strength / ds.min(dt);
            let bias = ds / (ds + dt);

            let k = (d - l.rest_length) / d * self.alpha * strength;
            let (fx, fy) = (dx * k, dy * k);
            self.forces[t].x -= fx * bias;
            self.forces[t].y -= fy * bias;
            self.forces[s].x += fx * (1.0 - bias);
            self.forces[s].y += fy * (1.0 - bias);
        }
    }

    fn apply_centering(&mut self) {
        let strength = self.config.center_strength;
        if strength == 0.0 || self.nodes.is_empty() {
            return;
        }
        let n = self.nodes.len() as f64;
        let (sx, sy) = self
            .nodes
            .iter()
            .fold((0.0, 0.0), |(sx, sy), node| {
                (sx + node.position.x, sy + node.position.y)
            });
        let shift = Point::new(
            (self.config.center_x - sx / n) * strength,
            (self.config.center_y - sy / n) * strength,
        );
        for f in &mut self.forces {
            f.x += shift.x;
            f.y += shift.y;
        }
    }

    fn integrate(&mut self) {
        let decay = self.config.velocity_decay;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            if let Some(at) = node.fixed {
                node.position = at;
                node.velocity = Point::ORIGIN;
                self.last_finite[i] = Kinematics {
                    position: at,
                    velocity: Point::ORIGIN,
                };
                continue;
            }

            let f = self.forces[i];
            let velocity = Point::new(
                (node.velocity.x + f.x) * decay,
                (node.velocity.y + f.y) * decay,
            );
            let position = Point::new(
                node.position.x + velocity.x,
                node.position.y + velocity.y,
            );

            if velocity.is_finite() && position.is_finite() {
                node.velocity = velocity;
                node.position = position;
                self.last_finite[i] = Kinematics { position, velocity };
                continue;
            }

            let last = self.last_finite[i];
            node.position = last.position;
            node.velocity = last.velocity;
            if !self.warned_non_finite[i] {
                self.warned_non_finite[i] = true;
                tracing::warn!(
                    node = %node.id,
                    tick = self.ticks,
                    "non-finite position or velocity; clamped to last finite state"
                );
            }
        }
    }
}

/// Deterministic unit direction (scaled to `len`) for separating coincident nodes `a` and `b`.
fn separation_direction(a: usize, b: usize, n: usize, len: f64) -> (f64, f64) {
    let golden_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    let angle = (a * n + b) as f64 * golden_angle;
    (angle.cos() * len, angle.sin() * len)
}
