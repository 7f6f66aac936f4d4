use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::broadphase::{all_pairs, Broadphase};
use super::collision::{overlaps, resolve_pair};
use super::{Body, Boundary, EngineEvent, NodeId, NodePosition, V2};
use crate::config::PhysicsConfig;
use crate::error::{Error, Result};

/// Owns every idea node's physics state and advances it one tick at a time.
///
/// Nodes are kept in ascending id order; integration, containment and the
/// pairwise collision pass all walk them in that order, so two identical call
/// sequences always produce identical positions.
///
/// Every operation taking a [`NodeId`] returns [`Error::NotFound`] for an
/// unregistered id and leaves the engine unchanged.
#[derive(Debug, Clone)]
pub struct Engine {
    config: PhysicsConfig,
    boundary: Boundary,
    nodes: BTreeMap<NodeId, Body>,
    broadphase: Broadphase,
    events: Vec<EngineEvent>,
}

impl Default for Engine {
    fn default() -> Self {
        let config = PhysicsConfig::default();
        Self {
            broadphase: Broadphase::from_config(&config.broadphase),
            config,
            boundary: Boundary::default(),
            nodes: BTreeMap::new(),
            events: Vec::new(),
        }
    }
}

impl Engine {
    pub fn new(config: PhysicsConfig, boundary: Boundary) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            broadphase: Broadphase::from_config(&config.broadphase),
            config,
            boundary,
            nodes: BTreeMap::new(),
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Swap in new constants. Node state is kept.
    pub fn set_config(&mut self, config: PhysicsConfig) -> Result<()> {
        config.validate()?;
        self.broadphase = Broadphase::from_config(&config.broadphase);
        self.config = config;
        Ok(())
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Replace the containment rectangle. Nodes already outside are clamped
    /// on the next tick, not here.
    pub fn set_boundary(&mut self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<()> {
        self.boundary = Boundary::new(min_x, min_y, max_x, max_y)?;
        debug!(min_x, min_y, max_x, max_y, "boundary updated");
        Ok(())
    }

    /// Register a node at rest.
    pub fn add_node(&mut self, id: NodeId, x: f64, y: f64, radius: f64) -> Result<()> {
        if self.nodes.contains_key(&id) {
            return Err(Error::DuplicateNode(id));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(Error::InvalidRadius { id, radius });
        }
        if !(x.is_finite() && y.is_finite()) {
            return Err(Error::InvalidPosition { id });
        }
        self.nodes.insert(id, Body::new(V2::new(x, y), radius));
        debug!(%id, x, y, radius, "node added");
        Ok(())
    }

    /// Drop a node with its velocity and any undelivered events about it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.nodes.remove(&id).ok_or(Error::NotFound(id))?;
        self.events.retain(|e| e.id() != id);
        debug!(%id, "node removed");
        Ok(())
    }

    pub fn clear(&mut self) {
        debug!(count = self.nodes.len(), "engine cleared");
        self.nodes.clear();
        self.events.clear();
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Registered ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Body)> + '_ {
        self.nodes.iter().map(|(id, body)| (*id, body))
    }

    pub fn body(&self, id: NodeId) -> Result<&Body> {
        self.nodes.get(&id).ok_or(Error::NotFound(id))
    }

    fn body_mut(&mut self, id: NodeId) -> Result<&mut Body> {
        self.nodes.get_mut(&id).ok_or(Error::NotFound(id))
    }

    pub fn position_of(&self, id: NodeId) -> Result<(f64, f64)> {
        let body = self.body(id)?;
        Ok((body.position.x, body.position.y))
    }

    pub fn velocity_of(&self, id: NodeId) -> Result<(f64, f64)> {
        let body = self.body(id)?;
        Ok((body.velocity.x, body.velocity.y))
    }

    pub fn is_dragged(&self, id: NodeId) -> Result<bool> {
        Ok(self.body(id)?.dragged)
    }

    /// Start or stop driving a node from the pointer. Either transition zeroes
    /// the velocity; use [`Engine::release_drag`] to let go with momentum.
    pub fn set_dragged(&mut self, id: NodeId, dragged: bool) -> Result<()> {
        let body = self.body_mut(id)?;
        body.dragged = dragged;
        body.velocity = V2::zeros();
        body.resting = !dragged;
        trace!(%id, dragged, "drag flag changed");
        Ok(())
    }

    /// End a drag: set the release velocity and clear the dragged flag together.
    pub fn release_drag(&mut self, id: NodeId, vx: f64, vy: f64) -> Result<()> {
        let body = self.body_mut(id)?;
        let velocity = if vx.is_finite() && vy.is_finite() {
            V2::new(vx, vy)
        } else {
            V2::zeros()
        };
        body.dragged = false;
        body.velocity = velocity;
        body.resting = velocity == V2::zeros();
        let (x, y) = (body.position.x, body.position.y);
        self.events.push(EngineEvent::Released { id, x, y });
        debug!(%id, vx = velocity.x, vy = velocity.y, "drag released");
        Ok(())
    }

    /// Force a node's position, leaving its velocity alone.
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<()> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(Error::InvalidPosition { id });
        }
        let body = self.body_mut(id)?;
        body.position = V2::new(x, y);
        if !body.dragged {
            body.resting = false;
        }
        Ok(())
    }

    /// Whether a tick would change nothing: every free node has stopped, sits
    /// inside the boundary and is clear of its neighbours.
    pub fn is_at_rest(&self) -> bool {
        let stopped = self
            .nodes
            .values()
            .filter(|b| !b.dragged)
            .all(|b| b.velocity == V2::zeros() && self.boundary.contains(&b.position, b.radius));
        if !stopped {
            return false;
        }
        let bodies: Vec<&Body> = self.nodes.values().collect();
        !bodies.iter().enumerate().any(|(i, a)| {
            bodies[i + 1..]
                .iter()
                .any(|b| !(a.dragged && b.dragged) && overlaps(a, b))
        })
    }

    /// Take the events queued since the last call.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the simulation by `dt_seconds` and return every node's position.
    ///
    /// Non-finite or non-positive steps advance nothing. Steps longer than
    /// `max_step` are split into equal sub-steps; once everything is at rest
    /// the remaining sub-steps are skipped, since they would change nothing.
    pub fn tick(&mut self, dt_seconds: f64) -> Vec<NodePosition> {
        if !(dt_seconds.is_finite() && dt_seconds > 0.0) {
            trace!(dt_seconds, "skipping empty tick");
            return self.positions();
        }
        let (steps, h) = self.config.substeps(dt_seconds);
        if dt_seconds > self.config.max_step * self.config.max_substeps as f64 {
            debug!(dt_seconds, simulated = steps as f64 * h, "tick exceeds max_substeps, remainder dropped");
        }
        let before: Vec<V2> = self.nodes.values().map(|b| b.position).collect();

        let mut taken = 0;
        let mut passes = 0;
        while taken < steps {
            self.integrate(h);
            self.contain();
            passes += self.resolve_collisions();
            taken += 1;
            if steps > 1 && self.is_at_rest() {
                break;
            }
        }
        self.record_settled(&before);

        trace!(dt = dt_seconds, steps = taken, nodes = self.nodes.len(), passes, "tick");
        self.positions()
    }

    /// Current positions, ascending id.
    pub fn positions(&self) -> Vec<NodePosition> {
        self.nodes
            .iter()
            .map(|(id, b)| NodePosition {
                id: *id,
                x: b.position.x,
                y: b.position.y,
            })
            .collect()
    }

    fn integrate(&mut self, dt: f64) {
        let factor = self.config.damping_for(dt);
        let min_speed = self.config.min_speed;
        for body in self.nodes.values_mut().filter(|b| !b.dragged) {
            body.position += body.velocity * dt;
            body.velocity *= factor;
            if body.velocity.norm() < min_speed {
                body.velocity = V2::zeros();
            }
        }
    }

    fn contain(&mut self) {
        let boundary = self.boundary;
        for body in self.nodes.values_mut() {
            contain_body(body, &boundary);
        }
    }

    /// Run the collision passes; returns how many ran. Stops early once a
    /// pass finds no overlap.
    fn resolve_collisions(&mut self) -> usize {
        let restitution = self.config.restitution;
        let boundary = self.boundary;
        let mut bodies: Vec<&mut Body> = self.nodes.values_mut().collect();

        let mut passes = 0;
        for pass in 0..self.config.solver_iterations {
            passes += 1;
            let apply_impulse = pass == 0;
            let circles: Vec<(V2, f64)> = bodies.iter().map(|b| (b.position, b.radius)).collect();
            let pairs = self.broadphase.candidate_pairs(&circles);

            let overlapped = match self.broadphase.slack() {
                None => sweep(&mut bodies, &pairs, &boundary, restitution, apply_impulse, None),
                Some(slack) => {
                    let velocities: Vec<V2> = bodies.iter().map(|b| b.velocity).collect();
                    let limit = Some((circles.as_slice(), slack));
                    match sweep(&mut bodies, &pairs, &boundary, restitution, apply_impulse, limit) {
                        done @ Some(_) => done,
                        None => {
                            trace!(pass, "grid candidates went stale, redoing pass over all pairs");
                            for ((body, (p, _)), v) in bodies.iter_mut().zip(&circles).zip(&velocities) {
                                body.position = *p;
                                body.velocity = *v;
                            }
                            let pairs = all_pairs(bodies.len());
                            sweep(&mut bodies, &pairs, &boundary, restitution, apply_impulse, None)
                        }
                    }
                }
            }
            .unwrap_or(true);

            for body in bodies.iter_mut() {
                contain_body(body, &boundary);
            }
            if !overlapped {
                break;
            }
        }
        passes
    }

    fn record_settled(&mut self, before: &[V2]) {
        for ((id, body), prev) in self.nodes.iter_mut().zip(before) {
            if body.dragged {
                continue;
            }
            let at_rest = body.velocity == V2::zeros() && body.position == *prev;
            if at_rest && !body.resting {
                self.events.push(EngineEvent::Settled {
                    id: *id,
                    x: body.position.x,
                    y: body.position.y,
                });
            }
            body.resting = at_rest;
        }
    }
}

/// Resolve every overlapping pair in `pairs`, in order. Returns whether any
/// overlapped.
///
/// With `limit = Some((start, slack))`, gives up and returns `None` as soon as
/// a body ends up further than `slack` from its centre in `start`: pairs left
/// out of `pairs` may then be touching.
fn sweep(
    bodies: &mut [&mut Body],
    pairs: &[(usize, usize)],
    boundary: &Boundary,
    restitution: f64,
    apply_impulse: bool,
    limit: Option<(&[(V2, f64)], f64)>,
) -> Option<bool> {
    let mut overlapped = false;
    for &(i, j) in pairs {
        let (left, right) = bodies.split_at_mut(j);
        let (a, b) = (&mut *left[i], &mut *right[0]);
        if !resolve_pair(a, b, boundary, restitution, apply_impulse) {
            continue;
        }
        overlapped = true;
        if let Some((start, slack)) = limit {
            if (a.position - start[i].0).norm() > slack || (b.position - start[j].0).norm() > slack {
                return None;
            }
        }
    }
    Some(overlapped)
}

/// Clamp a free node's centre into the boundary, turning the velocity
/// component that points outward back inside.
fn contain_body(body: &mut Body, boundary: &Boundary) {
    if body.dragged {
        return;
    }
    let (x0, x1) = boundary.x_range(body.radius);
    let (y0, y1) = boundary.y_range(body.radius);

    if body.position.x < x0 {
        body.position.x = x0;
        body.velocity.x = body.velocity.x.abs();
    } else if body.position.x > x1 {
        body.position.x = x1;
        body.velocity.x = -body.velocity.x.abs();
    }

    if body.position.y < y0 {
        body.position.y = y0;
        body.velocity.y = body.velocity.y.abs();
    } else if body.position.y > y1 {
        body.position.y = y1;
        body.velocity.y = -body.velocity.y.abs();
    }
}
