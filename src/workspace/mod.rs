// The idea workspace: physics engine plus the state the canvas keeps beside it.
//
// - connections: lines between ideas (never seen by the physics engine)
// - drag: pointer history for release momentum
// - placement: ring layout for generated ideas, canvas sizing
//
// The view reads everything back from here; nothing in this module touches
// presentation state.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::PhysicsConfig;
use crate::error::{Error, Result};
use crate::physics::{Boundary, Engine, NodeId, NodePosition, V2};

mod connections;
mod drag;
pub mod placement;

pub use connections::{Connection, Connections};
pub use drag::DragTracker;

/// A connection line resolved to current node centres.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment {
    pub from: NodeId,
    pub to: NodeId,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone)]
pub struct Workspace {
    engine: Engine,
    connections: Connections,
    drags: BTreeMap<NodeId, DragTracker>,
    panel_inset: f64,
    canvas: (f64, f64),
}

impl Default for Workspace {
    fn default() -> Self {
        let boundary = Boundary::default();
        Self {
            engine: Engine::default(),
            connections: Connections::default(),
            drags: BTreeMap::new(),
            panel_inset: 0.0,
            canvas: (boundary.max_x, boundary.max_y),
        }
    }
}

impl Workspace {
    /// Workspace for a viewport of `viewport_w` x `viewport_h`, with `panel_inset`
    /// units on the left reserved for the side panel.
    pub fn new(config: PhysicsConfig, viewport_w: f64, viewport_h: f64, panel_inset: f64) -> Result<Self> {
        let canvas = placement::canvas_size(viewport_w, viewport_h);
        let boundary = Boundary::from_viewport(canvas.0, canvas.1, panel_inset)?;
        Ok(Self {
            engine: Engine::new(config, boundary)?,
            connections: Connections::default(),
            drags: BTreeMap::new(),
            panel_inset,
            canvas,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        self.canvas
    }

    /// Resize the canvas for a new viewport and move the boundary with it.
    /// Returns the new canvas size.
    pub fn fit_viewport(&mut self, viewport_w: f64, viewport_h: f64) -> Result<(f64, f64)> {
        let canvas = placement::canvas_size(viewport_w, viewport_h);
        let b = Boundary::from_viewport(canvas.0, canvas.1, self.panel_inset)?;
        self.engine.set_boundary(b.min_x, b.min_y, b.max_x, b.max_y)?;
        self.canvas = canvas;
        Ok(canvas)
    }

    /// Add an idea with the configured default radius.
    pub fn add_idea(&mut self, id: NodeId, x: f64, y: f64) -> Result<()> {
        let radius = self.engine.config().default_radius;
        self.engine.add_node(id, x, y, radius)
    }

    pub fn add_node(&mut self, id: NodeId, x: f64, y: f64, radius: f64) -> Result<()> {
        self.engine.add_node(id, x, y, radius)
    }

    /// Remove an idea together with its connections and any drag in progress.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.engine.remove_node(id)?;
        let dropped = self.connections.remove_node(id);
        self.drags.remove(&id);
        debug!(%id, dropped, "idea removed");
        Ok(())
    }

    pub fn clear(&mut self) {
        self.engine.clear();
        self.connections.clear();
        self.drags.clear();
    }

    /// Connect two ideas. Returns false if they were already connected.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        if a == b {
            return Err(Error::SelfConnection(a));
        }
        for id in [a, b] {
            if !self.engine.contains(id) {
                return Err(Error::NotFound(id));
            }
        }
        Ok(self.connections.insert(a, b))
    }

    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> bool {
        self.connections.remove(a, b)
    }

    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        self.connections.neighbors(id).collect()
    }

    /// Line endpoints for every connection, from current node centres.
    pub fn connection_segments(&self) -> Vec<Segment> {
        self.connections
            .iter()
            .filter_map(|c| {
                let (x1, y1) = self.engine.position_of(c.from).ok()?;
                let (x2, y2) = self.engine.position_of(c.to).ok()?;
                Some(Segment { from: c.from, to: c.to, x1, y1, x2, y2 })
            })
            .collect()
    }

    /// The idea under the point, if any. Later (higher id) ideas are drawn on
    /// top, so they win when circles overlap.
    pub fn node_at(&self, x: f64, y: f64) -> Option<NodeId> {
        let p = V2::new(x, y);
        self.engine
            .iter()
            .filter(|(_, b)| (b.position - p).norm() <= b.radius)
            .map(|(id, _)| id)
            .last()
    }

    /// Positions for `count` ideas generated from `parent`, on a ring around it.
    pub fn spawn_ring(&self, parent: NodeId, count: usize, ring_radius: f64) -> Result<Vec<(f64, f64)>> {
        let (cx, cy) = self.engine.position_of(parent)?;
        Ok(placement::ring_positions(cx, cy, count, ring_radius))
    }

    /// Add generated ideas on a ring around `parent` and connect each to it.
    /// Nothing is added unless every id is free.
    pub fn add_ring(&mut self, parent: NodeId, ids: &[NodeId], ring_radius: f64) -> Result<()> {
        let positions = self.spawn_ring(parent, ids.len(), ring_radius)?;
        for (i, &id) in ids.iter().enumerate() {
            if self.engine.contains(id) || ids[..i].contains(&id) {
                return Err(Error::DuplicateNode(id));
            }
            if id == parent {
                return Err(Error::SelfConnection(id));
            }
        }
        for (&id, (x, y)) in ids.iter().zip(positions) {
            self.add_idea(id, x, y)?;
            self.connections.insert(parent, id);
        }
        debug!(%parent, count = ids.len(), "generated ideas placed");
        Ok(())
    }

    /// Pointer went down on an idea at time `t` (seconds).
    pub fn begin_drag(&mut self, id: NodeId, x: f64, y: f64, t: f64) -> Result<()> {
        self.engine.set_position(id, x, y)?;
        self.engine.set_dragged(id, true)?;
        let cfg = self.engine.config();
        self.drags
            .insert(id, DragTracker::new(cfg.drag_window, cfg.max_release_speed, t, x, y));
        Ok(())
    }

    /// Pointer moved while dragging `id`.
    pub fn drag_to(&mut self, id: NodeId, x: f64, y: f64, t: f64) -> Result<()> {
        self.engine.set_position(id, x, y)?;
        if let Some(tracker) = self.drags.get_mut(&id) {
            tracker.record(t, x, y);
        }
        Ok(())
    }

    /// Pointer released at time `t`. The idea keeps the momentum of the last
    /// few pointer moves; returns that velocity.
    pub fn end_drag(&mut self, id: NodeId, t: f64) -> Result<(f64, f64)> {
        let v = self
            .drags
            .remove(&id)
            .map(|mut tracker| tracker.release_velocity(t))
            .unwrap_or_else(V2::zeros);
        self.engine.release_drag(id, v.x, v.y)?;
        Ok((v.x, v.y))
    }

    pub fn tick(&mut self, dt_seconds: f64) -> Vec<NodePosition> {
        self.engine.tick(dt_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        Workspace::new(PhysicsConfig::default(), 1200.0, 800.0, 0.0).unwrap()
    }

    #[test]
    fn test_new_sizes_canvas_from_viewport() {
        let ws = Workspace::new(PhysicsConfig::default(), 2000.0, 800.0, 250.0).unwrap();
        assert_eq!(ws.canvas_size(), (4000.0, 3000.0));
        let b = ws.engine().boundary();
        assert_eq!((b.min_x, b.max_x, b.max_y), (250.0, 4000.0, 3000.0));
    }

    #[test]
    fn test_fit_viewport_moves_boundary() {
        let mut ws = workspace();
        assert_eq!(ws.fit_viewport(2500.0, 1600.0).unwrap(), (5000.0, 3200.0));
        assert_eq!(ws.engine().boundary().max_y, 3200.0);
    }

    #[test]
    fn test_connect_requires_existing_distinct_nodes() {
        let mut ws = workspace();
        ws.add_idea(NodeId(1), 500.0, 500.0).unwrap();
        ws.add_idea(NodeId(2), 800.0, 500.0).unwrap();
        assert_eq!(ws.connect(NodeId(1), NodeId(2)), Ok(true));
        assert_eq!(ws.connect(NodeId(2), NodeId(1)), Ok(false));
        assert_eq!(ws.connect(NodeId(1), NodeId(1)), Err(Error::SelfConnection(NodeId(1))));
        assert_eq!(ws.connect(NodeId(1), NodeId(9)), Err(Error::NotFound(NodeId(9))));
    }

    #[test]
    fn test_remove_node_drops_connections() {
        let mut ws = workspace();
        for (i, x) in [400.0, 700.0, 1000.0].into_iter().enumerate() {
            ws.add_idea(NodeId(i as u32), x, 500.0).unwrap();
        }
        ws.connect(NodeId(0), NodeId(1)).unwrap();
        ws.connect(NodeId(1), NodeId(2)).unwrap();
        ws.remove_node(NodeId(1)).unwrap();
        assert!(ws.connections().is_empty());
        assert_eq!(ws.remove_node(NodeId(1)), Err(Error::NotFound(NodeId(1))));
    }

    #[test]
    fn test_segments_follow_nodes() {
        let mut ws = workspace();
        ws.add_idea(NodeId(1), 500.0, 500.0).unwrap();
        ws.add_idea(NodeId(2), 800.0, 600.0).unwrap();
        ws.connect(NodeId(2), NodeId(1)).unwrap();
        ws.engine_mut().set_position(NodeId(2), 900.0, 650.0).unwrap();
        assert_eq!(
            ws.connection_segments(),
            vec![Segment { from: NodeId(1), to: NodeId(2), x1: 500.0, y1: 500.0, x2: 900.0, y2: 650.0 }]
        );
    }

    #[test]
    fn test_node_at_prefers_topmost() {
        let mut ws = workspace();
        ws.add_idea(NodeId(1), 500.0, 500.0).unwrap();
        ws.add_idea(NodeId(2), 580.0, 500.0).unwrap();
        assert_eq!(ws.node_at(450.0, 500.0), Some(NodeId(1)));
        assert_eq!(ws.node_at(540.0, 500.0), Some(NodeId(2)));
        assert_eq!(ws.node_at(560.0, 500.0 + 60.0), None);
        assert_eq!(ws.node_at(1500.0, 1500.0), None);
    }

    #[test]
    fn test_add_ring_places_and_connects() {
        let mut ws = workspace();
        ws.add_idea(NodeId(0), 1000.0, 1000.0).unwrap();
        let children = [NodeId(1), NodeId(2), NodeId(3)];
        ws.add_ring(NodeId(0), &children, placement::DEFAULT_RING_RADIUS).unwrap();
        assert_eq!(ws.neighbors(NodeId(0)), children.to_vec());
        let (x, y) = ws.engine().position_of(NodeId(1)).unwrap();
        assert!((x - 1150.0).abs() < 1e-9 && (y - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_ring_is_all_or_nothing() {
        let mut ws = workspace();
        ws.add_idea(NodeId(0), 1000.0, 1000.0).unwrap();
        ws.add_idea(NodeId(5), 200.0, 200.0).unwrap();
        let err = ws.add_ring(NodeId(0), &[NodeId(4), NodeId(5)], 150.0);
        assert_eq!(err, Err(Error::DuplicateNode(NodeId(5))));
        assert!(!ws.engine().contains(NodeId(4)));
        assert_eq!(ws.add_ring(NodeId(9), &[NodeId(4)], 150.0), Err(Error::NotFound(NodeId(9))));
    }

    #[test]
    fn test_drag_flick_carries_momentum() {
        let mut ws = workspace();
        ws.add_idea(NodeId(1), 100.0, 100.0).unwrap();
        ws.begin_drag(NodeId(1), 100.0, 100.0, 0.0).unwrap();
        for i in 1..=10 {
            let t = i as f64 * 0.02;
            ws.drag_to(NodeId(1), 100.0 + 1000.0 * t, 100.0, t).unwrap();
        }
        // Ticks while dragging leave the node where the pointer put it.
        ws.tick(0.016);
        let (x, y) = ws.engine().position_of(NodeId(1)).unwrap();
        assert!((x - 300.0).abs() < 1e-9 && y == 100.0);

        let (vx, vy) = ws.end_drag(NodeId(1), 0.2).unwrap();
        assert!((vx - 1000.0).abs() < 1e-6 && vy.abs() < 1e-9);
        ws.tick(0.016);
        let (x, _) = ws.engine().position_of(NodeId(1)).unwrap();
        assert!(x > 300.0);
    }

    #[test]
    fn test_end_drag_without_begin_releases_at_rest() {
        let mut ws = workspace();
        ws.add_idea(NodeId(1), 400.0, 400.0).unwrap();
        assert_eq!(ws.end_drag(NodeId(1), 1.0), Ok((0.0, 0.0)));
        assert_eq!(ws.end_drag(NodeId(2), 1.0), Err(Error::NotFound(NodeId(2))));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut ws = workspace();
        ws.add_idea(NodeId(1), 400.0, 400.0).unwrap();
        ws.add_idea(NodeId(2), 700.0, 400.0).unwrap();
        ws.connect(NodeId(1), NodeId(2)).unwrap();
        ws.begin_drag(NodeId(1), 400.0, 400.0, 0.0).unwrap();
        ws.clear();
        assert!(ws.engine().is_empty());
        assert!(ws.connections().is_empty());
        assert!(ws.node_at(400.0, 400.0).is_none());
    }
}
