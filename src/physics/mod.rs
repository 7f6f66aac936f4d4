// Node physics for the idea canvas.
//
// Every idea is a circle with a position and a velocity. Each tick:
// - integrates velocity into position, with frame-rate independent damping
// - keeps centres inside the workspace boundary, bouncing off the edges
// - separates overlapping circles (impulse + positional correction)
//
// Submodules:
// - engine: node table and the tick loop
// - collision: resolution of a single overlapping pair
// - broadphase: candidate pair generation (all pairs or spatial hash grid)

use std::fmt;

use crate::error::{Error, Result};

mod broadphase;
mod collision;
mod engine;

pub use broadphase::{Broadphase, SpatialGrid};
pub use engine::Engine;

pub type V2 = nalgebra::Vector2<f64>;

/// Caller-assigned handle of an idea node.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Physics state of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: V2,
    pub velocity: V2,
    pub radius: f64,
    /// Position is driven by the pointer; integration and collision pushes skip it.
    pub dragged: bool,
    /// Neither moved nor had velocity during the last tick.
    pub resting: bool,
}

impl Body {
    pub fn new(position: V2, radius: f64) -> Self {
        Self {
            position,
            velocity: V2::zeros(),
            radius,
            dragged: false,
            resting: true,
        }
    }

    /// Inverse mass for collision response. Dragged nodes behave as immovable.
    pub fn inverse_mass(&self) -> f64 {
        if self.dragged { 0.0 } else { 1.0 }
    }
}

/// Workspace rectangle the nodes live in.
///
/// Centres are kept `radius` away from each edge, so a whole circle stays visible.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Boundary {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Boundary {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        let finite = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite());
        if !finite || min_x >= max_x || min_y >= max_y {
            return Err(Error::InvalidBoundary { min_x, min_y, max_x, max_y });
        }
        Ok(Self { min_x, min_y, max_x, max_y })
    }

    /// Boundary for a viewport of `width` x `height`, reserving a strip of
    /// `panel_inset` units on the left for the side panel.
    pub fn from_viewport(width: f64, height: f64, panel_inset: f64) -> Result<Self> {
        Self::new(panel_inset, 0.0, width, height)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Allowed range of the centre coordinate on one axis for a circle of `radius`.
    /// Circles wider than the axis are pinned to its midpoint.
    fn axis_range(min: f64, max: f64, radius: f64) -> (f64, f64) {
        let lo = min + radius;
        let hi = max - radius;
        if lo <= hi {
            (lo, hi)
        } else {
            let mid = (min + max) / 2.0;
            (mid, mid)
        }
    }

    pub fn x_range(&self, radius: f64) -> (f64, f64) {
        Self::axis_range(self.min_x, self.max_x, radius)
    }

    pub fn y_range(&self, radius: f64) -> (f64, f64) {
        Self::axis_range(self.min_y, self.max_y, radius)
    }

    /// Whether a circle of `radius` centred at `p` lies fully inside.
    pub fn contains(&self, p: &V2, radius: f64) -> bool {
        let (x0, x1) = self.x_range(radius);
        let (y0, y1) = self.y_range(radius);
        p.x >= x0 && p.x <= x1 && p.y >= y0 && p.y <= y1
    }
}

impl Default for Boundary {
    /// The minimum canvas size of the workspace.
    fn default() -> Self {
        Self { min_x: 0.0, min_y: 0.0, max_x: 3000.0, max_y: 3000.0 }
    }
}

/// One entry of a tick result.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NodePosition {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

/// Position changes a persistence layer may want to record.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum EngineEvent {
    /// A drag ended; the node was let go at this position.
    Released { id: NodeId, x: f64, y: f64 },
    /// The node's velocity reached zero; it will not move again until disturbed.
    Settled { id: NodeId, x: f64, y: f64 },
}

impl EngineEvent {
    pub fn id(&self) -> NodeId {
        match self {
            EngineEvent::Released { id, .. } | EngineEvent::Settled { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_rejects_inverted_axes() {
        assert!(Boundary::new(0.0, 0.0, 100.0, 100.0).is_ok());
        assert!(matches!(
            Boundary::new(100.0, 0.0, 100.0, 50.0),
            Err(Error::InvalidBoundary { .. })
        ));
        assert!(matches!(
            Boundary::new(0.0, 80.0, 100.0, 20.0),
            Err(Error::InvalidBoundary { .. })
        ));
        assert!(Boundary::new(0.0, 0.0, f64::NAN, 10.0).is_err());
    }

    #[test]
    fn test_axis_range_accounts_for_radius() {
        let b = Boundary::new(0.0, 0.0, 800.0, 600.0).unwrap();
        assert_eq!(b.x_range(60.0), (60.0, 740.0));
        assert_eq!(b.y_range(60.0), (60.0, 540.0));
    }

    #[test]
    fn test_oversized_circle_pinned_to_midpoint() {
        let b = Boundary::new(0.0, 0.0, 100.0, 1000.0).unwrap();
        assert_eq!(b.x_range(60.0), (50.0, 50.0));
    }

    #[test]
    fn test_viewport_reserves_panel_strip() {
        let b = Boundary::from_viewport(1200.0, 800.0, 250.0).unwrap();
        assert_eq!(b.min_x, 250.0);
        assert_eq!(b.width(), 950.0);
        assert!(Boundary::from_viewport(200.0, 800.0, 250.0).is_err());
    }

    #[test]
    fn test_dragged_body_is_immovable() {
        let mut body = Body::new(V2::new(0.0, 0.0), 60.0);
        assert_eq!(body.inverse_mass(), 1.0);
        body.dragged = true;
        assert_eq!(body.inverse_mass(), 0.0);
    }
}
