//! Output types for the canvas front end.
//!
//! These structs are serialized to JSON and handed to the JavaScript view,
//! which redraws ideas and connection lines from them every frame.

use serde::Serialize;

use crate::error::Error;
use crate::physics::{EngineEvent, NodeId};
use crate::workspace::{Segment, Workspace};

/// One idea's physics state, as drawn this frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutput {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub dragged: bool,
}

/// A connection line between two idea centres
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionOutput {
    pub from: u32,
    pub to: u32,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl From<Segment> for ConnectionOutput {
    fn from(s: Segment) -> Self {
        Self { from: s.from.0, to: s.to.0, x1: s.x1, y1: s.y1, x2: s.x2, y2: s.y2 }
    }
}

/// Position changes worth persisting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventOutput {
    Released { id: u32, x: f64, y: f64 },
    Settled { id: u32, x: f64, y: f64 },
}

impl From<EngineEvent> for EventOutput {
    fn from(e: EngineEvent) -> Self {
        match e {
            EngineEvent::Released { id, x, y } => EventOutput::Released { id: id.0, x, y },
            EngineEvent::Settled { id, x, y } => EventOutput::Settled { id: id.0, x, y },
        }
    }
}

/// Error information for the view's console / toast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    /// Machine-readable error kind, e.g. "not_found"
    pub kind: String,
    pub message: String,
}

impl From<&Error> for ErrorInfo {
    fn from(e: &Error) -> Self {
        Self { kind: e.kind().to_string(), message: e.to_string() }
    }
}

/// Everything the view needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<ConnectionOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventOutput>,
    /// True once every free idea has stopped; the view may pause its animation loop.
    pub at_rest: bool,
}

pub fn node_output(id: NodeId, ws: &Workspace) -> Option<NodeOutput> {
    let body = ws.engine().body(id).ok()?;
    Some(NodeOutput {
        id: id.0,
        x: body.position.x,
        y: body.position.y,
        vx: body.velocity.x,
        vy: body.velocity.y,
        radius: body.radius,
        dragged: body.dragged,
    })
}

/// Snapshot the workspace, draining pending engine events into the frame.
pub fn frame_output(ws: &mut Workspace) -> FrameOutput {
    let view: &Workspace = ws;
    let nodes = view.engine().ids().filter_map(|id| node_output(id, view)).collect();
    let connections = view.connection_segments().into_iter().map(ConnectionOutput::from).collect();
    let events = ws.engine_mut().drain_events().into_iter().map(EventOutput::from).collect();
    FrameOutput { nodes, connections, events, at_rest: ws.engine().is_at_rest() }
}
