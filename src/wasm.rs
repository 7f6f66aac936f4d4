//! WASM bindings for the ideaspace-core library.
//!
//! `IdeaCanvas` is the only type exposed to JavaScript. Nothing here throws:
//! failures are logged to the console and reported as `false` / `"null"`.

use wasm_bindgen::prelude::*;
use serde_json::to_string;

use crate::config::PhysicsConfig;
use crate::error::{Error, Result};
use crate::output::{frame_output, ErrorInfo};
use crate::physics::NodeId;
use crate::workspace::{placement, Workspace};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    pub fn console_log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(s: &str);
}

/// Log a failed operation and turn it into `None`.
fn report<T>(op: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            let info = ErrorInfo::from(&e);
            console_error(&format!(
                "{}: {}",
                op,
                to_string(&info).unwrap_or_else(|_| e.to_string())
            ));
            None
        }
    }
}

/// Browser event timestamps are milliseconds.
fn ms_to_seconds(t_ms: f64) -> f64 {
    t_ms / 1000.0
}

#[wasm_bindgen]
pub struct IdeaCanvas {
    ws: Workspace,
}

#[wasm_bindgen]
impl IdeaCanvas {
    /// Canvas for a viewport of the given size, default physics.
    #[wasm_bindgen(constructor)]
    pub fn new(viewport_w: f64, viewport_h: f64, panel_inset: f64) -> IdeaCanvas {
        let ws = report(
            "new",
            Workspace::new(PhysicsConfig::default(), viewport_w, viewport_h, panel_inset),
        )
        .unwrap_or_default();
        IdeaCanvas { ws }
    }

    /// Like the constructor, with physics constants overridden from a JSON object.
    /// Falls back to the defaults if the JSON is rejected.
    pub fn with_config(viewport_w: f64, viewport_h: f64, panel_inset: f64, config_json: &str) -> IdeaCanvas {
        let config = report("with_config", PhysicsConfig::from_json(config_json)).unwrap_or_default();
        let ws = report(
            "with_config",
            Workspace::new(config, viewport_w, viewport_h, panel_inset),
        )
        .unwrap_or_default();
        IdeaCanvas { ws }
    }

    /// Canvas sized from the client area of the workspace element with `element_id`.
    pub fn for_element(element_id: &str, panel_inset: f64) -> Option<IdeaCanvas> {
        let element = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(element_id));
        let Some(element) = element else {
            console_error(&format!("Workspace element '{}' not found", element_id));
            return None;
        };
        let (w, h) = (element.client_width() as f64, element.client_height() as f64);
        console_log(&format!("Workspace '{}' is {}x{}", element_id, w, h));
        Some(IdeaCanvas::new(w, h, panel_inset))
    }

    pub fn add_idea(&mut self, id: u32, x: f64, y: f64) -> bool {
        report("add_idea", self.ws.add_idea(NodeId(id), x, y)).is_some()
    }

    pub fn add_node(&mut self, id: u32, x: f64, y: f64, radius: f64) -> bool {
        report("add_node", self.ws.add_node(NodeId(id), x, y, radius)).is_some()
    }

    /// Removing an idea that is already gone is not an error worth logging.
    pub fn remove_node(&mut self, id: u32) -> bool {
        match self.ws.remove_node(NodeId(id)) {
            Ok(()) => true,
            Err(Error::NotFound(_)) => false,
            Err(e) => {
                report::<()>("remove_node", Err(e));
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.ws.clear();
    }

    pub fn set_dragged(&mut self, id: u32, dragged: bool) -> bool {
        report("set_dragged", self.ws.engine_mut().set_dragged(NodeId(id), dragged)).is_some()
    }

    pub fn release_drag(&mut self, id: u32, vx: f64, vy: f64) -> bool {
        report("release_drag", self.ws.engine_mut().release_drag(NodeId(id), vx, vy)).is_some()
    }

    pub fn set_position(&mut self, id: u32, x: f64, y: f64) -> bool {
        report("set_position", self.ws.engine_mut().set_position(NodeId(id), x, y)).is_some()
    }

    pub fn begin_drag(&mut self, id: u32, x: f64, y: f64, t_ms: f64) -> bool {
        report("begin_drag", self.ws.begin_drag(NodeId(id), x, y, ms_to_seconds(t_ms))).is_some()
    }

    pub fn drag_to(&mut self, id: u32, x: f64, y: f64, t_ms: f64) -> bool {
        report("drag_to", self.ws.drag_to(NodeId(id), x, y, ms_to_seconds(t_ms))).is_some()
    }

    /// Returns the release velocity as `{"vx":..,"vy":..}`, or `"null"`.
    pub fn end_drag(&mut self, id: u32, t_ms: f64) -> String {
        match report("end_drag", self.ws.end_drag(NodeId(id), ms_to_seconds(t_ms))) {
            Some((vx, vy)) => serde_json::json!({ "vx": vx, "vy": vy }).to_string(),
            None => "null".to_string(),
        }
    }

    pub fn set_boundary(&mut self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> bool {
        report(
            "set_boundary",
            self.ws.engine_mut().set_boundary(min_x, min_y, max_x, max_y),
        )
        .is_some()
    }

    /// Refit the canvas to a resized viewport.
    pub fn resize(&mut self, viewport_w: f64, viewport_h: f64) -> bool {
        report("resize", self.ws.fit_viewport(viewport_w, viewport_h)).is_some()
    }

    pub fn canvas_width(&self) -> f64 {
        self.ws.canvas_size().0
    }

    pub fn canvas_height(&self) -> f64 {
        self.ws.canvas_size().1
    }

    /// Scroll offset that centres the given viewport on the canvas, as `[x, y]`.
    pub fn centered_scroll(&self, viewport_w: f64, viewport_h: f64) -> String {
        let (x, y) = placement::centered_scroll(self.ws.canvas_size(), (viewport_w, viewport_h));
        serde_json::json!([x, y]).to_string()
    }

    /// Advance the physics and return the frame to draw.
    pub fn tick(&mut self, dt_seconds: f64) -> String {
        self.ws.tick(dt_seconds);
        self.frame()
    }

    /// The current frame without advancing the physics.
    pub fn frame(&mut self) -> String {
        let frame = frame_output(&mut self.ws);
        to_string(&frame).unwrap_or_else(|_| "{}".to_string())
    }

    /// `{"x":..,"y":..}` or `"null"` for an unknown id.
    pub fn position_of(&self, id: u32) -> String {
        match self.ws.engine().position_of(NodeId(id)) {
            Ok((x, y)) => serde_json::json!({ "x": x, "y": y }).to_string(),
            Err(_) => "null".to_string(),
        }
    }

    pub fn node_at(&self, x: f64, y: f64) -> Option<u32> {
        self.ws.node_at(x, y).map(|id| id.0)
    }

    pub fn connect(&mut self, a: u32, b: u32) -> bool {
        report("connect", self.ws.connect(NodeId(a), NodeId(b))).unwrap_or(false)
    }

    pub fn disconnect(&mut self, a: u32, b: u32) -> bool {
        self.ws.disconnect(NodeId(a), NodeId(b))
    }

    /// Ring positions for `count` generated ideas, as `[[x, y], ...]`.
    pub fn spawn_ring(&self, parent: u32, count: usize, ring_radius: f64) -> String {
        let ring = report("spawn_ring", self.ws.spawn_ring(NodeId(parent), count, ring_radius))
            .unwrap_or_default();
        to_string(&ring).unwrap_or_else(|_| "[]".to_string())
    }

    /// Place generated ideas around `parent` and connect them to it.
    pub fn add_ring(&mut self, parent: u32, ids: Vec<u32>, ring_radius: f64) -> bool {
        let ids: Vec<NodeId> = ids.into_iter().map(NodeId).collect();
        report("add_ring", self.ws.add_ring(NodeId(parent), &ids, ring_radius)).is_some()
    }
}
