//! Where new ideas go and how big the canvas is.
//!
//! Generated ideas are laid out on a ring around the idea they came from,
//! evenly spaced starting at angle 0 (to the right of the parent), going
//! clockwise in screen coordinates. Overlap with existing ideas is left to the
//! physics engine to push apart.

use std::f64::consts::TAU;

/// Distance from the parent idea to its generated ideas.
pub const DEFAULT_RING_RADIUS: f64 = 150.0;

/// The canvas is never smaller than this on either axis.
pub const MIN_CANVAS_SIZE: f64 = 3000.0;

/// `count` points evenly spaced on a circle of `ring_radius` around `(cx, cy)`.
pub fn ring_positions(cx: f64, cy: f64, count: usize, ring_radius: f64) -> Vec<(f64, f64)> {
    if count == 0 {
        return Vec::new();
    }
    let step = TAU / count as f64;
    (0..count)
        .map(|i| {
            let angle = step * i as f64;
            (cx + ring_radius * angle.cos(), cy + ring_radius * angle.sin())
        })
        .collect()
}

/// Canvas size for a viewport: twice the viewport, but at least [`MIN_CANVAS_SIZE`].
pub fn canvas_size(viewport_w: f64, viewport_h: f64) -> (f64, f64) {
    ((viewport_w * 2.0).max(MIN_CANVAS_SIZE), (viewport_h * 2.0).max(MIN_CANVAS_SIZE))
}

/// Scroll offset that centres a viewport on the canvas.
pub fn centered_scroll(canvas: (f64, f64), viewport: (f64, f64)) -> (f64, f64) {
    (((canvas.0 - viewport.0) / 2.0).max(0.0), ((canvas.1 - viewport.1) / 2.0).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_ring_of_three() {
        let ring = ring_positions(500.0, 500.0, 3, DEFAULT_RING_RADIUS);
        assert_eq!(ring.len(), 3);
        assert!(close(ring[0], (650.0, 500.0)));
        for p in &ring {
            let d = ((p.0 - 500.0).powi(2) + (p.1 - 500.0).powi(2)).sqrt();
            assert!((d - DEFAULT_RING_RADIUS).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ring_quarter_turns() {
        let ring = ring_positions(0.0, 0.0, 4, 10.0);
        assert!(close(ring[1], (0.0, 10.0)));
        assert!(close(ring[2], (-10.0, 0.0)));
        assert!(close(ring[3], (0.0, -10.0)));
    }

    #[test]
    fn test_empty_ring() {
        assert!(ring_positions(0.0, 0.0, 0, 150.0).is_empty());
    }

    #[test]
    fn test_canvas_size_has_floor() {
        assert_eq!(canvas_size(1200.0, 800.0), (3000.0, 3000.0));
        assert_eq!(canvas_size(2000.0, 1000.0), (4000.0, 3000.0));
    }

    #[test]
    fn test_centered_scroll() {
        assert_eq!(centered_scroll((3000.0, 3000.0), (1000.0, 600.0)), (1000.0, 1200.0));
        assert_eq!(centered_scroll((3000.0, 3000.0), (4000.0, 600.0)), (0.0, 1200.0));
    }
}
