// Pointer history of an active drag, turned into a release velocity.
//
// Only samples from the last `window` seconds count. If the pointer stopped
// moving for longer than that before the release, the node is let go at rest.

use std::collections::VecDeque;

use crate::physics::V2;

#[derive(Debug, Clone)]
pub struct DragTracker {
    window: f64,
    max_speed: f64,
    samples: VecDeque<(f64, V2)>,
}

impl DragTracker {
    pub fn new(window: f64, max_speed: f64, t: f64, x: f64, y: f64) -> Self {
        let mut samples = VecDeque::new();
        samples.push_back((t, V2::new(x, y)));
        Self { window, max_speed, samples }
    }

    /// Record a pointer position at time `t` (seconds). Samples going back in
    /// time are ignored.
    pub fn record(&mut self, t: f64, x: f64, y: f64) {
        if let Some(&(last_t, _)) = self.samples.back() {
            if t < last_t {
                return;
            }
        }
        self.samples.push_back((t, V2::new(x, y)));
        self.prune(t);
    }

    fn prune(&mut self, now: f64) {
        // Keep one sample at or before the window start so the span covers the window.
        while self.samples.len() > 2 && self.samples[1].0 <= now - self.window {
            self.samples.pop_front();
        }
    }

    /// Velocity to hand to the engine when the pointer is released at `t`.
    pub fn release_velocity(&mut self, t: f64) -> V2 {
        self.prune(t);
        let (Some(&(t0, p0)), Some(&(t1, p1))) = (self.samples.front(), self.samples.back()) else {
            return V2::zeros();
        };
        let elapsed = t1 - t0;
        if elapsed <= 0.0 || t - t1 > self.window {
            return V2::zeros();
        }
        let v = (p1 - p0) / elapsed;
        let speed = v.norm();
        if speed > self.max_speed {
            v * (self.max_speed / speed)
        } else {
            v
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_drag_velocity() {
        let mut d = DragTracker::new(0.1, 2000.0, 0.0, 100.0, 100.0);
        for i in 1..=10 {
            let t = i as f64 * 0.02;
            d.record(t, 100.0 + 400.0 * t, 100.0);
        }
        let v = d.release_velocity(0.2);
        assert!((v.x - 400.0).abs() < 1e-6);
        assert!(v.y.abs() < 1e-9);
    }

    #[test]
    fn test_only_recent_motion_counts() {
        let mut d = DragTracker::new(0.1, 2000.0, 0.0, 0.0, 0.0);
        // Fast flick first, then a slow finish.
        d.record(0.05, 100.0, 0.0);
        d.record(0.5, 100.0, 0.0);
        d.record(0.65, 115.0, 0.0);
        let v = d.release_velocity(0.65);
        assert!((v.x - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_pause_before_release_drops_momentum() {
        let mut d = DragTracker::new(0.1, 2000.0, 0.0, 0.0, 0.0);
        d.record(0.05, 50.0, 0.0);
        assert_eq!(d.release_velocity(1.0), V2::zeros());
    }

    #[test]
    fn test_click_without_motion() {
        let mut d = DragTracker::new(0.1, 2000.0, 3.0, 10.0, 10.0);
        assert_eq!(d.release_velocity(3.0), V2::zeros());
    }

    #[test]
    fn test_speed_is_capped() {
        let mut d = DragTracker::new(0.1, 500.0, 0.0, 0.0, 0.0);
        d.record(0.01, 0.0, 100.0);
        let v = d.release_velocity(0.01);
        assert!((v.norm() - 500.0).abs() < 1e-9);
        assert!(v.y > 0.0);
    }

    #[test]
    fn test_out_of_order_sample_ignored() {
        let mut d = DragTracker::new(0.1, 2000.0, 1.0, 0.0, 0.0);
        d.record(1.05, 10.0, 0.0);
        d.record(0.9, 500.0, 0.0);
        let v = d.release_velocity(1.05);
        assert!((v.x - 200.0).abs() < 1e-6);
    }
}
