//! Tunable constants for the physics engine and the drag tracker.
//!
//! Every field has a default, so the JS side can override any subset:
//!
//! ```json
//! { "damping": 0.9, "broadphase": { "kind": "grid", "cell_size": 120.0 } }
//! ```

use serde::Deserialize;

use crate::error::{Error, Result};

/// How candidate pairs are proposed to the collision pass.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BroadphaseConfig {
    /// Test every unordered pair.
    AllPairs,
    /// Bucket nodes into a uniform hash grid; cell size should be around one node diameter.
    Grid { cell_size: f64 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Velocity kept per frame at `reference_hz`. Scaled by elapsed time, so a
    /// tick of `dt` seconds multiplies velocity by `damping^(dt * reference_hz)`.
    pub damping: f64,
    /// Frame rate the damping factor is expressed against.
    pub reference_hz: f64,
    /// Speeds below this (units/s) snap to exactly zero.
    pub min_speed: f64,
    /// Bounciness of node-node collisions, in (0, 1).
    pub restitution: f64,
    /// Radius used when the caller does not provide one (60 = half the rendered idea diameter).
    pub default_radius: f64,
    /// Longest sub-step integrated at once, in seconds. Longer ticks are split.
    pub max_step: f64,
    /// Most sub-steps a single tick is split into.
    pub max_substeps: usize,
    /// Collision + containment passes per tick. The impulse is only applied on the first.
    pub solver_iterations: usize,
    pub broadphase: BroadphaseConfig,
    /// Pointer history (seconds) used to derive a release velocity.
    pub drag_window: f64,
    /// Cap on the derived release speed, units/s.
    pub max_release_speed: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            damping: 0.95,
            reference_hz: 60.0,
            min_speed: 0.5,
            restitution: 0.5,
            default_radius: 60.0,
            max_step: 0.1,
            max_substeps: 1000,
            solver_iterations: 4,
            broadphase: BroadphaseConfig::AllPairs,
            drag_window: 0.1,
            max_release_speed: 2000.0,
        }
    }
}

impl PhysicsConfig {
    /// Parse a (possibly partial) JSON object and validate the result.
    pub fn from_json(input: &str) -> Result<Self> {
        let cfg: PhysicsConfig =
            serde_json::from_str(input).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        fn check(ok: bool, msg: &str) -> Result<()> {
            if ok { Ok(()) } else { Err(Error::InvalidConfig(msg.to_string())) }
        }

        check(self.damping > 0.0 && self.damping < 1.0, "damping must be in (0, 1)")?;
        check(self.reference_hz.is_finite() && self.reference_hz > 0.0, "reference_hz must be positive")?;
        // A zero threshold would let velocity decay forever without reaching rest.
        check(self.min_speed.is_finite() && self.min_speed > 0.0, "min_speed must be positive")?;
        check(
            self.restitution > 0.0 && self.restitution < 1.0,
            "restitution must be in (0, 1)",
        )?;
        check(
            self.default_radius.is_finite() && self.default_radius > 0.0,
            "default_radius must be positive",
        )?;
        check(self.max_step.is_finite() && self.max_step > 0.0, "max_step must be positive")?;
        check(self.max_substeps >= 1, "max_substeps must be at least 1")?;
        check(self.solver_iterations >= 1, "solver_iterations must be at least 1")?;
        if let BroadphaseConfig::Grid { cell_size } = self.broadphase {
            check(cell_size.is_finite() && cell_size > 0.0, "grid cell_size must be positive")?;
        }
        check(self.drag_window.is_finite() && self.drag_window > 0.0, "drag_window must be positive")?;
        check(
            self.max_release_speed.is_finite() && self.max_release_speed >= 0.0,
            "max_release_speed must be non-negative",
        )?;
        Ok(())
    }

    /// Split a tick of `dt` seconds into equal sub-steps no longer than
    /// `max_step`. Returns the count and the length of each. Past
    /// `max_substeps` the count is capped at full-length steps.
    pub fn substeps(&self, dt: f64) -> (usize, f64) {
        // The epsilon keeps e.g. 0.5 / 0.1 from rounding up to six steps.
        let n = (dt / self.max_step - 1e-9).ceil().max(1.0);
        if n > self.max_substeps as f64 {
            (self.max_substeps, self.max_step)
        } else {
            (n as usize, dt / n)
        }
    }

    /// Velocity multiplier for a step of `dt` seconds.
    pub fn damping_for(&self, dt: f64) -> f64 {
        self.damping.powf(dt * self.reference_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PhysicsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = PhysicsConfig::from_json(r#"{ "damping": 0.9 }"#).unwrap();
        assert_eq!(cfg.damping, 0.9);
        assert_eq!(cfg.restitution, 0.5);
        assert_eq!(cfg.broadphase, BroadphaseConfig::AllPairs);
    }

    #[test]
    fn test_grid_broadphase_from_json() {
        let cfg =
            PhysicsConfig::from_json(r#"{ "broadphase": { "kind": "grid", "cell_size": 120.0 } }"#)
                .unwrap();
        assert_eq!(cfg.broadphase, BroadphaseConfig::Grid { cell_size: 120.0 });
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(matches!(
            PhysicsConfig::from_json(r#"{ "damping": 1.0 }"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            PhysicsConfig::from_json(r#"{ "min_speed": 0.0 }"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            PhysicsConfig::from_json(r#"{ "broadphase": { "kind": "grid", "cell_size": -1.0 } }"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(PhysicsConfig::from_json("{"), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_damping_scales_with_elapsed_time() {
        let cfg = PhysicsConfig::default();
        let one_frame = cfg.damping_for(1.0 / 60.0);
        let two_frames = cfg.damping_for(2.0 / 60.0);
        assert!((one_frame - 0.95).abs() < 1e-12);
        assert!((two_frames - one_frame * one_frame).abs() < 1e-12);
    }

    #[test]
    fn test_long_tick_split_into_equal_substeps() {
        let cfg = PhysicsConfig::default();
        assert_eq!(cfg.substeps(1.0 / 60.0), (1, 1.0 / 60.0));
        assert_eq!(cfg.substeps(0.1), (1, 0.1));
        let (n, h) = cfg.substeps(0.5);
        assert_eq!(n, 5);
        assert!((h - 0.1).abs() < 1e-12);
        let (n, h) = cfg.substeps(0.25);
        assert_eq!(n, 3);
        assert!(h <= cfg.max_step);
    }

    #[test]
    fn test_substeps_capped() {
        let cfg = PhysicsConfig { max_substeps: 4, ..PhysicsConfig::default() };
        assert_eq!(cfg.substeps(60.0), (4, 0.1));
    }
}
