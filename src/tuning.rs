//! Data-driven game balance
//!
//! Every rule constant the simulation reads lives here so a level designer can
//! tweak the game from a JSON file without touching code. Angles are stored in
//! degrees (what people write in config files) and exposed in radians.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems found while loading or validating a [`Tuning`]
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl TuningError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Game balance parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Playfield ===
    pub viewport_width: f32,
    pub viewport_height: f32,

    // === Player ===
    /// Horizontal speed of the player base while a key is held (pixels/s)
    pub player_speed: f32,
    /// Distance from the bottom of the viewport to the player base center
    pub player_rest_offset: f32,

    // === Balance controller ===
    /// Restoring stiffness `k`
    pub stiffness: f32,
    /// Damping `b`
    pub damping: f32,
    /// Overall scale applied on top of the beam inertia
    pub torque_scale: f32,
    /// Tilt above which the warning overlay is shown (degrees)
    pub warning_angle_deg: f32,
    /// Tilt above which the game ends (degrees)
    pub max_angle_deg: f32,

    // === Spawner ===
    pub spawn_interval_initial_ms: f64,
    pub spawn_interval_step_ms: f64,
    pub spawn_interval_floor_ms: f64,
    /// Horizontal margin kept clear on both sides of the spawn band
    pub spawn_margin: f32,
    /// Spawn height range above the visible field (negative y is above)
    pub spawn_y_min: f32,
    pub spawn_y_max: f32,
    /// Probability that a spawn is a bomb
    pub bomb_chance: f64,

    // === Bodies ===
    pub block_size: f32,
    pub block_friction: f32,
    /// Density of a weight-1.0 block; scaled by the color weight
    pub block_base_density: f32,
    pub bomb_radius: f32,
    pub bomb_restitution: f32,
    pub bomb_density: f32,

    // === Merge ===
    pub merge_size_factor: f32,
    pub merge_density_factor: f32,
    /// Points per unit of color weight
    pub merge_score: f64,

    // === Explosion ===
    pub explosion_radius: f32,
    pub explosion_max_impulse: f32,
    /// Stop resolving the rest of a contact batch after the first bomb pair
    pub bomb_ends_batch: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,

            player_speed: 300.0,
            player_rest_offset: 60.0,

            stiffness: 0.5,
            damping: 0.2,
            torque_scale: 0.1,
            warning_angle_deg: 30.0,
            max_angle_deg: 60.0,

            spawn_interval_initial_ms: 2000.0,
            spawn_interval_step_ms: 20.0,
            spawn_interval_floor_ms: 500.0,
            spawn_margin: 50.0,
            spawn_y_min: -120.0,
            spawn_y_max: -40.0,
            bomb_chance: 0.1,

            block_size: 40.0,
            block_friction: 0.5,
            block_base_density: 0.001,
            bomb_radius: 15.0,
            bomb_restitution: 0.5,
            bomb_density: 0.002,

            merge_size_factor: 1.2,
            merge_density_factor: 1.5,
            merge_score: 100.0,

            explosion_radius: 200.0,
            explosion_max_impulse: 400.0,
            bomb_ends_batch: false,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn warning_angle(&self) -> f32 {
        self.warning_angle_deg.to_radians()
    }

    pub fn max_angle(&self) -> f32 {
        self.max_angle_deg.to_radians()
    }

    /// Y coordinate the player base is pinned to every tick
    pub fn player_rest_y(&self) -> f32 {
        self.viewport_height - self.player_rest_offset
    }

    /// Check cross-field constraints the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.viewport_width > 0.0 && self.viewport_height > 0.0) {
            return Err(TuningError::invalid("viewport_width", "viewport must be positive"));
        }
        if !(self.warning_angle_deg > 0.0) {
            return Err(TuningError::invalid("warning_angle_deg", "must be > 0"));
        }
        if !(self.max_angle_deg > self.warning_angle_deg) {
            return Err(TuningError::invalid(
                "max_angle_deg",
                format!(
                    "must exceed warning angle ({} <= {})",
                    self.max_angle_deg, self.warning_angle_deg
                ),
            ));
        }
        if !(self.spawn_interval_floor_ms > 0.0) {
            return Err(TuningError::invalid("spawn_interval_floor_ms", "must be > 0"));
        }
        if self.spawn_interval_initial_ms < self.spawn_interval_floor_ms {
            return Err(TuningError::invalid(
                "spawn_interval_initial_ms",
                "must be >= spawn_interval_floor_ms",
            ));
        }
        if !(self.spawn_interval_step_ms >= 0.0) {
            return Err(TuningError::invalid("spawn_interval_step_ms", "must be >= 0"));
        }
        if self.spawn_y_min > self.spawn_y_max {
            return Err(TuningError::invalid("spawn_y_min", "must be <= spawn_y_max"));
        }
        if !(0.0..=1.0).contains(&self.bomb_chance) {
            return Err(TuningError::invalid("bomb_chance", "must be within [0, 1]"));
        }
        if !(self.block_size > 0.0 && self.bomb_radius > 0.0) {
            return Err(TuningError::invalid("block_size", "body sizes must be positive"));
        }
        if !(self.block_base_density > 0.0 && self.bomb_density > 0.0) {
            return Err(TuningError::invalid("block_base_density", "densities must be positive"));
        }
        if !(self.explosion_radius > 0.0) {
            return Err(TuningError::invalid("explosion_radius", "must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert!((tuning.warning_angle() - std::f32::consts::FRAC_PI_6).abs() < 1e-6);
        assert!((tuning.max_angle() - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "player_speed": 120.0, "bomb_chance": 0.0 }"#)
            .expect("partial tuning should parse");
        assert_eq!(tuning.player_speed, 120.0);
        assert_eq!(tuning.bomb_chance, 0.0);
        assert_eq!(tuning.explosion_radius, 200.0);
    }

    #[test]
    fn test_rejects_inverted_angles() {
        let err = Tuning::from_json(r#"{ "warning_angle_deg": 70.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "max_angle_deg", .. }));
    }

    #[test]
    fn test_rejects_initial_interval_below_floor() {
        let tuning = Tuning {
            spawn_interval_initial_ms: 100.0,
            ..Default::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::Invalid { field: "spawn_interval_initial_ms", .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_json_roundtrip_preserves_flag() {
        let tuning = Tuning {
            bomb_ends_batch: true,
            ..Default::default()
        };
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }
}
