//! Simulation configuration and error types.
//!
//! Configuration is read once at startup, from YAML or from defaults, and
//! handed to the simulation by value. Missing keys fall back to defaults, so
//! a file only needs the values it changes:
//!
//! ```yaml
//! time_step: 0.0083
//! visual_pace: 0.5
//! default_shot: { force: 300.0, angle: 20.0, spin: 1500.0 }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::forces::TennisForces;
use crate::types::{constants, ShotLimits, ShotParameters};

/// Errors raised while loading configuration or surface files.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A return shot outside the allowed limits.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ShotError {
    #[error("force {value} N is outside [{min}, {max}]")]
    ForceOutOfRange { value: f64, min: f64, max: f64 },

    #[error("angle {value}° is outside [{min}, {max}]")]
    AngleOutOfRange { value: f64, min: f64, max: f64 },

    #[error("spin {value} RPM is outside [{min}, {max}]")]
    SpinOutOfRange { value: f64, min: f64, max: f64 },
}

/// Increments front ends use to nudge the offered shot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotSteps {
    pub force: f64,
    pub angle: f64,
    pub spin: f64,
}

/// Read-only settings for one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed tick length in seconds (~120 Hz)
    pub time_step: f64,
    /// Multiplier on the ball's integration step only
    pub visual_pace: f64,
    pub gravity: f64,
    pub ball_mass: f64,
    pub air_drag_coefficient: f64,
    pub magnus_coefficient: f64,

    /// Shot offered to the player and used for manual launches
    pub default_shot: ShotParameters,
    pub force_step: f64,
    pub angle_step: f64,
    pub spin_step: f64,
    pub min_spin: f64,
    pub max_spin: f64,

    /// Player movement speed (m/s)
    pub player_speed: f64,
    pub player_radius: f64,
    /// Player reach as a multiple of the net height
    pub player_reach_factor: f64,
    /// Starting x of the player; `None` puts them three quarters down the court
    pub player_start_x: Option<f64>,

    /// Seconds between a ball finishing and the next automatic serve
    pub relaunch_delay: f64,
    pub auto_relaunch: bool,

    /// Height for the surface comparison drop
    pub drop_height: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 120.0,
            visual_pace: 1.0,
            gravity: constants::GRAVITY,
            ball_mass: constants::BALL_MASS,
            air_drag_coefficient: 0.001,
            magnus_coefficient: 0.00004,
            default_shot: ShotParameters::default(),
            force_step: 10.0,
            angle_step: 1.0,
            spin_step: 100.0,
            min_spin: ShotLimits::RETURN.min_spin,
            max_spin: ShotLimits::RETURN.max_spin,
            player_speed: 5.0,
            player_radius: 0.3,
            player_reach_factor: 2.5,
            player_start_x: None,
            relaunch_delay: 2.0,
            auto_relaunch: true,
            drop_height: 2.0,
        }
    }
}

impl SimulationConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Range-clamp every value at the point of consumption.
    ///
    /// Values come from trusted static configuration, so out-of-range entries
    /// are pulled back to the nearest sensible value instead of rejected.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            self.time_step = defaults.time_step;
        }
        if !(self.visual_pace.is_finite() && self.visual_pace > 0.0) {
            self.visual_pace = defaults.visual_pace;
        }
        if !(self.ball_mass.is_finite() && self.ball_mass > 0.0) {
            self.ball_mass = defaults.ball_mass;
        }
        self.gravity = self.gravity.max(0.0);
        self.air_drag_coefficient = self.air_drag_coefficient.max(0.0);
        self.magnus_coefficient = self.magnus_coefficient.max(0.0);

        if self.min_spin > self.max_spin {
            std::mem::swap(&mut self.min_spin, &mut self.max_spin);
        }

        self.default_shot = ShotParameters {
            force: self.default_shot.force.clamp(0.0, 1000.0),
            angle: self.default_shot.angle.clamp(0.0, 90.0),
            spin: self.default_shot.spin.clamp(self.min_spin, self.max_spin),
        };
        self.force_step = self.force_step.abs();
        self.angle_step = self.angle_step.abs();
        self.spin_step = self.spin_step.abs();

        self.player_speed = self.player_speed.max(0.0);
        self.player_radius = self.player_radius.max(0.0);
        self.player_reach_factor = self.player_reach_factor.max(0.0);
        self.relaunch_delay = self.relaunch_delay.max(0.0);
        self.drop_height = self.drop_height.max(0.0);
        self
    }

    /// Integration step for the ball: the raw tick scaled by the visual pace.
    pub fn ball_step(&self) -> f64 {
        self.time_step * self.visual_pace
    }

    /// Limits a return shot must satisfy, with the configured spin bounds.
    pub fn return_limits(&self) -> ShotLimits {
        ShotLimits {
            min_spin: self.min_spin,
            max_spin: self.max_spin,
            ..ShotLimits::RETURN
        }
    }

    /// Default shot offered to the return-shot collaborator, pulled inside the return limits.
    pub fn return_defaults(&self) -> ShotParameters {
        self.return_limits().clamp(&self.default_shot)
    }

    pub fn shot_steps(&self) -> ShotSteps {
        ShotSteps {
            force: self.force_step,
            angle: self.angle_step,
            spin: self.spin_step,
        }
    }

    pub fn forces(&self) -> TennisForces {
        TennisForces {
            gravity: self.gravity,
            air_drag_coefficient: self.air_drag_coefficient,
            magnus_coefficient: self.magnus_coefficient,
            mass: self.ball_mass,
            ..TennisForces::default()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;

    fn config_path() -> PathBuf {
        let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(manifest_dir)
            .join("..")
            .join("materials")
            .join("config")
            .join("default.yaml")
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = SimulationConfig::from_yaml_str("visual_pace: 0.5\nplayer_speed: 7.0\n").unwrap();

        assert_eq!(config.visual_pace, 0.5);
        assert_eq!(config.player_speed, 7.0);
        assert_eq!(config.default_shot, ShotParameters::default());
        assert_eq!(config.relaunch_delay, 2.0);
    }

    #[test]
    fn test_load_default_file() {
        let result = SimulationConfig::from_yaml_file(config_path());

        assert!(result.is_ok(), "Should load default.yaml: {:?}", result.err());
        let config = result.unwrap();
        assert!(config.time_step > 0.0);
        assert_eq!(config.default_shot.force, 270.0);
    }

    #[test]
    fn test_missing_file() {
        let result = SimulationConfig::from_yaml_file("does/not/exist.yaml");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = SimulationConfig::from_yaml_str("time_step: [not, a, number]");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_sanitized_clamps() {
        let config = SimulationConfig {
            time_step: -1.0,
            visual_pace: 0.0,
            default_shot: ShotParameters::new(1500.0, 120.0, 20000.0),
            min_spin: 9000.0,
            max_spin: -3000.0,
            ..SimulationConfig::default()
        }
        .sanitized();

        assert_eq!(config.time_step, 1.0 / 120.0);
        assert_eq!(config.visual_pace, 1.0);
        assert_eq!(config.default_shot, ShotParameters::new(1000.0, 90.0, 9000.0));
        assert_eq!((config.min_spin, config.max_spin), (-3000.0, 9000.0));
    }

    #[test]
    fn test_return_defaults_inside_limits() {
        let config = SimulationConfig {
            default_shot: ShotParameters::new(900.0, 85.0, 0.0),
            ..SimulationConfig::default()
        };
        let defaults = config.return_defaults();

        assert!(defaults.validate(&config.return_limits()).is_ok());
        assert_eq!(defaults.force, 600.0);
        assert_eq!(defaults.angle, 75.0);
    }

    #[test]
    fn test_shot_steps_from_yaml() {
        let config = SimulationConfig::from_yaml_str("force_step: -25.0\nspin_step: 250.0\n")
            .unwrap()
            .sanitized();

        assert_eq!(
            config.shot_steps(),
            ShotSteps {
                force: 25.0,
                angle: 1.0,
                spin: 250.0
            }
        );
    }

    #[test]
    fn test_ball_step_scaled_by_pace() {
        let config = SimulationConfig {
            time_step: 0.01,
            visual_pace: 0.5,
            ..SimulationConfig::default()
        };
        assert!((config.ball_step() - 0.005).abs() < 1e-12);
    }
}
