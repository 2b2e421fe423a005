//! Physical forces acting on the ball.
//!
//! This module implements the `ForceModel` trait for tennis ball flight:
//!
//! - **Gravity**: Constant downward acceleration
//! - **Drag**: Horizontal air resistance proportional to vx·|vx|
//! - **Magnus**: Spin-induced vertical curvature
//!
//! ## The Magnus Effect
//!
//! ```text
//! Topspin (spin > 0):
//!     ↓ Magnus term pushes ball DOWN
//!     Ball dips earlier than gravity alone
//!
//! Backspin (spin < 0):
//!     ↑ Magnus term pushes ball UP
//!     Ball floats and carries further
//! ```

use crate::types::{constants, Vec2};

/// Source of accelerations for the integrator.
pub trait ForceModel {
    /// Downward acceleration magnitude (m/s²).
    fn gravity(&self) -> f64;

    /// Downward acceleration from spin (m/s²). Negative values lift the ball.
    fn magnus_acceleration(&self, vel: Vec2, spin_rpm: f64) -> f64;

    /// Horizontal acceleration from air resistance (m/s²).
    fn drag_acceleration(&self, vx: f64) -> f64;
}

/// Complete force model for a tennis ball.
#[derive(Debug, Clone, PartialEq)]
pub struct TennisForces {
    pub gravity: f64,
    /// Quadratic drag coefficient (kg/m)
    pub air_drag_coefficient: f64,
    /// Magnus lift coefficient k in `k·ω·|v| / m`
    pub magnus_coefficient: f64,
    pub mass: f64,

    /// Enable/disable individual forces (useful for testing)
    pub enable_gravity: bool,
    pub enable_drag: bool,
    pub enable_magnus: bool,
}

impl Default for TennisForces {
    fn default() -> Self {
        Self {
            gravity: constants::GRAVITY,
            air_drag_coefficient: 0.001,
            magnus_coefficient: 0.00004,
            mass: constants::BALL_MASS,
            enable_gravity: true,
            enable_drag: true,
            enable_magnus: true,
        }
    }
}

impl TennisForces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default model with a custom drag coefficient.
    pub fn with_drag(air_drag_coefficient: f64) -> Self {
        Self {
            air_drag_coefficient,
            ..Self::default()
        }
    }

    /// Create a force model with only gravity (for testing).
    pub fn gravity_only() -> Self {
        Self {
            enable_drag: false,
            enable_magnus: false,
            ..Self::default()
        }
    }
}

impl ForceModel for TennisForces {
    fn gravity(&self) -> f64 {
        if self.enable_gravity {
            self.gravity
        } else {
            0.0
        }
    }

    /// `k·ω·speed / m`, suppressed for a nearly stationary ball.
    fn magnus_acceleration(&self, vel: Vec2, spin_rpm: f64) -> f64 {
        if !self.enable_magnus {
            return 0.0;
        }
        let speed = vel.magnitude();
        if speed <= constants::MAGNUS_MIN_SPEED {
            return 0.0;
        }
        let omega = spin_rpm * 2.0 * std::f64::consts::PI / 60.0;
        self.magnus_coefficient * omega * speed / self.mass
    }

    fn drag_acceleration(&self, vx: f64) -> f64 {
        if !self.enable_drag {
            return 0.0;
        }
        -self.air_drag_coefficient * vx * vx.abs() / self.mass
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_only() {
        let forces = TennisForces::gravity_only();
        let vel = Vec2::new(20.0, 5.0);

        assert!((forces.gravity() - constants::GRAVITY).abs() < constants::EPSILON);
        assert_eq!(forces.magnus_acceleration(vel, 3000.0), 0.0);
        assert_eq!(forces.drag_acceleration(vel.x), 0.0);
    }

    #[test]
    fn test_drag_opposes_motion() {
        let forces = TennisForces::default();

        assert!(forces.drag_acceleration(10.0) < 0.0);
        assert!(forces.drag_acceleration(-10.0) > 0.0);
        assert_eq!(forces.drag_acceleration(0.0), 0.0);
    }

    #[test]
    fn test_drag_quadratic_in_speed() {
        let forces = TennisForces::default();

        let slow = forces.drag_acceleration(5.0);
        let fast = forces.drag_acceleration(20.0);

        // 4x speed gives 16x drag
        assert!(
            (fast / slow - 16.0).abs() < 1e-9,
            "Expected ratio 16, got {}",
            fast / slow
        );
    }

    #[test]
    fn test_topspin_pushes_down_backspin_lifts() {
        let forces = TennisForces::default();
        let vel = Vec2::new(20.0, 0.0);

        let top = forces.magnus_acceleration(vel, 2000.0);
        let back = forces.magnus_acceleration(vel, -2000.0);

        assert!(top > 0.0, "Topspin should add downward acceleration, got {}", top);
        assert!(back < 0.0, "Backspin should lift, got {}", back);
        assert!((top + back).abs() < 1e-12);
    }

    #[test]
    fn test_magnus_suppressed_at_low_speed() {
        let forces = TennisForces::default();

        assert_eq!(forces.magnus_acceleration(Vec2::new(0.05, 0.05), 5000.0), 0.0);
        assert_eq!(forces.magnus_acceleration(Vec2::new(0.1, 0.0), 5000.0), 0.0);
        assert!(forces.magnus_acceleration(Vec2::new(0.2, 0.0), 5000.0) > 0.0);
    }
}
