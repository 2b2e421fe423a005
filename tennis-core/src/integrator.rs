//! Fixed-step integration of ball flight.
//!
//! The integrator is semi-implicit (symplectic) Euler: velocities are updated
//! first and the new velocities move the ball.
//!
//! ## Algorithm
//!
//! ```text
//! 1. t  += dt
//! 2. vy -= g*dt
//! 3. vy -= magnus(v, spin)*dt      // skipped when |v| <= 0.1 m/s
//! 4. vx += drag(vx)*dt
//! 5. y  += vy*dt,  x += vx*dt      // updated velocities
//! 6. record (t, y)
//! ```

use crate::forces::{ForceModel, TennisForces};
use crate::types::BallState;

/// Semi-implicit Euler integrator for ball flight.
pub struct SemiImplicitEuler;

impl SemiImplicitEuler {
    /// Advance a flying ball by one time step, in place.
    ///
    /// Balls that are at rest or out of bounds are left untouched.
    pub fn advance<F: ForceModel>(ball: &mut BallState, forces: &F, dt: f64) {
        if !ball.is_flying() {
            return;
        }

        ball.elapsed += dt;

        ball.vel.y -= forces.gravity() * dt;
        ball.vel.y -= forces.magnus_acceleration(ball.vel, ball.spin) * dt;
        ball.vel.x += forces.drag_acceleration(ball.vel.x) * dt;

        ball.pos.y += ball.vel.y * dt;
        ball.pos.x += ball.vel.x * dt;

        ball.record_sample();
    }

    /// Advance by `steps` fixed steps of `dt`.
    pub fn advance_n<F: ForceModel>(ball: &mut BallState, forces: &F, dt: f64, steps: usize) {
        for _ in 0..steps {
            Self::advance(ball, forces, dt);
        }
    }
}

/// Advance `ball` by `dt` under gravity, Magnus lift and the given drag coefficient.
pub fn advance(ball: &mut BallState, dt: f64, air_drag_coefficient: f64) {
    SemiImplicitEuler::advance(ball, &TennisForces::with_drag(air_drag_coefficient), dt);
}

// =============================================================================
// Tests
// =============================================================================
