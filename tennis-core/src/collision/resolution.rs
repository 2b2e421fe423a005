//! Collision resolution for the court.
//!
//! ## Net Model
//!
//! The net absorbs a fixed fraction of velocity and spin. The ball is not
//! reflected: it keeps a little forward motion and dribbles over or into the
//! net under gravity, with a small random vertical kick.
//!
//! ## Ground Model
//!
//! ```text
//! vy'   = -vy * e            (surface restitution)
//! vx'   = vx * 0.8 + (spin / 5000) * 2.0
//! spin' = spin * 0.7
//! ```
//!
//! The surface `friction` value does not enter the bounce; horizontal damping
//! is the same on every court.

use log::debug;
use rand::Rng;

use crate::collision::detection::{CollisionDetector, NetCrossing};
use crate::types::{constants, BallState, SurfaceProfile, Vec2};

/// What a ground contact did to the ball.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundBounce {
    /// Vertical velocity just before contact (negative when falling).
    pub impact_vy: f64,
    /// Vertical velocity after restitution.
    pub rebound_vy: f64,
    /// Rebound too weak, or too many bounces: the ball should stop.
    pub came_to_rest: bool,
}

/// Everything the collision pass did during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepCollisions {
    pub net: Option<Vec2>,
    pub bounce: Option<GroundBounce>,
    pub came_to_rest: bool,
    pub out_of_bounds: bool,
}

/// Collision resolver for the court.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionResolver {
    /// Fraction of velocity and spin removed by the net
    pub net_absorption: f64,
    /// Amplitude of the uniform vertical kick after a net contact (m/s)
    pub net_noise: f64,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self {
            net_absorption: constants::NET_ABSORPTION,
            net_noise: constants::NET_NOISE,
        }
    }
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver without the random net kick (deterministic).
    pub fn without_noise() -> Self {
        Self {
            net_noise: 0.0,
            ..Self::default()
        }
    }

    /// Run the net, ground and boundary checks for one tick.
    ///
    /// `prev` is the ball position before this tick's integration.
    pub fn resolve_step<R: Rng + ?Sized>(
        &self,
        detector: &CollisionDetector,
        ball: &mut BallState,
        prev: Vec2,
        surface: &SurfaceProfile,
        rng: &mut R,
    ) -> StepCollisions {
        let mut result = StepCollisions::default();
        if !ball.is_flying() {
            return result;
        }

        if let Some(crossing) = detector.detect_net_contact(prev, ball.pos) {
            self.resolve_net(ball, &crossing, rng);
            debug!(
                "net contact at y={:.3} on {}, vx now {:.3}",
                crossing.point.y, surface.name, ball.vel.x
            );
            result.net = Some(crossing.point);
        }

        if detector.detect_ground(ball) {
            let bounce = self.bounce(ball, surface);
            debug!(
                "bounce #{} on {} at t={:.3}s, vy {:.3} -> {:.3}",
                ball.bounce_count, surface.name, ball.elapsed, bounce.impact_vy, bounce.rebound_vy
            );
            result.bounce = Some(bounce);
            result.came_to_rest = bounce.came_to_rest;
        }

        // Leaving the court wins over coming to rest in the same tick
        if detector.is_out_of_bounds(ball) {
            ball.mark_out_of_bounds();
            result.out_of_bounds = true;
            result.came_to_rest = false;
        } else if result.came_to_rest {
            ball.settle();
        }

        result
    }

    /// Apply net absorption at the interpolated crossing point.
    pub fn resolve_net<R: Rng + ?Sized>(
        &self,
        ball: &mut BallState,
        crossing: &NetCrossing,
        rng: &mut R,
    ) {
        let retained = 1.0 - self.net_absorption;

        ball.pos = crossing.point;
        ball.vel = ball.vel * retained;
        ball.spin *= retained;

        if self.net_noise > 0.0 {
            ball.vel.y += rng.gen_range(-self.net_noise..=self.net_noise);
        }

        if ball.vel.x.abs() < constants::NET_DROP_SPEED && ball.vel.y.abs() < constants::NET_DROP_SPEED
        {
            ball.vel.x = 0.0;
        }
    }

    /// Resolve a ground contact, stopping the ball if the rebound is spent.
    pub fn resolve_ground(&self, ball: &mut BallState, surface: &SurfaceProfile) -> GroundBounce {
        let bounce = self.bounce(ball, surface);
        if bounce.came_to_rest {
            ball.settle();
        }
        bounce
    }

    fn bounce(&self, ball: &mut BallState, surface: &SurfaceProfile) -> GroundBounce {
        ball.pos.y = 0.0;
        ball.record_bounce();

        let impact_vy = ball.vel.y;
        ball.vel.y = -impact_vy * surface.restitution;

        ball.vel.x *= constants::GROUND_ROLLING_DAMPING;
        ball.vel.x += (ball.spin / constants::SPIN_KICK_SCALE) * constants::SPIN_KICK_GAIN;
        ball.spin *= constants::GROUND_SPIN_RETENTION;

        ball.bounce_count += 1;

        let came_to_rest =
            ball.vel.y.abs() < constants::REST_SPEED || ball.bounce_count > constants::MAX_BOUNCES;

        GroundBounce {
            impact_vy,
            rebound_vy: ball.vel.y,
            came_to_rest,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
