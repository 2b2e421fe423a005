//! Shot lifecycle state machine.
//!
//! ```text
//!            launch                     ball stops / leaves court
//!   Idle ───────────▶ Flying ───────────────────────────────▶ WaitingToRelaunch
//!     ▲                │  ▲                                        │
//!     │         player │  │ resume                     timer ends │ random serve
//!     │        contact ▼  │                                        │
//!     │               Paused                 Flying ◀──────────────┘
//!     │
//!     └──── reset (from any state, cancels a pending relaunch)
//! ```
//!
//! When automatic relaunch is off, a finished ball parks in `Finished`.

use std::sync::Arc;

use log::info;
use rand::Rng;

use crate::collision::{CollisionDetector, CollisionResolver, StepCollisions};
use crate::forces::ForceModel;
use crate::integrator::SemiImplicitEuler;
use crate::types::{BallState, CourtGeometry, Lifecycle, ShotParameters, SurfaceProfile, Vec2};

/// Where a shot is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotPhase {
    Idle,
    Flying,
    /// Frozen while the return-shot collaborator decides.
    Paused,
    /// Ball stopped or left the court; no relaunch scheduled.
    Finished(Lifecycle),
    /// Ball finished; a random serve follows when `remaining` reaches zero.
    WaitingToRelaunch { remaining: f64, after: Lifecycle },
}

impl ShotPhase {
    /// How the last ball ended, while the shot is finished or waiting to relaunch.
    pub fn outcome(&self) -> Option<Lifecycle> {
        match *self {
            ShotPhase::Finished(after) | ShotPhase::WaitingToRelaunch { after, .. } => Some(after),
            ShotPhase::Idle | ShotPhase::Flying | ShotPhase::Paused => None,
        }
    }
}

/// One ball on one surface, plus the state machine that drives it.
#[derive(Debug, Clone)]
pub struct Shot {
    surface: Arc<SurfaceProfile>,
    ball: BallState,
    phase: ShotPhase,
}

impl Shot {
    /// An idle shot resting at the launch position.
    pub fn new(surface: Arc<SurfaceProfile>, geometry: &CourtGeometry) -> Self {
        Self {
            surface,
            ball: BallState::at_rest(geometry.launch_pos),
            phase: ShotPhase::Idle,
        }
    }

    pub fn surface(&self) -> &SurfaceProfile {
        &self.surface
    }

    pub fn ball(&self) -> &BallState {
        &self.ball
    }

    pub fn ball_mut(&mut self) -> &mut BallState {
        &mut self.ball
    }

    pub fn phase(&self) -> ShotPhase {
        self.phase
    }

    pub fn is_flying(&self) -> bool {
        self.phase == ShotPhase::Flying
    }

    /// Serve from the launch position. Replaces whatever the shot was doing.
    pub fn launch(&mut self, params: &ShotParameters, geometry: &CourtGeometry) {
        self.ball
            .reset(geometry.launch_pos, params.launch_velocity(), params.spin);
        self.phase = ShotPhase::Flying;
    }

    /// Release the ball from rest at `pos`.
    pub fn drop_from(&mut self, pos: Vec2) {
        self.ball.reset(pos, Vec2::ZERO, 0.0);
        self.phase = ShotPhase::Flying;
    }

    /// Back to `Idle` with no history. Cancels any pending relaunch.
    pub fn reset(&mut self, geometry: &CourtGeometry) {
        self.ball = BallState::at_rest(geometry.launch_pos);
        self.phase = ShotPhase::Idle;
    }

    /// Flying -> Paused. Returns false in any other phase.
    pub fn pause(&mut self) -> bool {
        if self.phase == ShotPhase::Flying {
            self.phase = ShotPhase::Paused;
            true
        } else {
            false
        }
    }

    /// Paused -> Flying.
    pub fn resume(&mut self) {
        if self.phase == ShotPhase::Paused {
            self.phase = ShotPhase::Flying;
        }
    }

    /// Integrate one ball step and run the collision checks. Only a `Flying` shot moves.
    pub fn advance<F: ForceModel, R: Rng + ?Sized>(
        &mut self,
        forces: &F,
        detector: &CollisionDetector,
        resolver: &CollisionResolver,
        dt: f64,
        rng: &mut R,
    ) -> StepCollisions {
        if self.phase != ShotPhase::Flying {
            return StepCollisions::default();
        }
        let prev = self.ball.pos;
        SemiImplicitEuler::advance(&mut self.ball, forces, dt);
        resolver.resolve_step(detector, &mut self.ball, prev, &self.surface, rng)
    }

    /// Move a flying shot whose ball has stopped or left the court out of `Flying`.
    ///
    /// Returns the ball's terminal lifecycle when the transition happens.
    pub fn observe_terminal(&mut self, auto_relaunch: bool, relaunch_delay: f64) -> Option<Lifecycle> {
        if self.phase != ShotPhase::Flying || self.ball.is_flying() {
            return None;
        }
        let after = self.ball.lifecycle;
        self.phase = if auto_relaunch {
            ShotPhase::WaitingToRelaunch {
                remaining: relaunch_delay,
                after,
            }
        } else {
            ShotPhase::Finished(after)
        };
        info!(
            "{}: ball {:?} after {} bounces at x={:.2}",
            self.surface.name, after, self.ball.bounce_count, self.ball.pos.x
        );
        Some(after)
    }

    /// Count down a pending relaunch; serve a random shot when it expires.
    pub fn tick_relaunch<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        rng: &mut R,
        geometry: &CourtGeometry,
    ) -> Option<ShotParameters> {
        let ShotPhase::WaitingToRelaunch { remaining, after } = self.phase else {
            return None;
        };

        let remaining = remaining - dt;
        if remaining > 0.0 {
            self.phase = ShotPhase::WaitingToRelaunch { remaining, after };
            return None;
        }

        let params = ShotParameters::random_serve(rng);
        self.launch(&params, geometry);
        info!(
            "{}: relaunch force={:.0}N angle={:.0}° spin={:.0}rpm",
            self.surface.name, params.force, params.angle, params.spin
        );
        Some(params)
    }
}

// =============================================================================
// Tests
// =============================================================================
