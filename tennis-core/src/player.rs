//! The receiving player and the return-shot collaborator.
//!
//! When a flying ball reaches the player the shot is paused and a
//! [`ReturnShotResponder`] is asked, synchronously, how to hit it back. The
//! tick loop does not advance until the responder answers.

use std::collections::VecDeque;

use log::{info, warn};

use crate::config::SimulationConfig;
use crate::lifecycle::Shot;
use crate::types::{constants, BallState, CourtGeometry, ShotLimits, ShotParameters, Vec2};

/// Answer from the return-shot collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnOutcome {
    /// A validated return shot.
    Accepted(ShotParameters),
    Cancelled,
}

/// Supplies human-chosen return shots.
///
/// Implementations must validate input against `limits` and re-prompt rather
/// than return an out-of-range `Accepted`.
pub trait ReturnShotResponder {
    fn request_return_shot(
        &mut self,
        defaults: &ShotParameters,
        limits: &ShotLimits,
    ) -> ReturnOutcome;
}

/// Accepts whatever defaults it is offered.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsResponder;

impl ReturnShotResponder for DefaultsResponder {
    fn request_return_shot(
        &mut self,
        defaults: &ShotParameters,
        _limits: &ShotLimits,
    ) -> ReturnOutcome {
        ReturnOutcome::Accepted(*defaults)
    }
}

/// Replays a fixed list of answers, for tests and scripted runs.
///
/// `None` entries cancel. Out-of-range entries are treated as rejected input
/// and the next entry is tried. An exhausted script cancels.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResponder {
    script: VecDeque<Option<ShotParameters>>,
    prompts: usize,
}

impl ScriptedResponder {
    pub fn new<I: IntoIterator<Item = Option<ShotParameters>>>(script: I) -> Self {
        Self {
            script: script.into_iter().collect(),
            prompts: 0,
        }
    }

    /// Number of answers consumed, rejected ones included.
    pub fn prompts(&self) -> usize {
        self.prompts
    }
}

impl ReturnShotResponder for ScriptedResponder {
    fn request_return_shot(
        &mut self,
        _defaults: &ShotParameters,
        limits: &ShotLimits,
    ) -> ReturnOutcome {
        while let Some(entry) = self.script.pop_front() {
            self.prompts += 1;
            let Some(params) = entry else {
                return ReturnOutcome::Cancelled;
            };
            match params.validate(limits) {
                Ok(()) => return ReturnOutcome::Accepted(params),
                Err(e) => warn!("scripted return rejected, re-prompting: {e}"),
            }
        }
        ReturnOutcome::Cancelled
    }
}

/// Discrete movement commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerMove {
    Left,
    Right,
}

/// Result of a player contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerContact {
    Returned(ShotParameters),
    Cancelled,
}

/// Tracks the receiving player and resolves ball contacts.
#[derive(Debug, Clone)]
pub struct PlayerInteractionController {
    position: f64,
    speed: f64,
    radius: f64,
    reach_height: f64,
    ball_radius: f64,
    min_x: f64,
    max_x: f64,
    /// Cleared after a contact until the ball leaves the contact zone.
    armed: bool,
}

impl PlayerInteractionController {
    pub fn new(config: &SimulationConfig, geometry: &CourtGeometry) -> Self {
        let min_x = geometry.net_x;
        let max_x = geometry.length;
        let start = config
            .player_start_x
            .unwrap_or(geometry.net_x + geometry.length / 4.0);
        Self {
            position: start.clamp(min_x, max_x),
            speed: config.player_speed,
            radius: config.player_radius,
            reach_height: config.player_reach_factor * geometry.net_height,
            ball_radius: geometry.ball_radius,
            min_x,
            max_x,
            armed: true,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn reach_height(&self) -> f64 {
        self.reach_height
    }

    pub fn move_left(&mut self, dt: f64) {
        self.position = (self.position - self.speed * dt).clamp(self.min_x, self.max_x);
    }

    pub fn move_right(&mut self, dt: f64) {
        self.position = (self.position + self.speed * dt).clamp(self.min_x, self.max_x);
    }

    pub fn apply(&mut self, command: PlayerMove, dt: f64) {
        match command {
            PlayerMove::Left => self.move_left(dt),
            PlayerMove::Right => self.move_right(dt),
        }
    }

    /// Ball within reach horizontally and between the ground and reach height.
    pub fn check_collision(&self, ball: &BallState) -> bool {
        (ball.pos.x - self.position).abs() <= self.ball_radius + self.radius
            && ball.pos.y >= 0.0
            && ball.pos.y <= self.reach_height
    }

    /// Detect and resolve a contact for a flying shot.
    ///
    /// Pauses the shot, blocks on `responder`, applies the outcome and resumes.
    /// A ball that is still inside the contact zone after a contact is ignored
    /// until it leaves.
    pub fn poll_contact(
        &mut self,
        shot: &mut Shot,
        responder: &mut dyn ReturnShotResponder,
        defaults: &ShotParameters,
        limits: &ShotLimits,
    ) -> Option<PlayerContact> {
        if !shot.is_flying() || !shot.ball().is_flying() {
            return None;
        }
        if !self.check_collision(shot.ball()) {
            self.armed = true;
            return None;
        }
        if !self.armed {
            return None;
        }
        self.armed = false;

        shot.pause();
        let outcome = responder.request_return_shot(defaults, limits);
        let contact = match outcome {
            ReturnOutcome::Accepted(params) => {
                self.apply_return(shot.ball_mut(), &params);
                PlayerContact::Returned(params)
            }
            ReturnOutcome::Cancelled => {
                self.apply_cancel(shot.ball_mut());
                PlayerContact::Cancelled
            }
        };
        shot.resume();

        info!(
            "{}: player contact at x={:.2} -> {:?}",
            shot.surface().name,
            self.position,
            contact
        );
        Some(contact)
    }

    fn apply_return(&self, ball: &mut BallState, params: &ShotParameters) {
        ball.vel = params.return_velocity();
        ball.spin = params.spin;
        ball.pos.x = self.position - constants::CONTACT_NUDGE;
    }

    /// The ball glances off: half speed, reversed, placed just in front of the player.
    fn apply_cancel(&self, ball: &mut BallState) {
        ball.vel = Vec2::new(-ball.vel.x * 0.5, ball.vel.y);
        ball.pos.x = self.position - constants::CONTACT_NUDGE;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ShotPhase;
    use crate::types::SurfaceProfile;
    use std::sync::Arc;

    fn geometry() -> CourtGeometry {
        CourtGeometry::STANDARD
    }

    fn controller() -> PlayerInteractionController {
        PlayerInteractionController::new(&SimulationConfig::default(), &geometry())
    }

    /// A flying shot whose ball sits right on the player.
    fn shot_at_player(player_x: f64) -> Shot {
        let mut shot = Shot::new(Arc::new(SurfaceProfile::us_open_hard()), &geometry());
        shot.launch(&ShotParameters::default(), &geometry());
        let ball = shot.ball_mut();
        ball.pos = Vec2::new(player_x - 0.05, 1.0);
        ball.vel = Vec2::new(8.0, -2.0);
        ball.spin = 400.0;
        shot
    }

    /// Counts how often it is asked.
    struct PhaseProbe {
        answer: ReturnOutcome,
        calls: usize,
    }

    impl ReturnShotResponder for PhaseProbe {
        fn request_return_shot(&mut self, _: &ShotParameters, _: &ShotLimits) -> ReturnOutcome {
            self.calls += 1;
            self.answer
        }
    }

    #[test]
    fn test_collision_requires_reach() {
        let player = controller();
        let x = player.position();
        let mut ball = BallState::new(Vec2::new(x + 0.2, 1.0), Vec2::ZERO, 0.0);
        assert!(player.check_collision(&ball));

        ball.pos.x = x + 0.4;
        assert!(!player.check_collision(&ball), "Too far sideways");

        ball.pos = Vec2::new(x, player.reach_height() + 0.01);
        assert!(!player.check_collision(&ball), "Too high");
    }

    #[test]
    fn test_cancel_bounces_back() {
        let mut player = controller();
        let x = player.position();
        let mut shot = shot_at_player(x);
        let mut responder = ScriptedResponder::new([None]);

        let contact = player.poll_contact(
            &mut shot,
            &mut responder,
            &ShotParameters::default(),
            &ShotLimits::RETURN,
        );

        assert_eq!(contact, Some(PlayerContact::Cancelled));
        assert_eq!(shot.ball().vel.x, -4.0);
        assert_eq!(shot.ball().vel.y, -2.0);
        assert_eq!(shot.ball().pos.x, x - 0.1);
        assert_eq!(shot.phase(), ShotPhase::Flying);
    }

    #[test]
    fn test_accepted_return() {
        let mut player = controller();
        let x = player.position();
        let mut shot = shot_at_player(x);
        let params = ShotParameters::new(600.0, 30.0, -1000.0);
        let mut responder = ScriptedResponder::new([Some(params)]);

        let contact = player.poll_contact(
            &mut shot,
            &mut responder,
            &ShotParameters::default(),
            &ShotLimits::RETURN,
        );

        assert_eq!(contact, Some(PlayerContact::Returned(params)));
        let ball = shot.ball();
        assert!((ball.vel.x + 30.0 * 30f64.to_radians().cos()).abs() < 1e-9);
        assert!((ball.vel.y - 15.0).abs() < 1e-9);
        assert_eq!(ball.spin, -1000.0);
        assert!(ball.pos.x < x);
    }

    #[test]
    fn test_invalid_script_entries_reprompt() {
        let mut responder = ScriptedResponder::new([
            Some(ShotParameters::new(700.0, 10.0, 0.0)),
            Some(ShotParameters::new(100.0, 80.0, 0.0)),
            Some(ShotParameters::new(100.0, 10.0, 500.0)),
        ]);

        let outcome = responder.request_return_shot(&ShotParameters::default(), &ShotLimits::RETURN);

        assert_eq!(
            outcome,
            ReturnOutcome::Accepted(ShotParameters::new(100.0, 10.0, 500.0))
        );
        assert_eq!(responder.prompts(), 3);
        assert_eq!(
            responder.request_return_shot(&ShotParameters::default(), &ShotLimits::RETURN),
            ReturnOutcome::Cancelled,
            "Exhausted script cancels"
        );
    }

    #[test]
    fn test_no_second_contact_until_ball_leaves() {
        let mut player = controller();
        let x = player.position();
        let mut shot = shot_at_player(x);
        let mut probe = PhaseProbe {
            answer: ReturnOutcome::Cancelled,
            calls: 0,
        };
        let defaults = ShotParameters::default();

        player.poll_contact(&mut shot, &mut probe, &defaults, &ShotLimits::RETURN);
        // Still within reach right after the nudge
        assert!(player.check_collision(shot.ball()));
        assert!(player
            .poll_contact(&mut shot, &mut probe, &defaults, &ShotLimits::RETURN)
            .is_none());
        assert_eq!(probe.calls, 1);

        // Leaves the zone, comes back: contact again
        shot.ball_mut().pos.x = x - 2.0;
        assert!(player
            .poll_contact(&mut shot, &mut probe, &defaults, &ShotLimits::RETURN)
            .is_none());
        shot.ball_mut().pos.x = x;
        assert!(player
            .poll_contact(&mut shot, &mut probe, &defaults, &ShotLimits::RETURN)
            .is_some());
        assert_eq!(probe.calls, 2);
    }

    #[test]
    fn test_paused_shot_not_checked() {
        let mut player = controller();
        let mut shot = shot_at_player(player.position());
        shot.pause();
        let mut responder = DefaultsResponder;

        let contact = player.poll_contact(
            &mut shot,
            &mut responder,
            &ShotParameters::default(),
            &ShotLimits::RETURN,
        );
        assert!(contact.is_none());
    }

    #[test]
    fn test_movement_clamped_to_receiving_half() {
        let mut player = controller();
        let court = geometry();

        for _ in 0..1000 {
            player.apply(PlayerMove::Left, 0.01);
        }
        assert_eq!(player.position(), court.net_x);

        for _ in 0..1000 {
            player.apply(PlayerMove::Right, 0.01);
        }
        assert_eq!(player.position(), court.length);
    }

    #[test]
    fn test_movement_rate() {
        let mut player = controller();
        let start = player.position();
        player.move_left(0.1);
        // 5 m/s * 0.1 s
        assert!((start - player.position() - 0.5).abs() < 1e-9);
    }
}
