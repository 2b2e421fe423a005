//! Main orchestrator: one court view, its shots and the receiving player.
//!
//! Per fixed tick:
//!
//! ```text
//! for each shot:
//!   Flying            -> integrate, net/ground/bounds checks,
//!                        player contact (may block on the responder),
//!                        observe stop / exit
//!   WaitingToRelaunch -> count down, serve a random shot on expiry
//!   otherwise         -> nothing
//! ```
//!
//! The ball integrates with `time_step * visual_pace`; the player and the
//! relaunch timer use the raw `time_step`.

use rand::rngs::StdRng;
use rand::SeedableRng;

use log::info;

use crate::collision::{CollisionDetector, CollisionResolver};
use crate::config::SimulationConfig;
use crate::forces::TennisForces;
use crate::lifecycle::{Shot, ShotPhase};
use crate::materials::SurfaceCatalog;
use crate::player::{PlayerContact, PlayerInteractionController, PlayerMove, ReturnShotResponder};
use crate::types::{CourtGeometry, CourtType, Lifecycle, ShotParameters, Vec2};

/// Which shots are on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourtMode {
    /// One ball per surface side by side, no player.
    Comparison,
    /// A single ball on one surface against the receiving player.
    Rally(CourtType),
}

/// Something that happened to a shot during a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotEventKind {
    NetContact { height: f64 },
    Bounce { count: u32, rebound_vy: f64 },
    PlayerContact(PlayerContact),
    CameToRest,
    WentOutOfBounds,
    Relaunched(ShotParameters),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotEvent {
    /// Index into [`Simulation::shots`].
    pub shot: usize,
    pub court: CourtType,
    /// Simulation clock when it happened.
    pub time: f64,
    pub kind: ShotEventKind,
}

/// A single-threaded simulation of one court view.
pub struct Simulation {
    config: SimulationConfig,
    geometry: CourtGeometry,
    catalog: SurfaceCatalog,
    mode: CourtMode,
    shots: Vec<Shot>,
    player: PlayerInteractionController,
    forces: TennisForces,
    detector: CollisionDetector,
    resolver: CollisionResolver,
    rng: StdRng,
    time: f64,
}

impl Simulation {
    /// Starts in [`CourtMode::Comparison`] with every shot idle.
    pub fn new(config: SimulationConfig, catalog: SurfaceCatalog, seed: u64) -> Self {
        let config = config.sanitized();
        let geometry = CourtGeometry::STANDARD;
        let mut sim = Self {
            player: PlayerInteractionController::new(&config, &geometry),
            forces: config.forces(),
            detector: CollisionDetector::new(geometry),
            resolver: CollisionResolver::default(),
            rng: StdRng::seed_from_u64(seed),
            shots: Vec::new(),
            mode: CourtMode::Comparison,
            time: 0.0,
            config,
            geometry,
            catalog,
        };
        sim.set_mode(CourtMode::Comparison);
        sim
    }

    /// Replace the collision resolver (e.g. to remove net noise).
    pub fn with_resolver(mut self, resolver: CollisionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn geometry(&self) -> &CourtGeometry {
        &self.geometry
    }

    pub fn mode(&self) -> CourtMode {
        self.mode
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub fn player(&self) -> &PlayerInteractionController {
        &self.player
    }

    /// Seconds of raw simulation clock since the last reset.
    pub fn elapsed(&self) -> f64 {
        self.time
    }

    /// Switch which shots are active. Every shot starts over idle.
    pub fn set_mode(&mut self, mode: CourtMode) {
        self.mode = mode;
        self.shots = match mode {
            CourtMode::Comparison => self
                .catalog
                .iter()
                .map(|surface| Shot::new(surface.clone(), &self.geometry))
                .collect(),
            CourtMode::Rally(court) => vec![Shot::new(self.catalog.get(court), &self.geometry)],
        };
        self.time = 0.0;
        info!("mode set to {:?} ({} shots)", mode, self.shots.len());
    }

    /// Serve every active shot with `params`.
    pub fn launch(&mut self, params: &ShotParameters) {
        for shot in &mut self.shots {
            shot.launch(params, &self.geometry);
        }
        info!(
            "launch force={:.0}N angle={:.0}° spin={:.0}rpm",
            params.force, params.angle, params.spin
        );
    }

    /// Serve with the configured default shot.
    pub fn launch_default(&mut self) {
        let params = self.config.default_shot;
        self.launch(&params);
    }

    /// Release every ball from rest at `height`, a quarter of the way down the court.
    pub fn drop_all(&mut self, height: f64) {
        let pos = Vec2::new(self.geometry.length / 4.0, height.max(0.0));
        for shot in &mut self.shots {
            shot.drop_from(pos);
        }
    }

    /// Every shot back to idle; pending relaunches are dropped.
    pub fn reset(&mut self) {
        for shot in &mut self.shots {
            shot.reset(&self.geometry);
        }
        self.time = 0.0;
    }

    /// Move the player by one raw (unscaled) tick.
    pub fn move_player(&mut self, command: PlayerMove) {
        self.player.apply(command, self.config.time_step);
    }

    /// No shot is in flight or waiting on the player.
    pub fn is_settled(&self) -> bool {
        self.shots
            .iter()
            .all(|shot| !matches!(shot.phase(), ShotPhase::Flying | ShotPhase::Paused))
    }

    /// Advance one fixed tick.
    pub fn step(&mut self, responder: &mut dyn ReturnShotResponder) -> Vec<ShotEvent> {
        let dt = self.config.time_step;
        let ball_dt = self.config.ball_step();
        let rally = matches!(self.mode, CourtMode::Rally(_));
        let auto_relaunch = rally && self.config.auto_relaunch;
        let defaults = self.config.return_defaults();
        let limits = self.config.return_limits();

        self.time += dt;
        let time = self.time;
        let mut events = Vec::new();

        for (index, shot) in self.shots.iter_mut().enumerate() {
            let court = shot.surface().court;
            let mut push = |kind| {
                events.push(ShotEvent {
                    shot: index,
                    court,
                    time,
                    kind,
                })
            };

            match shot.phase() {
                ShotPhase::Flying => {
                    let collisions = shot.advance(
                        &self.forces,
                        &self.detector,
                        &self.resolver,
                        ball_dt,
                        &mut self.rng,
                    );
                    if let Some(point) = collisions.net {
                        push(ShotEventKind::NetContact { height: point.y });
                    }
                    if let Some(bounce) = collisions.bounce {
                        push(ShotEventKind::Bounce {
                            count: shot.ball().bounce_count,
                            rebound_vy: bounce.rebound_vy,
                        });
                    }

                    if rally {
                        if let Some(contact) =
                            self.player
                                .poll_contact(shot, responder, &defaults, &limits)
                        {
                            push(ShotEventKind::PlayerContact(contact));
                        }
                    }

                    match shot.observe_terminal(auto_relaunch, self.config.relaunch_delay) {
                        Some(Lifecycle::AtRest) => push(ShotEventKind::CameToRest),
                        Some(Lifecycle::OutOfBounds) => push(ShotEventKind::WentOutOfBounds),
                        _ => {}
                    }
                }
                ShotPhase::WaitingToRelaunch { .. } => {
                    if let Some(params) = shot.tick_relaunch(dt, &mut self.rng, &self.geometry) {
                        push(ShotEventKind::Relaunched(params));
                    }
                }
                ShotPhase::Idle | ShotPhase::Paused | ShotPhase::Finished(_) => {}
            }
        }

        events
    }

    /// Run `ticks` steps and collect their events.
    pub fn run(&mut self, ticks: usize, responder: &mut dyn ReturnShotResponder) -> Vec<ShotEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(self.step(responder));
        }
        events
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{DefaultsResponder, ScriptedResponder};

    fn sim() -> Simulation {
        Simulation::new(SimulationConfig::default(), SurfaceCatalog::standard(), 11)
            .with_resolver(CollisionResolver::without_noise())
    }

    fn rally(court: CourtType) -> Simulation {
        let mut sim = sim();
        sim.set_mode(CourtMode::Rally(court));
        sim
    }

    fn first<'a>(events: &'a [ShotEvent], pred: impl Fn(&ShotEventKind) -> bool) -> Option<&'a ShotEvent> {
        events.iter().find(|event| pred(&event.kind))
    }

    #[test]
    fn test_comparison_drop_settles_every_surface() {
        let mut sim = sim();
        sim.drop_all(2.0);
        let mut responder = DefaultsResponder;

        let mut events = Vec::new();
        let mut ticks = 0;
        while !sim.is_settled() && ticks < 10_000 {
            events.extend(sim.step(&mut responder));
            ticks += 1;
        }

        assert!(sim.is_settled(), "Drop test should finish");
        let rested = events
            .iter()
            .filter(|e| e.kind == ShotEventKind::CameToRest)
            .count();
        assert_eq!(rested, 4);
        for shot in sim.shots() {
            assert_eq!(shot.phase(), ShotPhase::Finished(Lifecycle::AtRest));
            assert!(shot.ball().bounce_count <= 11);
            assert_eq!(shot.ball().vel, Vec2::ZERO);
            assert!(shot.ball().bounces.len() <= 3);
        }

        // No relaunch in comparison mode
        assert!(sim.run(600, &mut responder).is_empty());
    }

    #[test]
    fn test_higher_restitution_bounces_higher() {
        let mut sim = sim();
        sim.drop_all(2.0);
        let mut responder = DefaultsResponder;

        let mut peaks = [0.0_f64; 4];
        for _ in 0..240 {
            sim.step(&mut responder);
            for (peak, shot) in peaks.iter_mut().zip(sim.shots()) {
                if shot.ball().bounce_count == 1 {
                    *peak = peak.max(shot.ball().pos.y);
                }
            }
        }

        let index = |court: CourtType| CourtType::ALL.iter().position(|c| *c == court).unwrap();
        let clay = peaks[index(CourtType::RolandGarrosClay)];
        let grass = peaks[index(CourtType::WimbledonGrass)];
        assert!(clay > grass, "clay peak {} should beat grass peak {}", clay, grass);
    }

    #[test]
    fn test_rally_cancel_then_relaunch() {
        let mut sim = rally(CourtType::RolandGarrosClay);
        sim.launch_default();
        let mut responder = ScriptedResponder::new([None]);

        let events = sim.run(2000, &mut responder);

        let contact = first(&events, |k| matches!(k, ShotEventKind::PlayerContact(_)));
        assert!(contact.is_some(), "Default serve should reach the player");
        assert_eq!(
            contact.unwrap().kind,
            ShotEventKind::PlayerContact(PlayerContact::Cancelled)
        );

        let rest = first(&events, |k| *k == ShotEventKind::CameToRest).expect("ball should stop");
        let relaunch = first(&events, |k| matches!(k, ShotEventKind::Relaunched(_)))
            .expect("ball should be served again");
        let delay = relaunch.time - rest.time;
        assert!(
            (delay - 2.0).abs() <= sim.config().time_step + 1e-9,
            "relaunch {} s after rest",
            delay
        );
    }

    #[test]
    fn test_rally_return_leaves_court() {
        let mut sim = rally(CourtType::UsOpenHard);
        sim.launch_default();
        let mut responder = ScriptedResponder::new([Some(ShotParameters::new(300.0, 20.0, 0.0))]);

        let mut events = Vec::new();
        for _ in 0..1200 {
            events.extend(sim.step(&mut responder));
            if events.iter().any(|e| e.kind == ShotEventKind::WentOutOfBounds) {
                break;
            }
        }

        assert!(first(&events, |k| matches!(
            k,
            ShotEventKind::PlayerContact(PlayerContact::Returned(_))
        ))
        .is_some());
        let exit = first(&events, |k| *k == ShotEventKind::WentOutOfBounds);
        assert!(exit.is_some(), "Return should travel back past the left edge");
        assert!(sim.shots()[0].ball().pos.x < 0.0);
        assert!(matches!(
            sim.shots()[0].phase(),
            ShotPhase::WaitingToRelaunch { .. }
        ));
    }

    #[test]
    fn test_reset_cancels_relaunch() {
        let mut sim = rally(CourtType::WimbledonGrass);
        sim.launch_default();
        let mut responder = ScriptedResponder::new([Some(ShotParameters::new(300.0, 20.0, 0.0))]);

        while !matches!(sim.shots()[0].phase(), ShotPhase::WaitingToRelaunch { .. }) {
            sim.step(&mut responder);
            assert!(sim.elapsed() < 20.0, "shot never finished");
        }
        sim.reset();

        let events = sim.run(600, &mut responder);
        assert!(events.is_empty(), "unexpected events after reset: {:?}", events);
        assert_eq!(sim.shots()[0].phase(), ShotPhase::Idle);
    }

    #[test]
    fn test_visual_pace_scales_ball_only() {
        let config = SimulationConfig {
            visual_pace: 0.5,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(config, SurfaceCatalog::standard(), 1);
        sim.set_mode(CourtMode::Rally(CourtType::UsOpenHard));
        sim.launch_default();
        let start = sim.player().position();

        for _ in 0..12 {
            sim.step(&mut DefaultsResponder);
            sim.move_player(PlayerMove::Left);
        }

        let dt = sim.config().time_step;
        assert!((sim.shots()[0].ball().elapsed - 12.0 * dt * 0.5).abs() < 1e-9);
        assert!((start - sim.player().position() - 12.0 * dt * 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_mode_switch_resets_shots() {
        let mut sim = sim();
        assert_eq!(sim.shots().len(), 4);
        sim.launch_default();
        sim.step(&mut DefaultsResponder);

        sim.set_mode(CourtMode::Rally(CourtType::LaverCupBlack));

        assert_eq!(sim.shots().len(), 1);
        assert_eq!(sim.shots()[0].surface().court, CourtType::LaverCupBlack);
        assert_eq!(sim.shots()[0].phase(), ShotPhase::Idle);
        assert!(sim.is_settled());
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut sim = Simulation::new(SimulationConfig::default(), SurfaceCatalog::standard(), 99);
            sim.set_mode(CourtMode::Rally(CourtType::RolandGarrosClay));
            sim.launch(&ShotParameters::new(150.0, 10.0, 2000.0));
            sim.run(3000, &mut ScriptedResponder::default());
            sim.shots()[0].ball().clone()
        };
        assert_eq!(run(), run());
    }
}
