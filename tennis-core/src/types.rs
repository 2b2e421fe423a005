//! Core types for the court simulation.
//!
//! All units are SI unless noted:
//! - Position: meters (m)
//! - Velocity: meters per second (m/s)
//! - Spin: revolutions per minute (RPM), signed (positive = topspin)
//! - Force: Newtons (N)
//! - Angles: degrees at the API boundary

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use crate::config::ShotError;

// =============================================================================
// Vec2 - 2D Vector
// =============================================================================

/// A 2D vector used for positions and velocities on the court's side view.
///
/// Coordinate system:
/// - X: horizontal distance from the court's left edge (positive toward the receiver)
/// - Y: height above the court surface (positive upward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Builds a vector from a magnitude and an elevation angle in degrees.
    pub fn from_polar_degrees(magnitude: f64, angle_degrees: f64) -> Self {
        let angle = angle_degrees.to_radians();
        Self {
            x: magnitude * angle.cos(),
            y: magnitude * angle.sin(),
        }
    }

    /// Squared magnitude (avoids sqrt for comparisons)
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Magnitude (length) of the vector
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Linear interpolation between two vectors
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        *self + (*other - *self) * t
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
        }
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl Default for Vec2 {
    fn default() -> Self {
        Self::ZERO
    }
}

// =============================================================================
// Ball State
// =============================================================================

/// Whether a ball is still being integrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Flying,
    AtRest,
    OutOfBounds,
}

/// A (time, height) pair. Used for trajectory samples and bounce markers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightSample {
    pub time: f64,
    pub height: f64,
}

/// Kinematic state of one ball plus its display history.
///
/// `trajectory` and `bounces` are append-only while the ball lives; only
/// [`BallState::reset`] clears them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Signed spin in RPM.
    pub spin: f64,
    pub elapsed: f64,
    pub bounce_count: u32,
    pub lifecycle: Lifecycle,
    pub trajectory: Vec<HeightSample>,
    pub bounces: Vec<HeightSample>,
}

impl BallState {
    /// A flying ball with fresh history.
    pub fn new(pos: Vec2, vel: Vec2, spin: f64) -> Self {
        let mut ball = Self {
            pos,
            vel,
            spin,
            elapsed: 0.0,
            bounce_count: 0,
            lifecycle: Lifecycle::Flying,
            trajectory: Vec::new(),
            bounces: Vec::new(),
        };
        ball.reset(pos, vel, spin);
        ball
    }

    /// Ball resting at a given position
    pub fn at_rest(pos: Vec2) -> Self {
        let mut ball = Self::new(pos, Vec2::ZERO, 0.0);
        ball.lifecycle = Lifecycle::AtRest;
        ball
    }

    /// Puts the ball back in flight with the given kinematics and clears all history.
    pub fn reset(&mut self, pos: Vec2, vel: Vec2, spin: f64) {
        self.pos = pos;
        self.vel = vel;
        self.spin = spin;
        self.elapsed = 0.0;
        self.bounce_count = 0;
        self.lifecycle = Lifecycle::Flying;
        self.trajectory.clear();
        self.bounces.clear();
        self.trajectory.push(HeightSample {
            time: 0.0,
            height: pos.y,
        });
    }

    pub fn is_flying(&self) -> bool {
        self.lifecycle == Lifecycle::Flying
    }

    pub fn speed(&self) -> f64 {
        self.vel.magnitude()
    }

    /// Spin as angular velocity in rad/s.
    pub fn angular_velocity(&self) -> f64 {
        self.spin * 2.0 * std::f64::consts::PI / 60.0
    }

    /// Appends the current height to the trajectory.
    pub fn record_sample(&mut self) {
        self.trajectory.push(HeightSample {
            time: self.elapsed,
            height: self.pos.y,
        });
    }

    /// Records a ground contact marker, keeping only the first few.
    pub fn record_bounce(&mut self) {
        if (self.bounce_count as usize) < constants::RECORDED_BOUNCES {
            self.bounces.push(HeightSample {
                time: self.elapsed,
                height: 0.0,
            });
        }
    }

    /// Flying -> AtRest; the ball stops dead.
    pub fn settle(&mut self) {
        if self.is_flying() {
            self.lifecycle = Lifecycle::AtRest;
            self.vel = Vec2::ZERO;
        }
    }

    /// Flying -> OutOfBounds; velocity is left untouched.
    pub fn mark_out_of_bounds(&mut self) {
        if self.is_flying() {
            self.lifecycle = Lifecycle::OutOfBounds;
        }
    }
}

impl Default for BallState {
    fn default() -> Self {
        Self::at_rest(Vec2::ZERO)
    }
}

// =============================================================================
// Shot Parameters
// =============================================================================

/// Inclusive bounds a shot must respect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotLimits {
    pub min_force: f64,
    pub max_force: f64,
    pub min_angle: f64,
    pub max_angle: f64,
    pub min_spin: f64,
    pub max_spin: f64,
}

impl ShotLimits {
    /// Bounds for a player's return hit.
    pub const RETURN: ShotLimits = ShotLimits {
        min_force: 10.0,
        max_force: 600.0,
        min_angle: 0.0,
        max_angle: 75.0,
        min_spin: -3000.0,
        max_spin: 9000.0,
    };

    /// Pull every component of `shot` inside these bounds.
    pub fn clamp(&self, shot: &ShotParameters) -> ShotParameters {
        ShotParameters {
            force: shot.force.clamp(self.min_force, self.max_force),
            angle: shot.angle.clamp(self.min_angle, self.max_angle),
            spin: shot.spin.clamp(self.min_spin, self.max_spin),
        }
    }
}

impl Default for ShotLimits {
    fn default() -> Self {
        Self::RETURN
    }
}

/// Force, elevation angle and spin of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotParameters {
    /// Newtons
    pub force: f64,
    /// Degrees above horizontal
    pub angle: f64,
    /// RPM, positive = topspin
    pub spin: f64,
}

impl ShotParameters {
    pub const fn new(force: f64, angle: f64, spin: f64) -> Self {
        Self { force, angle, spin }
    }

    /// Launch velocity for a serve from the left baseline.
    ///
    /// Force maps linearly onto speed: 1000 N gives 50 m/s. Inputs come from
    /// trusted configuration and are clamped, not rejected.
    pub fn launch_velocity(&self) -> Vec2 {
        let force = self.force.clamp(0.0, 1000.0);
        let angle = self.angle.clamp(0.0, 90.0);
        let speed = (force / 1000.0) * 50.0;
        Vec2::from_polar_degrees(speed, angle)
    }

    /// Velocity of a return hit travelling back toward the left side.
    ///
    /// 600 N maps to 30 m/s; returns never leave the racket slower than 5 m/s.
    pub fn return_velocity(&self) -> Vec2 {
        let speed = ((self.force / 600.0) * 30.0).max(constants::MIN_RETURN_SPEED);
        let v = Vec2::from_polar_degrees(speed, self.angle);
        Vec2::new(-v.x, v.y)
    }

    /// Checks a human-supplied return against `limits`.
    pub fn validate(&self, limits: &ShotLimits) -> Result<(), ShotError> {
        if !(limits.min_force..=limits.max_force).contains(&self.force) {
            return Err(ShotError::ForceOutOfRange {
                value: self.force,
                min: limits.min_force,
                max: limits.max_force,
            });
        }
        if !(limits.min_angle..=limits.max_angle).contains(&self.angle) {
            return Err(ShotError::AngleOutOfRange {
                value: self.angle,
                min: limits.min_angle,
                max: limits.max_angle,
            });
        }
        if !(limits.min_spin..=limits.max_spin).contains(&self.spin) {
            return Err(ShotError::SpinOutOfRange {
                value: self.spin,
                min: limits.min_spin,
                max: limits.max_spin,
            });
        }
        Ok(())
    }

    /// A randomized serve used when a ball is relaunched automatically.
    ///
    /// Force in [200, 400) N, whole-degree angle in [9, 39), spin in [60, 600) RPM.
    pub fn random_serve<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            force: rng.gen_range(200.0..400.0),
            angle: rng.gen_range(9..39) as f64,
            spin: rng.gen_range(60.0..600.0),
        }
    }
}

impl Default for ShotParameters {
    fn default() -> Self {
        Self::new(270.0, 39.0, 0.0)
    }
}

// =============================================================================
// Court
// =============================================================================

/// Fixed court dimensions (ITF singles court, side view).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourtGeometry {
    pub length: f64,
    pub net_x: f64,
    pub net_height: f64,
    pub ball_radius: f64,
    /// Where serves leave the racket.
    pub launch_pos: Vec2,
}

impl CourtGeometry {
    pub const STANDARD: CourtGeometry = CourtGeometry {
        length: 23.77,
        net_x: 23.77 / 2.0,
        net_height: 0.914,
        ball_radius: 0.0335,
        launch_pos: Vec2::new(0.5, 1.0),
    };

    pub fn is_in_bounds(&self, x: f64) -> bool {
        (0.0..=self.length).contains(&x)
    }

    /// Top of the net as seen by the ball's center.
    pub fn net_clearance(&self) -> f64 {
        self.net_height + self.ball_radius
    }
}

impl Default for CourtGeometry {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// The four tournament surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtType {
    RolandGarrosClay,
    WimbledonGrass,
    UsOpenHard,
    LaverCupBlack,
}

impl CourtType {
    pub const ALL: [CourtType; 4] = [
        CourtType::RolandGarrosClay,
        CourtType::WimbledonGrass,
        CourtType::UsOpenHard,
        CourtType::LaverCupBlack,
    ];

    /// Short legend label
    pub fn label(&self) -> &'static str {
        match self {
            CourtType::RolandGarrosClay => "Clay",
            CourtType::WimbledonGrass => "Grass",
            CourtType::UsOpenHard => "Hard",
            CourtType::LaverCupBlack => "Black",
        }
    }

    /// File stem used by the surface loader.
    pub fn key(&self) -> &'static str {
        match self {
            CourtType::RolandGarrosClay => "roland_garros_clay",
            CourtType::WimbledonGrass => "wimbledon_grass",
            CourtType::UsOpenHard => "us_open_hard",
            CourtType::LaverCupBlack => "laver_cup_black",
        }
    }

    /// Parses either the file stem or the short label, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|court| court.key() == name || court.label().to_ascii_lowercase() == name)
    }
}

/// Physical properties of a court surface. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceProfile {
    pub court: CourtType,
    pub name: String,
    /// Coefficient of restitution at ground contact
    pub restitution: f64,
    /// Declared surface friction. The bounce model applies a fixed rolling
    /// damping instead; see `constants::GROUND_ROLLING_DAMPING`.
    pub friction: f64,
}

impl SurfaceProfile {
    /// Roland Garros clay: slow, high bounce
    pub fn roland_garros_clay() -> Self {
        Self {
            court: CourtType::RolandGarrosClay,
            name: "Roland Garros (Clay)".to_string(),
            restitution: 0.75,
            friction: 0.6,
        }
    }

    /// Wimbledon grass: fast, low bounce
    pub fn wimbledon_grass() -> Self {
        Self {
            court: CourtType::WimbledonGrass,
            name: "Wimbledon (Grass)".to_string(),
            restitution: 0.70,
            friction: 0.4,
        }
    }

    pub fn us_open_hard() -> Self {
        Self {
            court: CourtType::UsOpenHard,
            name: "US Open (Hard Court)".to_string(),
            restitution: 0.73,
            friction: 0.5,
        }
    }

    pub fn laver_cup_black() -> Self {
        Self {
            court: CourtType::LaverCupBlack,
            name: "Laver Cup (Black Court)".to_string(),
            restitution: 0.72,
            friction: 0.5,
        }
    }

    pub fn for_court(court: CourtType) -> Self {
        match court {
            CourtType::RolandGarrosClay => Self::roland_garros_clay(),
            CourtType::WimbledonGrass => Self::wimbledon_grass(),
            CourtType::UsOpenHard => Self::us_open_hard(),
            CourtType::LaverCupBlack => Self::laver_cup_black(),
        }
    }
}

// =============================================================================
// Physical Constants
// =============================================================================

/// Constants of the ball and collision model.
pub mod constants {
    /// Gravitational acceleration (m/s²)
    pub const GRAVITY: f64 = 9.81;

    /// Tennis ball mass (kg)
    pub const BALL_MASS: f64 = 0.057;

    /// Below this speed (m/s) the Magnus term is skipped
    pub const MAGNUS_MIN_SPEED: f64 = 0.1;

    /// Fraction of velocity and spin the net absorbs on contact
    pub const NET_ABSORPTION: f64 = 0.8;

    /// Amplitude of the random vertical kick after a net contact (m/s)
    pub const NET_NOISE: f64 = 0.15;

    /// After a net contact slower than this on both axes, the ball drops straight down
    pub const NET_DROP_SPEED: f64 = 0.5;

    /// Horizontal velocity retained on each bounce
    pub const GROUND_ROLLING_DAMPING: f64 = 0.8;

    /// Spin (RPM) that adds `SPIN_KICK_GAIN` m/s of horizontal velocity on a bounce
    pub const SPIN_KICK_SCALE: f64 = 5000.0;
    pub const SPIN_KICK_GAIN: f64 = 2.0;

    /// Spin retained on each bounce
    pub const GROUND_SPIN_RETENTION: f64 = 0.7;

    /// Rebound speed (m/s) below which the ball is considered at rest
    pub const REST_SPEED: f64 = 0.1;

    /// Bounce count past which the ball is forced to rest
    pub const MAX_BOUNCES: u32 = 10;

    /// Bounce markers kept for display
    pub const RECORDED_BOUNCES: usize = 3;

    /// Slowest possible return hit (m/s)
    pub const MIN_RETURN_SPEED: f64 = 5.0;

    /// Distance the ball is placed in front of the player after contact (m)
    pub const CONTACT_NUDGE: f64 = 0.1;

    /// Small value for floating-point comparisons
    pub const EPSILON: f64 = 1e-10;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);

        assert_eq!(a + b, Vec2::new(5.0, 8.0));
        assert_eq!(b - a, Vec2::new(3.0, 4.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert!(((b - a).magnitude() - 5.0).abs() < 1e-10);
        assert_eq!(a.lerp(&b, 0.5), Vec2::new(2.5, 4.0));
    }

    #[test]
    fn test_launch_velocity_components() {
        let shot = ShotParameters::new(270.0, 39.0, 0.0);
        let v = shot.launch_velocity();

        // (270 / 1000) * 50 = 13.5 m/s
        assert!((v.magnitude() - 13.5).abs() < 1e-9);
        assert!((v.x - 10.49).abs() < 0.01, "vx = {}", v.x);
        assert!((v.y - 8.49).abs() < 0.01, "vy = {}", v.y);
    }

    #[test]
    fn test_launch_clamps_configuration() {
        let v = ShotParameters::new(5000.0, 120.0, 0.0).launch_velocity();
        // Clamped to 1000 N straight up
        assert!((v.magnitude() - 50.0).abs() < 1e-9);
        assert!(v.x.abs() < 1e-9);
    }

    #[test]
    fn test_return_velocity_minimum_speed() {
        let soft = ShotParameters::new(10.0, 0.0, 0.0).return_velocity();
        assert!((soft.x + 5.0).abs() < 1e-9, "vx = {}", soft.x);

        let hard = ShotParameters::new(600.0, 30.0, 0.0).return_velocity();
        assert!((hard.magnitude() - 30.0).abs() < 1e-9);
        assert!(hard.x < 0.0 && hard.y > 0.0);
    }

    #[test]
    fn test_validate_return_limits() {
        let limits = ShotLimits::RETURN;
        assert!(ShotParameters::new(300.0, 20.0, 1000.0).validate(&limits).is_ok());
        assert!(matches!(
            ShotParameters::new(601.0, 20.0, 0.0).validate(&limits),
            Err(ShotError::ForceOutOfRange { .. })
        ));
        assert!(matches!(
            ShotParameters::new(100.0, 80.0, 0.0).validate(&limits),
            Err(ShotError::AngleOutOfRange { .. })
        ));
        assert!(matches!(
            ShotParameters::new(100.0, 10.0, -3500.0).validate(&limits),
            Err(ShotError::SpinOutOfRange { .. })
        ));
    }

    #[test]
    fn test_random_serve_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let shot = ShotParameters::random_serve(&mut rng);
            assert!((200.0..400.0).contains(&shot.force));
            assert!((9.0..39.0).contains(&shot.angle));
            assert_eq!(shot.angle.fract(), 0.0, "angle should be whole degrees");
            assert!((60.0..600.0).contains(&shot.spin));
        }
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut ball = BallState::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, 0.0), 100.0);
        ball.elapsed = 1.5;
        ball.bounce_count = 4;
        ball.record_sample();
        ball.record_bounce();

        ball.reset(Vec2::new(0.5, 1.0), Vec2::ZERO, 0.0);
        let once = ball.clone();
        ball.reset(Vec2::new(0.5, 1.0), Vec2::ZERO, 0.0);

        assert_eq!(ball, once);
        assert_eq!(ball.trajectory.len(), 1);
        assert!(ball.bounces.is_empty());
    }

    #[test]
    fn test_lifecycle_only_leaves_flying() {
        let mut ball = BallState::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0), 0.0);
        ball.mark_out_of_bounds();
        assert_eq!(ball.lifecycle, Lifecycle::OutOfBounds);

        // No transition back out of a terminal state without reset
        ball.settle();
        assert_eq!(ball.lifecycle, Lifecycle::OutOfBounds);
        assert_eq!(ball.vel, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_court_type_parse() {
        assert_eq!(CourtType::parse("clay"), Some(CourtType::RolandGarrosClay));
        assert_eq!(CourtType::parse("us_open_hard"), Some(CourtType::UsOpenHard));
        assert_eq!(CourtType::parse(" Black "), Some(CourtType::LaverCupBlack));
        assert_eq!(CourtType::parse("carpet"), None);
    }

    #[test]
    fn test_geometry_bounds() {
        let court = CourtGeometry::STANDARD;
        assert!(court.is_in_bounds(0.0));
        assert!(court.is_in_bounds(court.length));
        assert!(!court.is_in_bounds(-0.01));
        assert!(!court.is_in_bounds(court.length + 0.01));
    }
}
