//! # Tennis Core
//!
//! A 2D side-view tennis ball physics and shot-lifecycle engine.
//!
//! ## Architecture
//!
//! - `types`: Core data structures (Vec2, ball state, shots, surfaces, court)
//! - `forces`: Gravity, quadratic air drag, Magnus lift
//! - `integrator`: Semi-implicit Euler stepping
//! - `collision`: Net, ground and court-bounds detection and response
//! - `config`: YAML-backed simulation settings and error types
//! - `materials`: YAML-based surface loader
//! - `lifecycle`: Per-shot state machine (launch, pause, relaunch)
//! - `player`: Receiving player and the return-shot collaborator seam
//! - `simulation`: Main orchestrator

pub mod collision;
pub mod config;
pub mod forces;
pub mod integrator;
pub mod lifecycle;
pub mod materials;
pub mod player;
pub mod simulation;
pub mod types;

pub use config::{ConfigError, ShotError, ShotSteps, SimulationConfig};
pub use simulation::{CourtMode, ShotEvent, ShotEventKind, Simulation};
