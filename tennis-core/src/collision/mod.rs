//! Collision detection and resolution for the court.
//!
//! This module handles:
//! - **Detection**: net-plane crossings, ground contact, leaving the court
//! - **Resolution**: net absorption, restitution, rolling damping, spin decay
//!
//! ## Net Crossing Test
//!
//! The net is a vertical segment at `x = net_x`. A tick crosses it when the
//! ball's x changes side between the pre-step and post-step positions; the
//! height at the crossing is linearly interpolated.
//!
//! ```text
//!   prev ●
//!         \       ┃ net top
//!          \      ┃
//!           ╲─────╳  y at crossing = lerp(prev.y, post.y, t)
//!                 ┃\
//!                 ┃ ● post
//! ════════════════╋══════════ court
//! ```
//!
//! Checks run net first, then ground, then out-of-bounds.

pub mod detection;
pub mod resolution;

pub use detection::*;
pub use resolution::*;
