//! Net, ground and boundary detection.

use crate::types::{BallState, CourtGeometry, Vec2};

/// Where a tick's straight-line path crossed the net plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetCrossing {
    /// Fraction of the step at which the crossing happened, in [0, 1].
    pub fraction: f64,
    /// Interpolated ball center at the crossing.
    pub point: Vec2,
}

/// Collision detector for one court.
#[derive(Debug, Clone)]
pub struct CollisionDetector {
    pub geometry: CourtGeometry,
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::new(CourtGeometry::STANDARD)
    }
}

impl CollisionDetector {
    pub fn new(geometry: CourtGeometry) -> Self {
        Self { geometry }
    }

    /// Detect a crossing of `x = net_x` between two consecutive positions.
    ///
    /// A ball that starts exactly on the plane is not crossing it; this keeps
    /// a ball snapped onto the net from hitting it again on the next tick.
    pub fn detect_net_crossing(&self, prev: Vec2, post: Vec2) -> Option<NetCrossing> {
        let net_x = self.geometry.net_x;
        let crossed = (prev.x < net_x && post.x >= net_x) || (prev.x > net_x && post.x <= net_x);
        if !crossed {
            return None;
        }

        // prev.x != post.x here, since they lie on different sides
        let fraction = (net_x - prev.x) / (post.x - prev.x);
        let height = prev.y + fraction * (post.y - prev.y);

        Some(NetCrossing {
            fraction,
            point: Vec2::new(net_x, height),
        })
    }

    /// A crossing low enough for the ball to strike the net.
    pub fn detect_net_contact(&self, prev: Vec2, post: Vec2) -> Option<NetCrossing> {
        self.detect_net_crossing(prev, post)
            .filter(|crossing| crossing.point.y <= self.geometry.net_clearance())
    }

    /// The ball has reached or passed through the court surface.
    pub fn detect_ground(&self, ball: &BallState) -> bool {
        ball.pos.y <= 0.0
    }

    pub fn is_out_of_bounds(&self, ball: &BallState) -> bool {
        !self.geometry.is_in_bounds(ball.pos.x)
    }
}

// =============================================================================
// Tests
// =============================================================================
