//! Boundary collision tests
//!
//! Geometry only: these functions report contact, the boundary policies
//! decide what to do about it.

use glam::Vec2;

use super::state::Arena;
use crate::{cartesian_to_polar, polar_to_cartesian};

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal at collision (pointing back into the arena)
    pub normal: Vec2,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
        }
    }
}

/// Check whether a ball's outer edge has reached the arena circle from inside
///
/// Fires when `distance + radius > arena.radius`. The normal is the unit
/// vector from the ball back toward the center, so `normal * force` is the
/// repulsion kick.
pub fn ball_containment_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    arena: &Arena,
) -> CollisionResult {
    let (r, theta) = cartesian_to_polar(ball_pos - arena.center);

    if r + ball_radius > arena.radius {
        return CollisionResult {
            hit: true,
            normal: -polar_to_cartesian(1.0, theta), // Point inward
        };
    }

    CollisionResult::miss()
}

/// Check whether a ball's center is inside the arena circle
pub fn ball_inside_circle(ball_pos: Vec2, arena: &Arena) -> bool {
    arena.distance_to_center(ball_pos) < arena.radius
}

/// Which rectangular playfield walls a ball overlaps, per axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContact {
    /// Left or right wall
    pub x: bool,
    /// Top or bottom wall
    pub y: bool,
}

/// Test the left/right and top/bottom walls independently
pub fn ball_wall_collision(ball_pos: Vec2, ball_radius: f32, width: f32, height: f32) -> WallContact {
    WallContact {
        x: ball_pos.x + ball_radius > width || ball_pos.x - ball_radius < 0.0,
        y: ball_pos.y + ball_radius > height || ball_pos.y - ball_radius < 0.0,
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containment_inside_is_miss() {
        let arena = Arena::default();
        let result = ball_containment_collision(Vec2::new(400.0, 400.0), 20.0, &arena);
        assert!(!result.hit);

        // Edge exactly on the boundary does not count
        let result = ball_containment_collision(Vec2::new(630.0, 400.0), 20.0, &arena);
        assert!(!result.hit);
    }

    #[test]
    fn test_containment_touching_wall() {
        let arena = Arena::default();
        let result = ball_containment_collision(Vec2::new(635.0, 400.0), 20.0, &arena);
        assert!(result.hit);
        // Normal points back at the center
        assert!((result.normal - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_containment_diagonal_normal() {
        let arena = Arena::default();
        let pos = arena.center + Vec2::new(200.0, 200.0);
        let result = ball_containment_collision(pos, 1.0, &arena);
        assert!(result.hit);
        let expected = -Vec2::new(1.0, 1.0).normalize();
        assert!((result.normal - expected).length() < 1e-5);
    }

    #[test]
    fn test_inside_circle() {
        let arena = Arena::default();
        assert!(ball_inside_circle(Vec2::new(400.0, 400.0), &arena));
        assert!(!ball_inside_circle(Vec2::new(650.0, 400.0), &arena));
        assert!(!ball_inside_circle(Vec2::new(10.0, 10.0), &arena));
    }

    #[test]
    fn test_wall_axes_independent() {
        let hit = ball_wall_collision(Vec2::new(795.0, 400.0), 10.0, 800.0, 800.0);
        assert_eq!(hit, WallContact { x: true, y: false });

        let hit = ball_wall_collision(Vec2::new(400.0, 5.0), 10.0, 800.0, 800.0);
        assert_eq!(hit, WallContact { x: false, y: true });

        let hit = ball_wall_collision(Vec2::new(5.0, 795.0), 10.0, 800.0, 800.0);
        assert_eq!(hit, WallContact { x: true, y: true });

        let hit = ball_wall_collision(Vec2::new(400.0, 400.0), 10.0, 800.0, 800.0);
        assert_eq!(hit, WallContact::default());
    }

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let velocity = Vec2::new(100.0, 0.0);
        let normal = Vec2::new(-1.0, 0.0);

        let reflected = reflect_velocity(velocity, normal);
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }
}
