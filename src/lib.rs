//! Circle ASMR - balls bouncing inside a circle
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integration, boundary policies, collision rules)
//! - `render`: Draw command generation for the arena and balls
//! - `renderer`: WebGPU rendering pipeline
//! - `audio`: Note trigger capability and the Web Audio implementation
//! - `settings`: Per-tick rule configuration

pub mod audio;
pub mod render;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use audio::{NoteTrigger, SilentNotes};
pub use settings::{NoteMode, RuleConfig};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Downward acceleration added to `vel.y` every tick (pixels/tick²)
    pub const GRAVITY: f32 = 0.5;

    /// Playfield dimensions (canvas pixels, y grows downward)
    pub const CANVAS_WIDTH: f32 = 800.0;
    pub const CANVAS_HEIGHT: f32 = 800.0;

    /// Arena defaults - centered in the playfield
    pub const ARENA_RADIUS: f32 = 250.0;
    /// Arena rotation per tick while rotation is enabled (radians)
    pub const ROTATION_STEP: f32 = 0.01;
    /// Radial gap between concentric arena rings
    pub const LAYER_SPACING: f32 = 20.0;

    /// Initial ball spawned by the start action
    pub const INITIAL_BALL_RADIUS: f32 = 20.0;
    pub const INITIAL_BALL_VEL_X: f32 = 2.0;
    pub const INITIAL_BALL_VEL_Y: f32 = 2.0;

    /// Radius change per collision for grow/shrink
    pub const RADIUS_STEP: f32 = 1.0;
    /// Velocity multiplier for speed-change-on-collision
    pub const SPEED_FACTOR: f32 = 1.1;

    /// Starting note (Hz) and per-collision change for increase/decrease
    pub const BASE_NOTE: f32 = 440.0;
    pub const NOTE_STEP: f32 = 10.0;

    /// Drivers stop ticking past this many balls; multiply doubles per tick
    pub const MAX_POPULATION: usize = 5_000;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}

/// Rotate `point` around `pivot` by `angle` radians
#[inline]
pub fn rotate_about(point: Vec2, pivot: Vec2, angle: f32) -> Vec2 {
    pivot + Vec2::from_angle(angle).rotate(point - pivot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-5);
        assert!((normalize_angle(0.5) - 0.5).abs() < 1e-6);
        assert!((normalize_angle(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_polar_roundtrip_angle() {
        let p = polar_to_cartesian(10.0, PI / 3.0);
        let (r, theta) = cartesian_to_polar(p);
        assert!((r - 10.0).abs() < 1e-4);
        assert!((theta - PI / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_rotate_about_quarter_turn() {
        let pivot = Vec2::new(400.0, 400.0);
        let rotated = rotate_about(Vec2::new(410.0, 400.0), pivot, PI / 2.0);
        assert!((rotated.x - 400.0).abs() < 1e-3);
        assert!((rotated.y - 410.0).abs() < 1e-3);
    }
}
