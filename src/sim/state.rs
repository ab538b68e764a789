//! Simulation state and core types

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boundary::BoundaryPolicy;
use crate::consts::*;
use crate::normalize_angle;
use crate::settings::NoteMode;

/// 24-bit RGB fill color (0xRRGGBB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const BLUE: Color = Color(0x0000ff);
    pub const BLACK: Color = Color(0x000000);

    /// Random color over the full 24-bit range
    pub fn random(rng: &mut Pcg32) -> Self {
        Color(rng.random_range(0..0xff_ffff))
    }

    /// Linear RGBA components for the vertex pipeline
    pub fn to_rgba(self, alpha: f32) -> [f32; 4] {
        let r = ((self.0 >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xff) as f32 / 255.0;
        let b = (self.0 & 0xff) as f32 / 255.0;
        [r, g, b, alpha]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLUE
    }
}

/// A ball entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Not clamped; repeated shrink can take it to zero or below
    pub radius: f32,
    /// Pitch (Hz) this ball last triggered, or was born with
    pub note: f32,
    pub color: Color,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, radius: f32, note: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            radius,
            note,
            color: Color::default(),
        }
    }

    /// Integrate one tick: move by velocity, then apply gravity
    #[inline]
    pub fn advance(&mut self, gravity: f32) {
        self.pos += self.vel;
        self.vel.y += gravity;
    }

    /// Fallen fully below the playfield
    #[inline]
    pub fn has_exited(&self, floor: f32) -> bool {
        self.pos.y - self.radius > floor
    }

    /// Offspring at this ball's position/radius, moving the opposite way.
    /// Ids are assigned when they join the live collection.
    pub fn spawn_offspring(&self, count: u32, note: f32) -> impl Iterator<Item = Ball> + '_ {
        (0..count).map(move |_| Ball::new(0, self.pos, -self.vel, self.radius, note))
    }
}

/// The circular boundary plus the playfield it sits in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub center: Vec2,
    pub radius: f32,
    /// Render-only rotation (radians)
    pub angle: f32,
    /// Playfield extent; `height` is also the exit line
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self::centered(CANVAS_WIDTH, CANVAS_HEIGHT, ARENA_RADIUS)
    }
}

impl Arena {
    /// Arena centered in a `width` x `height` playfield
    pub fn centered(width: f32, height: f32, radius: f32) -> Self {
        Self {
            center: Vec2::new(width / 2.0, height / 2.0),
            radius,
            angle: 0.0,
            width,
            height,
        }
    }

    /// Advance the cosmetic rotation
    pub fn rotate(&mut self, delta: f32) {
        self.angle = normalize_angle(self.angle + delta);
    }

    /// Distance from a point to the arena center
    #[inline]
    pub fn distance_to_center(&self, pos: Vec2) -> f32 {
        (pos - self.center).length()
    }
}

/// Running note value, threaded through ticks instead of living in a global
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteCounter {
    value: f32,
}

impl Default for NoteCounter {
    fn default() -> Self {
        Self::new(BASE_NOTE)
    }
}

impl NoteCounter {
    pub fn new(value: f32) -> Self {
        Self { value }
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.value
    }

    /// Apply one step of the progression
    pub fn advance(&mut self, mode: NoteMode) {
        self.value += mode.step();
    }
}

/// Summary of one tick, consumed by the driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The last ball left the playfield this tick
    pub population_empty: bool,
    /// Balls whose boundary test fired
    pub collisions: u32,
    /// Offspring appended for next tick
    pub spawned: u32,
    /// Balls removed below the playfield
    pub pruned: u32,
}

/// Complete simulation state, owned by the driver
#[derive(Debug, Clone)]
pub struct SimState {
    /// Seed the RNG was created from
    pub seed: u64,
    /// Boundary policy, fixed for the lifetime of the state
    pub policy: BoundaryPolicy,
    pub arena: Arena,
    /// Live balls (ascending id)
    pub balls: Vec<Ball>,
    pub note: NoteCounter,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Collisions since creation
    pub total_collisions: u64,
    pub(crate) rng: Pcg32,
    /// Next entity ID
    next_id: u32,
}

impl SimState {
    /// Containment simulation in the default playfield
    pub fn new(seed: u64) -> Self {
        Self::with_policy(seed, BoundaryPolicy::Containment, Arena::default())
    }

    pub fn with_policy(seed: u64, policy: BoundaryPolicy, arena: Arena) -> Self {
        Self {
            seed,
            policy,
            arena,
            balls: Vec::new(),
            note: NoteCounter::default(),
            time_ticks: 0,
            total_collisions: 0,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn the start ball at the arena center. Safe to call repeatedly.
    pub fn spawn_initial_ball(&mut self) -> &Ball {
        let id = self.next_entity_id();
        let ball = Ball::new(
            id,
            self.arena.center,
            Vec2::new(INITIAL_BALL_VEL_X, INITIAL_BALL_VEL_Y),
            INITIAL_BALL_RADIUS,
            self.note.current(),
        );
        log::debug!("Spawned initial ball {} at {:?}", id, ball.pos);
        self.balls.push(ball);
        &self.balls[self.balls.len() - 1]
    }

    /// Add a driver-built ball, assigning it a fresh id
    pub fn insert_ball(&mut self, mut ball: Ball) -> u32 {
        ball.id = self.next_entity_id();
        let id = ball.id;
        self.balls.push(ball);
        id
    }

    pub fn population(&self) -> usize {
        self.balls.len()
    }

    /// Past the point where drivers should stop ticking
    pub fn is_overcrowded(&self) -> bool {
        self.balls.len() > MAX_POPULATION
    }
}
