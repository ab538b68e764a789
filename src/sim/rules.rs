//! Collision reactions
//!
//! Applied in a fixed order because later reactions read what earlier ones
//! wrote: grow, shrink, multiply, reversal, recolor, speed change.

use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{Ball, Color};
use crate::consts::{RADIUS_STEP, SPEED_FACTOR};

/// Velocity reversal applied after the boundary response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reversal {
    #[default]
    None,
    /// Negate both components
    Both,
    /// Negate one component, chosen 50/50
    RandomAxis,
}

/// Reactions that fire when a ball's boundary test does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reactions {
    pub grow: bool,
    pub shrink: bool,
    /// Offspring per collision
    pub multiply: u32,
    pub reversal: Reversal,
    pub recolor: bool,
    pub speed_change: bool,
}

impl Reactions {
    /// Apply to a colliding ball. Offspring are pushed to `offspring` rather
    /// than the live collection so the current pass never sees them.
    pub fn apply(&self, ball: &mut Ball, note: f32, rng: &mut Pcg32, offspring: &mut Vec<Ball>) {
        if self.grow {
            ball.radius += RADIUS_STEP;
        }
        if self.shrink {
            ball.radius -= RADIUS_STEP;
        }

        offspring.extend(ball.spawn_offspring(self.multiply, note));

        match self.reversal {
            Reversal::None => {}
            Reversal::Both => ball.vel = -ball.vel,
            Reversal::RandomAxis => {
                if rng.random_bool(0.5) {
                    ball.vel.x = -ball.vel.x;
                } else {
                    ball.vel.y = -ball.vel.y;
                }
            }
        }

        if self.recolor {
            ball.color = Color::random(rng);
        }

        if self.speed_change {
            ball.vel *= SPEED_FACTOR;
        }
    }
}
