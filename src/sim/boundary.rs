//! Boundary policies
//!
//! A policy is picked once when the simulation is built. It decides how an
//! integrated ball interacts with the arena and which collision reactions
//! it supports.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{
    ball_containment_collision, ball_inside_circle, ball_wall_collision, reflect_velocity,
};
use super::rules::{Reactions, Reversal};
use super::state::{Arena, Ball};
use crate::settings::RuleConfig;

/// How balls interact with the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Balls live inside the circle and are kicked back when they reach it
    #[default]
    Containment,
    /// Balls bounce off the playfield walls; the circle is a trigger zone
    WallBounce,
}

impl BoundaryPolicy {
    /// Apply the policy's velocity response and report whether the collision
    /// rules fire for this ball this tick
    pub fn resolve(&self, ball: &mut Ball, arena: &Arena, repulsion: f32) -> bool {
        match self {
            BoundaryPolicy::Containment => {
                let hit = ball_containment_collision(ball.pos, ball.radius, arena);
                if hit.hit {
                    // Full replacement: incoming speed and direction are discarded
                    ball.vel = hit.normal * repulsion;
                }
                hit.hit
            }
            BoundaryPolicy::WallBounce => {
                let walls = ball_wall_collision(ball.pos, ball.radius, arena.width, arena.height);
                if walls.x {
                    ball.vel = reflect_velocity(ball.vel, Vec2::X);
                }
                if walls.y {
                    ball.vel = reflect_velocity(ball.vel, Vec2::Y);
                }
                ball_inside_circle(ball.pos, arena)
            }
        }
    }

    /// Collision reactions enabled under this policy for the given config
    pub fn reactions(&self, config: &RuleConfig) -> Reactions {
        match self {
            BoundaryPolicy::Containment => Reactions {
                grow: config.grow,
                shrink: config.shrink,
                multiply: config.multiply_count,
                reversal: if config.small_space {
                    Reversal::Both
                } else {
                    Reversal::None
                },
                recolor: config.recolor,
                speed_change: config.speed_change,
            },
            BoundaryPolicy::WallBounce => Reactions {
                grow: config.grow,
                shrink: config.shrink,
                multiply: config.multiply_count,
                reversal: if config.small_space {
                    Reversal::RandomAxis
                } else {
                    Reversal::None
                },
                recolor: false,
                speed_change: false,
            },
        }
    }
}
