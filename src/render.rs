//! Draw command generation
//!
//! Turns the arena and balls into a flat list of commands. Backends (the
//! WebGPU tessellator, or anything else) consume the list; nothing here
//! touches a GPU.

use glam::Vec2;

use crate::consts::LAYER_SPACING;
use crate::sim::{Arena, Ball, Color};

/// A single drawing instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    /// Rotate everything until the matching `PopTransform` around `center`
    PushRotation { center: Vec2, angle: f32 },
    /// Restore the transform saved by the last push
    PopTransform,
    /// Stroked circle outline
    Ring { center: Vec2, radius: f32, color: Color },
    /// Filled circle
    Disc { center: Vec2, radius: f32, color: Color },
}

/// Ordered draw commands for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Build the frame: arena rings (rotated when enabled), then balls
///
/// Rings whose radius would be zero or negative are skipped, as are balls
/// shrunk to a non-positive radius.
pub fn render(arena: &Arena, balls: &[Ball], circle_layers: u32, rotate: bool) -> DrawList {
    let mut list = DrawList::default();

    if rotate {
        list.push(DrawCommand::PushRotation {
            center: arena.center,
            angle: arena.angle,
        });
    }

    for i in 0..circle_layers {
        let radius = arena.radius - i as f32 * LAYER_SPACING;
        if radius <= 0.0 {
            break;
        }
        list.push(DrawCommand::Ring {
            center: arena.center,
            radius,
            color: Color::BLACK,
        });
    }

    if rotate {
        list.push(DrawCommand::PopTransform);
    }

    for ball in balls.iter().filter(|b| b.radius > 0.0) {
        list.push(DrawCommand::Disc {
            center: ball.pos,
            radius: ball.radius,
            color: ball.color,
        });
    }

    list
}
