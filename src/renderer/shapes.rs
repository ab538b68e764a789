//! Shape generation for 2D primitives

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::{Vertex, colors};
use crate::render::{DrawCommand, DrawList};
use crate::rotate_about;

/// Segment count that keeps large circles smooth without wasting small ones
pub fn segments_for(radius: f32) -> u32 {
    ((radius * 0.5) as u32).clamp(16, 128)
}

/// Generate vertices for a filled circle (triangle fan from the center)
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        vertices.extend(
            [
                center,
                center + Vec2::from_angle(theta1) * radius,
                center + Vec2::from_angle(theta2) * radius,
            ]
            .map(|p| Vertex::at(p, color)),
        );
    }

    vertices
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        let inner1 = center + Vec2::from_angle(theta1) * inner_radius;
        let outer1 = center + Vec2::from_angle(theta1) * outer_radius;
        let inner2 = center + Vec2::from_angle(theta2) * inner_radius;
        let outer2 = center + Vec2::from_angle(theta2) * outer_radius;

        // Two triangles per segment
        vertices.extend(
            [inner1, outer1, inner2, inner2, outer1, outer2].map(|p| Vertex::at(p, color)),
        );
    }

    vertices
}

/// Append `shape`, applying the active rotations innermost-first
fn emit(shape: Vec<Vertex>, stack: &[(Vec2, f32)], out: &mut Vec<Vertex>) {
    if stack.is_empty() {
        out.extend(shape);
        return;
    }
    out.extend(shape.into_iter().map(|v| {
        let p = stack
            .iter()
            .rev()
            .fold(v.point(), |p, &(pivot, angle)| rotate_about(p, pivot, angle));
        Vertex::at(p, v.color)
    }));
}

/// Tessellate a draw list into triangles, honouring the rotation stack
pub fn tessellate(list: &DrawList) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    // (pivot, angle) pairs; rotations compose in push order
    let mut stack: Vec<(Vec2, f32)> = Vec::new();

    for command in list.iter() {
        match *command {
            DrawCommand::PushRotation { center, angle } => stack.push((center, angle)),
            DrawCommand::PopTransform => {
                if stack.pop().is_none() {
                    log::warn!("Unbalanced PopTransform in draw list");
                }
            }
            DrawCommand::Ring {
                center,
                radius,
                color,
            } => {
                let half = colors::RING_STROKE / 2.0;
                let shape = ring(
                    center,
                    (radius - half).max(0.0),
                    radius + half,
                    color.to_rgba(1.0),
                    segments_for(radius),
                );
                emit(shape, &stack, &mut vertices);
            }
            DrawCommand::Disc {
                center,
                radius,
                color,
            } => {
                let shape = circle(center, radius, color.to_rgba(1.0), segments_for(radius));
                emit(shape, &stack, &mut vertices);
            }
        }
    }

    vertices
}
