//! Vertex format shared by the tessellator and the pipeline

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Position in canvas pixels (NDC once uploaded) plus linear RGBA
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn at(point: Vec2, color: [f32; 4]) -> Self {
        Self::new(point.x, point.y, color)
    }

    pub fn point(&self) -> Vec2 {
        Vec2::from(self.position)
    }

    /// Matches `VertexInput` in shader.wgsl
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Scene styling
pub mod colors {
    /// Canvas clear color (the arena is drawn on white)
    pub const BACKGROUND: wgpu::Color = wgpu::Color::WHITE;
    /// Ring stroke width in canvas pixels
    pub const RING_STROKE: f32 = 1.5;
}
