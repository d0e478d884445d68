//! Vertex and index buffers for the bounding cube.

use voxel_core::{BoundingGeometry, Tracked};

use crate::buffer::{create_index_buffer, create_vertex_buffer};
use crate::engine::GpuContext;

/// Byte stride of one cube vertex (a `vec3<f32>` position).
pub const VERTEX_STRIDE: u64 = std::mem::size_of::<[f32; 3]>() as u64;

/// GPU copy of the bounding cube, drawn by both passes.
#[derive(Debug)]
pub struct GeometryBuffers {
    /// Positions.
    pub vertex_buffer: Tracked<wgpu::Buffer>,
    /// Triangle indices.
    pub index_buffer: Tracked<wgpu::Buffer>,
    /// Number of indices to draw.
    pub index_count: u32,
}

impl GeometryBuffers {
    /// Uploads the cube.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(ctx: &GpuContext, geometry: &BoundingGeometry) -> Self {
        let positions: Vec<[f32; 3]> = geometry.vertices().iter().map(|v| v.to_array()).collect();
        let vertex_buffer = create_vertex_buffer(ctx, &positions, "cube vertices");
        let index_buffer = create_index_buffer(ctx, geometry.indices(), "cube indices");
        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices().len() as u32,
        }
    }

    /// Vertex layout matching `@location(0) position: vec3<f32>`.
    pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: VERTEX_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }

    /// Binds the buffers and issues the indexed draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
