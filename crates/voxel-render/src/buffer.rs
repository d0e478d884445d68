//! GPU buffer management.
//!
//! Every helper returns a [`Tracked`] buffer registered with the context's
//! ledger.

use voxel_core::{ResourceKind, Tracked};
use wgpu::util::DeviceExt;

use crate::engine::GpuContext;

/// Creates a vertex buffer from data.
pub fn create_vertex_buffer<T: bytemuck::Pod>(
    ctx: &GpuContext,
    data: &[T],
    label: &str,
) -> Tracked<wgpu::Buffer> {
    let buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    });
    ctx.ledger.track(ResourceKind::Buffer, label, buffer)
}

/// Creates a 16-bit index buffer from data.
pub fn create_index_buffer(ctx: &GpuContext, data: &[u16], label: &str) -> Tracked<wgpu::Buffer> {
    // Buffer sizes must be a multiple of 4 bytes.
    let mut padded = data.to_vec();
    if padded.len() % 2 == 1 {
        padded.push(0);
    }
    let buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&padded),
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
    });
    ctx.ledger.track(ResourceKind::Buffer, label, buffer)
}

/// Creates a uniform buffer from data.
pub fn create_uniform_buffer<T: bytemuck::Pod>(
    ctx: &GpuContext,
    data: &T,
    label: &str,
) -> Tracked<wgpu::Buffer> {
    let buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(data),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    ctx.ledger.track(ResourceKind::Buffer, label, buffer)
}

/// Creates a mappable buffer that texture copies can land in.
pub fn create_readback_buffer(ctx: &GpuContext, size: u64, label: &str) -> Tracked<wgpu::Buffer> {
    let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    ctx.ledger.track(ResourceKind::Buffer, label, buffer)
}

/// Updates a buffer with new data.
pub fn update_buffer<T: bytemuck::Pod>(queue: &wgpu::Queue, buffer: &wgpu::Buffer, data: &T) {
    queue.write_buffer(buffer, 0, bytemuck::bytes_of(data));
}
