//! Offscreen visible targets and pixel readback.

use voxel_core::{ResourceKind, Tracked};

use crate::buffer::create_readback_buffer;
use crate::engine::GpuContext;
use crate::error::{RenderError, RenderResult};

/// Format of [`HeadlessTarget`].
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Row pitch of an RGBA8 copy, padded to the copy alignment.
pub fn aligned_bytes_per_row(width: u32) -> u32 {
    let bytes_per_pixel = 4u32; // RGBA8
    let unaligned = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// An RGBA8 texture standing in for a window surface.
#[derive(Debug)]
pub struct HeadlessTarget {
    /// Render attachment view.
    pub view: Tracked<wgpu::TextureView>,
    /// The texture.
    pub texture: Tracked<wgpu::Texture>,
    width: u32,
    height: u32,
}

impl HeadlessTarget {
    /// Creates a target of the given size.
    pub fn new(ctx: &GpuContext, width: u32, height: u32) -> Self {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("headless target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HEADLESS_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let texture = ctx.ledger.track(ResourceKind::Texture, "headless target", texture);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let view = ctx
            .ledger
            .track(ResourceKind::TextureView, "headless target view", view);
        Self {
            view,
            texture,
            width,
            height,
        }
    }

    /// Target size.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Copies the target back to the CPU as tightly packed RGBA8 rows, top
    /// row first.
    pub fn read_rgba8(&self, ctx: &GpuContext) -> RenderResult<Vec<u8>> {
        let bytes_per_row = aligned_bytes_per_row(self.width);
        let buffer = create_readback_buffer(
            ctx,
            u64::from(bytes_per_row) * u64::from(self.height),
            "readback buffer",
        );

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback copy encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            self.texture.size(),
        );

        ctx.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver only disappears if this function already returned.
            let _ = tx.send(result);
        });
        ctx.wait_idle();
        rx.recv()
            .map_err(|e| RenderError::ReadbackFailed(e.to_string()))?
            .map_err(|e| RenderError::ReadbackFailed(e.to_string()))?;

        // Copy data, removing row padding
        let data = buffer_slice.get_mapped_range();
        let row_bytes = (self.width * 4) as usize;
        let mut result = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height {
            let start = (row * bytes_per_row) as usize;
            result.extend_from_slice(&data[start..start + row_bytes]);
        }

        drop(data);
        buffer.unmap();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_bytes_per_row() {
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(65), 512);
        assert_eq!(aligned_bytes_per_row(1), 256);
        assert_eq!(aligned_bytes_per_row(0), 0);
    }

    proptest::proptest! {
        #[test]
        fn test_aligned_row_holds_pixels(width in 1u32..16_384) {
            let row = aligned_bytes_per_row(width);
            proptest::prop_assert_eq!(row % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
            proptest::prop_assert!(row >= width * 4);
            proptest::prop_assert!(row - width * 4 < wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        }
    }
}
