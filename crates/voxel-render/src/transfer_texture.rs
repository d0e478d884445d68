//! Transfer function lookup texture.

use voxel_core::{ResourceKind, Tracked, TransferFunction, TRANSFER_FUNCTION_ENTRIES};

use crate::engine::GpuContext;

/// The transfer function as a 256x1 `Rgba8Unorm` 2D texture, read with
/// integer loads. Downlevel backends do not support 1D textures.
#[derive(Debug)]
pub struct TransferTexture {
    /// 2D view.
    pub view: Tracked<wgpu::TextureView>,
    /// The texture.
    pub texture: Tracked<wgpu::Texture>,
}

impl TransferTexture {
    /// Uploads a transfer function.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(ctx: &GpuContext, transfer: &TransferFunction) -> Self {
        let width = TRANSFER_FUNCTION_ENTRIES as u32;
        let size = wgpu::Extent3d {
            width,
            height: 1,
            depth_or_array_layers: 1,
        };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("transfer function texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // Not sRGB: entries are read back exactly as stored.
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let texture = ctx
            .ledger
            .track(ResourceKind::Texture, "transfer function texture", texture);

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            transfer.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: None,
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("transfer function view"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            ..Default::default()
        });
        let view = ctx
            .ledger
            .track(ResourceKind::TextureView, "transfer function view", view);

        Self { view, texture }
    }

    /// Replaces the table contents in place.
    pub fn update(&self, queue: &wgpu::Queue, transfer: &TransferFunction) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            transfer.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(transfer.as_bytes().len() as u32),
                rows_per_image: None,
            },
            self.texture.size(),
        );
    }
}
