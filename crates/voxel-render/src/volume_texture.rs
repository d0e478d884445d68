//! 3D density texture.

use voxel_core::{ResourceKind, Tracked, VolumeDataset, VoxelError};

use crate::engine::GpuContext;
use crate::error::{RenderError, RenderResult};

/// The density volume as a 3D `R8Unorm` texture with a trilinear,
/// edge-clamped sampler.
#[derive(Debug)]
pub struct VolumeTexture {
    /// Sampler shared by all lookups.
    pub sampler: Tracked<wgpu::Sampler>,
    /// 3D view.
    pub view: Tracked<wgpu::TextureView>,
    /// The texture.
    pub texture: Tracked<wgpu::Texture>,
    dimensions: (u32, u32, u32),
}

impl VolumeTexture {
    /// Uploads a volume.
    pub fn new(ctx: &GpuContext, volume: &VolumeDataset) -> RenderResult<Self> {
        let (width, height, depth) = volume.dimensions();
        if volume.is_empty() {
            return Err(VoxelError::InvalidDimensions {
                width,
                height,
                depth,
            }
            .into());
        }
        let max = ctx.limits().max_texture_dimension_3d;
        if width > max || height > max || depth > max {
            return Err(RenderError::TextureCreationFailed(format!(
                "volume {width}x{height}x{depth} exceeds the 3D texture limit of {max}"
            )));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: depth,
        };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("volume texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let texture = ctx.ledger.track(ResourceKind::Texture, "volume texture", texture);

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            volume.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("volume view"),
            dimension: Some(wgpu::TextureViewDimension::D3),
            ..Default::default()
        });
        let view = ctx.ledger.track(ResourceKind::TextureView, "volume view", view);

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("volume sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let sampler = ctx.ledger.track(ResourceKind::Sampler, "volume sampler", sampler);

        log::debug!("uploaded {width}x{height}x{depth} volume texture");
        Ok(Self {
            sampler,
            view,
            texture,
            dimensions: (width, height, depth),
        })
    }

    /// Volume size in voxels.
    pub fn dimensions(&self) -> (u32, u32, u32) {
        self.dimensions
    }
}
