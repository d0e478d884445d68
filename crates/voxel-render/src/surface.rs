//! The offscreen exit-position surface.

use voxel_core::surface::{AttachmentFormat, SurfaceDescriptor};
use voxel_core::{ResourceKind, Tracked, VoxelError};

use crate::engine::GpuContext;
use crate::error::{RenderError, RenderResult};

/// Maps an attachment format to its wgpu equivalent.
pub fn wgpu_format(format: AttachmentFormat) -> wgpu::TextureFormat {
    match format {
        AttachmentFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        AttachmentFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        AttachmentFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        AttachmentFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
        AttachmentFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
        AttachmentFormat::Depth24PlusStencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
    }
}

/// Render target of the entry/exit pass: exit positions in a float color
/// attachment plus a depth-stencil attachment, both viewport sized.
///
/// Only recreated when the viewport changes size.
#[derive(Debug)]
pub struct OffscreenSurface {
    /// Color attachment view.
    pub color_view: Tracked<wgpu::TextureView>,
    /// Color attachment (exit positions).
    pub color: Tracked<wgpu::Texture>,
    /// Depth attachment view.
    pub depth_view: Tracked<wgpu::TextureView>,
    /// Depth attachment.
    pub depth: Tracked<wgpu::Texture>,
    descriptor: SurfaceDescriptor,
    width: u32,
    height: u32,
    _entry: Tracked<()>,
}

impl OffscreenSurface {
    /// Creates the standard exit-position surface for a viewport.
    pub fn create(ctx: &GpuContext, width: u32, height: u32) -> RenderResult<Self> {
        let descriptor = SurfaceDescriptor::exit_positions(width, height)
            .with_max_dimension(ctx.limits().max_texture_dimension_2d);
        Self::from_descriptor(ctx, descriptor)
    }

    /// Creates a surface from an explicit descriptor, failing with
    /// [`RenderError::IncompleteSurface`] if it is not complete.
    pub fn from_descriptor(ctx: &GpuContext, descriptor: SurfaceDescriptor) -> RenderResult<Self> {
        let (width, height) = descriptor.validate().map_err(|e| match e {
            VoxelError::IncompleteSurface(msg) => RenderError::IncompleteSurface(msg),
            other => RenderError::Core(other),
        })?;
        // `validate` guarantees both attachments exist.
        let (Some(color_desc), Some(depth_desc)) = (descriptor.color, descriptor.depth) else {
            return Err(RenderError::IncompleteSurface("missing attachment".into()));
        };

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let attachment = |label: &str, format: AttachmentFormat, usage: wgpu::TextureUsages| {
            let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu_format(format),
                usage,
                view_formats: &[],
            });
            let texture = ctx.ledger.track(ResourceKind::Texture, label, texture);
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let view = ctx.ledger.track(ResourceKind::TextureView, format!("{label} view"), view);
            (texture, view)
        };

        // Attachments created so far are released by their guards if the
        // device rejects a later one.
        let ((color, color_view), (depth, depth_view)) = ctx.validated(RenderError::IncompleteSurface, |_| {
            let color = attachment(
                "exit position attachment",
                color_desc.format,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            );
            let depth = attachment(
                "exit depth attachment",
                depth_desc.format,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            );
            (color, depth)
        })?;

        let entry = ctx.ledger.track(ResourceKind::Surface, "exit surface", ());
        log::debug!("created {width}x{height} offscreen surface");

        Ok(Self {
            color_view,
            color,
            depth_view,
            depth,
            descriptor,
            width,
            height,
            _entry: entry,
        })
    }

    /// Surface size.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The descriptor the surface was created from.
    pub fn descriptor(&self) -> &SurfaceDescriptor {
        &self.descriptor
    }
}
