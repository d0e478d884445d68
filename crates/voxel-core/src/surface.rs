//! Offscreen surface descriptions and completeness checks.

use crate::{Result, VoxelError};

/// Pixel formats an attachment may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentFormat {
    /// 8-bit normalized RGBA.
    Rgba8Unorm,
    /// 16-bit float RGBA. Renderable on every adapter, downlevel included.
    Rgba16Float,
    /// 32-bit float RGBA. Not renderable on downlevel adapters.
    Rgba32Float,
    /// Single 8-bit channel, sampleable only.
    R8Unorm,
    /// 32-bit float depth.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
}

impl AttachmentFormat {
    /// Whether the format can be a color render target.
    pub fn is_color_renderable(self) -> bool {
        matches!(self, Self::Rgba8Unorm | Self::Rgba16Float | Self::Rgba32Float)
    }

    /// Whether the format is a depth or depth-stencil format.
    pub fn is_depth_stencil(self) -> bool {
        matches!(self, Self::Depth32Float | Self::Depth24PlusStencil8)
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::Rgba8Unorm | Self::Depth32Float | Self::Depth24PlusStencil8 => 4,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }
}

/// One attachment of a render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    /// Pixel format.
    pub format: AttachmentFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl AttachmentDescriptor {
    /// Creates an attachment description.
    pub fn new(format: AttachmentFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
        }
    }
}

/// Layout of the offscreen surface receiving exit positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    /// Color attachment (exit position in RGB, coverage in A).
    pub color: Option<AttachmentDescriptor>,
    /// Depth-stencil attachment.
    pub depth: Option<AttachmentDescriptor>,
    /// Largest width or height the device accepts.
    pub max_dimension: u32,
}

/// Color format holding exit positions.
pub const EXIT_POSITION_FORMAT: AttachmentFormat = AttachmentFormat::Rgba16Float;

/// Depth format of the offscreen surface.
pub const DEPTH_FORMAT: AttachmentFormat = AttachmentFormat::Depth24PlusStencil8;

/// Default maximum texture dimension (the WebGPU baseline limit).
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

impl SurfaceDescriptor {
    /// The standard exit-position surface for a viewport.
    pub fn exit_positions(width: u32, height: u32) -> Self {
        Self {
            color: Some(AttachmentDescriptor::new(EXIT_POSITION_FORMAT, width, height)),
            depth: Some(AttachmentDescriptor::new(DEPTH_FORMAT, width, height)),
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    /// Sets the device texture size limit.
    #[must_use]
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Shared size of both attachments, if validation passes.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.validate().ok()
    }

    /// Checks the surface is complete: both attachments present with
    /// compatible formats and the same non-zero size within device limits.
    ///
    /// Returns the surface size on success.
    pub fn validate(&self) -> Result<(u32, u32)> {
        let incomplete = |msg: String| Err(VoxelError::IncompleteSurface(msg));

        let Some(color) = self.color else {
            return incomplete("missing color attachment".into());
        };
        let Some(depth) = self.depth else {
            return incomplete("missing depth attachment".into());
        };
        if !color.format.is_color_renderable() {
            return incomplete(format!("{:?} is not a renderable color format", color.format));
        }
        if !depth.format.is_depth_stencil() {
            return incomplete(format!("{:?} is not a depth format", depth.format));
        }
        if color.width == 0 || color.height == 0 {
            return incomplete(format!("zero-sized attachment {}x{}", color.width, color.height));
        }
        if (color.width, color.height) != (depth.width, depth.height) {
            return incomplete(format!(
                "attachment sizes differ: color {}x{}, depth {}x{}",
                color.width, color.height, depth.width, depth.height
            ));
        }
        if color.width > self.max_dimension || color.height > self.max_dimension {
            return incomplete(format!(
                "{}x{} exceeds the device limit of {}",
                color.width, color.height, self.max_dimension
            ));
        }
        Ok((color.width, color.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_positions_complete() {
        let desc = SurfaceDescriptor::exit_positions(640, 480);
        assert_eq!(desc.validate().unwrap(), (640, 480));
        assert_eq!(desc.size(), Some((640, 480)));
    }

    #[test]
    fn test_missing_attachment() {
        let mut desc = SurfaceDescriptor::exit_positions(8, 8);
        desc.depth = None;
        assert!(matches!(desc.validate(), Err(VoxelError::IncompleteSurface(_))));
        let mut desc = SurfaceDescriptor::exit_positions(8, 8);
        desc.color = None;
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_wrong_formats() {
        let mut desc = SurfaceDescriptor::exit_positions(8, 8);
        desc.color = Some(AttachmentDescriptor::new(AttachmentFormat::R8Unorm, 8, 8));
        assert!(desc.validate().is_err());
        let mut desc = SurfaceDescriptor::exit_positions(8, 8);
        desc.depth = Some(AttachmentDescriptor::new(AttachmentFormat::Rgba8Unorm, 8, 8));
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_size_checks() {
        assert!(SurfaceDescriptor::exit_positions(0, 8).validate().is_err());
        let mut desc = SurfaceDescriptor::exit_positions(8, 8);
        desc.depth = Some(AttachmentDescriptor::new(DEPTH_FORMAT, 8, 4));
        assert!(desc.validate().is_err());
        let desc = SurfaceDescriptor::exit_positions(4096, 16).with_max_dimension(2048);
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_exit_format_renderable_everywhere() {
        // Rgba32Float render targets are rejected by downlevel adapters.
        assert_eq!(EXIT_POSITION_FORMAT, AttachmentFormat::Rgba16Float);
        assert!(EXIT_POSITION_FORMAT.is_color_renderable());
        let desc = SurfaceDescriptor::exit_positions(16, 16);
        assert_eq!(desc.color.map(|c| c.format), Some(AttachmentFormat::Rgba16Float));
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(AttachmentFormat::Rgba32Float.bytes_per_pixel(), 16);
        assert_eq!(AttachmentFormat::Rgba8Unorm.bytes_per_pixel(), 4);
    }
}
