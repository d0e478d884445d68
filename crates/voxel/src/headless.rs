//! Headless rendering API for voxel-rs.
//!
//! Renders frames to an RGBA8 buffer without opening a window. Useful for
//! integration tests, batch processing and comparing the GPU pipeline with
//! the software one.

use pollster::FutureExt;
use voxel_core::{FrameTransforms, RenderOptions, TransferFunction, VolumeDataset};
use voxel_render::{GpuContext, HeadlessTarget, RayCompositor, RenderResult, HEADLESS_FORMAT};

/// A GPU compositor rendering into an offscreen RGBA8 target.
pub struct HeadlessRenderer {
    compositor: RayCompositor,
    target: HeadlessTarget,
    ctx: GpuContext,
}

impl HeadlessRenderer {
    /// Creates a headless device and sets up the compositor on it.
    pub fn new(
        volume: &VolumeDataset,
        transfer: &TransferFunction,
        options: &RenderOptions,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let ctx = GpuContext::new_headless().block_on()?;
        Self::with_context(ctx, volume, transfer, options, width, height)
    }

    /// Sets up the compositor on an existing device.
    pub fn with_context(
        ctx: GpuContext,
        volume: &VolumeDataset,
        transfer: &TransferFunction,
        options: &RenderOptions,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let compositor =
            RayCompositor::new(&ctx, volume, transfer, options, HEADLESS_FORMAT, width, height)?;
        let target = HeadlessTarget::new(&ctx, width, height);
        Ok(Self {
            compositor,
            target,
            ctx,
        })
    }

    /// Renders one frame and reads it back as RGBA8 rows, top row first.
    pub fn render(&mut self, transforms: &FrameTransforms) -> RenderResult<Vec<u8>> {
        self.compositor.render(&self.target.view, transforms);
        self.target.read_rgba8(&self.ctx)
    }

    /// Changes the viewport size.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if self.target.size() == (width, height) {
            return Ok(());
        }
        self.compositor.resize(width, height)?;
        self.target = HeadlessTarget::new(&self.ctx, width, height);
        Ok(())
    }

    /// Viewport size.
    pub fn size(&self) -> (u32, u32) {
        self.target.size()
    }

    /// The underlying compositor.
    pub fn compositor(&self) -> &RayCompositor {
        &self.compositor
    }

    /// The device the renderer runs on.
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }
}

/// Renders a single frame to a raw RGBA pixel buffer.
///
/// Creates a headless GPU context, renders one frame of `volume` classified
/// by `transfer`, and returns `width * height * 4` bytes ordered row by row
/// from the top-left corner.
///
/// # Example
/// ```no_run
/// use voxel::*;
///
/// let volume = VolumeDataset::load(&[128; 8], 2, 2, 2).unwrap();
/// let transfer = premade::grayscale_ramp(0.5);
/// let pixels = render_to_image(
///     &volume,
///     &transfer,
///     &RenderOptions::default(),
///     &FrameTransforms::orbit(0.5, 1.0),
///     256,
///     256,
/// )
/// .unwrap();
/// assert_eq!(pixels.len(), 256 * 256 * 4);
/// ```
pub fn render_to_image(
    volume: &VolumeDataset,
    transfer: &TransferFunction,
    options: &RenderOptions,
    transforms: &FrameTransforms,
    width: u32,
    height: u32,
) -> RenderResult<Vec<u8>> {
    let mut renderer = HeadlessRenderer::new(volume, transfer, options, width, height)?;
    renderer.render(transforms)
}
