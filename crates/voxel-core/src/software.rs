//! CPU implementation of the two-pass ray compositor.
//!
//! Mirrors the GPU pipeline pass for pass and is used wherever a frame has
//! to be produced without a graphics device, most importantly in tests.

use glam::{Mat4, Vec3, Vec4};

use crate::compositing::{march_ray, MarchConfig, RayOutcome};
use crate::frame::FrameTransforms;
use crate::pass::{DepthTest, FrameGraph, FrameStage, PassKind, PassTarget, RenderPassConfig};
use crate::raster::{rasterize_triangle, ClipVertex, Viewport};
use crate::surface::SurfaceDescriptor;
use crate::{BoundingGeometry, RenderOptions, Result, TransferFunction, VolumeDataset};

/// CPU counterpart of the offscreen exit-position surface.
#[derive(Debug, Clone)]
pub struct SoftwareSurface {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl SoftwareSurface {
    /// Allocates a surface after checking it is complete.
    pub fn create(descriptor: &SurfaceDescriptor) -> Result<Self> {
        let (width, height) = descriptor.validate()?;
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            color: vec![Vec4::ZERO; len],
            depth: vec![1.0; len],
        })
    }

    /// Surface size.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Resets color and depth.
    pub fn clear(&mut self, color: Vec4, depth: f32) {
        self.color.fill(color);
        self.depth.fill(depth);
    }

    /// Color texel at a pixel: exit position in RGB, coverage in A.
    pub fn texel(&self, x: u32, y: u32) -> Vec4 {
        self.color[self.index(x, y)]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Per-frame counters from the compositing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Fragments produced by the front faces.
    pub covered: usize,
    /// Fragments whose ray had no extent.
    pub discarded: usize,
    /// Fragments written with a composited color.
    pub composited: usize,
}

/// A finished frame.
#[derive(Debug, Clone)]
pub struct SoftwareFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Linear RGB pixels, rows from top to bottom.
    pub pixels: Vec<Vec3>,
    /// Compositing counters.
    pub stats: FrameStats,
}

impl SoftwareFrame {
    /// Pixel color at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Opaque RGBA8 bytes, the same layout the GPU readback produces.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_rgba8(&self) -> Vec<u8> {
        let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.pixels
            .iter()
            .flat_map(|p| [to_byte(p.x), to_byte(p.y), to_byte(p.z), 255])
            .collect()
    }
}

/// Two-pass ray compositor running on the CPU.
#[derive(Debug)]
pub struct SoftwareCompositor {
    volume: VolumeDataset,
    transfer: TransferFunction,
    geometry: BoundingGeometry,
    march: MarchConfig,
    surface: SoftwareSurface,
    order: Vec<PassKind>,
    stage: FrameStage,
}

impl SoftwareCompositor {
    /// Sets up a compositor for a `width x height` viewport.
    pub fn new(
        volume: VolumeDataset,
        transfer: TransferFunction,
        options: &RenderOptions,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let surface = SoftwareSurface::create(&SurfaceDescriptor::exit_positions(width, height))?;
        let order = FrameGraph::new().schedule()?;

        log::info!("software compositor ready ({width}x{height})");
        Ok(Self {
            volume,
            transfer,
            geometry: BoundingGeometry::build(),
            march: MarchConfig::from(options),
            surface,
            order,
            stage: FrameStage::Idle,
        })
    }

    /// Recreates the offscreen surface for a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.surface.size() == (width, height) {
            return Ok(());
        }
        self.surface = SoftwareSurface::create(&SurfaceDescriptor::exit_positions(width, height))?;
        log::debug!("software surface resized to {width}x{height}");
        Ok(())
    }

    /// Current viewport size.
    pub fn size(&self) -> (u32, u32) {
        self.surface.size()
    }

    /// Current frame stage; `Idle` between frames.
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    /// The offscreen surface as left by the last entry/exit pass.
    pub fn exit_surface(&self) -> &SoftwareSurface {
        &self.surface
    }

    /// Renders one frame.
    pub fn render(&mut self, transforms: &FrameTransforms) -> Result<SoftwareFrame> {
        let (width, height) = self.surface.size();
        let mvp = transforms.model_view_projection();

        let mut frame = SoftwareFrame {
            width,
            height,
            pixels: vec![Vec3::ZERO; width as usize * height as usize],
            stats: FrameStats::default(),
        };

        for pass in self.order.clone() {
            self.stage = self.stage.next();
            debug_assert_eq!(self.stage, FrameStage::of(pass));
            let config = match pass {
                PassKind::EntryExit => pass.config(),
                PassKind::Compositing => pass.config().with_clear_color(self.march.background.extend(1.0)),
            };
            self.submit(pass, &config, mvp, &mut frame);
        }
        self.stage = self.stage.next();
        Ok(frame)
    }

    fn submit(&mut self, pass: PassKind, config: &RenderPassConfig, mvp: Mat4, frame: &mut SoftwareFrame) {
        log::trace!("software {pass}");
        let viewport = Viewport::new(frame.width, frame.height);
        let clear = Vec4::from_array(config.clear_color);

        match config.target {
            PassTarget::Offscreen => self.surface.clear(clear, 1.0),
            PassTarget::Visible => frame.pixels.fill(clear.truncate()),
        }

        let triangles: Vec<[ClipVertex; 3]> = self
            .geometry
            .triangles()
            .map(|tri| {
                tri.map(|p| ClipVertex {
                    clip: mvp * p.extend(1.0),
                    attribute: p,
                })
            })
            .collect();

        for tri in triangles {
            rasterize_triangle(tri, viewport, config.cull, config.front_face, |fragment| {
                match config.target {
                    PassTarget::Offscreen => {
                        let idx = self.surface.index(fragment.x, fragment.y);
                        let passes = match config.depth {
                            DepthTest::Disabled => true,
                            DepthTest::Less => fragment.depth < self.surface.depth[idx],
                        };
                        if passes {
                            self.surface.depth[idx] = fragment.depth;
                            self.surface.color[idx] = fragment.attribute.extend(1.0);
                        }
                    }
                    PassTarget::Visible => {
                        let idx = fragment.y as usize * frame.width as usize + fragment.x as usize;
                        frame.stats.covered += 1;
                        let texel = self.surface.color[idx];
                        // Alpha 0: the entry/exit pass never reached this pixel.
                        let outcome = if texel.w == 0.0 {
                            RayOutcome::Discarded
                        } else {
                            march_ray(
                                &self.volume,
                                &self.transfer,
                                fragment.attribute,
                                texel.truncate(),
                                &self.march,
                            )
                        };
                        match outcome.color() {
                            Some(color) => {
                                frame.pixels[idx] = color;
                                frame.stats.composited += 1;
                            }
                            None => frame.stats.discarded += 1,
                        }
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{premade, VoxelError};

    fn compositor(volume_value: u8, transfer: TransferFunction) -> SoftwareCompositor {
        let volume = VolumeDataset::load(&[volume_value; 64], 4, 4, 4).unwrap();
        SoftwareCompositor::new(volume, transfer, &RenderOptions::default(), 24, 24).unwrap()
    }

    #[test]
    fn test_surface_rejects_zero_size() {
        let err = SoftwareSurface::create(&SurfaceDescriptor::exit_positions(0, 10)).unwrap_err();
        assert!(matches!(err, VoxelError::IncompleteSurface(_)));
    }

    #[test]
    fn test_exit_surface_holds_positions_inside_cube() {
        let mut c = compositor(0, premade::transparent());
        c.render(&FrameTransforms::orbit(0.4, 1.0)).unwrap();
        let surface = c.exit_surface();
        let mut written = 0;
        for y in 0..24 {
            for x in 0..24 {
                let texel = surface.texel(x, y);
                if texel.w == 1.0 {
                    written += 1;
                    let p = texel.truncate();
                    assert!(p.cmpge(Vec3::splat(-1e-4)).all() && p.cmple(Vec3::splat(1.0 + 1e-4)).all());
                } else {
                    assert_eq!(texel, Vec4::ZERO);
                }
            }
        }
        assert!(written > 0);
        assert_eq!(surface.texel(0, 0).w, 0.0);
    }

    #[test]
    fn test_stage_returns_to_idle() {
        let mut c = compositor(0, premade::transparent());
        assert_eq!(c.stage(), FrameStage::Idle);
        c.render(&FrameTransforms::default()).unwrap();
        assert_eq!(c.stage(), FrameStage::Idle);
    }

    #[test]
    fn test_resize_recreates_surface() {
        let mut c = compositor(0, premade::transparent());
        c.resize(10, 6).unwrap();
        assert_eq!(c.size(), (10, 6));
        let frame = c.render(&FrameTransforms::orbit(0.0, 10.0 / 6.0)).unwrap();
        assert_eq!(frame.pixels.len(), 60);
        assert!(c.resize(0, 6).is_err());
    }

    #[test]
    fn test_every_covered_pixel_accounted() {
        let mut c = compositor(128, premade::band(127..=128, [255, 0, 0]));
        let frame = c.render(&FrameTransforms::orbit(0.9, 1.0)).unwrap();
        assert!(frame.stats.covered > 0);
        assert_eq!(frame.stats.covered, frame.stats.composited + frame.stats.discarded);
    }
}
