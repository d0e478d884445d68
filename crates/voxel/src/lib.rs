//! voxel-rs: a two-pass GPU volume ray-caster for 3-D density scans.
//!
//! A scalar volume is drawn as a unit cube. The first pass records, for
//! every pixel the cube covers, where the view ray leaves the volume. The
//! second pass draws the front faces, marches each ray from entry to exit,
//! classifies the samples through a 256-entry transfer function and
//! composites them front to back over a background.
//!
//! # Quick Start
//!
//! ```no_run
//! use voxel::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let volume = VolumeDataset::from_fn(64, 64, 64, |x, y, z| ((x + y + z) % 256) as u8)?;
//!     let transfer = premade::grayscale_ramp(0.05);
//!     let options = RenderOptions::default();
//!
//!     let mut compositor = SoftwareCompositor::new(volume, transfer, &options, 320, 240)?;
//!     let frame = compositor.render(&FrameTransforms::orbit(0.3, 320.0 / 240.0))?;
//!     println!("{} pixels hit the volume", frame.stats.composited);
//!     Ok(())
//! }
//! ```
//!
//! # Layers
//!
//! - [`voxel_core`]: data model, ray compositing and a CPU reference
//!   pipeline ([`SoftwareCompositor`])
//! - [`voxel_render`]: the wgpu pipeline ([`RayCompositor`])
//! - this crate: logging setup, [`FrameLoop`] and headless rendering

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod frame_loop;
mod headless;

// Re-export core types
pub use voxel_core::{
    error::{Result, VoxelError},
    premade, BoundingGeometry, FrameClock, FrameGraph, FrameStage, FrameStats, FrameTick,
    FrameTransforms, MarchConfig, PassKind, RayOutcome, RenderOptions, ResourceKind,
    ResourceLedger, SoftwareCompositor, SoftwareFrame, StepMode, SurfaceDescriptor,
    TransferFunction, VolumeDataset, Mat4, Vec2, Vec3, Vec4,
};

// Re-export render types
pub use voxel_render::{
    present_mode, GpuContext, HeadlessTarget, RayCompositor, RenderError, RenderResult,
    HEADLESS_FORMAT,
};

pub use frame_loop::{FrameLoop, FrameRenderer, Presenter};
pub use headless::{render_to_image, HeadlessRenderer};

/// The wgpu version the renderer is built against, for hosts creating
/// window surfaces.
pub use wgpu;

/// Installs the `env_logger` backend, filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls do nothing.
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::debug!("logging initialized");
    }
}
