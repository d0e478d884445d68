//! GPU backend for voxel-rs.
//!
//! This crate provides the wgpu implementation of the two-pass ray-caster:
//! - device setup and validation scopes ([`GpuContext`])
//! - volume, transfer function and cube uploads
//! - the offscreen exit-position surface
//! - the embedded WGSL programs and their pipelines
//! - [`RayCompositor`], which records and submits both passes each frame
//! - headless targets with pixel readback

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::float_cmp)]

pub mod buffer;
pub mod compositor;
pub mod engine;
pub mod error;
pub mod geometry_render;
pub mod readback;
pub mod shader;
pub mod surface;
pub mod transfer_texture;
pub mod volume_texture;

pub use compositor::{FrameUniforms, RayCompositor};
pub use engine::GpuContext;
pub use error::{RenderError, RenderResult};
pub use geometry_render::GeometryBuffers;
pub use readback::{aligned_bytes_per_row, HeadlessTarget, HEADLESS_FORMAT};
pub use shader::{ShaderBuilder, ShaderProgram};
pub use surface::OffscreenSurface;
pub use transfer_texture::TransferTexture;
pub use volume_texture::VolumeTexture;

use voxel_core::RenderOptions;

/// Presentation mode for a window surface: wait for the display refresh
/// when `vsync` is on, present immediately otherwise.
pub fn present_mode(options: &RenderOptions) -> wgpu::PresentMode {
    if options.vsync {
        wgpu::PresentMode::Fifo
    } else {
        wgpu::PresentMode::Immediate
    }
}
