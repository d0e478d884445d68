//! Core data model and CPU algorithms for voxel-rs.
//!
//! This crate holds everything about the volume ray-caster that does not
//! need a GPU:
//! - [`VolumeDataset`] and [`TransferFunction`] loading and sampling
//! - the [`BoundingGeometry`] cube whose faces start and end every ray
//! - the ray march itself ([`compositing::march_ray`])
//! - per-pass render state and the [`FrameGraph`] ordering the two passes
//! - resource ownership tracking ([`ResourceLedger`], [`Tracked`])
//! - [`SoftwareCompositor`], a CPU rendition of the full two-pass pipeline

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Options structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Exact comparisons against 0 and 1 are intended in the compositing math
#![allow(clippy::float_cmp)]

pub mod compositing;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod options;
pub mod pass;
pub mod premade;
pub mod raster;
pub mod resource;
pub mod software;
pub mod surface;
pub mod transfer_function;
pub mod volume;

pub use compositing::{march_ray, MarchConfig, RayOutcome};
pub use error::{Result, VoxelError};
pub use frame::{FrameClock, FrameTick, FrameTransforms};
pub use geometry::BoundingGeometry;
pub use options::{RenderOptions, StepMode};
pub use pass::{
    CullFace, DepthTest, FrameGraph, FrameResource, FrameStage, FrontFace, PassKind, PassTarget,
    RenderPassConfig, ScheduleError,
};
pub use resource::{ResourceKind, ResourceLedger, Tracked};
pub use software::{FrameStats, SoftwareCompositor, SoftwareFrame, SoftwareSurface};
pub use surface::{AttachmentDescriptor, AttachmentFormat, SurfaceDescriptor};
pub use transfer_function::{TransferFunction, TRANSFER_FUNCTION_BYTES, TRANSFER_FUNCTION_ENTRIES};
pub use volume::VolumeDataset;

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
