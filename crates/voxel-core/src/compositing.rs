//! Front-to-back ray marching and compositing.
//!
//! This is the CPU form of the fragment program in `raycast.wgsl`. Both
//! follow the same steps:
//!
//! 1. discard rays whose entry and exit coincide or whose length is zero,
//! 2. march `sample_count` samples from the entry point towards the exit,
//! 3. classify each density through the transfer function and premultiply,
//! 4. accumulate front to back, clamping after every step,
//! 5. stop once the accumulated opacity reaches the termination threshold,
//! 6. composite the remainder over the background and emit it opaque.

use glam::Vec3;

use crate::options::{RenderOptions, StepMode};
use crate::{TransferFunction, VolumeDataset};

/// Parameters of a single ray march.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchConfig {
    /// Samples per ray.
    pub sample_count: u32,
    /// Accumulated opacity at which marching stops.
    pub termination_threshold: f32,
    /// Color behind the volume.
    pub background: Vec3,
    /// Step size policy.
    pub step_mode: StepMode,
    /// Reference sample count for opacity correction, if enabled.
    pub opacity_reference: Option<u32>,
}

impl Default for MarchConfig {
    fn default() -> Self {
        Self::from(&RenderOptions::default())
    }
}

impl From<&RenderOptions> for MarchConfig {
    fn from(options: &RenderOptions) -> Self {
        Self {
            sample_count: options.sample_count.max(1),
            termination_threshold: options.termination_threshold,
            background: options.background,
            step_mode: options.step_mode,
            opacity_reference: options
                .opacity_correction
                .then_some(options.reference_sample_count.max(1)),
        }
    }
}

impl MarchConfig {
    /// Distance between consecutive samples for a ray of length `len`.
    #[allow(clippy::cast_precision_loss)]
    pub fn step_size(&self, len: f32) -> f32 {
        let n = self.sample_count.max(1) as f32;
        match self.step_mode {
            StepMode::RayLength => len / n,
            StepMode::Fixed => 1.0 / n,
        }
    }

    /// Rescales a sample opacity for the given step length.
    #[allow(clippy::cast_precision_loss)]
    pub fn corrected_opacity(&self, alpha: f32, step: f32) -> f32 {
        match self.opacity_reference {
            Some(reference) => 1.0 - (1.0 - alpha).powf(step * reference as f32),
            None => alpha,
        }
    }
}

/// Result of marching one ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayOutcome {
    /// The ray has no extent inside the volume; the pixel is left untouched.
    Discarded,
    /// The ray was marched and produced an opaque color.
    Composited {
        /// Final color, already composited over the background.
        color: Vec3,
        /// Opacity accumulated from the volume alone.
        alpha: f32,
        /// Number of samples taken before termination.
        samples: u32,
    },
}

impl RayOutcome {
    /// Final color, if the ray was not discarded.
    pub fn color(&self) -> Option<Vec3> {
        match self {
            Self::Discarded => None,
            Self::Composited { color, .. } => Some(*color),
        }
    }

    /// Whether the ray was discarded.
    pub fn is_discarded(&self) -> bool {
        matches!(self, Self::Discarded)
    }
}

/// Marches the ray from `entry` to `exit` (normalized volume coordinates).
pub fn march_ray(
    volume: &VolumeDataset,
    transfer: &TransferFunction,
    entry: Vec3,
    exit: Vec3,
    config: &MarchConfig,
) -> RayOutcome {
    if entry == exit {
        return RayOutcome::Discarded;
    }
    let segment = exit - entry;
    let len = segment.length();
    if len == 0.0 || !len.is_finite() {
        return RayOutcome::Discarded;
    }

    let dir = segment / len;
    let step = config.step_size(len);

    let mut color = Vec3::ZERO;
    let mut alpha = 0.0f32;
    let mut samples = 0;

    for i in 0..config.sample_count {
        #[allow(clippy::cast_precision_loss)]
        let pos = entry + dir * (step * i as f32);
        let density = volume.sample_at(pos);
        let (c, a) = transfer.evaluate(density);
        let a = config.corrected_opacity(a, step);
        let c = c * a;

        color = (color + (1.0 - alpha) * c).clamp(Vec3::ZERO, Vec3::ONE);
        alpha = (alpha + (1.0 - alpha) * a).clamp(0.0, 1.0);
        samples += 1;

        if alpha >= config.termination_threshold {
            break;
        }
    }

    RayOutcome::Composited {
        color: color + (1.0 - alpha) * config.background,
        alpha,
        samples,
    }
}
