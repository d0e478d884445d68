//! Configuration options for the ray compositor.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Reference number of samples marched along every ray.
pub const DEFAULT_SAMPLE_COUNT: u32 = 1000;

/// Accumulated opacity at which a ray counts as opaque.
pub const DEFAULT_TERMINATION_THRESHOLD: f32 = 0.999;

/// How the distance between two consecutive samples is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StepMode {
    /// `step = ray_length / sample_count`: every ray takes exactly
    /// `sample_count` samples regardless of its length.
    #[default]
    RayLength,
    /// `step = 1 / sample_count`, independent of the ray length. Long rays
    /// stop short of the exit point, short rays overshoot it.
    Fixed,
}

/// Options controlling the marching and compositing of every ray.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Number of samples per ray.
    pub sample_count: u32,

    /// Accumulated opacity treated as fully opaque (early ray termination).
    pub termination_threshold: f32,

    /// Background color the accumulated ray is composited over.
    pub background: Vec3,

    /// Step size policy.
    pub step_mode: StepMode,

    /// Rescale sample opacity to the step length.
    pub opacity_correction: bool,

    /// Sample count per unit length at which corrected and raw opacity agree.
    pub reference_sample_count: u32,

    /// Wait for the display refresh when presenting.
    pub vsync: bool,

    /// Model rotation speed in radians per second.
    pub rotation_speed: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            termination_threshold: DEFAULT_TERMINATION_THRESHOLD,
            background: Vec3::ONE,
            step_mode: StepMode::RayLength,
            opacity_correction: false,
            reference_sample_count: DEFAULT_SAMPLE_COUNT,
            vsync: true,
            rotation_speed: 0.5,
        }
    }
}

impl RenderOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of samples per ray (at least one).
    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count.max(1);
        self
    }

    /// Sets the early termination threshold.
    pub fn with_termination_threshold(mut self, threshold: f32) -> Self {
        self.termination_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Sets the background color.
    pub fn with_background(mut self, background: Vec3) -> Self {
        self.background = background.clamp(Vec3::ZERO, Vec3::ONE);
        self
    }

    /// Sets the step size policy.
    pub fn with_step_mode(mut self, step_mode: StepMode) -> Self {
        self.step_mode = step_mode;
        self
    }

    /// Enables or disables opacity correction with the given reference count.
    pub fn with_opacity_correction(mut self, enabled: bool, reference_sample_count: u32) -> Self {
        self.opacity_correction = enabled;
        self.reference_sample_count = reference_sample_count.max(1);
        self
    }

    /// Enables or disables vsync.
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Sets the model rotation speed (radians per second).
    pub fn with_rotation_speed(mut self, speed: f32) -> Self {
        self.rotation_speed = speed;
        self
    }

    /// Parses options from a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        Ok(options.sanitized())
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading render options from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    /// Serializes the options to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn sanitized(self) -> Self {
        let (sample_count, threshold, background) =
            (self.sample_count, self.termination_threshold, self.background);
        let (opacity_correction, reference) = (self.opacity_correction, self.reference_sample_count);
        self.with_sample_count(sample_count)
            .with_termination_threshold(threshold)
            .with_background(background)
            .with_opacity_correction(opacity_correction, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_default() {
        let options = RenderOptions::default();
        assert_eq!(options.sample_count, 1000);
        assert_eq!(options.termination_threshold, 0.999);
        assert_eq!(options.background, Vec3::ONE);
        assert_eq!(options.step_mode, StepMode::RayLength);
        assert!(!options.opacity_correction);
        assert!(options.vsync);
    }

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_sample_count(0)
            .with_termination_threshold(1.5)
            .with_step_mode(StepMode::Fixed);
        assert_eq!(options.sample_count, 1);
        assert_eq!(options.termination_threshold, 1.0);
        assert_eq!(options.step_mode, StepMode::Fixed);
    }

    #[test]
    fn test_render_options_partial_json() {
        let options = RenderOptions::from_json_str(r#"{ "sample_count": 250, "vsync": false }"#)
            .expect("valid json");
        assert_eq!(options.sample_count, 250);
        assert!(!options.vsync);
        assert_eq!(options.termination_threshold, DEFAULT_TERMINATION_THRESHOLD);
    }

    #[test]
    fn test_render_options_json_roundtrip() {
        let options = RenderOptions::new()
            .with_background(Vec3::new(0.1, 0.2, 0.3))
            .with_opacity_correction(true, 50);
        let json = options.to_json_string().expect("serializable");
        let parsed = RenderOptions::from_json_str(&json).expect("valid json");
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_render_options_json_sanitized() {
        let options = RenderOptions::from_json_str(
            r#"{
                "sample_count": 0,
                "termination_threshold": 3.0,
                "background": [2.0, -1.0, 0.5],
                "opacity_correction": true,
                "reference_sample_count": 0
            }"#,
        )
        .expect("valid json");
        assert_eq!(options.sample_count, 1);
        assert_eq!(options.termination_threshold, 1.0);
        assert_eq!(options.background, Vec3::new(1.0, 0.0, 0.5));
        assert!(options.opacity_correction);
        assert_eq!(options.reference_sample_count, 1);
    }

    #[test]
    fn test_render_options_invalid_json() {
        let result = RenderOptions::from_json_str("{ sample_count: }");
        assert!(matches!(result, Err(crate::VoxelError::Config(_))));
    }
}
