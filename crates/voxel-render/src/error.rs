//! Rendering error types.

use thiserror::Error;
use voxel_core::VoxelError;

/// Errors that can occur while setting up or reading back the renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Shader compilation failed.
    #[error("shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    /// Pipeline creation failed.
    #[error("pipeline creation failed: {0}")]
    PipelineCreationFailed(String),

    /// Texture creation failed (for example, a volume larger than the
    /// device allows).
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),

    /// The offscreen surface could not be made complete.
    #[error("incomplete surface: {0}")]
    IncompleteSurface(String),

    /// Reading pixels back from the GPU failed.
    #[error("readback failed: {0}")]
    ReadbackFailed(String),

    /// Loading or validating input data failed.
    #[error(transparent)]
    Core(#[from] VoxelError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
