//! Shader management.
//!
//! The renderer embeds exactly two WGSL programs, one per pass. Both are
//! compiled inside a validation scope so a broken program surfaces as
//! [`RenderError::ShaderCompilationFailed`] instead of a device panic.

use voxel_core::{PassKind, ResourceKind, Tracked};

use crate::engine::GpuContext;
use crate::error::{RenderError, RenderResult};

/// WGSL for the entry/exit pass.
pub const ENTRY_EXIT_WGSL: &str = include_str!("shaders/entry_exit.wgsl");

/// WGSL for the compositing pass.
pub const RAYCAST_WGSL: &str = include_str!("shaders/raycast.wgsl");

/// Builder for a validated shader module.
pub struct ShaderBuilder {
    source: Option<String>,
    vertex_entry: String,
    fragment_entry: String,
    label: String,
}

impl ShaderBuilder {
    /// Creates a new shader builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            vertex_entry: "vs_main".to_string(),
            fragment_entry: "fs_main".to_string(),
            label: "shader".to_string(),
        }
    }

    /// The embedded program for a pass.
    #[must_use]
    pub fn for_pass(pass: PassKind) -> Self {
        let source = match pass {
            PassKind::EntryExit => ENTRY_EXIT_WGSL,
            PassKind::Compositing => RAYCAST_WGSL,
        };
        Self::new().with_source(source).with_label(pass.label())
    }

    /// Sets the WGSL source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the vertex shader entry point.
    #[must_use]
    pub fn with_vertex_entry(mut self, entry: impl Into<String>) -> Self {
        self.vertex_entry = entry.into();
        self
    }

    /// Sets the fragment shader entry point.
    #[must_use]
    pub fn with_fragment_entry(mut self, entry: impl Into<String>) -> Self {
        self.fragment_entry = entry.into();
        self
    }

    /// Sets the shader label for debugging.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Compiles the module, failing if the device reports any validation
    /// error.
    pub fn build(self, ctx: &GpuContext) -> RenderResult<ShaderProgram> {
        let source = self
            .source
            .ok_or_else(|| RenderError::ShaderCompilationFailed(format!("{}: missing source", self.label)))?;

        for entry in [&self.vertex_entry, &self.fragment_entry] {
            if !source.contains(&format!("fn {entry}(")) {
                return Err(RenderError::ShaderCompilationFailed(format!(
                    "{}: entry point '{entry}' not found",
                    self.label
                )));
            }
        }

        let label = self.label.clone();
        let module = ctx.validated(
            |e| RenderError::ShaderCompilationFailed(format!("{label}: {e}")),
            |device| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(self.label.as_str()),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                })
            },
        )?;

        Ok(ShaderProgram {
            module: ctx.ledger.track(ResourceKind::Shader, &self.label, module),
            vertex_entry: self.vertex_entry,
            fragment_entry: self.fragment_entry,
        })
    }
}

impl Default for ShaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A compiled shader module and its entry points.
#[derive(Debug)]
pub struct ShaderProgram {
    /// The shader module.
    pub module: Tracked<wgpu::ShaderModule>,
    /// Vertex entry point.
    pub vertex_entry: String,
    /// Fragment entry point.
    pub fragment_entry: String,
}
