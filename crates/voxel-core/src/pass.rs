//! Per-pass render state and frame scheduling.
//!
//! A frame consists of two passes over the bounding cube. The first renders
//! back faces into the offscreen surface, recording where each ray leaves
//! the volume. The second renders front faces to the visible target and
//! marches every covered pixel. Each pass carries its own
//! [`RenderPassConfig`]; nothing is inherited from the previous pass.

use std::fmt;

/// Which triangles are culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullFace {
    /// Cull front faces, keeping the far side of the cube.
    Front,
    /// Cull back faces, keeping the near side of the cube.
    Back,
}

/// Winding order that marks a triangle as front facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontFace {
    /// Counter-clockwise in window space.
    #[default]
    Ccw,
    /// Clockwise in window space.
    Cw,
}

/// Depth comparison used by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthTest {
    /// No depth attachment.
    Disabled,
    /// Keep the nearest fragment.
    Less,
}

/// Render target a pass writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    /// The offscreen exit-position surface.
    Offscreen,
    /// The caller's visible surface.
    Visible,
}

/// Complete fixed-function state for one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPassConfig {
    /// Culled faces.
    pub cull: CullFace,
    /// Front-face winding.
    pub front_face: FrontFace,
    /// Whether fragments are blended with the target.
    pub blend: bool,
    /// Depth test.
    pub depth: DepthTest,
    /// Target surface.
    pub target: PassTarget,
    /// Clear color of the target.
    pub clear_color: [f32; 4],
}

impl RenderPassConfig {
    /// Replaces the clear color.
    #[must_use]
    pub fn with_clear_color(mut self, color: glam::Vec4) -> Self {
        self.clear_color = color.to_array();
        self
    }
}

/// The two passes of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Writes model-space exit positions into the offscreen surface.
    EntryExit,
    /// Marches rays from the front faces and writes the visible image.
    Compositing,
}

impl PassKind {
    /// Fixed-function state for this pass.
    pub fn config(self) -> RenderPassConfig {
        match self {
            Self::EntryExit => RenderPassConfig {
                cull: CullFace::Front,
                front_face: FrontFace::Ccw,
                blend: false,
                depth: DepthTest::Less,
                target: PassTarget::Offscreen,
                clear_color: [0.0, 0.0, 0.0, 0.0],
            },
            Self::Compositing => RenderPassConfig {
                cull: CullFace::Back,
                front_face: FrontFace::Ccw,
                blend: false,
                depth: DepthTest::Disabled,
                target: PassTarget::Visible,
                clear_color: [1.0, 1.0, 1.0, 1.0],
            },
        }
    }

    /// Intermediate resources the pass reads.
    pub fn inputs(self) -> &'static [FrameResource] {
        match self {
            Self::EntryExit => &[],
            Self::Compositing => &[FrameResource::ExitPositions],
        }
    }

    /// Intermediate resources the pass writes.
    pub fn outputs(self) -> &'static [FrameResource] {
        match self {
            Self::EntryExit => &[FrameResource::ExitPositions],
            Self::Compositing => &[FrameResource::FinalImage],
        }
    }

    /// Debug label.
    pub fn label(self) -> &'static str {
        match self {
            Self::EntryExit => "entry/exit pass",
            Self::Compositing => "compositing pass",
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resources flowing between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameResource {
    /// Per-pixel exit positions.
    ExitPositions,
    /// The finished frame.
    FinalImage,
}

/// Where a frame currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameStage {
    /// Between frames.
    #[default]
    Idle,
    /// Recording the entry/exit pass.
    EntryExitPass,
    /// Recording the compositing pass.
    CompositingPass,
}

impl FrameStage {
    /// Stage reached after finishing the current one.
    pub fn next(self) -> Self {
        match self {
            Self::Idle => Self::EntryExitPass,
            Self::EntryExitPass => Self::CompositingPass,
            Self::CompositingPass => Self::Idle,
        }
    }

    /// Stage in which `pass` is recorded.
    pub fn of(pass: PassKind) -> Self {
        match pass {
            PassKind::EntryExit => Self::EntryExitPass,
            PassKind::Compositing => Self::CompositingPass,
        }
    }
}

/// Error raised when the pass dependencies cannot be ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleError {
    /// Passes left unscheduled.
    pub blocked: Vec<PassKind>,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsatisfiable pass inputs: {:?}", self.blocked)
    }
}

impl std::error::Error for ScheduleError {}

/// Dependency graph of the passes in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameGraph {
    passes: Vec<PassKind>,
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGraph {
    /// The standard two-pass frame.
    pub fn new() -> Self {
        Self::with_passes(vec![PassKind::Compositing, PassKind::EntryExit])
    }

    /// A graph over an arbitrary set of passes.
    pub fn with_passes(passes: Vec<PassKind>) -> Self {
        Self { passes }
    }

    /// Orders the passes so every input is produced before it is read.
    pub fn schedule(&self) -> Result<Vec<PassKind>, ScheduleError> {
        let mut pending = self.passes.clone();
        let mut available: Vec<FrameResource> = Vec::new();
        let mut order = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let Some(pos) = pending
                .iter()
                .position(|pass| pass.inputs().iter().all(|r| available.contains(r)))
            else {
                return Err(ScheduleError { blocked: pending });
            };
            let pass = pending.remove(pos);
            available.extend_from_slice(pass.outputs());
            order.push(pass);
        }
        Ok(order)
    }
}
