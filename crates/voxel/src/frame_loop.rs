//! Driving the renderer frame after frame.
//!
//! The host owns the window; it plugs in through [`Presenter`], which
//! receives finished frames and reports when the user asked to close.

use voxel_core::{FrameClock, FrameTransforms, SoftwareCompositor, SoftwareFrame, VoxelError};
use voxel_render::RenderError;

use crate::headless::HeadlessRenderer;

/// Something that can produce frames.
pub trait FrameRenderer {
    /// A finished frame.
    type Frame;
    /// Fatal render error.
    type Error;

    /// Viewport size in pixels.
    fn viewport(&self) -> (u32, u32);

    /// Renders one frame.
    fn render_frame(&mut self, transforms: &FrameTransforms) -> Result<Self::Frame, Self::Error>;
}

impl FrameRenderer for SoftwareCompositor {
    type Frame = SoftwareFrame;
    type Error = VoxelError;

    fn viewport(&self) -> (u32, u32) {
        self.size()
    }

    fn render_frame(&mut self, transforms: &FrameTransforms) -> Result<SoftwareFrame, VoxelError> {
        self.render(transforms)
    }
}

impl FrameRenderer for HeadlessRenderer {
    type Frame = Vec<u8>;
    type Error = RenderError;

    fn viewport(&self) -> (u32, u32) {
        self.size()
    }

    fn render_frame(&mut self, transforms: &FrameTransforms) -> Result<Vec<u8>, RenderError> {
        self.render(transforms)
    }
}

/// Receives finished frames.
pub trait Presenter<F> {
    /// Whether the loop should stop. Checked once before every frame.
    fn close_requested(&mut self) -> bool;

    /// Shows a finished frame; may block (for example on vsync).
    fn present(&mut self, frame: F);
}

/// Renders and presents frames until the presenter asks to close.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    clock: FrameClock,
    max_frames: Option<u64>,
}

impl FrameLoop {
    /// Creates a loop rotating the model at `rotation_speed` radians per
    /// second.
    pub fn new(rotation_speed: f32) -> Self {
        Self {
            clock: FrameClock::new(rotation_speed),
            max_frames: None,
        }
    }

    /// Stops after `max_frames` frames even without a close request.
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Runs the loop and returns the number of frames presented.
    pub fn run<R, P>(&mut self, renderer: &mut R, presenter: &mut P) -> Result<u64, R::Error>
    where
        R: FrameRenderer,
        P: Presenter<R::Frame>,
    {
        let mut presented = 0;
        while !presenter.close_requested() {
            if self.max_frames.is_some_and(|max| presented >= max) {
                break;
            }

            let tick = self.clock.tick();
            let (width, height) = renderer.viewport();
            #[allow(clippy::cast_precision_loss)]
            let aspect = width as f32 / height.max(1) as f32;
            let transforms = self.clock.transforms(&tick, aspect);

            let frame = renderer.render_frame(&transforms)?;
            presenter.present(frame);
            presented += 1;
            log::trace!("presented frame {} (dt {:.4}s)", tick.frame, tick.delta);
        }
        log::info!("frame loop stopped after {presented} frames");
        Ok(presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxel_core::{premade, RenderOptions, VolumeDataset};

    struct CountingPresenter {
        close_after: u64,
        presented: u64,
        checks: u64,
    }

    impl Presenter<SoftwareFrame> for CountingPresenter {
        fn close_requested(&mut self) -> bool {
            self.checks += 1;
            self.presented >= self.close_after
        }

        fn present(&mut self, frame: SoftwareFrame) {
            assert_eq!(frame.pixels.len(), 16 * 8);
            self.presented += 1;
        }
    }

    fn compositor() -> SoftwareCompositor {
        let volume = VolumeDataset::load(&[0; 8], 2, 2, 2).unwrap();
        let options = RenderOptions::default().with_sample_count(8);
        SoftwareCompositor::new(volume, premade::transparent(), &options, 16, 8).unwrap()
    }

    #[test]
    fn test_loop_stops_on_close_request() {
        let mut presenter = CountingPresenter {
            close_after: 3,
            presented: 0,
            checks: 0,
        };
        let frames = FrameLoop::new(0.5)
            .run(&mut compositor(), &mut presenter)
            .unwrap();
        assert_eq!(frames, 3);
        // One check per frame plus the final one that stops the loop.
        assert_eq!(presenter.checks, 4);
    }

    #[test]
    fn test_loop_respects_max_frames() {
        let mut presenter = CountingPresenter {
            close_after: u64::MAX,
            presented: 0,
            checks: 0,
        };
        let frames = FrameLoop::new(0.5)
            .with_max_frames(2)
            .run(&mut compositor(), &mut presenter)
            .unwrap();
        assert_eq!(frames, 2);
        assert_eq!(presenter.presented, 2);
    }

    #[test]
    fn test_closed_before_first_frame() {
        let mut presenter = CountingPresenter {
            close_after: 0,
            presented: 0,
            checks: 0,
        };
        let frames = FrameLoop::new(0.5)
            .run(&mut compositor(), &mut presenter)
            .unwrap();
        assert_eq!(frames, 0);
    }
}
