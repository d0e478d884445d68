//! Per-frame transforms and the default animation driver.

use std::time::{Duration, Instant};

use glam::{Mat4, Vec3};

/// Distance of the default camera from the volume center.
pub const DEFAULT_EYE_DISTANCE: f32 = 3.0;

/// Vertical field of view of the default camera, in degrees.
pub const DEFAULT_FOV_DEGREES: f32 = 45.0;

/// The world, view and projection matrices of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    /// Model space (the unit cube) to world space.
    pub world: Mat4,
    /// World space to camera space.
    pub view: Mat4,
    /// Camera space to clip space (depth in `[0, 1]`).
    pub projection: Mat4,
}

impl Default for FrameTransforms {
    fn default() -> Self {
        Self::orbit(0.0, 1.0)
    }
}

impl FrameTransforms {
    /// Creates transforms from explicit matrices.
    pub fn new(world: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            world,
            view,
            projection,
        }
    }

    /// The volume centered at the origin and rotated by `angle` radians
    /// about +Y, seen from a fixed camera on the +Z axis.
    pub fn orbit(angle: f32, aspect: f32) -> Self {
        let world = Mat4::from_rotation_y(angle) * Mat4::from_translation(Vec3::splat(-0.5));
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, DEFAULT_EYE_DISTANCE), Vec3::ZERO, Vec3::Y);
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        let projection = Mat4::perspective_rh(DEFAULT_FOV_DEGREES.to_radians(), aspect, 0.1, 100.0);
        Self::new(world, view, projection)
    }

    /// Combined model-view-projection matrix.
    pub fn model_view_projection(&self) -> Mat4 {
        self.projection * self.view * self.world
    }
}

/// Timing of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Seconds since the clock started.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
    /// Frame number, starting at 0.
    pub frame: u64,
}

/// Drives the model rotation from wall-clock time.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    previous: Duration,
    frame: u64,
    rotation_speed: f32,
}

impl FrameClock {
    /// Starts a clock rotating at `rotation_speed` radians per second.
    pub fn new(rotation_speed: f32) -> Self {
        Self {
            start: Instant::now(),
            previous: Duration::ZERO,
            frame: 0,
            rotation_speed,
        }
    }

    /// Advances to the current wall-clock time.
    pub fn tick(&mut self) -> FrameTick {
        let now = self.start.elapsed();
        self.tick_at(now)
    }

    /// Advances to `elapsed` since the clock started. Time never runs
    /// backwards: an earlier timestamp yields a zero delta.
    pub fn tick_at(&mut self, elapsed: Duration) -> FrameTick {
        let elapsed = elapsed.max(self.previous);
        let delta = elapsed - self.previous;
        self.previous = elapsed;
        let tick = FrameTick {
            elapsed: elapsed.as_secs_f32(),
            delta: delta.as_secs_f32(),
            frame: self.frame,
        };
        self.frame += 1;
        tick
    }

    /// Model rotation angle for a tick.
    pub fn angle(&self, tick: &FrameTick) -> f32 {
        tick.elapsed * self.rotation_speed
    }

    /// Transforms for a tick at the given viewport aspect ratio.
    pub fn transforms(&self, tick: &FrameTick, aspect: f32) -> FrameTransforms {
        FrameTransforms::orbit(self.angle(tick), aspect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn project(transforms: &FrameTransforms, p: Vec3) -> Vec3 {
        let clip = transforms.model_view_projection() * p.extend(1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn test_orbit_centers_volume() {
        let transforms = FrameTransforms::orbit(0.7, 1.0);
        let center = project(&transforms, Vec3::splat(0.5));
        assert!(center.x.abs() < 1e-5);
        assert!(center.y.abs() < 1e-5);
        assert!((0.0..1.0).contains(&center.z));
    }

    #[test]
    fn test_orbit_cube_inside_view() {
        let transforms = FrameTransforms::orbit(1.3, 1.0);
        let mvp = transforms.model_view_projection();
        for i in 0..8u32 {
            let corner = Vec4::new((i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32, 1.0);
            let clip = mvp * corner;
            assert!(clip.w > 0.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() < 0.9 && ndc.y.abs() < 0.9, "corner {i} at {ndc:?}");
        }
    }

    #[test]
    fn test_clock_delta() {
        let mut clock = FrameClock::new(0.5);
        let first = clock.tick_at(Duration::from_millis(100));
        assert_eq!(first.frame, 0);
        assert!((first.delta - 0.1).abs() < 1e-6);
        let second = clock.tick_at(Duration::from_millis(350));
        assert_eq!(second.frame, 1);
        assert!((second.delta - 0.25).abs() < 1e-6);
        assert!((clock.angle(&second) - 0.175).abs() < 1e-6);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut clock = FrameClock::new(1.0);
        clock.tick_at(Duration::from_secs(2));
        let tick = clock.tick_at(Duration::from_secs(1));
        assert_eq!(tick.delta, 0.0);
        assert_eq!(tick.elapsed, 2.0);
    }
}
