//! Dense 3D density volumes.

use std::path::Path;

use glam::Vec3;

use crate::{Result, VoxelError};

/// A dense grid of 8-bit density samples.
///
/// Samples are stored with x varying fastest: the voxel at `(x, y, z)` lives
/// at `x + y * width + z * width * height`. The dataset is immutable once
/// loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeDataset {
    width: u32,
    height: u32,
    depth: u32,
    data: Vec<u8>,
}

impl VolumeDataset {
    /// Builds a dataset from raw bytes laid out as `width * height * depth`
    /// voxels.
    ///
    /// Any blob of exactly that length is accepted, including the empty blob
    /// of a grid with a zero dimension. Every other length is a
    /// `SizeMismatch`.
    pub fn load(raw: &[u8], width: u32, height: u32, depth: u32) -> Result<Self> {
        match Self::byte_len(width, height, depth) {
            Some(expected) if expected == raw.len() => {}
            expected => {
                return Err(VoxelError::SizeMismatch {
                    what: "volume",
                    expected: expected.unwrap_or(usize::MAX),
                    actual: raw.len(),
                })
            }
        }

        log::debug!("loaded {width}x{height}x{depth} volume");
        Ok(Self {
            width,
            height,
            depth,
            data: raw.to_vec(),
        })
    }

    /// Reads a headerless raw volume file.
    pub fn from_file(path: impl AsRef<Path>, width: u32, height: u32, depth: u32) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)?;
        log::info!("reading volume {} ({} bytes)", path.display(), raw.len());
        Self::load(&raw, width, height, depth)
    }

    /// Builds a dataset by evaluating `f(x, y, z)` for every voxel.
    pub fn from_fn(
        width: u32,
        height: u32,
        depth: u32,
        mut f: impl FnMut(u32, u32, u32) -> u8,
    ) -> Result<Self> {
        let len = Self::byte_len(width, height, depth).ok_or(VoxelError::InvalidDimensions {
            width,
            height,
            depth,
        })?;
        let mut data = Vec::with_capacity(len);
        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    data.push(f(x, y, z));
                }
            }
        }
        Ok(Self {
            width,
            height,
            depth,
            data,
        })
    }

    /// Voxel count, `None` on overflow.
    fn byte_len(width: u32, height: u32, depth: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(depth as usize))
    }

    /// Whether the grid holds no voxels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `(width, height, depth)`.
    pub fn dimensions(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.depth)
    }

    /// Returns the raw voxel bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns a copy of the raw voxel bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Returns the voxel at integer coordinates, clamped to the grid. An
    /// empty grid reads as zero everywhere.
    pub fn voxel(&self, x: u32, y: u32, z: u32) -> u8 {
        if self.is_empty() {
            return 0;
        }
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let z = z.min(self.depth - 1) as usize;
        let w = self.width as usize;
        let h = self.height as usize;
        self.data[x + y * w + z * w * h]
    }

    /// Samples the density at normalized coordinates in `[0, 1]^3`.
    ///
    /// Trilinear interpolation between voxel centers, clamped to the edge
    /// voxels outside the grid. Returns a value in `[0, 1]`; an empty grid
    /// samples as zero.
    pub fn sample(&self, u: f32, v: f32, w: f32) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let (x0, x1, fx) = axis_taps(u, self.width);
        let (y0, y1, fy) = axis_taps(v, self.height);
        let (z0, z1, fz) = axis_taps(w, self.depth);

        let c = |x, y, z| f32::from(self.voxel(x, y, z)) / 255.0;
        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

        let c00 = lerp(c(x0, y0, z0), c(x1, y0, z0), fx);
        let c10 = lerp(c(x0, y1, z0), c(x1, y1, z0), fx);
        let c01 = lerp(c(x0, y0, z1), c(x1, y0, z1), fx);
        let c11 = lerp(c(x0, y1, z1), c(x1, y1, z1), fx);

        let c0 = lerp(c00, c10, fy);
        let c1 = lerp(c01, c11, fy);
        lerp(c0, c1, fz).clamp(0.0, 1.0)
    }

    /// Samples the density at a normalized position.
    pub fn sample_at(&self, p: Vec3) -> f32 {
        self.sample(p.x, p.y, p.z)
    }
}

/// Splits a normalized coordinate into the two neighbouring voxel indices and
/// the interpolation weight between them.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn axis_taps(u: f32, size: u32) -> (u32, u32, f32) {
    let max = (size - 1) as f32;
    let t = if u.is_finite() {
        (u * size as f32 - 0.5).clamp(0.0, max)
    } else {
        0.0
    };
    let i0 = t.floor();
    let i1 = (i0 + 1.0).min(max);
    (i0 as u32, i1 as u32, t - i0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp_x(width: u32) -> VolumeDataset {
        VolumeDataset::from_fn(width, 2, 2, |x, _, _| {
            (x * 255 / (width - 1)) as u8
        })
        .unwrap()
    }

    #[test]
    fn test_load_exact_size() {
        let raw = vec![7u8; 4 * 3 * 2];
        let volume = VolumeDataset::load(&raw, 4, 3, 2).unwrap();
        assert_eq!(volume.dimensions(), (4, 3, 2));
        assert_eq!(volume.as_bytes(), raw.as_slice());
        assert_eq!(volume.to_bytes(), raw);
    }

    #[test]
    fn test_load_size_mismatch() {
        let err = VolumeDataset::load(&[0u8; 23], 4, 3, 2).unwrap_err();
        match err {
            VoxelError::SizeMismatch {
                what,
                expected,
                actual,
            } => {
                assert_eq!(what, "volume");
                assert_eq!(expected, 24);
                assert_eq!(actual, 23);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_zero_dimension() {
        let volume = VolumeDataset::load(&[], 0, 3, 2).unwrap();
        assert!(volume.is_empty());
        assert_eq!(volume.dimensions(), (0, 3, 2));
        assert_eq!(volume.voxel(0, 0, 0), 0);
        assert_eq!(volume.sample(0.5, 0.5, 0.5), 0.0);

        let err = VolumeDataset::load(&[1, 2, 3], 0, 3, 2).unwrap_err();
        assert!(matches!(
            err,
            VoxelError::SizeMismatch {
                expected: 0,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_load_overflowing_dimensions() {
        let err = VolumeDataset::load(&[0; 8], u32::MAX, u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(err, VoxelError::SizeMismatch { actual: 8, .. }));
    }

    #[test]
    fn test_voxel_layout_x_fastest() {
        let raw: Vec<u8> = (0..24).collect();
        let volume = VolumeDataset::load(&raw, 4, 3, 2).unwrap();
        assert_eq!(volume.voxel(1, 0, 0), 1);
        assert_eq!(volume.voxel(0, 1, 0), 4);
        assert_eq!(volume.voxel(0, 0, 1), 12);
        assert_eq!(volume.voxel(3, 2, 1), 23);
        // Clamped outside the grid.
        assert_eq!(volume.voxel(9, 9, 9), 23);
    }

    #[test]
    fn test_sample_uniform() {
        let volume = VolumeDataset::load(&[128u8; 8], 2, 2, 2).unwrap();
        for p in [Vec3::ZERO, Vec3::splat(0.5), Vec3::ONE, Vec3::new(0.3, 0.9, 0.1)] {
            assert!((volume.sample_at(p) - 128.0 / 255.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sample_texel_centers() {
        let volume = ramp_x(4);
        // Texel i is centred at (i + 0.5) / 4.
        assert!((volume.sample(0.125, 0.5, 0.5) - 0.0).abs() < 1e-6);
        assert!((volume.sample(0.875, 0.5, 0.5) - 1.0).abs() < 1e-6);
        let mid = (f32::from(volume.voxel(1, 0, 0)) + f32::from(volume.voxel(2, 0, 0))) / 2.0;
        assert!((volume.sample(0.5, 0.5, 0.5) - mid / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_sample_edge_clamped() {
        let volume = ramp_x(4);
        assert_eq!(volume.sample(0.0, 0.5, 0.5), volume.sample(0.125, 0.5, 0.5));
        assert_eq!(volume.sample(-3.0, 0.5, 0.5), 0.0);
        assert_eq!(volume.sample(1.0, 0.5, 0.5), 1.0);
        assert_eq!(volume.sample(7.0, 0.5, 0.5), 1.0);
    }

    proptest! {
        #[test]
        fn prop_sample_in_unit_range(
            data in proptest::collection::vec(any::<u8>(), 27),
            u in -1.0f32..2.0,
            v in -1.0f32..2.0,
            w in -1.0f32..2.0,
        ) {
            let volume = VolumeDataset::load(&data, 3, 3, 3).unwrap();
            let d = volume.sample(u, v, w);
            prop_assert!((0.0..=1.0).contains(&d));
        }

        #[test]
        fn prop_size_mismatch_unless_exact(
            len in 0usize..64,
            width in 0u32..5,
            height in 0u32..5,
            depth in 0u32..5,
        ) {
            let result = VolumeDataset::load(&vec![0u8; len], width, height, depth);
            let exact = len == (width * height * depth) as usize;
            prop_assert_eq!(result.is_ok(), exact);
            if !exact {
                let is_size_mismatch = matches!(result, Err(VoxelError::SizeMismatch { .. }));
                prop_assert!(is_size_mismatch);
            }
        }
    }
}
