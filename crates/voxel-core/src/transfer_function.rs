//! Density to color/opacity lookup tables.

use std::path::Path;

use glam::{Vec3, Vec4};

use crate::{Result, VoxelError};

/// Number of entries in a transfer function table.
pub const TRANSFER_FUNCTION_ENTRIES: usize = 256;

/// Size in bytes of a serialized transfer function (RGBA8 per entry).
pub const TRANSFER_FUNCTION_BYTES: usize = TRANSFER_FUNCTION_ENTRIES * 4;

/// A 256-entry RGBA8 table mapping density to color and opacity.
#[derive(Clone, PartialEq, Eq)]
pub struct TransferFunction {
    entries: [[u8; 4]; TRANSFER_FUNCTION_ENTRIES],
}

impl std::fmt::Debug for TransferFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferFunction")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl TransferFunction {
    /// Builds a table from exactly 1024 bytes of RGBA8 data.
    pub fn load(raw: &[u8]) -> Result<Self> {
        if raw.len() != TRANSFER_FUNCTION_BYTES {
            return Err(VoxelError::SizeMismatch {
                what: "transfer function",
                expected: TRANSFER_FUNCTION_BYTES,
                actual: raw.len(),
            });
        }

        let mut entries = [[0u8; 4]; TRANSFER_FUNCTION_ENTRIES];
        for (entry, chunk) in entries.iter_mut().zip(raw.chunks_exact(4)) {
            entry.copy_from_slice(chunk);
        }
        Ok(Self { entries })
    }

    /// Reads a headerless transfer function file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)?;
        log::info!("reading transfer function {}", path.display());
        Self::load(&raw)
    }

    /// Builds a table by evaluating `f(index)` for each entry.
    pub fn from_fn(mut f: impl FnMut(u8) -> [u8; 4]) -> Self {
        let mut entries = [[0u8; 4]; TRANSFER_FUNCTION_ENTRIES];
        for (i, entry) in (0..=u8::MAX).zip(entries.iter_mut()) {
            *entry = f(i);
        }
        Self { entries }
    }

    /// Returns the raw RGBA8 entry at `index`.
    pub fn entry(&self, index: u8) -> [u8; 4] {
        self.entries[index as usize]
    }

    /// Returns the table as 1024 contiguous bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.entries.as_flattened()
    }

    /// Returns a copy of the table bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Table index for a density: `round(density * 255)`, wrapping modulo 256.
    ///
    /// A density slightly above 1 therefore maps to entry 0.
    #[allow(clippy::cast_possible_truncation)]
    pub fn index_for(density: f32) -> u8 {
        let scaled = (density * 255.0).round();
        if !scaled.is_finite() {
            return 0;
        }
        (scaled as i64).rem_euclid(TRANSFER_FUNCTION_ENTRIES as i64) as u8
    }

    /// Looks up the color and opacity for a density in `[0, 1]`.
    pub fn evaluate(&self, density: f32) -> (Vec3, f32) {
        let rgba = self.evaluate_rgba(density);
        (rgba.truncate(), rgba.w)
    }

    /// Looks up the normalized RGBA entry for a density.
    pub fn evaluate_rgba(&self, density: f32) -> Vec4 {
        let [r, g, b, a] = self.entry(Self::index_for(density));
        Vec4::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }
}
