//! Ready-made transfer functions.

use crate::TransferFunction;

/// Gray ramp whose opacity grows linearly with density, scaled by
/// `max_opacity` in `[0, 1]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn grayscale_ramp(max_opacity: f32) -> TransferFunction {
    let scale = max_opacity.clamp(0.0, 1.0);
    TransferFunction::from_fn(|i| {
        let a = (f32::from(i) * scale).round() as u8;
        [i, i, i, a]
    })
}

/// Fully transparent table. Every ray through it shows the background.
pub fn transparent() -> TransferFunction {
    TransferFunction::from_fn(|_| [0; 4])
}

/// Single opaque color for densities whose table index lies in `range`.
pub fn band(range: std::ops::RangeInclusive<u8>, color: [u8; 3]) -> TransferFunction {
    TransferFunction::from_fn(|i| {
        if range.contains(&i) {
            [color[0], color[1], color[2], 255]
        } else {
            [0; 4]
        }
    })
}

/// Classic CT preset: air and noise transparent, soft tissue faint red,
/// bone opaque ivory.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn skull() -> TransferFunction {
    TransferFunction::from_fn(|i| match i {
        0..=39 => [0, 0, 0, 0],
        40..=89 => {
            let t = f32::from(i - 40) / 50.0;
            [200, 80, 60, (t * 12.0).round() as u8]
        }
        90..=139 => {
            let t = f32::from(i - 90) / 50.0;
            let g = (80.0 + t * 140.0).round() as u8;
            [220, g, 170, (12.0 + t * 80.0).round() as u8]
        }
        _ => [245, 240, 225, 230],
    })
}
