//! Orbits a synthetic head-like volume and saves the last frame as a PNG.
//!
//! Run with: cargo run --example demo [-- --gpu]
//!
//! Without `--gpu` the CPU pipeline renders the frames.

use image::{ImageBuffer, Rgba};
use voxel::*;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const FRAMES: u64 = 30;

/// Nested spheres: a dense shell around softer tissue.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn phantom(size: u32) -> Result<VolumeDataset> {
    let center = (size as f32 - 1.0) / 2.0;
    VolumeDataset::from_fn(size, size, size, |x, y, z| {
        let p = Vec3::new(x as f32, y as f32, z as f32) - Vec3::splat(center);
        let r = p.length() / center;
        match r {
            r if r > 0.95 => 0,
            r if r > 0.8 => 220,
            r => (60.0 + 40.0 * (r * 12.0).sin().abs()) as u8,
        }
    })
}

/// Keeps the last frame and writes it out once the loop stops.
struct KeepLast<F>(Option<F>);

impl<F> Presenter<F> for KeepLast<F> {
    fn close_requested(&mut self) -> bool {
        false
    }

    fn present(&mut self, frame: F) {
        self.0 = Some(frame);
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let options = RenderOptions::default().with_sample_count(256);
    let volume = phantom(96)?;
    let transfer = premade::skull();
    let mut frame_loop = FrameLoop::new(options.rotation_speed).with_max_frames(FRAMES);

    let rgba = if std::env::args().any(|arg| arg == "--gpu") {
        let mut renderer = HeadlessRenderer::new(&volume, &transfer, &options, WIDTH, HEIGHT)?;
        let mut presenter = KeepLast(None);
        frame_loop.run(&mut renderer, &mut presenter)?;
        presenter.0.unwrap_or_default()
    } else {
        let mut compositor = SoftwareCompositor::new(volume, transfer, &options, WIDTH, HEIGHT)?;
        let mut presenter = KeepLast(None);
        frame_loop.run(&mut compositor, &mut presenter)?;
        let frame = presenter.0.ok_or("no frame rendered")?;
        println!(
            "covered {} pixels, {} composited, {} discarded",
            frame.stats.covered, frame.stats.composited, frame.stats.discarded
        );
        frame.to_rgba8()
    };

    let img: ImageBuffer<Rgba<u8>, _> =
        ImageBuffer::from_raw(WIDTH, HEIGHT, rgba).ok_or("frame size does not match the viewport")?;
    img.save_with_format("voxel_demo.png", image::ImageFormat::Png)?;
    println!("wrote voxel_demo.png");
    Ok(())
}
