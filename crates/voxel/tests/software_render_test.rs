//! End-to-end tests of the CPU pipeline: both passes, compositing and the
//! frame loop, driven only through the public API.

use proptest::prelude::*;
use voxel::*;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;

const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);
const WHITE: Vec3 = Vec3::ONE;

fn uniform_volume(value: u8) -> VolumeDataset {
    VolumeDataset::from_fn(128, 128, 128, |_, _, _| value).unwrap()
}

fn aspect() -> f32 {
    WIDTH as f32 / HEIGHT as f32
}

fn render(volume: VolumeDataset, transfer: TransferFunction, options: &RenderOptions, angle: f32) -> SoftwareFrame {
    let mut compositor = SoftwareCompositor::new(volume, transfer, options, WIDTH, HEIGHT).unwrap();
    compositor
        .render(&FrameTransforms::orbit(angle, aspect()))
        .unwrap()
}

#[test]
fn opaque_band_renders_red_cube_on_white() {
    let frame = render(
        uniform_volume(128),
        premade::band(127..=128, [255, 0, 0]),
        &RenderOptions::default(),
        0.7,
    );

    let mut red = 0;
    for &pixel in &frame.pixels {
        if pixel == RED {
            red += 1;
        } else {
            assert_eq!(pixel, WHITE, "unexpected pixel {pixel}");
        }
    }

    assert_eq!(frame.pixel(WIDTH / 2, HEIGHT / 2), RED);
    for (x, y) in [(0, 0), (WIDTH - 1, 0), (0, HEIGHT - 1), (WIDTH - 1, HEIGHT - 1)] {
        assert_eq!(frame.pixel(x, y), WHITE);
    }
    assert_eq!(red, frame.stats.composited);
    assert_eq!(frame.stats.covered, frame.stats.composited + frame.stats.discarded);
}

#[test]
fn zero_opacity_shows_only_background() {
    let frame = render(
        uniform_volume(200),
        premade::transparent(),
        &RenderOptions::default(),
        1.3,
    );
    assert!(frame.pixels.iter().all(|&p| p == WHITE));
    assert!(frame.stats.composited > 0);
}

#[test]
fn background_option_reaches_uncovered_pixels() {
    let background = Vec3::new(0.1, 0.2, 0.3);
    let options = RenderOptions::default().with_background(background);
    let frame = render(uniform_volume(0), premade::transparent(), &options, 0.2);
    assert_eq!(frame.pixel(0, 0), background);
    assert_eq!(frame.pixel(WIDTH / 2, HEIGHT / 2), background);
}

#[test]
fn rgba8_output_is_tightly_packed() {
    let frame = render(
        uniform_volume(128),
        premade::band(127..=128, [255, 0, 0]),
        &RenderOptions::default(),
        0.7,
    );
    let bytes = frame.to_rgba8();
    assert_eq!(bytes.len(), (WIDTH * HEIGHT * 4) as usize);
    assert_eq!(&bytes[..4], &[255, 255, 255, 255]);
    let center = ((HEIGHT / 2 * WIDTH + WIDTH / 2) * 4) as usize;
    assert_eq!(&bytes[center..center + 4], &[255, 0, 0, 255]);
}

#[test]
fn frame_loop_drives_software_compositor() {
    struct Collect(Vec<FrameStats>);

    impl Presenter<SoftwareFrame> for Collect {
        fn close_requested(&mut self) -> bool {
            self.0.len() >= 4
        }

        fn present(&mut self, frame: SoftwareFrame) {
            self.0.push(frame.stats);
        }
    }

    let volume = VolumeDataset::from_fn(8, 8, 8, |_, _, _| 128).unwrap();
    let options = RenderOptions::default().with_sample_count(16);
    let mut compositor =
        SoftwareCompositor::new(volume, premade::band(127..=128, [255, 0, 0]), &options, 32, 32).unwrap();
    let mut presenter = Collect(Vec::new());

    let frames = FrameLoop::new(options.rotation_speed)
        .run(&mut compositor, &mut presenter)
        .unwrap();

    assert_eq!(frames, 4);
    assert!(presenter.0.iter().all(|stats| stats.composited > 0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn opaque_band_is_red_or_white_from_any_angle(angle in 0.0f32..std::f32::consts::TAU) {
        let volume = VolumeDataset::from_fn(16, 16, 16, |_, _, _| 128).unwrap();
        let options = RenderOptions::default().with_sample_count(32);
        let mut compositor =
            SoftwareCompositor::new(volume, premade::band(127..=128, [255, 0, 0]), &options, 24, 24).unwrap();
        let frame = compositor.render(&FrameTransforms::orbit(angle, 1.0)).unwrap();

        prop_assert!(frame.pixels.iter().all(|&p| p == RED || p == WHITE));
        prop_assert_eq!(frame.pixel(12, 12), RED);
    }
}
