use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use lottie_sheet::{
    AUTO_ROWS, BakeParameters, CpuLottieEngine, LottieTexture, SheetSettings, TextureContent,
    TextureRegistry, load_artifact_file,
};

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).unwrap()
}

fn rgba_at(tex: &LottieTexture, x: u32, y: u32) -> [u8; 4] {
    tex.image().unwrap().get_pixel(x, y).0
}

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

#[test]
fn four_frames_fill_a_two_by_two_sheet() {
    let tex = LottieTexture::create_from_text(
        Box::new(CpuLottieEngine::new()),
        TextureRegistry::shared(),
        &read_fixture("square.json"),
        BakeParameters {
            frame_end: 60.0,
            frame_count: 4,
            ..BakeParameters::default()
        },
    )
    .unwrap();

    assert_eq!(tex.size(), (200, 200));
    let g = tex.geometry().unwrap();
    assert_eq!((g.rows, g.columns), (2, 2));
    assert_eq!((g.cell_width, g.cell_height), (100, 100));
    assert_eq!(g.effective_scale, 1.0);

    for (x0, y0) in [(0, 0), (100, 0), (0, 100), (100, 100)] {
        assert_eq!(rgba_at(&tex, x0 + 25, y0 + 25), RED);
        assert_eq!(rgba_at(&tex, x0 + 75, y0 + 75), CLEAR);
        assert!(tex.is_pixel_opaque(x0 + 10, y0 + 10));
        assert!(!tex.is_pixel_opaque(x0 + 90, y0 + 90));
    }
}

#[test]
fn scale_shrinks_cells() {
    let tex = LottieTexture::create_from_text(
        Box::new(CpuLottieEngine::new()),
        TextureRegistry::shared(),
        &read_fixture("square.json"),
        BakeParameters {
            scale: 0.5,
            frame_count: 3,
            rows: 1,
            ..BakeParameters::default()
        },
    )
    .unwrap();

    assert_eq!(tex.size(), (150, 50));
    assert_eq!(rgba_at(&tex, 112, 12), RED);
    assert_eq!(rgba_at(&tex, 140, 40), CLEAR);
}

#[test]
fn oversized_request_is_clamped_to_max_dimension() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .with_writer(move || writer.clone())
        .finish();

    let settings = SheetSettings { max_dimension: 400 };
    let mut tex = LottieTexture::new(Box::new(CpuLottieEngine::new()), TextureRegistry::shared())
        .with_settings(settings);
    let doc = lottie_sheet::AnimationDocument::parse(&read_fixture("square.json")).unwrap();
    tracing::subscriber::with_default(subscriber, || {
        tex.update(
            doc,
            BakeParameters {
                scale: 4.0,
                frame_count: 4,
                rows: AUTO_ROWS,
                ..BakeParameters::default()
            },
        )
    })
    .unwrap();

    let output = logs.contents();
    assert!(output.contains("WARN"), "{output}");
    assert!(output.contains("target canvas exceeds the max supported dimensions"));
    assert!(output.contains("max_dimension=400"));

    assert_eq!(tex.scale(), 4.0);
    assert_eq!(tex.effective_scale(), Some(2.0));
    assert_eq!(tex.size(), (400, 400));
    let clamp = tex.geometry().unwrap().clamp.unwrap();
    assert_eq!(clamp.requested_cell_width, 400);
    // The square covers the top-left quarter of each 200px cell.
    assert_eq!(rgba_at(&tex, 250, 50), RED);
    assert_eq!(rgba_at(&tex, 350, 350), CLEAR);
}

#[test]
fn stored_parameters_drive_the_bake() {
    let registry = TextureRegistry::shared();
    let tex = load_artifact_file(
        fixture("sliding.json"),
        Box::new(CpuLottieEngine::new()),
        registry.clone(),
        SheetSettings::default(),
    )
    .unwrap();

    assert_eq!(tex.frame_count(), 2);
    assert_eq!(tex.rows(), 1);
    assert_eq!(tex.size(), (200, 100));

    // Frame 0: square at x 0..50. Frame 30: slid right to x 25..75.
    assert_eq!(rgba_at(&tex, 10, 25), BLUE);
    assert_eq!(rgba_at(&tex, 60, 25), CLEAR);
    assert_eq!(rgba_at(&tex, 110, 25), CLEAR);
    assert_eq!(rgba_at(&tex, 160, 25), BLUE);

    let slot = registry.get(tex.texture()).unwrap();
    assert!(matches!(
        slot.content,
        TextureContent::Image(ref img) if img.dimensions() == (200, 100)
    ));
}

#[test]
fn re_bakes_keep_the_texture_handle() {
    let registry = TextureRegistry::shared();
    let mut tex = LottieTexture::create_from_text(
        Box::new(CpuLottieEngine::new()),
        registry.clone(),
        &read_fixture("square.json"),
        BakeParameters::default(),
    )
    .unwrap();
    let handle = tex.texture();
    assert_eq!(tex.size(), (100, 100));

    tex.set_frame_count(2).unwrap();
    tex.set_scale(0.25).unwrap();

    assert_eq!(tex.texture(), handle);
    assert_eq!(tex.size(), (25, 50));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(handle).unwrap().version, 2);
}
