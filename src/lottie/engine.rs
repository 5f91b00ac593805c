use serde_json::error::Category;

use super::{
    model::LottieDef,
    scene::{PaintOp, Scene},
};
use crate::{
    engine::{EngineError, LoadError, LoadErrorKind, SeekStatus, VectorEngine},
    foundation::core::NaturalSize,
    pixel::pack_argb,
};

struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

/// Lottie renderer on `vello_cpu`.
///
/// Draws shape layers (rectangles, ellipses, bezier paths, fills, strokes,
/// group and layer transforms, parenting). Other layer kinds load but draw
/// nothing. The composition is stretched to the attached surface.
#[derive(Default)]
pub struct CpuLottieEngine {
    scene: Option<Scene>,
    /// Frame offset from the in point.
    frame: f64,
    display: Vec<PaintOp>,
    surface: Option<CpuSurface>,
}

impl CpuLottieEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse(text: &str) -> Result<Scene, LoadError> {
        let def: LottieDef = serde_json::from_str(text).map_err(|e| {
            let kind = match e.classify() {
                Category::Syntax | Category::Eof => LoadErrorKind::InvalidArguments,
                Category::Data => LoadErrorKind::Unsupported,
                Category::Io => LoadErrorKind::Unknown,
            };
            LoadError::new(kind, e.to_string())
        })?;
        Scene::compile(def)
    }
}

impl VectorEngine for CpuLottieEngine {
    fn check(&self, text: &str) -> Result<(), LoadError> {
        Self::parse(text).map(|_| ())
    }

    fn load(&mut self, text: &str) -> Result<(), LoadError> {
        let scene = Self::parse(text)?;
        tracing::debug!(
            width = scene.width,
            height = scene.height,
            frames = scene.total_frame_count(),
            "loaded lottie scene"
        );
        self.scene = Some(scene);
        self.frame = 0.0;
        self.display.clear();
        Ok(())
    }

    fn natural_size(&self) -> NaturalSize {
        self.scene
            .as_ref()
            .map_or_else(NaturalSize::default, |s| NaturalSize::new(s.width, s.height))
    }

    fn total_frame_count(&self) -> f64 {
        self.scene.as_ref().map_or(0.0, Scene::total_frame_count)
    }

    fn duration(&self) -> f64 {
        self.scene
            .as_ref()
            .map_or(0.0, |s| s.total_frame_count() / s.frame_rate)
    }

    fn seek(&mut self, frame: f64) -> SeekStatus {
        let Some(scene) = &self.scene else {
            return SeekStatus::Failed("no animation loaded".to_string());
        };
        if !frame.is_finite() {
            return SeekStatus::Failed(format!("frame {frame} is not finite"));
        }
        let frame = frame.clamp(0.0, scene.total_frame_count());
        if frame == self.frame {
            return SeekStatus::Unchanged;
        }
        self.frame = frame;
        SeekStatus::Updated
    }

    fn attach_surface(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        if self.scene.is_none() {
            return Err(EngineError::NoScene);
        }
        let width: u16 = width
            .try_into()
            .map_err(|_| EngineError::Surface("surface width exceeds u16".to_string()))?;
        let height: u16 = height
            .try_into()
            .map_err(|_| EngineError::Surface("surface height exceeds u16".to_string()))?;
        if width == 0 || height == 0 {
            return Err(EngineError::Surface("surface must not be empty".to_string()));
        }
        self.surface = Some(CpuSurface {
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
        });
        Ok(())
    }

    fn update(&mut self) {
        if let Some(scene) = &self.scene {
            let at = (scene.in_point + self.frame).min(scene.last_frame());
            self.display = scene.render(at);
        }
    }

    fn draw(&mut self) -> Result<(), EngineError> {
        let scene = self.scene.as_ref().ok_or(EngineError::NoScene)?;
        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| EngineError::Draw("no surface attached".to_string()))?;

        let fit = kurbo::Affine::scale_non_uniform(
            f64::from(surface.width) / scene.width,
            f64::from(surface.height) / scene.height,
        );
        let mut ctx = vello_cpu::RenderContext::new(surface.width, surface.height);
        ctx.set_transform(affine_to_cpu(fit));
        for op in &self.display {
            match op {
                PaintOp::Fill { path, color } => {
                    ctx.set_paint(paint(*color));
                    ctx.fill_path(&bezpath_to_cpu(path));
                }
                PaintOp::Stroke { path, color, width } => {
                    ctx.set_paint(paint(*color));
                    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
                    ctx.stroke_path(&bezpath_to_cpu(path));
                }
            }
        }
        ctx.flush();
        clear_pixmap(&mut surface.pixmap);
        ctx.render_to_pixmap(&mut surface.pixmap);
        Ok(())
    }

    fn sync(&mut self, target: &mut [u32]) -> Result<(), EngineError> {
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| EngineError::Sync("no surface attached".to_string()))?;
        let expected = usize::from(surface.width) * usize::from(surface.height);
        if target.len() != expected {
            return Err(EngineError::Sync(format!(
                "target holds {} pixels, surface has {expected}",
                target.len()
            )));
        }
        let data = surface.pixmap.data_as_u8_slice();
        for (dst, px) in target.iter_mut().zip(data.chunks_exact(4)) {
            *dst = pack_argb(px[0], px[1], px[2], px[3]);
        }
        Ok(())
    }

    fn clear_surface(&mut self, keep_attached: bool) {
        if keep_attached {
            if let Some(surface) = &mut self.surface {
                clear_pixmap(&mut surface.pixmap);
            }
        } else {
            self.surface = None;
        }
    }
}

fn paint(color: [u8; 4]) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = color;
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
