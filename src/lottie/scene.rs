//! Compiled Lottie scene: animated properties resolved once at load, then
//! evaluated per frame into a flat list of paint operations.

use std::collections::HashMap;

use kurbo::{Affine, BezPath, Ellipse, Rect, Shape, Vec2};

use super::{
    anim::{Animated, BezierShape, bezier_shape, numbers},
    model::{LayerDef, LottieDef, PositionDef, PropertyDef, ShapeDef, TransformDef},
};
use crate::engine::{LoadError, LoadErrorKind};

const SHAPE_LAYER: i64 = 4;
const CURVE_TOLERANCE: f64 = 0.1;

/// One fill or stroke, in composition coordinates.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PaintOp {
    Fill {
        path: BezPath,
        color: [u8; 4],
    },
    Stroke {
        path: BezPath,
        color: [u8; 4],
        width: f64,
    },
}

#[derive(Debug)]
pub(crate) struct Scene {
    pub width: f64,
    pub height: f64,
    pub frame_rate: f64,
    pub in_point: f64,
    pub out_point: f64,
    layers: Vec<Layer>,
}

#[derive(Debug)]
struct Layer {
    parent: Option<usize>,
    in_point: f64,
    out_point: f64,
    drawable: bool,
    transform: TransformAnim,
    items: Vec<Item>,
}

type Property = Animated<Vec<f64>>;

#[derive(Debug)]
enum Position {
    Unified(Property),
    Split(Property, Property),
}

#[derive(Debug)]
struct TransformAnim {
    anchor: Property,
    position: Position,
    scale: Property,
    rotation: Property,
    opacity: Property,
}

#[derive(Debug)]
enum Geometry {
    Rect {
        position: Property,
        size: Property,
        roundness: Option<Property>,
    },
    Ellipse {
        position: Property,
        size: Property,
    },
    Path(Animated<BezierShape>),
}

#[derive(Debug)]
enum Item {
    Group(Vec<Item>),
    Geometry(Geometry),
    Fill {
        color: Property,
        opacity: Property,
    },
    Stroke {
        color: Property,
        opacity: Property,
        width: Property,
    },
    Transform(TransformAnim),
}

impl Scene {
    pub fn compile(def: LottieDef) -> Result<Self, LoadError> {
        let insufficient = |msg: &str| LoadError::new(LoadErrorKind::InsufficientCondition, msg);
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(def.w) || !positive(def.h) {
            return Err(insufficient("canvas size must be positive"));
        }
        if !positive(def.fr) {
            return Err(insufficient("frame rate must be positive"));
        }
        if !(def.ip.is_finite() && def.op.is_finite() && def.op > def.ip) {
            return Err(insufficient("out point must come after in point"));
        }

        let by_index: HashMap<i64, usize> = def
            .layers
            .iter()
            .enumerate()
            .filter_map(|(pos, l)| l.ind.map(|ind| (ind, pos)))
            .collect();

        let mut layers = Vec::with_capacity(def.layers.len());
        for layer in &def.layers {
            layers.push(compile_layer(layer, &by_index, def.ip, def.op)?);
        }

        Ok(Self {
            width: def.w,
            height: def.h,
            frame_rate: def.fr,
            in_point: def.ip,
            out_point: def.op,
            layers,
        })
    }

    pub fn total_frame_count(&self) -> f64 {
        self.out_point - self.in_point
    }

    /// Last frame time with content; `out_point` itself is exclusive.
    pub fn last_frame(&self) -> f64 {
        (self.out_point - 1.0).max(self.in_point)
    }

    /// Paint operations for absolute frame time `frame`, bottom layer first.
    pub fn render(&self, frame: f64) -> Vec<PaintOp> {
        let mut out = Vec::new();
        for (idx, layer) in self.layers.iter().enumerate().rev() {
            if !layer.drawable || frame < layer.in_point || frame >= layer.out_point {
                continue;
            }
            let (_, opacity) = layer.transform.at(frame);
            if opacity <= 0.0 {
                continue;
            }
            let world = self.world_transform(idx, frame);
            render_items(&layer.items, frame, world, opacity, &mut out);
        }
        out
    }

    fn world_transform(&self, idx: usize, frame: f64) -> Affine {
        let mut world = Affine::IDENTITY;
        let mut current = Some(idx);
        // A parent cycle cannot be longer than the layer list.
        for _ in 0..=self.layers.len() {
            let Some(i) = current else {
                break;
            };
            let layer = &self.layers[i];
            world = layer.transform.at(frame).0 * world;
            current = layer.parent;
        }
        world
    }
}

fn compile_layer(
    def: &LayerDef,
    by_index: &HashMap<i64, usize>,
    scene_in: f64,
    scene_out: f64,
) -> Result<Layer, LoadError> {
    let items = if def.ty == SHAPE_LAYER {
        compile_items(&def.shapes)?
    } else {
        Vec::new()
    };
    Ok(Layer {
        parent: def.parent.and_then(|p| by_index.get(&p).copied()),
        in_point: def.ip.unwrap_or(scene_in),
        out_point: def.op.unwrap_or(scene_out),
        drawable: def.ty == SHAPE_LAYER && !def.hd,
        transform: compile_transform(&def.ks)?,
        items,
    })
}

fn compile_items(shapes: &[ShapeDef]) -> Result<Vec<Item>, LoadError> {
    let mut items = Vec::with_capacity(shapes.len());
    for shape in shapes {
        let item = match shape {
            ShapeDef::Group { hd: true, .. }
            | ShapeDef::Rect { hd: true, .. }
            | ShapeDef::Ellipse { hd: true, .. }
            | ShapeDef::Path { hd: true, .. }
            | ShapeDef::Fill { hd: true, .. }
            | ShapeDef::Stroke { hd: true, .. }
            | ShapeDef::Unsupported => continue,
            ShapeDef::Group { it, .. } => Item::Group(compile_items(it)?),
            ShapeDef::Rect { p, s, r, .. } => Item::Geometry(Geometry::Rect {
                position: property(p, "rect position")?,
                size: property(s, "rect size")?,
                roundness: r.as_ref().map(|r| property(r, "rect roundness")).transpose()?,
            }),
            ShapeDef::Ellipse { p, s, .. } => Item::Geometry(Geometry::Ellipse {
                position: property(p, "ellipse position")?,
                size: property(s, "ellipse size")?,
            }),
            ShapeDef::Path { ks, .. } => {
                let shape = Animated::parse(&ks.k, bezier_shape)
                    .ok_or_else(|| unsupported("path vertices"))?;
                Item::Geometry(Geometry::Path(shape))
            }
            ShapeDef::Fill { c, o, .. } => Item::Fill {
                color: property(c, "fill color")?,
                opacity: optional(o.as_ref(), 100.0, "fill opacity")?,
            },
            ShapeDef::Stroke { c, o, w, .. } => Item::Stroke {
                color: property(c, "stroke color")?,
                opacity: optional(o.as_ref(), 100.0, "stroke opacity")?,
                width: property(w, "stroke width")?,
            },
            ShapeDef::Transform(tr) => Item::Transform(compile_transform(tr)?),
        };
        items.push(item);
    }
    Ok(items)
}

fn compile_transform(def: &TransformDef) -> Result<TransformAnim, LoadError> {
    let position = match &def.p {
        None => Position::Unified(Animated::Static(vec![0.0, 0.0])),
        Some(PositionDef::Unified(p)) => Position::Unified(property(p, "position")?),
        Some(PositionDef::Split { x, y }) => {
            Position::Split(property(x, "position x")?, property(y, "position y")?)
        }
    };
    Ok(TransformAnim {
        anchor: optional(def.a.as_ref(), 0.0, "anchor")?,
        position,
        scale: optional(def.s.as_ref(), 100.0, "scale")?,
        rotation: optional(def.r.as_ref(), 0.0, "rotation")?,
        opacity: optional(def.o.as_ref(), 100.0, "opacity")?,
    })
}

fn unsupported(what: &str) -> LoadError {
    LoadError::new(LoadErrorKind::Unsupported, format!("unreadable {what}"))
}

fn property(def: &PropertyDef, what: &str) -> Result<Property, LoadError> {
    Animated::parse(&def.k, numbers).ok_or_else(|| unsupported(what))
}

fn optional(def: Option<&PropertyDef>, default: f64, what: &str) -> Result<Property, LoadError> {
    match def {
        Some(def) => property(def, what),
        None => Ok(Animated::Static(vec![default, default])),
    }
}

fn component(v: &[f64], i: usize, default: f64) -> f64 {
    v.get(i).copied().unwrap_or(default)
}

fn vec2(v: &[f64], default: f64) -> Vec2 {
    let x = component(v, 0, default);
    Vec2::new(x, component(v, 1, x))
}

impl TransformAnim {
    /// Local matrix and opacity (`0..=1`) at `frame`.
    fn at(&self, frame: f64) -> (Affine, f64) {
        let anchor = vec2(&self.anchor.at(frame), 0.0);
        let position = match &self.position {
            Position::Unified(p) => vec2(&p.at(frame), 0.0),
            Position::Split(x, y) => Vec2::new(
                component(&x.at(frame), 0, 0.0),
                component(&y.at(frame), 0, 0.0),
            ),
        };
        let scale = vec2(&self.scale.at(frame), 100.0) / 100.0;
        let rotation = component(&self.rotation.at(frame), 0, 0.0);
        let opacity = component(&self.opacity.at(frame), 0, 100.0) / 100.0;

        let matrix = Affine::translate(position)
            * Affine::rotate(rotation.to_radians())
            * Affine::scale_non_uniform(scale.x, scale.y)
            * Affine::translate(-anchor);
        (matrix, opacity.clamp(0.0, 1.0))
    }
}

impl Geometry {
    fn path_at(&self, frame: f64) -> BezPath {
        match self {
            Self::Rect {
                position,
                size,
                roundness,
            } => {
                let center = vec2(&position.at(frame), 0.0).to_point();
                let size = vec2(&size.at(frame), 0.0);
                let rect = Rect::from_center_size(center, (size.x.abs(), size.y.abs()));
                let radius = roundness
                    .as_ref()
                    .map_or(0.0, |r| component(&r.at(frame), 0, 0.0))
                    .clamp(0.0, rect.width().min(rect.height()) / 2.0);
                if radius > 0.0 {
                    rect.to_rounded_rect(radius).to_path(CURVE_TOLERANCE)
                } else {
                    rect.to_path(CURVE_TOLERANCE)
                }
            }
            Self::Ellipse { position, size } => {
                let center = vec2(&position.at(frame), 0.0).to_point();
                let radii = vec2(&size.at(frame), 0.0) / 2.0;
                Ellipse::new(center, (radii.x.abs(), radii.y.abs()), 0.0).to_path(CURVE_TOLERANCE)
            }
            Self::Path(shape) => shape.at(frame).to_path(),
        }
    }
}

fn group_transform(items: &[Item], frame: f64) -> (Affine, f64) {
    items
        .iter()
        .find_map(|item| match item {
            Item::Transform(t) => Some(t.at(frame)),
            _ => None,
        })
        .unwrap_or((Affine::IDENTITY, 1.0))
}

/// Every path under `items`, transformed into the coordinates of `parent`.
fn collect_paths(items: &[Item], frame: f64, parent: Affine, out: &mut BezPath) {
    let (local, _) = group_transform(items, frame);
    let matrix = parent * local;
    for item in items {
        match item {
            Item::Geometry(geometry) => {
                let mut path = geometry.path_at(frame);
                path.apply_affine(matrix);
                out.extend(path.elements().iter().copied());
            }
            Item::Group(sub) => collect_paths(sub, frame, matrix, out),
            _ => {}
        }
    }
}

/// A fill or stroke paints every path listed before it in the same group,
/// nested groups included. Later items sit below earlier ones.
fn render_items(
    items: &[Item],
    frame: f64,
    parent: Affine,
    opacity: f64,
    out: &mut Vec<PaintOp>,
) {
    let (local, local_opacity) = group_transform(items, frame);
    let matrix = parent * local;
    let opacity = opacity * local_opacity;
    if opacity <= 0.0 {
        return;
    }

    for k in (0..items.len()).rev() {
        match &items[k] {
            Item::Group(sub) => render_items(sub, frame, matrix, opacity, out),
            Item::Fill { color, opacity: o } => {
                let path = paths_before(items, k, frame, matrix);
                if path.elements().is_empty() {
                    continue;
                }
                out.push(PaintOp::Fill {
                    path,
                    color: rgba(&color.at(frame), &o.at(frame), opacity),
                });
            }
            Item::Stroke {
                color,
                opacity: o,
                width,
            } => {
                let path = paths_before(items, k, frame, matrix);
                let width =
                    component(&width.at(frame), 0, 0.0) * matrix.determinant().abs().sqrt();
                if path.elements().is_empty() || width <= 0.0 {
                    continue;
                }
                out.push(PaintOp::Stroke {
                    path,
                    color: rgba(&color.at(frame), &o.at(frame), opacity),
                    width,
                });
            }
            Item::Geometry(_) | Item::Transform(_) => {}
        }
    }
}

fn paths_before(items: &[Item], k: usize, frame: f64, matrix: Affine) -> BezPath {
    let mut path = BezPath::new();
    for item in &items[..k] {
        match item {
            Item::Geometry(geometry) => {
                let mut p = geometry.path_at(frame);
                p.apply_affine(matrix);
                path.extend(p.elements().iter().copied());
            }
            Item::Group(sub) => collect_paths(sub, frame, matrix, &mut path),
            _ => {}
        }
    }
    path
}

/// Lottie colors are `0..=1` floats; some exporters write `0..=255`.
fn rgba(color: &[f64], opacity: &[f64], inherited: f64) -> [u8; 4] {
    let wide = color.iter().take(3).any(|&c| c > 1.0);
    let channel = |i: usize| {
        let c = component(color, i, 0.0);
        let c = if wide { c / 255.0 } else { c };
        (c.clamp(0.0, 1.0) * 255.0).round() as u8
    };
    let alpha = component(opacity, 0, 100.0) / 100.0 * inherited;
    [
        channel(0),
        channel(1),
        channel(2),
        (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}
