use kurbo::{BezPath, Point, Vec2};
use serde_json::Value;

pub(crate) trait Lerp: Clone {
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Lerp for Vec<f64> {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        if self.len() != other.len() {
            return if t < 1.0 { self.clone() } else { other.clone() };
        }
        self.iter()
            .zip(other)
            .map(|(a, b)| a + (b - a) * t)
            .collect()
    }
}

/// One Lottie bezier shape: absolute vertices with tangents relative to them.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct BezierShape {
    pub vertices: Vec<Point>,
    pub in_tangents: Vec<Vec2>,
    pub out_tangents: Vec<Vec2>,
    pub closed: bool,
}

impl BezierShape {
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let n = self.vertices.len();
        if n == 0 {
            return path;
        }
        let tan = |v: &[Vec2], i: usize| v.get(i).copied().unwrap_or(Vec2::ZERO);

        path.move_to(self.vertices[0]);
        let segments = if self.closed { n } else { n - 1 };
        for s in 0..segments {
            let from = s;
            let to = (s + 1) % n;
            path.curve_to(
                self.vertices[from] + tan(&self.out_tangents, from),
                self.vertices[to] + tan(&self.in_tangents, to),
                self.vertices[to],
            );
        }
        if self.closed {
            path.close_path();
        }
        path
    }
}

impl Lerp for BezierShape {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        if self.vertices.len() != other.vertices.len() {
            return if t < 1.0 { self.clone() } else { other.clone() };
        }
        let pts = |a: &[Point], b: &[Point]| -> Vec<Point> {
            a.iter().zip(b).map(|(p, q)| p.lerp(*q, t)).collect()
        };
        let vecs = |a: &[Vec2], b: &[Vec2]| -> Vec<Vec2> {
            a.iter().zip(b).map(|(p, q)| p.lerp(*q, t)).collect()
        };
        Self {
            vertices: pts(&self.vertices, &other.vertices),
            in_tangents: vecs(&self.in_tangents, &other.in_tangents),
            out_tangents: vecs(&self.out_tangents, &other.out_tangents),
            closed: self.closed,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Keyframe<T> {
    pub time: f64,
    pub start: Option<T>,
    pub end: Option<T>,
    pub hold: bool,
    /// Easing control points `(x, y)` leaving this keyframe and entering the next.
    pub ease_out: (f64, f64),
    pub ease_in: (f64, f64),
}

#[derive(Clone, Debug)]
pub(crate) enum Animated<T> {
    Static(T),
    /// Keyframes sorted by time, plus the first value any of them carries.
    Keyframed(Vec<Keyframe<T>>, T),
}

impl<T: Lerp> Animated<T> {
    /// Parse a Lottie `k` value: either the value itself or a keyframe list.
    pub fn parse(k: &Value, value: impl Fn(&Value) -> Option<T>) -> Option<Self> {
        let keyframes = match k {
            Value::Array(items) if items.first().is_some_and(is_keyframe) => items,
            _ => return value(k).map(Self::Static),
        };

        let mut out = Vec::with_capacity(keyframes.len());
        for kf in keyframes {
            let time = kf.get("t").and_then(Value::as_f64)?;
            out.push(Keyframe {
                time,
                start: kf.get("s").and_then(&value),
                end: kf.get("e").and_then(&value),
                hold: kf.get("h").and_then(Value::as_i64) == Some(1),
                ease_out: kf.get("o").map_or((0.0, 0.0), ease_point),
                ease_in: kf.get("i").map_or((1.0, 1.0), ease_point),
            });
        }
        out.sort_by(|a, b| a.time.total_cmp(&b.time));
        let first = out.iter().find_map(|kf| kf.start.clone())?;
        Some(Self::Keyframed(out, first))
    }

    pub fn at(&self, frame: f64) -> T {
        match self {
            Self::Static(v) => v.clone(),
            Self::Keyframed(kfs, first) => value_at(kfs, first, frame),
        }
    }
}

fn is_keyframe(v: &Value) -> bool {
    v.as_object().is_some_and(|o| o.contains_key("t"))
}

fn ease_point(v: &Value) -> (f64, f64) {
    let first = |v: Option<&Value>| -> Option<f64> {
        match v? {
            Value::Array(a) => a.first().and_then(Value::as_f64),
            other => other.as_f64(),
        }
    };
    (
        first(v.get("x")).unwrap_or(0.0),
        first(v.get("y")).unwrap_or(0.0),
    )
}

fn value_at<T: Lerp>(kfs: &[Keyframe<T>], first_value: &T, frame: f64) -> T {
    let fallback = || first_value.clone();

    let Some(first) = kfs.first() else {
        return fallback();
    };
    if frame < first.time {
        return first.start.clone().unwrap_or_else(fallback);
    }

    for pair in kfs.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if frame >= b.time {
            continue;
        }
        let Some(start) = a.start.clone() else {
            return fallback();
        };
        if a.hold {
            return start;
        }
        let Some(end) = a.end.clone().or_else(|| b.start.clone()) else {
            return start;
        };
        let span = b.time - a.time;
        if span <= 0.0 {
            return start;
        }
        let t = (frame - a.time) / span;
        return start.lerp(&end, ease(a.ease_out, a.ease_in, t));
    }

    if let Some(v) = kfs.last().and_then(|kf| kf.start.clone()) {
        return v;
    }
    kfs.iter()
        .rev()
        .find_map(|kf| kf.end.clone().or_else(|| kf.start.clone()))
        .unwrap_or_else(fallback)
}

/// Cubic-bezier easing through `(0,0)`, `p1`, `p2`, `(1,1)`: find the curve
/// parameter whose x equals `x` and return its y.
pub(crate) fn ease(p1: (f64, f64), p2: (f64, f64), x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let bez = |a: f64, b: f64, t: f64| {
        let u = 1.0 - t;
        3.0 * u * u * t * a + 3.0 * u * t * t * b + t * t * t
    };
    let slope = |a: f64, b: f64, t: f64| {
        let u = 1.0 - t;
        3.0 * u * u * a + 6.0 * u * t * (b - a) + 3.0 * t * t * (1.0 - b)
    };

    let mut t = x;
    for _ in 0..8 {
        let err = bez(p1.0, p2.0, t) - x;
        if err.abs() < 1e-7 {
            return bez(p1.1, p2.1, t);
        }
        let d = slope(p1.0, p2.0, t);
        if d.abs() < 1e-9 {
            break;
        }
        t = (t - err / d).clamp(0.0, 1.0);
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    t = x;
    for _ in 0..64 {
        let v = bez(p1.0, p2.0, t);
        if (v - x).abs() < 1e-7 {
            break;
        }
        if v < x {
            lo = t;
        } else {
            hi = t;
        }
        t = 0.5 * (lo + hi);
    }
    bez(p1.1, p2.1, t)
}

pub(crate) fn numbers(v: &Value) -> Option<Vec<f64>> {
    match v {
        Value::Number(n) => n.as_f64().map(|f| vec![f]),
        Value::Array(items) => items.iter().map(Value::as_f64).collect(),
        _ => None,
    }
}

pub(crate) fn bezier_shape(v: &Value) -> Option<BezierShape> {
    let obj = match v {
        Value::Array(items) => items.first()?.as_object()?,
        Value::Object(obj) => obj,
        _ => return None,
    };
    let pairs = |key: &str| -> Option<Vec<(f64, f64)>> {
        match obj.get(key) {
            None => Some(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|p| {
                    let p = numbers(p)?;
                    Some((*p.first()?, *p.get(1)?))
                })
                .collect(),
            Some(_) => None,
        }
    };
    Some(BezierShape {
        vertices: pairs("v")?.into_iter().map(Point::from).collect(),
        in_tangents: pairs("i")?.into_iter().map(Vec2::from).collect(),
        out_tangents: pairs("o")?.into_iter().map(Vec2::from).collect(),
        closed: obj.get("c").and_then(Value::as_bool).unwrap_or(false),
    })
}
