/// Size of an animation in its own design units, before any scaling.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NaturalSize {
    pub width: f64,
    pub height: f64,
}

impl NaturalSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pixel size after scaling, rounded and never below one pixel per axis.
    pub fn scaled_px(self, scale: f64) -> (u32, u32) {
        (scaled_axis(self.width, scale), scaled_axis(self.height, scale))
    }
}

fn scaled_axis(len: f64, scale: f64) -> u32 {
    let v = (len * scale).round();
    if v.is_finite() && v >= 1.0 {
        v.min(f64::from(u32::MAX)) as u32
    } else {
        1
    }
}
