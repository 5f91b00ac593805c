use crate::{foundation::core::NaturalSize, pixel::PixelLayout};

/// Why a rendering engine refused a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadErrorKind {
    InvalidArguments,
    Unsupported,
    InsufficientCondition,
    Unknown,
}

impl std::fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InvalidArguments => "InvalidArguments",
            Self::Unsupported => "NonSupport",
            Self::InsufficientCondition => "InsufficientCondition",
            Self::Unknown => "Unknown Error",
        })
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub message: String,
}

impl LoadError {
    pub fn new(kind: LoadErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("no animation loaded")]
    NoScene,

    #[error("surface: {0}")]
    Surface(String),

    #[error("draw: {0}")]
    Draw(String),

    #[error("sync: {0}")]
    Sync(String),
}

/// Outcome of moving the animation to a frame time.
#[derive(Clone, Debug, PartialEq)]
pub enum SeekStatus {
    Updated,
    /// The animation was already at that frame.
    Unchanged,
    Failed(String),
}

/// Capability handle onto a vector-animation renderer.
///
/// The engine owns its scene; callers only drive it. A bake runs as
/// `attach_surface`, then per sample `seek` / `update` / `draw` / `sync` /
/// `clear_surface(true)`, and ends with `clear_surface(false)`.
pub trait VectorEngine: Send {
    /// Check that `text` is a document this engine understands, without
    /// touching the loaded scene.
    fn check(&self, text: &str) -> Result<(), LoadError>;

    /// Replace the loaded scene with `text`.
    fn load(&mut self, text: &str) -> Result<(), LoadError>;

    fn natural_size(&self) -> NaturalSize;

    fn total_frame_count(&self) -> f64;

    /// Duration in seconds.
    fn duration(&self) -> f64;

    fn pixel_layout(&self) -> PixelLayout {
        PixelLayout::Argb8888Premultiplied
    }

    fn seek(&mut self, frame: f64) -> SeekStatus;

    /// Size the render target; the scene is fitted to it.
    fn attach_surface(&mut self, width: u32, height: u32) -> Result<(), EngineError>;

    /// Re-evaluate the scene at the current frame before the next draw.
    fn update(&mut self);

    fn draw(&mut self) -> Result<(), EngineError>;

    /// Wait for the pending draw and copy its pixels into `target`
    /// (row-major, `width * height` entries, in [`Self::pixel_layout`]).
    fn sync(&mut self, target: &mut [u32]) -> Result<(), EngineError>;

    fn clear_surface(&mut self, keep_attached: bool);
}
