//! Bake Lottie animations into sprite-sheet textures.
//!
//! A [`LottieTexture`] owns an animation document plus its bake parameters
//! (scale, frame range, frame count, rows). Every parameter change plans a
//! grid ([`plan_sheet`]), samples frame times ([`sample_frames`]),
//! rasterizes each sample into its cell through a [`VectorEngine`]
//! ([`composite_sheet`]) and installs the result behind a stable
//! [`TextureHandle`].
//!
//! [`CpuLottieEngine`] is the bundled engine, built on `vello_cpu`.
#![forbid(unsafe_code)]

mod foundation;

pub mod artifact;
pub mod compositor;
pub mod document;
pub mod engine;
pub mod layout;
pub mod lottie;
pub mod pixel;
pub mod resource;
pub mod sampler;
pub mod settings;
pub mod texture;

pub use crate::foundation::core::NaturalSize;
pub use crate::foundation::error::{RasterStage, SheetError, SheetResult};

pub use crate::artifact::{load_artifact, load_artifact_file, save_artifact, save_artifact_file};
pub use crate::compositor::composite_sheet;
pub use crate::document::AnimationDocument;
pub use crate::engine::{EngineError, LoadError, LoadErrorKind, SeekStatus, VectorEngine};
pub use crate::layout::{AUTO_ROWS, GeometryClamp, MAX_DIMENSION, SheetGeometry, plan_sheet};
pub use crate::lottie::CpuLottieEngine;
pub use crate::pixel::PixelLayout;
pub use crate::resource::{BakeParameters, LottieTexture};
pub use crate::sampler::{FrameSamples, sample_frames};
pub use crate::settings::SheetSettings;
pub use crate::texture::{
    TextureContent, TextureHandle, TextureRegistry, TextureServer, TextureSlot,
};
