//! Bundled [`VectorEngine`](crate::engine::VectorEngine) for Lottie JSON.

mod anim;
mod engine;
mod model;
mod scene;

pub use engine::CpuLottieEngine;
