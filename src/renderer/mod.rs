//! Rendering module
//!
//! The Play scene describes each frame as a [`RenderFrame`]. The WebGPU SDF
//! pipeline draws it in a single fragment shader pass; when no adapter or
//! device is available the Canvas 2D renderer draws the same frame with
//! primitive shapes.

#[cfg(target_arch = "wasm32")]
pub mod canvas2d;
pub mod frame;
pub mod sdf_pipeline;

#[cfg(target_arch = "wasm32")]
pub use canvas2d::Canvas2dRenderer;
pub use frame::{BurstInstance, CoinInstance, RenderFrame};
pub use sdf_pipeline::SdfRenderState;

/// Failure to acquire a GPU render resource
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(String),
    #[error("no suitable adapter: {0}")]
    NoAdapter(String),
    #[error("failed to request device: {0}")]
    Device(String),
    #[error("canvas 2d context unavailable")]
    NoContext,
}
