//! Platform abstraction layer
//!
//! Implementations of the engine's `Host`:
//! - `web`: browser timers, DOM listeners, ResizeObserver, animation frames,
//!   DOM overlays, WebGPU/Canvas 2D surface and Web Audio
//! - `headless`: virtual clock and recording overlays (native demo, tests)
//!
//! `binding` exports the `CoinGame` class to the host page.

pub mod headless;

#[cfg(target_arch = "wasm32")]
pub mod binding;
#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod js_api;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use headless::{HeadlessHost, HeadlessOverlay};
#[cfg(target_arch = "wasm32")]
pub use binding::CoinGame;
