//! Platform services consumed by the engine
//!
//! Timers, listeners and animation frames are referred to by opaque ids. The
//! platform calls back into the engine with the same id (`Engine::on_timer`,
//! `Engine::on_frame`, ...), and the engine ignores any id it has not armed.

use crate::audio::SoundEffect;
use crate::leaderboard::LocalFuture;
use crate::renderer::RenderFrame;
use crate::scene::{Overlay, SceneKind};
use crate::viewport::{SurfaceMetrics, Viewport};

/// Handle to an interval or timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u32);

/// Handle to an attached event listener (or observer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u32);

/// Handle to a requested animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u32);

pub trait Host {
    /// Monotonic clock in milliseconds
    fn now_ms(&self) -> f64;
    /// Current container / window / visual viewport sizes
    fn measure(&self) -> SurfaceMetrics;
    fn is_mobile(&self) -> bool;

    fn set_interval(&mut self, ms: u32) -> TimerId;
    fn set_timeout(&mut self, ms: u32) -> TimerId;
    fn clear_timer(&mut self, id: TimerId);

    /// Attach the pointer-down hit-test listener to the play surface
    fn attach_pointer(&mut self) -> ListenerId;
    /// Attach window resize, visual viewport and container observers
    fn attach_viewport_listeners(&mut self) -> Vec<ListenerId>;
    fn detach(&mut self, id: ListenerId);

    fn request_frame(&mut self) -> FrameId;
    fn cancel_frame(&mut self, id: FrameId);

    fn create_surface(&mut self, viewport: &Viewport);
    fn resize_surface(&mut self, viewport: &Viewport);
    fn release_surface(&mut self);
    /// Draw a frame on the surface
    fn present(&mut self, frame: &RenderFrame);

    fn create_overlay(&mut self, kind: SceneKind) -> Box<dyn Overlay>;
    /// Called whenever a scene queued a user intent
    fn intent_waker(&self) -> Box<dyn Fn()>;

    fn play_sound(&mut self, effect: SoundEffect, volume: f32);
    /// Run a background task (score submission, leaderboard fetch)
    fn spawn_local(&mut self, task: LocalFuture<()>);
}
