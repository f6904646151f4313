//! Viewport resolution and resize coalescing
//!
//! The drawable area comes from the host container when it has a real size,
//! otherwise from the visible window area. Resize bursts (window resize,
//! orientation change, visualViewport, ResizeObserver) collapse into one
//! recompute per animation frame.

use serde::{Deserialize, Serialize};

/// Raw size measurements reported by the platform (CSS pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceMetrics {
    /// Container content box, if the container is attached
    pub container: Option<(f64, f64)>,
    /// `window.innerWidth/innerHeight`
    pub window: (f64, f64),
    /// `window.visualViewport` size (shrinks under on-screen keyboards)
    pub visual_viewport: Option<(f64, f64)>,
}

impl SurfaceMetrics {
    /// True when the container reports a usable size
    pub fn container_ready(&self) -> bool {
        matches!(self.container, Some((w, h)) if w >= 1.0 && h >= 1.0)
    }
}

/// Current drawable size plus the fit transform onto the design resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Uniform scale that fits the design resolution inside the viewport
    pub scale: f32,
    /// Letterbox offsets of the scaled design area
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Viewport {
    /// Build a viewport and its fit transform for a design resolution
    pub fn new(width: u32, height: u32, design: (u32, u32)) -> Self {
        let (dw, dh) = (design.0.max(1) as f32, design.1.max(1) as f32);
        let scale = (width as f32 / dw).min(height as f32 / dh);
        Self {
            width,
            height,
            scale,
            offset_x: (width as f32 - dw * scale) / 2.0,
            offset_y: (height as f32 - dh * scale) / 2.0,
        }
    }

    /// Integer dimensions, used to detect no-op resizes
    pub fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Resolve the drawable size from platform metrics
///
/// Prefers the container when both sides are at least 1px, then the visual
/// viewport, then the window. Both sides are floored to `min`.
pub fn resolve(metrics: &SurfaceMetrics, min: u32, design: (u32, u32)) -> Viewport {
    let (w, h) = match metrics.container {
        Some(size) if metrics.container_ready() => size,
        _ => metrics.visual_viewport.unwrap_or(metrics.window),
    };
    let floor = |v: f64| -> u32 {
        if v.is_finite() && v > 0.0 {
            (v.floor() as u32).max(min)
        } else {
            min
        }
    };
    Viewport::new(floor(w), floor(h), design)
}

/// Coalesces resize notifications into one recompute per frame
///
/// `F` is the platform's animation-frame handle.
#[derive(Debug, Default)]
pub struct ResizeThrottle<F> {
    pending: Option<F>,
    applied: Option<(u32, u32)>,
}

impl<F: Copy + PartialEq> ResizeThrottle<F> {
    pub fn new() -> Self {
        Self {
            pending: None,
            applied: None,
        }
    }

    /// Record a resize event; calls `request` only for the first event of a frame
    pub fn schedule(&mut self, request: impl FnOnce() -> F) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(request());
        true
    }

    /// Consume the pending frame if `frame` is the one we asked for
    pub fn fire(&mut self, frame: F) -> bool {
        if self.pending == Some(frame) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Drop the pending frame, returning it so the caller can cancel it
    pub fn cancel(&mut self) -> Option<F> {
        self.pending.take()
    }

    /// Record the dimensions the surface was created with
    pub fn prime(&mut self, viewport: &Viewport) {
        self.applied = Some(viewport.dims());
    }

    /// Accept `viewport` if its integer size differs from the last applied one
    pub fn commit(&mut self, viewport: &Viewport) -> bool {
        if self.applied == Some(viewport.dims()) {
            return false;
        }
        self.applied = Some(viewport.dims());
        true
    }
}
