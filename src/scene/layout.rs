//! Layout helpers
//!
//! Menu and game-over screens are laid out in design-resolution units and
//! projected through the viewport's fit transform. The HUD is anchored to the
//! real screen edges instead so it never letterboxes.

use crate::viewport::Viewport;

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

/// Smallest font we ever emit
pub const MIN_FONT_PX: f32 = 12.0;

/// Map a design-space rect onto the screen
pub fn project(viewport: &Viewport, design: Rect) -> Rect {
    Rect {
        x: viewport.offset_x + design.x * viewport.scale,
        y: viewport.offset_y + design.y * viewport.scale,
        w: design.w * viewport.scale,
        h: design.h * viewport.scale,
    }
}

/// Scale a design font size, never below `MIN_FONT_PX`
pub fn font(viewport: &Viewport, design_px: f32) -> f32 {
    (design_px * viewport.scale).max(MIN_FONT_PX)
}

/// Scale used by screen-anchored widgets (limited so the HUD stays legible)
pub fn hud_scale(viewport: &Viewport) -> f32 {
    viewport.scale.clamp(0.6, 1.6)
}

/// Widget list for a design-space screen
pub fn project_all(
    viewport: &Viewport,
    widgets: &[(super::Slot, Rect, f32)],
) -> Vec<(super::Slot, Rect, f32)> {
    widgets
        .iter()
        .map(|(slot, rect, px)| (*slot, project(viewport, *rect), font(viewport, *px)))
        .collect()
}
