//! Backend-independent description of one frame

use crate::viewport::Viewport;

/// A coin as drawn this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoinInstance {
    pub pos: [f32; 2],
    pub radius: f32,
    /// Pop-in scale (overshoots slightly past 1.0)
    pub scale: f32,
    pub alpha: f32,
    /// Rotation phase for the shine
    pub spin: f32,
}

/// A collection burst as drawn this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstInstance {
    pub pos: [f32; 2],
    pub radius: f32,
    /// 0 = just collected, 1 = finished
    pub progress: f32,
}

/// Everything a renderer needs to draw
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub viewport: Viewport,
    /// Seconds, for background animation
    pub time: f32,
    pub coins: Vec<CoinInstance>,
    pub bursts: Vec<BurstInstance>,
    /// Background darkening behind menus (0 = none)
    pub dim: f32,
}

impl RenderFrame {
    /// Background only, dimmed behind a menu or game-over screen
    pub fn backdrop(viewport: Viewport, now: f64) -> Self {
        Self {
            viewport,
            time: (now / 1000.0) as f32,
            coins: Vec::new(),
            bursts: Vec::new(),
            dim: 0.45,
        }
    }
}
