//! Play scene: HUD plus coin sprites and collection bursts
//!
//! Sprites are display handles keyed by coin id. Whether a coin is alive is
//! decided by the engine's registry; this scene only mirrors add/remove calls.

use glam::Vec2;

use super::layout::{Rect, hud_scale};
use super::{Overlay, Scene, SceneKind, SceneView, Slot};
use crate::renderer::{BurstInstance, CoinInstance, RenderFrame};
use crate::sim::{Coin, GameState};
use crate::viewport::Viewport;

/// Duration of the collection burst
pub const BURST_MS: f64 = 350.0;
/// Pop-in animation length for new coins
pub const POP_IN_MS: f64 = 120.0;
/// Fraction of the lifetime after which a coin starts blinking out
const FADE_START: f64 = 0.75;

/// Display handle for one live coin
#[derive(Debug, Clone, PartialEq)]
pub struct CoinSprite {
    pub id: String,
    pub pos: Vec2,
    pub radius: f32,
    pub spawned_at: f64,
}

/// Collection effect left behind by a tapped coin
#[derive(Debug, Clone, PartialEq)]
pub struct Burst {
    pub pos: Vec2,
    pub radius: f32,
    pub started_at: f64,
}

impl Burst {
    /// 0 at start, 1 when finished
    pub fn progress(&self, now: f64) -> f32 {
        ((now - self.started_at) / BURST_MS).clamp(0.0, 1.0) as f32
    }
}

pub struct PlayScene {
    view: SceneView,
    lifetime_ms: f64,
    sprites: Vec<CoinSprite>,
    bursts: Vec<Burst>,
    hud: Option<(u32, u32, u32)>,
}

impl PlayScene {
    pub fn new(overlay: Box<dyn Overlay>, viewport: Viewport, coin_lifetime_ms: u32) -> Self {
        let mut scene = Self {
            view: SceneView::new(overlay, viewport),
            lifetime_ms: coin_lifetime_ms as f64,
            sprites: Vec::new(),
            bursts: Vec::new(),
            hud: None,
        };
        scene.on_resize(viewport);
        scene.view.set_visible(false);
        scene
    }

    pub fn show(&mut self) {
        self.view.set_visible(true);
    }

    /// Mirror score, lives and clock into the HUD
    pub fn update_state(&mut self, state: &GameState) {
        let hud = (state.score, state.lives, state.time_left);
        if self.hud == Some(hud) {
            return;
        }
        self.hud = Some(hud);
        self.view.set_text(Slot::Score, &format!("Score {}", state.score));
        self.view.set_text(Slot::Clock, &format_clock(state.time_left));
        self.view.set_text(Slot::Lives, &lives_text(state.lives));
    }

    pub fn add_coin(&mut self, coin: &Coin) {
        self.sprites.push(CoinSprite {
            id: coin.id.clone(),
            pos: coin.pos,
            radius: coin.radius,
            spawned_at: coin.spawned_at,
        });
    }

    /// Drop a sprite without any effect (expiry)
    pub fn remove_coin(&mut self, id: &str) -> bool {
        let before = self.sprites.len();
        self.sprites.retain(|s| s.id != id);
        self.sprites.len() != before
    }

    /// Replace a sprite with a collection burst
    pub fn collect_coin(&mut self, id: &str, now: f64) -> bool {
        let Some(index) = self.sprites.iter().position(|s| s.id == id) else {
            return false;
        };
        let sprite = self.sprites.remove(index);
        self.bursts.push(Burst {
            pos: sprite.pos,
            radius: sprite.radius,
            started_at: now,
        });
        true
    }

    pub fn clear_coins(&mut self) {
        self.sprites.clear();
        self.bursts.clear();
    }

    pub fn sprites(&self) -> &[CoinSprite] {
        &self.sprites
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    /// Drop finished bursts
    pub fn advance(&mut self, now: f64) {
        self.bursts.retain(|b| now - b.started_at < BURST_MS);
    }

    /// Build the render data for this frame
    pub fn frame(&self, now: f64) -> RenderFrame {
        let coins = self
            .sprites
            .iter()
            .map(|sprite| {
                let age = (now - sprite.spawned_at).max(0.0);
                let scale = ease_out_back((age / POP_IN_MS).min(1.0) as f32);
                let life = (age / self.lifetime_ms).min(1.0);
                // Blink faster as the coin nears expiry
                let alpha = if life > FADE_START {
                    let t = ((life - FADE_START) / (1.0 - FADE_START)) as f32;
                    let blink = (age as f32 * 0.02 * (1.0 + 3.0 * t)).sin() * 0.5 + 0.5;
                    1.0 - t * 0.6 * blink
                } else {
                    1.0
                };
                CoinInstance {
                    pos: sprite.pos.to_array(),
                    radius: sprite.radius,
                    scale,
                    alpha,
                    spin: (age * 0.004) as f32,
                }
            })
            .collect();

        let bursts = self
            .bursts
            .iter()
            .map(|b| BurstInstance {
                pos: b.pos.to_array(),
                radius: b.radius,
                progress: b.progress(now),
            })
            .collect();

        RenderFrame {
            viewport: self.view.viewport(),
            time: (now / 1000.0) as f32,
            coins,
            bursts,
            dim: 0.0,
        }
    }
}

impl Scene for PlayScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Play
    }

    fn hide(&mut self) {
        self.view.set_visible(false);
    }

    /// HUD is anchored to screen edges; sprites keep their positions
    fn on_resize(&mut self, viewport: Viewport) {
        let s = hud_scale(&viewport);
        let (w, pad, h) = (viewport.width as f32, 16.0 * s, 36.0 * s);
        let slot_w = 180.0 * s;
        let font = 22.0 * s;
        let widgets = [
            (Slot::Score, Rect::new(pad, pad, slot_w, h), font),
            (Slot::Clock, Rect::new((w - slot_w) / 2.0, pad, slot_w, h), font),
            (Slot::Lives, Rect::new(w - slot_w - pad, pad, slot_w, h), font),
        ];
        self.view.relayout(viewport, &widgets);
    }

    fn is_visible(&self) -> bool {
        self.view.is_visible()
    }

    fn layout_passes(&self) -> u32 {
        self.view.layout_passes()
    }

    fn release(&mut self) {
        self.clear_coins();
        self.view.release();
    }
}

/// `0:07` style countdown
fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn lives_text(lives: u32) -> String {
    "\u{2665}".repeat(lives as usize)
}

/// Slight overshoot for the pop-in
fn ease_out_back(t: f32) -> f32 {
    let c1 = 1.70158;
    let c3 = c1 + 1.0;
    1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
}
