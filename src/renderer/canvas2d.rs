//! Canvas 2D fallback renderer
//!
//! Used when WebGPU/WebGL is unavailable. Draws the same [`RenderFrame`] as
//! the SDF pipeline with filled arcs and strokes.

use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::RenderError;
use super::frame::{BurstInstance, CoinInstance, RenderFrame};

pub struct Canvas2dRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pixel_ratio: f64,
}

impl Canvas2dRenderer {
    pub fn new(canvas: HtmlCanvasElement, pixel_ratio: f64) -> Result<Self, RenderError> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or(RenderError::NoContext)?;
        Ok(Self {
            canvas,
            ctx,
            pixel_ratio,
        })
    }

    /// Resize the backing store (physical pixels)
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
    }

    pub fn render(&self, frame: &RenderFrame) {
        let ctx = &self.ctx;
        let w = frame.viewport.width as f64;
        let h = frame.viewport.height as f64;

        // Draw in CSS pixels
        ctx.set_transform(self.pixel_ratio, 0.0, 0.0, self.pixel_ratio, 0.0, 0.0)
            .ok();
        ctx.set_global_alpha(1.0);

        let gradient = ctx.create_linear_gradient(0.0, 0.0, 0.0, h);
        gradient.add_color_stop(0.0, "#121733").ok();
        gradient.add_color_stop(1.0, "#050814").ok();
        ctx.set_fill_style_canvas_gradient(&gradient);
        ctx.fill_rect(0.0, 0.0, w, h);

        for coin in &frame.coins {
            self.draw_coin(coin);
        }
        for burst in &frame.bursts {
            self.draw_burst(burst);
        }

        if frame.dim > 0.0 {
            ctx.set_global_alpha(frame.dim as f64);
            ctx.set_fill_style_str("#000000");
            ctx.fill_rect(0.0, 0.0, w, h);
            ctx.set_global_alpha(1.0);
        }
    }

    fn draw_coin(&self, coin: &CoinInstance) {
        let ctx = &self.ctx;
        let r = (coin.radius * coin.scale) as f64;
        if r <= 0.0 {
            return;
        }
        let (x, y) = (coin.pos[0] as f64, coin.pos[1] as f64);
        ctx.set_global_alpha(coin.alpha.clamp(0.0, 1.0) as f64);

        ctx.begin_path();
        ctx.arc(x, y, r, 0.0, TAU).ok();
        ctx.set_fill_style_str("#ffc72e");
        ctx.fill();
        ctx.set_stroke_style_str("#b87a0d");
        ctx.set_line_width((r * 0.12).max(1.0));
        ctx.stroke();

        // Inner ring
        ctx.begin_path();
        ctx.arc(x, y, r * 0.62, 0.0, TAU).ok();
        ctx.set_stroke_style_str("#f2a81a");
        ctx.set_line_width((r * 0.08).max(1.0));
        ctx.stroke();

        // Shine
        let spin = coin.spin as f64;
        ctx.begin_path();
        ctx.arc(x, y, r * 0.8, spin, spin + 0.6).ok();
        ctx.set_stroke_style_str("#fff2c4");
        ctx.set_line_width((r * 0.1).max(1.0));
        ctx.stroke();

        ctx.set_global_alpha(1.0);
    }

    fn draw_burst(&self, burst: &BurstInstance) {
        let fade = 1.0 - burst.progress as f64;
        if fade <= 0.0 {
            return;
        }
        let ctx = &self.ctx;
        let ring = burst.radius as f64 * (1.0 + burst.progress as f64 * 1.2);
        ctx.set_global_alpha(fade);
        ctx.begin_path();
        ctx.arc(burst.pos[0] as f64, burst.pos[1] as f64, ring, 0.0, TAU)
            .ok();
        ctx.set_stroke_style_str("#ffe98a");
        ctx.set_line_width((fade * 6.0).max(0.5));
        ctx.stroke();
        ctx.set_global_alpha(1.0);
    }
}
