//! Coin spawning
//!
//! Radius scales with the viewport's shorter side; positions are sampled
//! inside a safe inset so coins never spawn clipped or under the HUD edge.

use glam::Vec2;
use rand::Rng;

use super::state::Coin;
use crate::config::GameConfig;

/// Largest batch a single spawn tick may produce
const MAX_BATCH: usize = 4;

/// Coin radius for a viewport, clamped to the device-class bounds
pub fn coin_radius(width: f32, height: f32, config: &GameConfig, is_mobile: bool) -> f32 {
    let raw = width.min(height) * config.coin_radius_factor;
    raw.clamp(config.coin_radius_min, config.coin_radius_max(is_mobile))
}

/// Distance from each edge a coin center must keep along one axis
pub fn spawn_margin(radius: f32, dimension: f32, config: &GameConfig) -> f32 {
    (radius + config.spawn_padding).max(dimension * config.spawn_margin_fraction)
}

/// Uniform sample in `[margin, dimension - margin]`, or the midpoint if empty
fn sample_axis(rng: &mut impl Rng, dimension: f32, margin: f32) -> f32 {
    let (lo, hi) = (margin, dimension - margin);
    if lo < hi {
        rng.random_range(lo..=hi)
    } else {
        dimension / 2.0
    }
}

/// Create a coin at a random safe position
pub fn spawn_coin(
    id: String,
    width: f32,
    height: f32,
    config: &GameConfig,
    is_mobile: bool,
    rng: &mut impl Rng,
    now: f64,
) -> Coin {
    let radius = coin_radius(width, height, config, is_mobile);
    let x = sample_axis(rng, width, spawn_margin(radius, width, config));
    let y = sample_axis(rng, height, spawn_margin(radius, height, config));
    Coin {
        id,
        pos: Vec2::new(x, y),
        radius,
        collected: false,
        spawned_at: now,
    }
}

/// Cap on simultaneously live coins
pub fn max_coins_on_screen(config: &GameConfig, is_mobile: bool) -> usize {
    if is_mobile {
        config.max_coins_mobile
    } else {
        config.max_coins_desktop
    }
}

/// Number of coins for the next batch: 1..=4, limited by headroom under `cap`
pub fn batch_size(rng: &mut impl Rng, live: usize, cap: usize) -> usize {
    let headroom = cap.saturating_sub(live);
    if headroom == 0 {
        return 0;
    }
    rng.random_range(1..=MAX_BATCH).min(headroom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_radius_clamped_by_device() {
        let config = GameConfig::default();
        // 2000 * 0.06 = 120, above both maxima
        assert_eq!(coin_radius(2000.0, 2000.0, &config, false), 42.0);
        assert_eq!(coin_radius(2000.0, 2000.0, &config, true), 56.0);
        // 320 * 0.06 = 19.2, below the minimum
        assert_eq!(coin_radius(320.0, 900.0, &config, true), 22.0);
    }

    #[test]
    fn test_margin_uses_larger_term() {
        let config = GameConfig::default();
        assert_eq!(spawn_margin(30.0, 400.0, &config), 42.0);
        assert!((spawn_margin(30.0, 1000.0, &config) - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_range_centers_coin() {
        // Radius clamps up to 22, margin 34 leaves no room on a 60px axis
        let config = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let coin = spawn_coin("coin-1".into(), 60.0, 60.0, &config, false, &mut rng, 0.0);
        assert_eq!(coin.pos, Vec2::new(30.0, 30.0));
    }

    #[test]
    fn test_batch_respects_headroom() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            let n = batch_size(&mut rng, 0, 6);
            assert!((1..=MAX_BATCH).contains(&n));
            assert!(batch_size(&mut rng, 5, 6) <= 1);
            assert_eq!(batch_size(&mut rng, 6, 6), 0);
            assert_eq!(batch_size(&mut rng, 9, 6), 0);
        }
    }

    #[test]
    fn test_caps_differ_by_device() {
        let config = GameConfig::default();
        assert_eq!(max_coins_on_screen(&config, false), 6);
        assert_eq!(max_coins_on_screen(&config, true), 4);
    }

    proptest! {
        #[test]
        fn prop_spawned_coin_stays_inside_margin(
            seed in any::<u64>(),
            w in 320u32..3000,
            h in 320u32..3000,
            is_mobile in any::<bool>(),
        ) {
            let config = GameConfig::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let (w, h) = (w as f32, h as f32);
            let coin = spawn_coin("c".into(), w, h, &config, is_mobile, &mut rng, 0.0);
            let mx = spawn_margin(coin.radius, w, &config);
            let my = spawn_margin(coin.radius, h, &config);
            prop_assert!(coin.pos.x >= mx && coin.pos.x <= w - mx);
            prop_assert!(coin.pos.y >= my && coin.pos.y <= h - my);
            // Bounding circle clear of every edge by at least the padding
            prop_assert!(coin.pos.x - coin.radius >= config.spawn_padding - 1e-3);
            prop_assert!(coin.pos.y - coin.radius >= config.spawn_padding - 1e-3);
            prop_assert!(coin.pos.x + coin.radius <= w - config.spawn_padding + 1e-3);
            prop_assert!(coin.pos.y + coin.radius <= h - config.spawn_padding + 1e-3);
        }
    }
}
