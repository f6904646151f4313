//! Game balance constants
//!
//! Defaults live in `GameConfig::default()`. A host page may pass a partial
//! JSON object to override any field; missing fields keep their defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing or validating a tuning override
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("coin radius bounds out of order: min {min} > max {max}")]
    RadiusBounds { min: f32, max: f32 },
    #[error("spawn margin fraction {0} outside [0, 0.5)")]
    MarginFraction(f32),
}

/// Static game configuration (immutable once the engine is built)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Reference resolution the UI layout is designed against
    pub design_width: u32,
    pub design_height: u32,
    /// Length of one round in seconds
    pub round_duration_secs: u32,
    pub max_lives: u32,
    /// Period of the spawn-batch timer
    pub spawn_interval_ms: u32,
    /// Coins older than this are swept before the next batch
    pub coin_lifetime_ms: u32,
    /// Radius as a fraction of the viewport's shorter side
    pub coin_radius_factor: f32,
    pub coin_radius_min: f32,
    pub coin_radius_max_desktop: f32,
    pub coin_radius_max_mobile: f32,
    /// Fixed padding added to the radius when computing spawn margins
    pub spawn_padding: f32,
    /// Minimum spawn margin as a fraction of each axis
    pub spawn_margin_fraction: f32,
    pub max_coins_desktop: usize,
    pub max_coins_mobile: usize,
    /// Misses within this window after a start are not penalized
    pub grace_window_ms: u32,
    /// Floor for both viewport dimensions
    pub min_viewport: u32,
    /// Delay between init attempts while the container is still 0x0
    pub init_retry_ms: u32,
    pub init_max_attempts: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            design_width: 800,
            design_height: 600,
            round_duration_secs: 30,
            max_lives: 3,
            spawn_interval_ms: 900,
            coin_lifetime_ms: 2000,
            coin_radius_factor: 0.06,
            coin_radius_min: 22.0,
            coin_radius_max_desktop: 42.0,
            coin_radius_max_mobile: 56.0,
            spawn_padding: 12.0,
            spawn_margin_fraction: 0.06,
            max_coins_desktop: 6,
            max_coins_mobile: 4,
            grace_window_ms: 500,
            min_viewport: 320,
            init_retry_ms: 50,
            init_max_attempts: 10,
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) JSON override and validate the result
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("designWidth", self.design_width),
            ("designHeight", self.design_height),
            ("roundDurationSecs", self.round_duration_secs),
            ("maxLives", self.max_lives),
            ("spawnIntervalMs", self.spawn_interval_ms),
            ("coinLifetimeMs", self.coin_lifetime_ms),
            ("minViewport", self.min_viewport),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::NotPositive { field });
            }
        }
        if self.max_coins_desktop == 0 {
            return Err(ConfigError::NotPositive {
                field: "maxCoinsDesktop",
            });
        }
        if self.max_coins_mobile == 0 {
            return Err(ConfigError::NotPositive {
                field: "maxCoinsMobile",
            });
        }
        if self.coin_radius_factor <= 0.0 || self.coin_radius_min <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "coinRadiusMin",
            });
        }
        let max = self.coin_radius_max_desktop.min(self.coin_radius_max_mobile);
        if self.coin_radius_min > max {
            return Err(ConfigError::RadiusBounds {
                min: self.coin_radius_min,
                max,
            });
        }
        if !(0.0..0.5).contains(&self.spawn_margin_fraction) {
            return Err(ConfigError::MarginFraction(self.spawn_margin_fraction));
        }
        Ok(())
    }

    /// Radius upper bound for the current device class
    pub fn coin_radius_max(&self, is_mobile: bool) -> f32 {
        if is_mobile {
            self.coin_radius_max_mobile
        } else {
            self.coin_radius_max_desktop
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_lives, 3);
        assert_eq!(config.round_duration_secs, 30);
        assert_eq!(config.grace_window_ms, 500);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = GameConfig::from_json(r#"{"maxLives": 5, "roundDurationSecs": 45}"#).unwrap();
        assert_eq!(config.max_lives, 5);
        assert_eq!(config.round_duration_secs, 45);
        assert_eq!(config.spawn_interval_ms, GameConfig::default().spawn_interval_ms);
    }

    #[test]
    fn test_rejects_zero_duration() {
        let err = GameConfig::from_json(r#"{"roundDurationSecs": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotPositive {
                field: "roundDurationSecs"
            }
        ));
    }

    #[test]
    fn test_rejects_inverted_radius_bounds() {
        let err = GameConfig::from_json(r#"{"coinRadiusMin": 80.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::RadiusBounds { .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            GameConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_radius_max_by_device() {
        let config = GameConfig::default();
        assert_eq!(config.coin_radius_max(true), 56.0);
        assert_eq!(config.coin_radius_max(false), 42.0);
    }
}
