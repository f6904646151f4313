//! Player audio preferences
//!
//! Persisted separately from anything round-related in LocalStorage.

use serde::{Deserialize, Serialize};

/// Persisted sound settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Silences every sound effect
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            muted: false,
            volume: 0.7,
        }
    }
}

impl Settings {
    /// Build settings from host-supplied values, clamping the volume
    pub fn new(muted: bool, volume: f32) -> Self {
        Self {
            muted,
            volume: clamp_volume(volume),
        }
    }

    /// Volume sound effects should actually play at
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            clamp_volume(self.volume)
        }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "coin_rush_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str::<Settings>(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return Self::new(settings.muted, settings.volume);
                    }
                    Err(e) => log::warn!("Ignoring corrupt settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

/// Clamp to [0, 1], treating NaN as silence
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_is_silent() {
        let settings = Settings::new(true, 0.9);
        assert_eq!(settings.effective_volume(), 0.0);
    }

    #[test]
    fn test_volume_is_clamped() {
        assert_eq!(Settings::new(false, 1.7).effective_volume(), 1.0);
        assert_eq!(Settings::new(false, -0.2).effective_volume(), 0.0);
        assert_eq!(Settings::new(false, f32::NAN).effective_volume(), 0.0);
        assert!((Settings::new(false, 0.25).effective_volume() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"muted": true}"#).unwrap();
        assert!(settings.muted);
        assert_eq!(settings.volume, Settings::default().volume);
    }
}
