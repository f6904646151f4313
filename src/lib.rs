//! Coin Rush - a coin-catching reflex mini-game
//!
//! Core modules:
//! - `engine`: Game orchestrator (state machine, timers, hit dispatch)
//! - `sim`: Round state, coin spawning and the coin registry
//! - `viewport`: Drawable size resolution and resize coalescing
//! - `scene`: Menu, play and game-over views
//! - `renderer`: WebGPU SDF pipeline with a Canvas 2D fallback
//! - `leaderboard`: Score submission and leaderboard cache
//! - `platform`: Browser host, headless host and the JS binding
//! - `config` / `settings`: Tuning constants and persisted audio settings

pub mod audio;
pub mod config;
pub mod engine;
pub mod leaderboard;
pub mod platform;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod sim;
pub mod viewport;

pub use config::{ConfigError, GameConfig};
pub use engine::{Engine, GameCallbacks, Host, InitStatus, Lifecycle};
pub use leaderboard::{LeaderboardEntry, ScoreReporter, ScoreService, ServiceError};
pub use settings::Settings;
pub use viewport::Viewport;

#[cfg(target_arch = "wasm32")]
pub use platform::CoinGame;
