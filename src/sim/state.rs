//! Game state and entity types
//!
//! Everything the engine treats as authoritative for one round lives here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

/// Which scene the game is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, no round running
    Menu,
    /// Active round
    Playing,
    /// Round ended, final score on screen
    GameOver,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimeUp,
    OutOfLives,
}

/// Per-round state (score, lives, countdown)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub score: u32,
    pub lives: u32,
    /// Seconds remaining in the round
    pub time_left: u32,
    pub phase: GamePhase,
}

impl GameState {
    /// Idle state shown behind the menu
    pub fn menu(config: &GameConfig) -> Self {
        Self {
            score: 0,
            lives: config.max_lives,
            time_left: config.round_duration_secs,
            phase: GamePhase::Menu,
        }
    }

    /// Fresh state for a new round
    pub fn new_round(config: &GameConfig) -> Self {
        Self {
            phase: GamePhase::Playing,
            ..Self::menu(config)
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Count one second down; returns true when the clock hits zero
    pub fn tick_clock(&mut self) -> bool {
        self.time_left = self.time_left.saturating_sub(1);
        self.time_left == 0
    }

    /// Take one life; returns true when none are left
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.lives == 0
    }
}

/// A collectible coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: String,
    pub pos: Vec2,
    pub radius: f32,
    pub collected: bool,
    /// Spawn timestamp in milliseconds
    pub spawned_at: f64,
}

impl Coin {
    /// Milliseconds since spawn
    pub fn age(&self, now: f64) -> f64 {
        (now - self.spawned_at).max(0.0)
    }

    pub fn is_expired(&self, now: f64, lifetime_ms: u32) -> bool {
        self.age(now) >= lifetime_ms as f64
    }

    /// Point-in-circle test (edge counts as a hit)
    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.distance(point) <= self.radius
    }
}
