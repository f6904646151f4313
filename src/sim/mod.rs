//! Deterministic gameplay module
//!
//! Pure round logic with no rendering or platform dependencies:
//! - Seeded RNG only (passed in by the engine)
//! - Timestamps supplied by the caller
//! - Stable iteration order (spawn order)

pub mod registry;
pub mod spawn;
pub mod state;

pub use registry::{CoinRegistry, HitOutcome};
pub use spawn::{batch_size, coin_radius, max_coins_on_screen, spawn_coin, spawn_margin};
pub use state::{Coin, EndReason, GamePhase, GameState};
