//! Live coin registry
//!
//! Insertion-ordered so hit testing is first-match in spawn order, not
//! closest-match.

use glam::Vec2;

use super::state::Coin;

/// Result of a pointer-down hit test
#[derive(Debug, Clone, PartialEq)]
pub enum HitOutcome {
    /// A coin was collected and removed from the registry
    Hit(Coin),
    Miss,
}

/// Coins currently alive in the round
#[derive(Debug, Default)]
pub struct CoinRegistry {
    coins: Vec<Coin>,
    next_id: u64,
}

impl CoinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new unique coin id
    pub fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("coin-{}", self.next_id)
    }

    pub fn insert(&mut self, coin: Coin) {
        debug_assert!(self.get(&coin.id).is_none(), "duplicate coin id {}", coin.id);
        self.coins.push(coin);
    }

    pub fn get(&self, id: &str) -> Option<&Coin> {
        self.coins.iter().find(|c| c.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Coin> {
        let index = self.coins.iter().position(|c| c.id == id)?;
        Some(self.coins.remove(index))
    }

    /// Non-collected coins
    pub fn live_count(&self) -> usize {
        self.coins.iter().filter(|c| !c.collected).count()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.coins.iter()
    }

    /// Remove every coin (ids keep counting up so they stay unique)
    pub fn clear(&mut self) {
        self.coins.clear();
    }

    /// Remove coins whose age reached `lifetime_ms`, returning their ids
    pub fn purge_expired(&mut self, now: f64, lifetime_ms: u32) -> Vec<String> {
        let mut expired = Vec::new();
        self.coins.retain(|coin| {
            if !coin.collected && coin.is_expired(now, lifetime_ms) {
                expired.push(coin.id.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// First live coin (in insertion order) containing `point` is collected
    pub fn hit_test(&mut self, point: Vec2) -> HitOutcome {
        let Some(index) = self
            .coins
            .iter()
            .position(|c| !c.collected && c.contains(point))
        else {
            return HitOutcome::Miss;
        };
        let mut coin = self.coins.remove(index);
        coin.collected = true;
        HitOutcome::Hit(coin)
    }
}
