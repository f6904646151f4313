//! Coin Rush entry point
//!
//! The browser build is driven from JS through the `CoinGame` binding. The
//! native binary plays one scripted round on the headless host and prints
//! the outcome, which is handy for checking tuning changes.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cell::RefCell;
    use std::rc::Rc;

    use coin_rush::leaderboard::{LeaderboardEntry, LocalFuture, ScoreService, ServiceError};
    use coin_rush::platform::HeadlessHost;
    use coin_rush::sim::EndReason;
    use coin_rush::{Engine, GameCallbacks, GameConfig, InitStatus, Settings};

    /// In-memory leaderboard for offline play
    #[derive(Default)]
    struct LocalScores {
        entries: RefCell<Vec<LeaderboardEntry>>,
    }

    impl ScoreService for LocalScores {
        fn current_player(&self) -> Option<String> {
            Some("bot".to_string())
        }

        fn submit_score(&self, score: u32) -> LocalFuture<Result<(), ServiceError>> {
            let mut entries = self.entries.borrow_mut();
            entries.push(LeaderboardEntry {
                display_name: "bot".to_string(),
                score,
                rank: None,
                user_id: None,
                avatar_url: None,
                social_links: Default::default(),
            });
            entries.sort_by(|a, b| b.score.cmp(&a.score));
            Box::pin(std::future::ready(Ok(())))
        }

        fn fetch_leaderboard(&self) -> LocalFuture<Result<Vec<LeaderboardEntry>, ServiceError>> {
            Box::pin(std::future::ready(Ok(self.entries.borrow().clone())))
        }
    }

    /// Load tuning overrides from the first CLI argument, if any
    fn load_config() -> GameConfig {
        let Some(path) = std::env::args().nth(1) else {
            return GameConfig::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => GameConfig::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Invalid config {} ({}), using defaults", path, e);
                GameConfig::default()
            }),
            Err(e) => {
                log::warn!("Cannot read {} ({}), using defaults", path, e);
                GameConfig::default()
            }
        }
    }

    pub fn run() {
        let config = load_config();
        let final_score = Rc::new(RefCell::new(None));
        let sink = final_score.clone();
        let callbacks = GameCallbacks {
            on_game_over: Box::new(move |score| *sink.borrow_mut() = Some(score)),
            on_leaderboard_click: Box::new(|_| {}),
        };

        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(42);
        let mut engine = Engine::new(
            HeadlessHost::new(1280.0, 720.0),
            config,
            callbacks,
            Rc::new(LocalScores::default()),
            Settings::default(),
            seed,
        );

        if engine.init() != InitStatus::Ready {
            log::error!("Engine failed to initialize");
            return;
        }
        engine.start_game();

        // The bot reacts every 250 ms and grabs the oldest coin half the time
        let mut step = 0u32;
        while engine.state().is_playing() {
            engine.advance(250.0);
            step += 1;
            let target = engine.coins().iter().next().map(|c| c.pos);
            match target {
                Some(pos) if step % 2 == 0 => engine.tap(pos.x, pos.y),
                _ if step % 7 == 0 => engine.tap(1.0, 1.0),
                _ => {}
            }
        }

        let state = engine.state();
        let reason = if state.lives == 0 {
            EndReason::OutOfLives
        } else {
            EndReason::TimeUp
        };
        println!(
            "Round over ({:?}): score {:?}, lives left {}, time left {}s",
            reason,
            final_score.borrow(),
            state.lives,
            state.time_left
        );
        engine.destroy();
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Coin Rush (native) starting headless demo round...");
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is the CoinGame binding, this is just to satisfy the compiler
}
