//! `CoinGame` JS binding
//!
//! ```js
//! const game = new CoinGame(container, score => ..., ranked => ..., scoreApi);
//! await game.init();
//! game.startGame();
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlElement;

use super::js_api::JsScoreService;
use super::web::{SharedEngine, WeakEngine, WebHost, dispatch};
use crate::config::GameConfig;
use crate::engine::{Engine, GameCallbacks, InitStatus, Lifecycle};
use crate::leaderboard::RankedEntry;
use crate::settings::Settings;

/// Install the panic hook and console logger once per page
fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger already set: {}", e).into());
        }
    });
}

/// Resolve after `ms` milliseconds
async fn sleep(ms: u32) {
    let promise = Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
        }
    });
    let _ = JsFuture::from(promise).await;
}

#[wasm_bindgen]
pub struct CoinGame {
    engine: SharedEngine,
    retry_ms: u32,
}

#[wasm_bindgen]
impl CoinGame {
    #[wasm_bindgen(constructor)]
    pub fn new(
        container: HtmlElement,
        on_game_over: Function,
        on_leaderboard_click: Function,
        score_api: JsValue,
        config_json: Option<String>,
    ) -> Result<CoinGame, JsValue> {
        init_logging();

        let config = match config_json.as_deref() {
            Some(json) => GameConfig::from_json(json).unwrap_or_else(|e| {
                log::warn!("Invalid game config ({}), using defaults", e);
                GameConfig::default()
            }),
            None => GameConfig::default(),
        };
        let retry_ms = config.init_retry_ms;

        let callbacks = GameCallbacks {
            on_game_over: Box::new(move |score| {
                if let Err(e) = on_game_over.call1(&JsValue::NULL, &JsValue::from(score)) {
                    log::error!("onGameOver threw: {:?}", e);
                }
            }),
            on_leaderboard_click: Box::new(move |ranked| {
                if let Err(e) = on_leaderboard_click.call1(&JsValue::NULL, &to_js(ranked)) {
                    log::error!("onLeaderboardClick threw: {:?}", e);
                }
            }),
        };

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let service = Rc::new(JsScoreService::new(score_api));
        let seed = js_sys::Date::now() as u64;

        let engine = Rc::new_cyclic(|weak: &Weak<RefCell<Engine<WebHost>>>| {
            let host = WebHost::new(window, document, container, weak.clone());
            RefCell::new(Engine::new(
                host,
                config,
                callbacks,
                service,
                Settings::load(),
                seed,
            ))
        });

        log::info!("Coin Rush created (seed {})", seed);
        Ok(CoinGame { engine, retry_ms })
    }

    /// Resolves `true` once the game is ready, `false` if it was destroyed first
    pub fn init(&self) -> Promise {
        let engine = Rc::downgrade(&self.engine);
        let retry_ms = self.retry_ms;
        wasm_bindgen_futures::future_to_promise(async move {
            let status = try_init(&engine);
            if status != InitStatus::Deferred {
                return Ok(JsValue::from(status == InitStatus::Ready));
            }
            // The engine retries on its own timer; wait for it to settle
            loop {
                sleep(retry_ms).await;
                match lifecycle(&engine) {
                    Some(Lifecycle::Ready) => return Ok(JsValue::TRUE),
                    Some(Lifecycle::Destroyed) => return Ok(JsValue::FALSE),
                    _ => {}
                }
            }
        })
    }

    #[wasm_bindgen(js_name = startGame)]
    pub fn start_game(&self) {
        self.run(|e| {
            e.start_game();
        });
    }

    pub fn destroy(&self) {
        self.run(|e| e.destroy());
    }

    /// Persist audio settings and apply them to future sounds
    #[wasm_bindgen(js_name = applySettings)]
    pub fn apply_settings(&self, muted: bool, volume: f32) {
        self.run(move |e| e.apply_settings(muted, volume));
    }

    #[wasm_bindgen(js_name = previewVolume)]
    pub fn preview_volume(&self, volume: f32) {
        self.run(move |e| e.preview_volume(volume));
    }

    /// Cached leaderboard as `[{rank, entry}]`; null while the engine is busy
    pub fn leaderboard(&self) -> JsValue {
        match self.engine.try_borrow() {
            Ok(engine) => to_js(&engine.leaderboard()),
            Err(_) => JsValue::NULL,
        }
    }
}

/// Round-trip through JSON so the page gets plain objects
fn to_js(ranked: &[RankedEntry]) -> JsValue {
    let parsed = serde_json::to_string(ranked)
        .map_err(|e| JsValue::from_str(&e.to_string()))
        .and_then(|json| js_sys::JSON::parse(&json));
    match parsed {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Failed to export leaderboard: {:?}", e);
            JsValue::NULL
        }
    }
}

fn try_init(engine: &WeakEngine) -> InitStatus {
    let Some(engine) = engine.upgrade() else {
        return InitStatus::Aborted;
    };
    let Ok(mut engine) = engine.try_borrow_mut() else {
        return InitStatus::Deferred;
    };
    engine.init()
}

/// None while the engine is borrowed
fn lifecycle(engine: &WeakEngine) -> Option<Lifecycle> {
    let Some(engine) = engine.upgrade() else {
        return Some(Lifecycle::Destroyed);
    };
    let engine = engine.try_borrow().ok()?;
    Some(engine.lifecycle())
}

impl CoinGame {
    /// Run now, or on a microtask when called from inside an engine callback
    fn run(&self, f: impl FnOnce(&mut Engine<WebHost>) + 'static) {
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => f(&mut engine),
            Err(_) => dispatch(&Rc::downgrade(&self.engine), f),
        }
    }
}

impl Drop for CoinGame {
    fn drop(&mut self) {
        self.run(|e| e.destroy());
    }
}
