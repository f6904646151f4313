//! Game orchestrator
//!
//! Owns the authoritative round state and the coin registry, drives the
//! scene state machine (Menu -> Playing -> GameOver -> Playing ...) and
//! reacts to timer, pointer and resize callbacks delivered by the [`Host`].
//! Every resource acquired from the host is recorded here so `destroy` can
//! hand it back.

pub mod host;
pub mod intents;
#[cfg(test)]
mod tests;

use std::rc::Rc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

pub use host::{FrameId, Host, ListenerId, TimerId};
pub use intents::{Intent, IntentQueue};

use crate::audio::SoundEffect;
use crate::config::GameConfig;
use crate::leaderboard::{RankedEntry, ScoreReporter, ScoreService};
use crate::renderer::RenderFrame;
use crate::scene::{GameOverScene, MenuScene, PlayScene, Scene, SceneActions, SceneKind, SceneSet};
use crate::settings::{Settings, clamp_volume};
use crate::sim::{
    CoinRegistry, EndReason, GamePhase, GameState, HitOutcome, batch_size, max_coins_on_screen,
    spawn_coin,
};
use crate::viewport::{ResizeThrottle, Viewport, resolve};

/// Countdown resolution
const CLOCK_TICK_MS: u32 = 1000;
/// Remaining seconds from which the countdown ticks audibly
const CLOCK_WARNING_SECS: u32 = 5;

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Initializing,
    Ready,
    Destroyed,
}

/// Result of one `init` attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Ready,
    /// Container not laid out yet; a retry timer is armed
    Deferred,
    /// The engine was destroyed
    Aborted,
}

/// Host page callbacks
pub struct GameCallbacks {
    pub on_game_over: Box<dyn FnMut(u32)>,
    /// Receives the cached leaderboard with display ranks
    pub on_leaderboard_click: Box<dyn FnMut(&[RankedEntry])>,
}

impl GameCallbacks {
    pub fn noop() -> Self {
        Self {
            on_game_over: Box::new(|_| {}),
            on_leaderboard_click: Box::new(|_| {}),
        }
    }
}

/// Timers currently armed on the host
#[derive(Debug, Default)]
struct Timers {
    countdown: Option<TimerId>,
    spawn: Option<TimerId>,
    init_retry: Option<TimerId>,
}

pub struct Engine<H: Host> {
    host: H,
    config: GameConfig,
    callbacks: GameCallbacks,
    lifecycle: Lifecycle,

    state: GameState,
    coins: CoinRegistry,
    rng: Pcg32,
    is_mobile: bool,
    /// Incremented by every `start_game`
    round: u64,
    round_started_at: f64,

    timers: Timers,
    pointer: Option<ListenerId>,
    viewport_listeners: Vec<ListenerId>,
    throttle: ResizeThrottle<FrameId>,
    viewport: Option<Viewport>,
    surface: bool,
    init_attempts: u32,

    scenes: Option<SceneSet>,
    intents: Rc<IntentQueue>,
    reporter: ScoreReporter,
    settings: Settings,
}

impl<H: Host> Engine<H> {
    pub fn new(
        host: H,
        config: GameConfig,
        callbacks: GameCallbacks,
        service: Rc<dyn ScoreService>,
        settings: Settings,
        seed: u64,
    ) -> Self {
        let intents = Rc::new(IntentQueue::new(host.intent_waker()));
        Self {
            state: GameState::menu(&config),
            host,
            config,
            callbacks,
            lifecycle: Lifecycle::Created,
            coins: CoinRegistry::new(),
            rng: Pcg32::seed_from_u64(seed),
            is_mobile: false,
            round: 0,
            round_started_at: 0.0,
            timers: Timers::default(),
            pointer: None,
            viewport_listeners: Vec::new(),
            throttle: ResizeThrottle::new(),
            viewport: None,
            surface: false,
            init_attempts: 0,
            scenes: None,
            intents,
            reporter: ScoreReporter::new(service),
            settings,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Build the surface and scenes, deferring while the container is 0x0
    pub fn init(&mut self) -> InitStatus {
        match self.lifecycle {
            Lifecycle::Destroyed => return InitStatus::Aborted,
            Lifecycle::Ready => return InitStatus::Ready,
            Lifecycle::Created | Lifecycle::Initializing => {}
        }
        if self.timers.init_retry.is_some() {
            return InitStatus::Deferred;
        }
        self.lifecycle = Lifecycle::Initializing;

        let metrics = self.host.measure();
        if !metrics.container_ready() {
            if self.init_attempts < self.config.init_max_attempts {
                self.init_attempts += 1;
                log::debug!(
                    "Container not laid out, retrying init ({}/{})",
                    self.init_attempts,
                    self.config.init_max_attempts
                );
                self.timers.init_retry = Some(self.host.set_timeout(self.config.init_retry_ms));
                return InitStatus::Deferred;
            }
            log::warn!(
                "Container still empty after {} attempts, falling back to window size",
                self.init_attempts
            );
        }

        let viewport = self.resolve_viewport();
        self.is_mobile = self.host.is_mobile();
        self.host.create_surface(&viewport);
        self.surface = true;
        self.throttle.prime(&viewport);
        self.viewport = Some(viewport);

        let actions: Rc<dyn SceneActions> = self.intents.clone();
        let mut scenes = SceneSet {
            menu: MenuScene::new(
                self.host.create_overlay(SceneKind::Menu),
                viewport,
                actions.clone(),
            ),
            play: PlayScene::new(
                self.host.create_overlay(SceneKind::Play),
                viewport,
                self.config.coin_lifetime_ms,
            ),
            game_over: GameOverScene::new(
                self.host.create_overlay(SceneKind::GameOver),
                viewport,
                actions,
            ),
        };
        scenes.menu.set_player(self.reporter.player_name());
        scenes.menu.set_best_score(self.reporter.board().top_score());
        scenes.menu.show();
        self.scenes = Some(scenes);

        self.viewport_listeners = self.host.attach_viewport_listeners();
        self.refresh_leaderboard();

        self.lifecycle = Lifecycle::Ready;
        log::info!(
            "Engine ready: {}x{} (scale {:.2}, mobile: {})",
            viewport.width,
            viewport.height,
            viewport.scale,
            self.is_mobile
        );
        InitStatus::Ready
    }

    /// Release everything acquired from the host; safe to call repeatedly
    pub fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.lifecycle = Lifecycle::Destroyed;

        if let Some(frame) = self.throttle.cancel() {
            self.host.cancel_frame(frame);
        }
        self.stop_round_timers();
        if let Some(id) = self.timers.init_retry.take() {
            self.host.clear_timer(id);
        }
        for id in self.viewport_listeners.drain(..) {
            self.host.detach(id);
        }
        if let Some(id) = self.pointer.take() {
            self.host.detach(id);
        }
        if let Some(mut scenes) = self.scenes.take() {
            for scene in scenes.all_mut() {
                scene.release();
            }
        }
        if self.surface {
            self.surface = false;
            self.host.release_surface();
        }
        self.coins.clear();
        self.intents.clear();
        log::info!("Engine destroyed");
    }

    // ------------------------------------------------------------------
    // Round flow
    // ------------------------------------------------------------------

    /// Begin a fresh round (also used for restarts)
    pub fn start_game(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Ready {
            log::warn!("start_game ignored: engine is {:?}", self.lifecycle);
            return false;
        }
        self.stop_round_timers();

        let now = self.host.now_ms();
        self.state = GameState::new_round(&self.config);
        self.coins.clear();
        self.round += 1;
        self.round_started_at = now;

        if let Some(scenes) = self.scenes.as_mut() {
            scenes.menu.hide();
            scenes.game_over.hide();
            scenes.play.clear_coins();
            scenes.play.update_state(&self.state);
            scenes.play.show();
        }

        self.spawn_batch(now);
        self.timers.countdown = Some(self.host.set_interval(CLOCK_TICK_MS));
        self.timers.spawn = Some(self.host.set_interval(self.config.spawn_interval_ms));

        if let Some(previous) = self.pointer.take() {
            self.host.detach(previous);
        }
        self.pointer = Some(self.host.attach_pointer());

        self.play(SoundEffect::RoundStart);
        log::info!("Round {} started", self.round);
        true
    }

    /// Finish the round; returns false when no round is in progress
    pub fn end_game(&mut self, reason: EndReason) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        self.stop_round_timers();
        self.coins.clear();
        self.state.phase = GamePhase::GameOver;
        let score = self.state.score;

        let rank = self.reporter.board().potential_rank(score);
        if let Some(scenes) = self.scenes.as_mut() {
            scenes.play.clear_coins();
            scenes.play.hide();
            scenes.game_over.show(score);
            scenes.game_over.set_rank_hint(rank);
        }
        log::info!(
            "Round {} over ({:?}): score {}",
            self.round,
            reason,
            score
        );

        self.play(SoundEffect::GameOver);
        (self.callbacks.on_game_over)(score);

        if let Some(task) = self.reporter.submit(self.round, score) {
            self.host.spawn_local(task);
        }
        true
    }

    // ------------------------------------------------------------------
    // Host callbacks
    // ------------------------------------------------------------------

    pub fn on_timer(&mut self, id: TimerId) {
        if self.timers.countdown == Some(id) {
            self.on_clock_tick();
        } else if self.timers.spawn == Some(id) {
            self.on_spawn_tick();
        } else if self.timers.init_retry == Some(id) {
            self.timers.init_retry = None;
            self.init();
        } else {
            log::trace!("Ignoring stale timer {:?}", id);
        }
    }

    /// Pointer-down at (x, y) in surface CSS pixels
    pub fn on_pointer_down(&mut self, listener: ListenerId, x: f32, y: f32) {
        if self.pointer != Some(listener) || !self.state.is_playing() {
            return;
        }
        let now = self.host.now_ms();

        match self.coins.hit_test(Vec2::new(x, y)) {
            HitOutcome::Hit(coin) => {
                self.state.score += 1;
                log::debug!("Collected {} (score {})", coin.id, self.state.score);
                if let Some(scenes) = self.scenes.as_mut() {
                    scenes.play.collect_coin(&coin.id, now);
                    scenes.play.update_state(&self.state);
                }
                self.play(SoundEffect::Collect);
            }
            HitOutcome::Miss => {
                if now - self.round_started_at < self.config.grace_window_ms as f64 {
                    log::debug!("Miss inside grace window");
                    return;
                }
                self.play(SoundEffect::Miss);
                let out = self.state.lose_life();
                log::debug!("Miss, {} lives left", self.state.lives);
                if let Some(scenes) = self.scenes.as_mut() {
                    scenes.play.update_state(&self.state);
                }
                if out {
                    self.end_game(EndReason::OutOfLives);
                }
            }
        }
    }

    /// A window, visual viewport or container resize was observed
    pub fn on_viewport_event(&mut self, listener: ListenerId) {
        if !self.viewport_listeners.contains(&listener) {
            return;
        }
        let host = &mut self.host;
        if self.throttle.schedule(|| host.request_frame()) {
            log::trace!("Resize scheduled");
        }
    }

    /// Animation frame requested by the resize throttle
    pub fn on_frame(&mut self, id: FrameId) {
        if !self.throttle.fire(id) {
            return;
        }
        let viewport = self.resolve_viewport();
        if !self.throttle.commit(&viewport) {
            log::trace!("Resize to same size skipped");
            return;
        }
        self.is_mobile = self.host.is_mobile();
        log::debug!(
            "Viewport resized to {}x{} (mobile: {})",
            viewport.width,
            viewport.height,
            self.is_mobile
        );
        self.viewport = Some(viewport);
        self.host.resize_surface(&viewport);
        if let Some(scenes) = self.scenes.as_mut() {
            for scene in scenes.all_mut() {
                scene.on_resize(viewport);
            }
        }
    }

    /// Handle every button press queued by the scenes
    pub fn process_intents(&mut self) {
        while let Some(intent) = self.intents.pop() {
            if self.lifecycle != Lifecycle::Ready {
                continue;
            }
            match intent {
                Intent::Start | Intent::Restart => {
                    self.start_game();
                }
                Intent::OpenLeaderboard => {
                    self.refresh_leaderboard();
                    let ranked = self.leaderboard();
                    (self.callbacks.on_leaderboard_click)(&ranked);
                }
            }
        }
    }

    /// Build and present the current frame
    pub fn render_frame(&mut self, now: f64) -> Option<RenderFrame> {
        if self.lifecycle != Lifecycle::Ready {
            return None;
        }
        let viewport = self.viewport?;
        let scenes = self.scenes.as_mut()?;
        let frame = if scenes.play.is_visible() {
            scenes.play.advance(now);
            scenes.play.frame(now)
        } else {
            RenderFrame::backdrop(viewport, now)
        };
        self.host.present(&frame);
        Some(frame)
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub fn apply_settings(&mut self, muted: bool, volume: f32) {
        self.settings = Settings::new(muted, volume);
        self.settings.save();
        log::info!(
            "Audio settings: muted={}, volume={:.2}",
            self.settings.muted,
            self.settings.volume
        );
    }

    /// Audible feedback for a volume slider, regardless of mute
    pub fn preview_volume(&mut self, volume: f32) {
        self.host.play_sound(SoundEffect::Preview, clamp_volume(volume));
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn coins(&self) -> &CoinRegistry {
        &self.coins
    }

    pub fn scenes(&self) -> Option<&SceneSet> {
        self.scenes.as_ref()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn reporter(&self) -> &ScoreReporter {
        &self.reporter
    }

    /// Cached leaderboard with dense display ranks
    pub fn leaderboard(&self) -> Vec<RankedEntry> {
        self.reporter.board().ranked()
    }

    /// Current pointer listener, if a round has attached one
    pub fn pointer(&self) -> Option<ListenerId> {
        self.pointer
    }

    pub fn viewport_listeners(&self) -> &[ListenerId] {
        &self.viewport_listeners
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn resolve_viewport(&self) -> Viewport {
        resolve(
            &self.host.measure(),
            self.config.min_viewport,
            (self.config.design_width, self.config.design_height),
        )
    }

    fn on_clock_tick(&mut self) {
        if !self.state.is_playing() {
            return;
        }
        let expired = self.state.tick_clock();
        if let Some(scenes) = self.scenes.as_mut() {
            scenes.play.update_state(&self.state);
        }
        if expired {
            self.end_game(EndReason::TimeUp);
        } else if self.state.time_left <= CLOCK_WARNING_SECS {
            self.play(SoundEffect::ClockTick);
        }
    }

    /// Expiry sweep, then a new batch
    fn on_spawn_tick(&mut self) {
        if !self.state.is_playing() {
            return;
        }
        let now = self.host.now_ms();
        let expired = self
            .coins
            .purge_expired(now, self.config.coin_lifetime_ms);
        if let Some(scenes) = self.scenes.as_mut() {
            for id in &expired {
                scenes.play.remove_coin(id);
            }
        }
        if !expired.is_empty() {
            log::trace!("{} coins expired", expired.len());
        }
        self.spawn_batch(now);
    }

    fn spawn_batch(&mut self, now: f64) {
        let Some(viewport) = self.viewport else {
            return;
        };
        let cap = max_coins_on_screen(&self.config, self.is_mobile);
        let count = batch_size(&mut self.rng, self.coins.live_count(), cap);
        for _ in 0..count {
            let id = self.coins.next_id();
            let coin = spawn_coin(
                id,
                viewport.width as f32,
                viewport.height as f32,
                &self.config,
                self.is_mobile,
                &mut self.rng,
                now,
            );
            if let Some(scenes) = self.scenes.as_mut() {
                scenes.play.add_coin(&coin);
            }
            self.coins.insert(coin);
        }
        log::trace!("Spawned {} coins ({} live)", count, self.coins.live_count());
    }

    fn stop_round_timers(&mut self) {
        if let Some(id) = self.timers.countdown.take() {
            self.host.clear_timer(id);
        }
        if let Some(id) = self.timers.spawn.take() {
            self.host.clear_timer(id);
        }
    }

    fn refresh_leaderboard(&mut self) {
        let task = self.reporter.refresh();
        self.host.spawn_local(task);
    }

    fn play(&mut self, effect: SoundEffect) {
        let volume = self.settings.effective_volume();
        if volume > 0.0 {
            self.host.play_sound(effect, volume);
        }
    }
}
