use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::*;
use crate::leaderboard::tests::{StubService, entry};
use crate::platform::headless::HeadlessHost;
use crate::scene::Slot;
use crate::viewport::SurfaceMetrics;

struct Harness {
    engine: Engine<HeadlessHost>,
    game_overs: Rc<RefCell<Vec<u32>>>,
    leaderboard_clicks: Rc<Cell<u32>>,
    /// Ranks handed to the last leaderboard click
    shown_ranks: Rc<RefCell<Vec<usize>>>,
    service: Rc<StubService>,
}

fn harness_with(host: HeadlessHost, service: StubService) -> Harness {
    let game_overs = Rc::new(RefCell::new(Vec::new()));
    let leaderboard_clicks = Rc::new(Cell::new(0));
    let shown_ranks = Rc::new(RefCell::new(Vec::new()));
    let service = Rc::new(service);

    let scores = game_overs.clone();
    let clicks = leaderboard_clicks.clone();
    let shown = shown_ranks.clone();
    let callbacks = GameCallbacks {
        on_game_over: Box::new(move |score| scores.borrow_mut().push(score)),
        on_leaderboard_click: Box::new(move |ranked| {
            clicks.set(clicks.get() + 1);
            *shown.borrow_mut() = ranked.iter().map(|r| r.rank).collect();
        }),
    };
    let engine = Engine::new(
        host,
        GameConfig::default(),
        callbacks,
        service.clone(),
        Settings::default(),
        7,
    );
    Harness {
        engine,
        game_overs,
        leaderboard_clicks,
        shown_ranks,
        service,
    }
}

fn ready() -> Harness {
    let mut h = harness_with(HeadlessHost::new(800.0, 600.0), StubService::signed_in());
    assert_eq!(h.engine.init(), InitStatus::Ready);
    h
}

fn playing() -> Harness {
    let mut h = ready();
    assert!(h.engine.start_game());
    h
}

/// Tap the oldest live coin, returning false if there is none
fn tap_first_coin(engine: &mut Engine<HeadlessHost>) -> bool {
    let Some(pos) = engine.coins().iter().next().map(|c| c.pos) else {
        return false;
    };
    engine.tap(pos.x, pos.y);
    true
}

/// A point no coin can cover (coins keep radius + padding from the edges)
const EMPTY_CORNER: (f32, f32) = (1.0, 1.0);

fn miss(engine: &mut Engine<HeadlessHost>) {
    engine.tap(EMPTY_CORNER.0, EMPTY_CORNER.1);
}

// ----------------------------------------------------------------------------
// Init
// ----------------------------------------------------------------------------

#[test]
fn test_init_builds_scenes_and_shows_menu() {
    let h = ready();
    let engine = &h.engine;
    assert_eq!(engine.lifecycle(), Lifecycle::Ready);
    assert_eq!(engine.viewport().map(|v| v.dims()), Some((800, 600)));
    assert_eq!(engine.scenes().and_then(|s| s.visible()), Some(SceneKind::Menu));
    assert!(engine.host().surface().is_some());
    assert_eq!(engine.host().live_overlays(), 3);
    assert_eq!(engine.viewport_listeners().len(), 3);

    let menu = engine.host().overlay(SceneKind::Menu).unwrap();
    assert_eq!(menu.text(Slot::Subtitle).as_deref(), Some("Playing as Ada"));
}

#[test]
fn test_init_defers_until_container_has_size() {
    let mut h = harness_with(HeadlessHost::new(0.0, 0.0), StubService::signed_in());
    assert_eq!(h.engine.init(), InitStatus::Deferred);
    assert_eq!(h.engine.host().active_timers(), 1);
    // A second call while a retry is armed does not arm another
    assert_eq!(h.engine.init(), InitStatus::Deferred);
    assert_eq!(h.engine.host().active_timers(), 1);

    h.engine.advance(50.0);
    assert_eq!(h.engine.lifecycle(), Lifecycle::Initializing);

    h.engine.host_mut().set_container(Some((640.0, 480.0)));
    h.engine.advance(50.0);
    assert_eq!(h.engine.lifecycle(), Lifecycle::Ready);
    assert_eq!(h.engine.viewport().map(|v| v.dims()), Some((640, 480)));
    assert_eq!(h.engine.host().active_timers(), 0);
}

#[test]
fn test_init_falls_back_to_window_after_retries() {
    let host = HeadlessHost::with_metrics(SurfaceMetrics {
        container: Some((0.0, 0.0)),
        window: (1024.0, 768.0),
        visual_viewport: None,
    });
    let mut h = harness_with(host, StubService::signed_in());
    assert_eq!(h.engine.init(), InitStatus::Deferred);
    h.engine.advance(1000.0);
    assert_eq!(h.engine.lifecycle(), Lifecycle::Ready);
    assert_eq!(h.engine.viewport().map(|v| v.dims()), Some((1024, 768)));
}

#[test]
fn test_destroy_during_deferred_init_aborts() {
    let mut h = harness_with(HeadlessHost::new(0.0, 0.0), StubService::signed_in());
    assert_eq!(h.engine.init(), InitStatus::Deferred);
    h.engine.destroy();
    assert_eq!(h.engine.host().active_timers(), 0);

    h.engine.host_mut().set_container(Some((800.0, 600.0)));
    h.engine.advance(1000.0);
    assert_eq!(h.engine.lifecycle(), Lifecycle::Destroyed);
    assert_eq!(h.engine.init(), InitStatus::Aborted);
    assert!(h.engine.host().surface().is_none());
}

// ----------------------------------------------------------------------------
// Round flow
// ----------------------------------------------------------------------------

#[test]
fn test_start_button_begins_round() {
    let mut h = ready();
    assert!(h.engine.click(SceneKind::Menu, Slot::PrimaryButton));

    let engine = &h.engine;
    assert!(engine.state().is_playing());
    assert_eq!(engine.state().lives, 3);
    assert_eq!(engine.state().time_left, 30);
    assert_eq!(engine.scenes().and_then(|s| s.visible()), Some(SceneKind::Play));
    let live = engine.coins().live_count();
    assert!((1..=4).contains(&live));
    assert_eq!(engine.scenes().unwrap().play.sprites().len(), live);
    // countdown + spawn
    assert_eq!(engine.host().active_timers(), 2);
    // viewport listeners + pointer
    assert_eq!(engine.host().active_listeners(), 4);
}

#[test]
fn test_start_before_init_is_ignored() {
    let mut h = harness_with(HeadlessHost::new(800.0, 600.0), StubService::signed_in());
    assert!(!h.engine.start_game());
    assert!(!h.engine.state().is_playing());
}

#[test]
fn test_hit_scores_and_removes_coin() {
    let mut h = playing();
    let live = h.engine.coins().live_count();
    assert!(tap_first_coin(&mut h.engine));
    assert_eq!(h.engine.state().score, 1);
    assert_eq!(h.engine.coins().live_count(), live - 1);
    assert_eq!(h.engine.scenes().unwrap().play.bursts().len(), 1);

    let play = h.engine.host().overlay(SceneKind::Play).unwrap();
    assert_eq!(play.text(Slot::Score).as_deref(), Some("Score 1"));
}

#[test]
fn test_miss_inside_grace_window_keeps_lives() {
    let mut h = playing();
    h.engine.advance(200.0);
    miss(&mut h.engine);
    assert_eq!(h.engine.state().lives, 3);
}

#[test]
fn test_miss_inside_grace_window_is_silent() {
    let mut h = playing();
    h.engine.advance(200.0);
    h.engine.host_mut().sounds.clear();
    miss(&mut h.engine);
    assert!(h.engine.host().sounds.is_empty());

    h.engine.advance(600.0);
    miss(&mut h.engine);
    let effects: Vec<_> = h.engine.host().sounds.iter().map(|(e, _)| *e).collect();
    assert_eq!(effects, vec![SoundEffect::Miss]);
}

#[test]
fn test_miss_after_grace_window_costs_a_life() {
    let mut h = playing();
    h.engine.advance(600.0);
    miss(&mut h.engine);
    assert_eq!(h.engine.state().lives, 2);
    assert_eq!(h.engine.state().score, 0);
}

#[test]
fn test_running_out_of_lives_ends_round() {
    let mut h = playing();
    h.engine.advance(600.0);
    for _ in 0..3 {
        miss(&mut h.engine);
    }
    assert!(h.engine.state().is_game_over());
    assert_eq!(h.engine.state().lives, 0);
    assert_eq!(*h.game_overs.borrow(), vec![0]);
    assert_eq!(h.engine.host().active_timers(), 0);
    assert_eq!(h.engine.coins().live_count(), 0);

    // Further taps do nothing
    miss(&mut h.engine);
    assert_eq!(*h.game_overs.borrow(), vec![0]);
}

#[test]
fn test_five_hits_then_timeout() {
    let mut h = playing();
    let mut hits = 0;
    while hits < 5 {
        if tap_first_coin(&mut h.engine) {
            hits += 1;
        } else {
            h.engine.advance(900.0);
        }
    }
    assert!(h.engine.state().is_playing());

    h.engine.advance(30_000.0);
    assert!(h.engine.state().is_game_over());
    assert_eq!(h.engine.state().score, 5);
    assert_eq!(h.engine.state().time_left, 0);
    assert_eq!(*h.game_overs.borrow(), vec![5]);
    assert_eq!(*h.service.submitted.borrow(), vec![5]);

    let game_over = h.engine.host().overlay(SceneKind::GameOver).unwrap();
    assert!(game_over.is_visible());
    assert_eq!(game_over.text(Slot::Detail).as_deref(), Some("Score: 5"));

    h.engine.advance(10_000.0);
    assert_eq!(*h.game_overs.borrow(), vec![5]);
}

#[test]
fn test_end_game_only_once_per_round() {
    let mut h = playing();
    assert!(h.engine.end_game(EndReason::TimeUp));
    assert!(!h.engine.end_game(EndReason::OutOfLives));
    assert_eq!(*h.game_overs.borrow(), vec![0]);
    assert_eq!(h.service.submitted.borrow().len(), 1);

    assert!(h.engine.start_game());
    assert!(h.engine.end_game(EndReason::TimeUp));
    assert_eq!(h.service.submitted.borrow().len(), 2);
}

#[test]
fn test_restart_replaces_pointer_listener() {
    let mut h = playing();
    let old = h.engine.pointer().unwrap();
    h.engine.end_game(EndReason::TimeUp);

    assert!(h.engine.click(SceneKind::GameOver, Slot::PrimaryButton));
    assert!(h.engine.state().is_playing());
    let new = h.engine.pointer().unwrap();
    assert_ne!(old, new);
    assert_eq!(h.engine.host().active_listeners(), 4);

    h.engine.advance(600.0);
    h.engine.on_pointer_down(old, EMPTY_CORNER.0, EMPTY_CORNER.1);
    assert_eq!(h.engine.state().lives, 3);
}

#[test]
fn test_rank_hint_from_cached_leaderboard() {
    let service = StubService::signed_in();
    service
        .board
        .borrow_mut()
        .extend([entry("x", 10), entry("y", 3)]);
    let mut h = harness_with(HeadlessHost::new(800.0, 600.0), service);
    h.engine.init();
    h.engine.start_game();
    assert!(tap_first_coin(&mut h.engine));
    h.engine.end_game(EndReason::TimeUp);

    let game_over = h.engine.host().overlay(SceneKind::GameOver).unwrap();
    assert_eq!(
        game_over.text(Slot::Subtitle).as_deref(),
        Some("Leaderboard rank #3")
    );
}

#[test]
fn test_leaderboard_button_calls_host() {
    let mut h = ready();
    assert!(h.engine.click(SceneKind::Menu, Slot::SecondaryButton));
    assert_eq!(h.leaderboard_clicks.get(), 1);
    assert!(!h.engine.state().is_playing());
}

#[test]
fn test_leaderboard_shows_dense_ranks() {
    let service = StubService::signed_in();
    service
        .board
        .borrow_mut()
        .extend([entry("a", 50), entry("b", 50), entry("c", 30)]);
    let mut h = harness_with(HeadlessHost::new(800.0, 600.0), service);
    h.engine.init();

    let ranks: Vec<usize> = h.engine.leaderboard().iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 1, 2]);

    assert!(h.engine.click(SceneKind::Menu, Slot::SecondaryButton));
    assert_eq!(*h.shown_ranks.borrow(), vec![1, 1, 2]);
}

#[test]
fn test_ranked_entries_serialize_for_the_page() {
    let service = StubService::signed_in();
    service.board.borrow_mut().push(entry("a", 50));
    let mut h = harness_with(HeadlessHost::new(800.0, 600.0), service);
    h.engine.init();

    let json = serde_json::to_value(h.engine.leaderboard()).unwrap();
    assert_eq!(json[0]["rank"], 1);
    assert_eq!(json[0]["entry"]["displayName"], "a");
    assert_eq!(json[0]["entry"]["score"], 50);
}

// ----------------------------------------------------------------------------
// Spawning and expiry
// ----------------------------------------------------------------------------

#[test]
fn test_live_coins_never_exceed_desktop_cap() {
    let mut h = playing();
    for _ in 0..25 {
        h.engine.advance(900.0);
        assert!(h.engine.coins().live_count() <= 6);
    }
}

#[test]
fn test_live_coins_never_exceed_mobile_cap() {
    let host = HeadlessHost::new(400.0, 700.0).mobile(true);
    let mut h = harness_with(host, StubService::signed_in());
    h.engine.init();
    h.engine.start_game();
    for _ in 0..25 {
        h.engine.advance(900.0);
        assert!(h.engine.coins().live_count() <= 4);
    }
}

#[test]
fn test_device_class_rechecked_on_resize() {
    let mut h = playing();
    h.engine.host_mut().set_mobile(true);
    h.engine.resize_to(400.0, 700.0);
    h.engine.flush_frames();

    // Once the desktop-era coins expire, batches follow the mobile cap
    h.engine.advance(2700.0);
    for _ in 0..20 {
        assert!(h.engine.coins().live_count() <= 4);
        h.engine.advance(900.0);
    }
    assert!(h.engine.state().is_playing());
}

#[test]
fn test_expired_coins_swept_on_spawn_tick() {
    let mut h = playing();
    let first: Vec<String> = h.engine.coins().iter().map(|c| c.id.clone()).collect();

    // Ticks at 900 and 1800: still younger than the 2000 ms lifetime
    h.engine.advance(1800.0);
    for id in &first {
        assert!(h.engine.coins().get(id).is_some());
    }

    // Tick at 2700 sweeps them
    h.engine.advance(900.0);
    let play = &h.engine.scenes().unwrap().play;
    for id in &first {
        assert!(h.engine.coins().get(id).is_none());
        assert!(play.sprites().iter().all(|s| &s.id != id));
    }
    let now = h.engine.host().now();
    assert!(h.engine.coins().iter().all(|c| c.age(now) < 2000.0));
}

#[test]
fn test_spawned_coins_stay_inside_viewport() {
    let mut h = playing();
    for _ in 0..10 {
        h.engine.advance(900.0);
        for coin in h.engine.coins().iter() {
            assert!(coin.pos.x - coin.radius >= 0.0 && coin.pos.x + coin.radius <= 800.0);
            assert!(coin.pos.y - coin.radius >= 0.0 && coin.pos.y + coin.radius <= 600.0);
        }
    }
}

// ----------------------------------------------------------------------------
// Resize
// ----------------------------------------------------------------------------

fn layout_passes(engine: &Engine<HeadlessHost>) -> [u32; 3] {
    let scenes = engine.scenes().unwrap();
    [
        scenes.menu.layout_passes(),
        scenes.play.layout_passes(),
        scenes.game_over.layout_passes(),
    ]
}

#[test]
fn test_resize_burst_with_same_size_does_not_rebuild() {
    let mut h = ready();
    let before = layout_passes(&h.engine);

    h.engine.resize_to(800.0, 600.0);
    h.engine.resize_to(800.0, 600.0);
    assert_eq!(h.engine.host().pending_frames().len(), 1);
    h.engine.flush_frames();

    assert_eq!(layout_passes(&h.engine), before);
    assert_eq!(h.engine.host().surface_resizes, 0);
}

#[test]
fn test_resize_burst_rebuilds_once() {
    let mut h = ready();
    let before = layout_passes(&h.engine);

    h.engine.resize_to(1024.0, 768.0);
    h.engine.resize_to(1024.0, 768.0);
    assert_eq!(h.engine.host().pending_frames().len(), 1);
    h.engine.flush_frames();

    let after = layout_passes(&h.engine);
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(*a, b + 1);
    }
    assert_eq!(h.engine.host().surface_resizes, 1);
    assert_eq!(h.engine.viewport().map(|v| v.dims()), Some((1024, 768)));
}

#[test]
fn test_resize_preserves_round_state() {
    let mut h = playing();
    h.engine.advance(1000.0);
    assert!(tap_first_coin(&mut h.engine) || h.engine.coins().is_empty());
    let state = h.engine.state().clone();
    let positions: Vec<_> = h.engine.coins().iter().map(|c| c.pos).collect();

    h.engine.resize_to(500.0, 900.0);
    h.engine.flush_frames();

    assert_eq!(h.engine.state(), &state);
    let after: Vec<_> = h.engine.coins().iter().map(|c| c.pos).collect();
    assert_eq!(after, positions);
}

#[test]
fn test_resize_floors_to_minimum() {
    let mut h = ready();
    h.engine.resize_to(200.0, 150.0);
    h.engine.flush_frames();
    assert_eq!(h.engine.viewport().map(|v| v.dims()), Some((320, 320)));
}

// ----------------------------------------------------------------------------
// Teardown
// ----------------------------------------------------------------------------

#[test]
fn test_destroy_releases_everything() {
    let mut h = playing();
    h.engine.resize_to(1000.0, 700.0);
    assert_eq!(h.engine.host().pending_frames().len(), 1);

    h.engine.destroy();
    let host = h.engine.host();
    assert_eq!(host.active_timers(), 0);
    assert_eq!(host.active_listeners(), 0);
    assert!(host.pending_frames().is_empty());
    assert_eq!(host.live_overlays(), 0);
    assert!(host.surface().is_none());
    assert_eq!(h.engine.lifecycle(), Lifecycle::Destroyed);
}

#[test]
fn test_destroy_twice_is_a_noop() {
    let mut h = playing();
    h.engine.destroy();
    let calls = h.engine.host().release_calls;
    h.engine.destroy();
    assert_eq!(h.engine.host().release_calls, calls);
}

#[test]
fn test_callbacks_after_destroy_are_ignored() {
    let mut h = playing();
    let pointer = h.engine.pointer().unwrap();
    let listener = h.engine.viewport_listeners()[0];
    h.engine.advance(600.0);
    h.engine.destroy();

    h.engine.on_pointer_down(pointer, EMPTY_CORNER.0, EMPTY_CORNER.1);
    h.engine.on_viewport_event(listener);
    for id in 0..32 {
        h.engine.on_timer(TimerId(id));
        h.engine.on_frame(FrameId(id));
    }
    assert_eq!(h.engine.state().lives, 3);
    assert!(h.engine.host().pending_frames().is_empty());
    assert!(h.game_overs.borrow().is_empty());
    assert!(!h.engine.start_game());
    assert!(h.engine.render_frame(0.0).is_none());
}

// ----------------------------------------------------------------------------
// Settings and rendering
// ----------------------------------------------------------------------------

#[test]
fn test_muted_rounds_are_silent() {
    let mut h = ready();
    h.engine.apply_settings(true, 0.5);
    h.engine.host_mut().sounds.clear();
    h.engine.start_game();
    tap_first_coin(&mut h.engine);
    assert!(h.engine.host().sounds.is_empty());

    h.engine.preview_volume(0.3);
    assert_eq!(h.engine.host().sounds, vec![(SoundEffect::Preview, 0.3)]);
}

#[test]
fn test_sounds_use_effective_volume() {
    let mut h = playing();
    assert_eq!(
        h.engine.host().sounds.last(),
        Some(&(SoundEffect::RoundStart, 0.7))
    );
}

#[test]
fn test_render_frame_follows_scene() {
    let mut h = ready();
    let menu = h.engine.render_frame(16.0).unwrap();
    assert!(menu.dim > 0.0);
    assert!(menu.coins.is_empty());

    h.engine.start_game();
    let now = h.engine.host().now() + 200.0;
    let play = h.engine.render_frame(now).unwrap();
    assert_eq!(play.dim, 0.0);
    assert_eq!(play.coins.len(), h.engine.coins().live_count());
    assert_eq!(h.engine.host().presented, 2);
}
