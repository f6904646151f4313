//! Headless host with a virtual clock
//!
//! Drives the engine without a browser: timers fire when the clock is
//! advanced, overlays record what the scenes put on screen, and every
//! acquire/release is counted so teardown can be checked. Used by the native
//! demo binary and by the engine tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::audio::SoundEffect;
use crate::engine::{Engine, FrameId, Host, ListenerId, TimerId};
use crate::leaderboard::LocalFuture;
use crate::renderer::RenderFrame;
use crate::scene::{ClickHandler, Overlay, Rect, SceneKind, Slot};
use crate::viewport::{SurfaceMetrics, Viewport};

// ============================================================================
// OVERLAY
// ============================================================================

#[derive(Default)]
struct OverlayLog {
    visible: bool,
    released: bool,
    texts: HashMap<Slot, String>,
    rects: HashMap<Slot, (Rect, f32)>,
    handlers: HashMap<Slot, ClickHandler>,
}

/// Recording overlay; clones share the same log
#[derive(Clone, Default)]
pub struct HeadlessOverlay {
    log: Rc<RefCell<OverlayLog>>,
}

impl HeadlessOverlay {
    pub fn text(&self, slot: Slot) -> Option<String> {
        self.log.borrow().texts.get(&slot).cloned()
    }

    pub fn rect(&self, slot: Slot) -> Option<Rect> {
        self.log.borrow().rects.get(&slot).map(|(rect, _)| *rect)
    }

    pub fn font_px(&self, slot: Slot) -> Option<f32> {
        self.log.borrow().rects.get(&slot).map(|(_, px)| *px)
    }

    pub fn is_visible(&self) -> bool {
        self.log.borrow().visible
    }

    pub fn is_released(&self) -> bool {
        self.log.borrow().released
    }

    /// Simulate a click; returns false if nothing handled it
    pub fn click(&self, slot: Slot) -> bool {
        // The handler is taken out while it runs so it may touch the overlay
        let handler = {
            let mut log = self.log.borrow_mut();
            if log.released {
                return false;
            }
            log.handlers.remove(&slot)
        };
        let Some(mut handler) = handler else {
            return false;
        };
        handler();
        let mut log = self.log.borrow_mut();
        if !log.released {
            log.handlers.entry(slot).or_insert(handler);
        }
        true
    }
}

impl Overlay for HeadlessOverlay {
    fn set_visible(&mut self, visible: bool) {
        self.log.borrow_mut().visible = visible;
    }

    fn set_text(&mut self, slot: Slot, text: &str) {
        self.log.borrow_mut().texts.insert(slot, text.to_string());
    }

    fn place(&mut self, slot: Slot, rect: Rect, font_px: f32) {
        self.log.borrow_mut().rects.insert(slot, (rect, font_px));
    }

    fn on_click(&mut self, slot: Slot, handler: ClickHandler) {
        self.log.borrow_mut().handlers.insert(slot, handler);
    }

    fn release(&mut self) {
        let mut log = self.log.borrow_mut();
        log.released = true;
        log.visible = false;
        log.handlers.clear();
    }
}

// ============================================================================
// HOST
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    due: f64,
    /// Some for intervals
    period: Option<f64>,
}

pub struct HeadlessHost {
    now: f64,
    metrics: SurfaceMetrics,
    mobile: bool,
    next_id: u32,

    timers: BTreeMap<TimerId, PendingTimer>,
    listeners: BTreeSet<ListenerId>,
    frames: BTreeSet<FrameId>,
    surface: Option<Viewport>,
    overlays: Vec<(SceneKind, HeadlessOverlay)>,
    tasks: Vec<LocalFuture<()>>,

    /// Sounds played, in order
    pub sounds: Vec<(SoundEffect, f32)>,
    /// Frames handed to `present`
    pub presented: u32,
    pub surface_resizes: u32,
    /// Every release call (timers, listeners, frames, surface)
    pub release_calls: u32,
}

impl HeadlessHost {
    /// Host whose container measures `width` x `height`
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_metrics(SurfaceMetrics {
            container: Some((width, height)),
            window: (width, height),
            visual_viewport: None,
        })
    }

    pub fn with_metrics(metrics: SurfaceMetrics) -> Self {
        Self {
            now: 0.0,
            metrics,
            mobile: false,
            next_id: 0,
            timers: BTreeMap::new(),
            listeners: BTreeSet::new(),
            frames: BTreeSet::new(),
            surface: None,
            overlays: Vec::new(),
            tasks: Vec::new(),
            sounds: Vec::new(),
            presented: 0,
            surface_resizes: 0,
            release_calls: 0,
        }
    }

    pub fn mobile(mut self, mobile: bool) -> Self {
        self.mobile = mobile;
        self
    }

    /// Switch device class, e.g. after a pointer-type change
    pub fn set_mobile(&mut self, mobile: bool) {
        self.mobile = mobile;
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn set_metrics(&mut self, metrics: SurfaceMetrics) {
        self.metrics = metrics;
    }

    /// Resize the container
    pub fn set_container(&mut self, container: Option<(f64, f64)>) {
        self.metrics.container = container;
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub fn pending_frames(&self) -> Vec<FrameId> {
        self.frames.iter().copied().collect()
    }

    pub fn surface(&self) -> Option<Viewport> {
        self.surface
    }

    pub fn overlay(&self, kind: SceneKind) -> Option<HeadlessOverlay> {
        self.overlays
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, overlay)| overlay.clone())
    }

    /// Overlays that have not been released
    pub fn live_overlays(&self) -> usize {
        self.overlays.iter().filter(|(_, o)| !o.is_released()).count()
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Pop the earliest timer due at or before `until`, rescheduling intervals
    fn next_due(&mut self, until: f64) -> Option<(f64, TimerId)> {
        let (id, timer) = self
            .timers
            .iter()
            .filter(|(_, t)| t.due <= until)
            .min_by(|a, b| a.1.due.total_cmp(&b.1.due).then(a.0.cmp(b.0)))
            .map(|(id, t)| (*id, *t))?;
        match timer.period {
            Some(period) => {
                if let Some(t) = self.timers.get_mut(&id) {
                    t.due += period;
                }
            }
            None => {
                self.timers.remove(&id);
            }
        }
        Some((timer.due, id))
    }

    /// Poll every spawned task once; unfinished ones are kept
    pub fn run_tasks(&mut self) {
        let mut cx = Context::from_waker(Waker::noop());
        let tasks = std::mem::take(&mut self.tasks);
        for mut task in tasks {
            if task.as_mut().poll(&mut cx) == Poll::Pending {
                self.tasks.push(task);
            }
        }
    }

    fn alloc(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl Host for HeadlessHost {
    fn now_ms(&self) -> f64 {
        self.now
    }

    fn measure(&self) -> SurfaceMetrics {
        self.metrics
    }

    fn is_mobile(&self) -> bool {
        self.mobile
    }

    fn set_interval(&mut self, ms: u32) -> TimerId {
        let id = TimerId(self.alloc());
        let period = (ms as f64).max(1.0);
        self.timers.insert(
            id,
            PendingTimer {
                due: self.now + period,
                period: Some(period),
            },
        );
        id
    }

    fn set_timeout(&mut self, ms: u32) -> TimerId {
        let id = TimerId(self.alloc());
        self.timers.insert(
            id,
            PendingTimer {
                due: self.now + ms as f64,
                period: None,
            },
        );
        id
    }

    fn clear_timer(&mut self, id: TimerId) {
        self.release_calls += 1;
        self.timers.remove(&id);
    }

    fn attach_pointer(&mut self) -> ListenerId {
        let id = ListenerId(self.alloc());
        self.listeners.insert(id);
        id
    }

    fn attach_viewport_listeners(&mut self) -> Vec<ListenerId> {
        // window resize, visualViewport resize, container observer
        (0..3)
            .map(|_| {
                let id = ListenerId(self.alloc());
                self.listeners.insert(id);
                id
            })
            .collect()
    }

    fn detach(&mut self, id: ListenerId) {
        self.release_calls += 1;
        self.listeners.remove(&id);
    }

    fn request_frame(&mut self) -> FrameId {
        let id = FrameId(self.alloc());
        self.frames.insert(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.release_calls += 1;
        self.frames.remove(&id);
    }

    fn create_surface(&mut self, viewport: &Viewport) {
        self.surface = Some(*viewport);
    }

    fn resize_surface(&mut self, viewport: &Viewport) {
        self.surface_resizes += 1;
        self.surface = Some(*viewport);
    }

    fn release_surface(&mut self) {
        self.release_calls += 1;
        self.surface = None;
    }

    fn present(&mut self, _frame: &RenderFrame) {
        self.presented += 1;
    }

    fn create_overlay(&mut self, kind: SceneKind) -> Box<dyn Overlay> {
        let overlay = HeadlessOverlay::default();
        self.overlays.push((kind, overlay.clone()));
        Box::new(overlay)
    }

    fn intent_waker(&self) -> Box<dyn Fn()> {
        // Intents are drained explicitly by `Engine::click`
        Box::new(|| {})
    }

    fn play_sound(&mut self, effect: SoundEffect, volume: f32) {
        self.sounds.push((effect, volume));
    }

    fn spawn_local(&mut self, task: LocalFuture<()>) {
        self.tasks.push(task);
        self.run_tasks();
    }
}

// ============================================================================
// DRIVING THE ENGINE
// ============================================================================

impl Engine<HeadlessHost> {
    /// Move the virtual clock forward, firing due timers in order
    pub fn advance(&mut self, ms: f64) {
        let target = self.host().now() + ms;
        while let Some((due, id)) = self.host_mut().next_due(target) {
            self.host_mut().now = due;
            self.on_timer(id);
        }
        self.host_mut().now = target;
        self.host_mut().run_tasks();
    }

    /// Deliver every pending animation frame
    pub fn flush_frames(&mut self) {
        let frames = std::mem::take(&mut self.host_mut().frames);
        for frame in frames {
            self.on_frame(frame);
        }
    }

    /// Tap at (x, y) through the current pointer listener
    pub fn tap(&mut self, x: f32, y: f32) {
        if let Some(listener) = self.pointer() {
            self.on_pointer_down(listener, x, y);
        }
    }

    /// Press a button in a scene's overlay and handle the resulting intent
    pub fn click(&mut self, kind: SceneKind, slot: Slot) -> bool {
        let Some(overlay) = self.host().overlay(kind) else {
            return false;
        };
        let handled = overlay.click(slot);
        self.process_intents();
        handled
    }

    /// Fire every viewport listener once, as a resize burst would
    pub fn resize_to(&mut self, width: f64, height: f64) {
        self.host_mut().set_container(Some((width, height)));
        let listeners = self.viewport_listeners().to_vec();
        for listener in listeners {
            self.on_viewport_event(listener);
        }
    }
}
