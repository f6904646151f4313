//! Browser host
//!
//! Every JS callback (timers, listeners, animation frames, button intents)
//! reaches the engine through [`dispatch`], which runs on a microtask with a
//! weak handle. Callbacks therefore never re-enter an engine that is already
//! borrowed, and they do nothing once the engine has been dropped.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, HtmlCanvasElement, HtmlElement, MouseEvent, ResizeObserver, Window};

use super::dom::{DomOverlay, EventListener, apply_style, create_html};
use crate::audio::{AudioManager, SoundEffect};
use crate::engine::{Engine, FrameId, Host, ListenerId, TimerId};
use crate::leaderboard::LocalFuture;
use crate::renderer::{Canvas2dRenderer, RenderFrame, SdfRenderState};
use crate::scene::{Overlay, Rect, SceneKind, Slot};
use crate::viewport::{SurfaceMetrics, Viewport};

pub type SharedEngine = Rc<RefCell<Engine<WebHost>>>;
pub type WeakEngine = Weak<RefCell<Engine<WebHost>>>;

/// Run `f` against the engine on a microtask, if it still exists
pub fn dispatch(engine: &WeakEngine, f: impl FnOnce(&mut Engine<WebHost>) + 'static) {
    let engine = engine.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let Some(engine) = engine.upgrade() else { return };
        match engine.try_borrow_mut() {
            Ok(mut engine) => f(&mut engine),
            Err(_) => log::warn!("Engine busy, dropping callback"),
        };
    });
}

// ============================================================================
// RESOURCE GUARDS
// ============================================================================

/// Interval or timeout; cleared on drop
struct Timer {
    window: Window,
    handle: i32,
    repeat: bool,
    _callback: Closure<dyn FnMut()>,
}

impl Drop for Timer {
    fn drop(&mut self) {
        if self.repeat {
            self.window.clear_interval_with_handle(self.handle);
        } else {
            self.window.clear_timeout_with_handle(self.handle);
        }
    }
}

/// One-shot animation frame; cancelled on drop
struct AnimationFrame {
    window: Window,
    handle: i32,
    _callback: Closure<dyn FnMut(f64)>,
}

impl Drop for AnimationFrame {
    fn drop(&mut self) {
        let _ = self.window.cancel_animation_frame(self.handle);
    }
}

/// ResizeObserver; disconnected on drop
struct Observer {
    observer: ResizeObserver,
    _callback: Closure<dyn FnMut(js_sys::Array)>,
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Held only for its `Drop`
#[allow(dead_code)]
enum Listener {
    Event(EventListener),
    Observer(Observer),
}

/// Continuous render loop; stops on drop
struct RenderLoop {
    window: Window,
    running: Rc<Cell<bool>>,
    handle: Rc<Cell<i32>>,
}

impl RenderLoop {
    fn start(window: Window, engine: WeakEngine) -> Self {
        let running = Rc::new(Cell::new(true));
        let handle = Rc::new(Cell::new(0));
        schedule_render(window.clone(), engine, running.clone(), handle.clone());
        Self {
            window,
            running,
            handle,
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.running.set(false);
        let _ = self.window.cancel_animation_frame(self.handle.get());
    }
}

fn schedule_render(window: Window, engine: WeakEngine, running: Rc<Cell<bool>>, handle: Rc<Cell<i32>>) {
    let next_window = window.clone();
    let next_handle = handle.clone();
    let callback = Closure::once_into_js(move |time: f64| {
        if !running.get() {
            return;
        }
        dispatch(&engine, move |e| {
            e.render_frame(time);
        });
        schedule_render(next_window, engine, running, next_handle);
    });
    if let Ok(id) = window.request_animation_frame(callback.unchecked_ref()) {
        handle.set(id);
    }
}

// ============================================================================
// RENDER BACKEND
// ============================================================================

enum Backend {
    Gpu(SdfRenderState),
    Canvas(Canvas2dRenderer),
}

impl Backend {
    fn draw(&mut self, frame: &RenderFrame, (width, height): (u32, u32)) {
        match self {
            Backend::Gpu(state) => {
                if state.size != (width, height) {
                    state.resize(width, height);
                }
                match state.render(frame) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let (w, h) = state.size;
                        state.resize(w, h);
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
            Backend::Canvas(renderer) => {
                renderer.resize(width, height);
                renderer.render(frame);
            }
        }
    }
}

fn create_canvas(document: &Document) -> Result<HtmlCanvasElement, JsValue> {
    let canvas = create_html(document, "canvas")?.dyn_into::<HtmlCanvasElement>()?;
    apply_style(
        &canvas,
        &[("display", "block"), ("width", "100%"), ("height", "100%")],
    );
    Ok(canvas)
}

/// Try WebGPU/WebGL first, then Canvas 2D on a fresh canvas
async fn create_backend(
    document: Document,
    canvas: HtmlCanvasElement,
    (width, height): (u32, u32),
    pixel_ratio: f64,
) -> Option<Backend> {
    match SdfRenderState::for_canvas(canvas.clone(), width, height, pixel_ratio as f32).await {
        Ok(state) => return Some(Backend::Gpu(state)),
        Err(e) => log::warn!("GPU rendering unavailable ({}), falling back to Canvas 2D", e),
    }

    // A canvas keeps whatever context it handed out first
    let fresh = match create_canvas(&document) {
        Ok(fresh) => fresh,
        Err(e) => {
            log::error!("Failed to create fallback canvas: {:?}", e);
            return None;
        }
    };
    if let Err(e) = canvas.replace_with_with_node_1(&fresh) {
        log::error!("Failed to swap in fallback canvas: {:?}", e);
        return None;
    }
    match Canvas2dRenderer::new(fresh, pixel_ratio) {
        Ok(mut renderer) => {
            renderer.resize(width, height);
            Some(Backend::Canvas(renderer))
        }
        Err(e) => {
            log::error!("No renderer available: {}", e);
            None
        }
    }
}

// ============================================================================
// HOST
// ============================================================================

pub struct WebHost {
    window: Window,
    document: Document,
    container: HtmlElement,
    engine: WeakEngine,
    next_id: u32,

    timers: HashMap<TimerId, Timer>,
    frames: HashMap<FrameId, AnimationFrame>,
    listeners: HashMap<ListenerId, Listener>,

    stage: Option<HtmlElement>,
    backend: Rc<RefCell<Option<Backend>>>,
    /// Backing store size in physical pixels
    physical: (u32, u32),
    pixel_ratio: f64,
    render_loop: Option<RenderLoop>,
    audio: AudioManager,
}

impl WebHost {
    pub fn new(window: Window, document: Document, container: HtmlElement, engine: WeakEngine) -> Self {
        Self {
            pixel_ratio: window.device_pixel_ratio().max(1.0),
            window,
            document,
            container,
            engine,
            next_id: 0,
            timers: HashMap::new(),
            frames: HashMap::new(),
            listeners: HashMap::new(),
            stage: None,
            backend: Rc::new(RefCell::new(None)),
            physical: (1, 1),
            render_loop: None,
            audio: AudioManager::new(),
        }
    }

    fn alloc(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn set_timer(&mut self, ms: u32, repeat: bool) -> TimerId {
        let id = TimerId(self.alloc());
        let engine = self.engine.clone();
        let callback = Closure::<dyn FnMut()>::new(move || {
            dispatch(&engine, move |e| {
                if !repeat {
                    e.host_mut().timers.remove(&id);
                }
                e.on_timer(id);
            });
        });
        let function = callback.as_ref().unchecked_ref();
        let result = if repeat {
            self.window
                .set_interval_with_callback_and_timeout_and_arguments_0(function, ms as i32)
        } else {
            self.window
                .set_timeout_with_callback_and_timeout_and_arguments_0(function, ms as i32)
        };
        match result {
            Ok(handle) => {
                self.timers.insert(
                    id,
                    Timer {
                        window: self.window.clone(),
                        handle,
                        repeat,
                        _callback: callback,
                    },
                );
            }
            Err(e) => log::error!("Failed to arm timer: {:?}", e),
        }
        id
    }

    fn listen(&mut self, target: &web_sys::EventTarget, event: &'static str) -> Option<ListenerId> {
        let id = ListenerId(self.alloc());
        let engine = self.engine.clone();
        match EventListener::new(target, event, move |_: Event| {
            dispatch(&engine, move |e| e.on_viewport_event(id));
        }) {
            Ok(listener) => {
                self.listeners.insert(id, Listener::Event(listener));
                Some(id)
            }
            Err(e) => {
                log::warn!("Failed to listen for {}: {:?}", event, e);
                None
            }
        }
    }

    fn observe_container(&mut self) -> Option<ListenerId> {
        let id = ListenerId(self.alloc());
        let engine = self.engine.clone();
        let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |_entries: js_sys::Array| {
            dispatch(&engine, move |e| e.on_viewport_event(id));
        });
        let observer = match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                log::warn!("ResizeObserver unavailable: {:?}", e);
                return None;
            }
        };
        observer.observe(&self.container);
        self.listeners.insert(
            id,
            Listener::Observer(Observer {
                observer,
                _callback: callback,
            }),
        );
        Some(id)
    }

    fn physical_size(&self, viewport: &Viewport) -> (u32, u32) {
        (
            ((viewport.width as f64) * self.pixel_ratio).round().max(1.0) as u32,
            ((viewport.height as f64) * self.pixel_ratio).round().max(1.0) as u32,
        )
    }

    fn build_stage(&self, viewport: &Viewport) -> Result<(HtmlElement, HtmlCanvasElement), JsValue> {
        let stage = create_html(&self.document, "div")?;
        stage.set_class_name("coin-rush-stage");
        apply_style(
            &stage,
            &[
                ("position", "relative"),
                ("width", format!("{}px", viewport.width).as_str()),
                ("height", format!("{}px", viewport.height).as_str()),
                ("overflow", "hidden"),
                ("touch-action", "none"),
            ],
        );
        let canvas = create_canvas(&self.document)?;
        stage.append_child(&canvas)?;
        self.container.append_child(&stage)?;
        Ok((stage, canvas))
    }
}

impl Host for WebHost {
    fn now_ms(&self) -> f64 {
        self.window
            .performance()
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn measure(&self) -> SurfaceMetrics {
        let container = if self.container.is_connected() {
            Some((
                self.container.client_width() as f64,
                self.container.client_height() as f64,
            ))
        } else {
            None
        };
        let size = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        SurfaceMetrics {
            container,
            window: (size(self.window.inner_width()), size(self.window.inner_height())),
            visual_viewport: self
                .window
                .visual_viewport()
                .map(|vv| (vv.width(), vv.height())),
        }
    }

    fn is_mobile(&self) -> bool {
        self.window
            .match_media("(pointer: coarse)")
            .ok()
            .flatten()
            .map(|m| m.matches())
            .unwrap_or(false)
    }

    fn set_interval(&mut self, ms: u32) -> TimerId {
        self.set_timer(ms, true)
    }

    fn set_timeout(&mut self, ms: u32) -> TimerId {
        self.set_timer(ms, false)
    }

    fn clear_timer(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    fn attach_pointer(&mut self) -> ListenerId {
        let id = ListenerId(self.alloc());
        let Some(stage) = self.stage.clone() else {
            log::warn!("Pointer listener requested without a surface");
            return id;
        };
        let engine = self.engine.clone();
        let target = stage.clone();
        let listener = EventListener::new(&stage, "pointerdown", move |event: Event| {
            let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let rect = target.get_bounding_client_rect();
            let x = (mouse.client_x() as f64 - rect.left()) as f32;
            let y = (mouse.client_y() as f64 - rect.top()) as f32;
            dispatch(&engine, move |e| e.on_pointer_down(id, x, y));
        });
        match listener {
            Ok(listener) => {
                self.listeners.insert(id, Listener::Event(listener));
            }
            Err(e) => log::error!("Failed to attach pointer listener: {:?}", e),
        }
        id
    }

    fn attach_viewport_listeners(&mut self) -> Vec<ListenerId> {
        let window = self.window.clone();
        let mut ids = Vec::new();
        ids.extend(self.listen(&window, "resize"));
        ids.extend(self.listen(&window, "orientationchange"));
        if let Some(vv) = window.visual_viewport() {
            ids.extend(self.listen(&vv, "resize"));
        }
        ids.extend(self.observe_container());
        ids
    }

    fn detach(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn request_frame(&mut self) -> FrameId {
        let id = FrameId(self.alloc());
        let engine = self.engine.clone();
        let callback = Closure::<dyn FnMut(f64)>::new(move |_time: f64| {
            dispatch(&engine, move |e| {
                e.host_mut().frames.remove(&id);
                e.on_frame(id);
            });
        });
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(handle) => {
                self.frames.insert(
                    id,
                    AnimationFrame {
                        window: self.window.clone(),
                        handle,
                        _callback: callback,
                    },
                );
            }
            Err(e) => log::error!("Failed to request animation frame: {:?}", e),
        }
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.frames.remove(&id);
    }

    fn create_surface(&mut self, viewport: &Viewport) {
        let (stage, canvas) = match self.build_stage(viewport) {
            Ok(parts) => parts,
            Err(e) => {
                log::error!("Failed to create stage: {:?}", e);
                return;
            }
        };
        self.physical = self.physical_size(viewport);
        canvas.set_width(self.physical.0);
        canvas.set_height(self.physical.1);

        let slot = self.backend.clone();
        let document = self.document.clone();
        let physical = self.physical;
        let ratio = self.pixel_ratio;
        wasm_bindgen_futures::spawn_local(async move {
            if let Some(backend) = create_backend(document, canvas, physical, ratio).await {
                *slot.borrow_mut() = Some(backend);
            }
        });

        self.stage = Some(stage);
        self.render_loop = Some(RenderLoop::start(self.window.clone(), self.engine.clone()));
        log::info!(
            "Surface created: {}x{} css, {}x{} physical",
            viewport.width,
            viewport.height,
            physical.0,
            physical.1
        );
    }

    fn resize_surface(&mut self, viewport: &Viewport) {
        self.physical = self.physical_size(viewport);
        if let Some(stage) = &self.stage {
            apply_style(
                stage,
                &[
                    ("width", format!("{}px", viewport.width).as_str()),
                    ("height", format!("{}px", viewport.height).as_str()),
                ],
            );
        }
    }

    fn release_surface(&mut self) {
        self.render_loop = None;
        // Orphan the slot so an in-flight backend init lands nowhere
        self.backend = Rc::new(RefCell::new(None));
        if let Some(stage) = self.stage.take() {
            stage.remove();
        }
        self.audio.close();
    }

    fn present(&mut self, frame: &RenderFrame) {
        if let Some(backend) = self.backend.borrow_mut().as_mut() {
            backend.draw(frame, self.physical);
        }
    }

    fn create_overlay(&mut self, kind: SceneKind) -> Box<dyn Overlay> {
        let parent: &web_sys::Element = match &self.stage {
            Some(stage) => stage,
            None => &self.container,
        };
        match DomOverlay::new(&self.document, parent, kind) {
            Ok(overlay) => Box::new(overlay),
            Err(e) => {
                log::error!("Failed to create {} overlay: {:?}", kind.as_str(), e);
                Box::new(NullOverlay)
            }
        }
    }

    fn intent_waker(&self) -> Box<dyn Fn()> {
        let engine = self.engine.clone();
        Box::new(move || dispatch(&engine, |e| e.process_intents()))
    }

    fn play_sound(&mut self, effect: SoundEffect, volume: f32) {
        self.audio.play(effect, volume);
    }

    fn spawn_local(&mut self, task: LocalFuture<()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        if let Some(stage) = self.stage.take() {
            stage.remove();
        }
    }
}

/// Stand-in when the DOM refuses to create an overlay
struct NullOverlay;

impl Overlay for NullOverlay {
    fn set_visible(&mut self, _visible: bool) {}
    fn set_text(&mut self, _slot: Slot, _text: &str) {}
    fn place(&mut self, _slot: Slot, _rect: Rect, _font_px: f32) {}
    fn on_click(&mut self, _slot: Slot, _handler: crate::scene::ClickHandler) {}
    fn release(&mut self) {}
}
