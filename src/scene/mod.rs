//! Scene renderers (menu, play, game over)
//!
//! Scenes are reactive views. They never touch the engine's state; they
//! mirror what the engine tells them and forward button presses through
//! `SceneActions`. Each scene draws its widgets into an `Overlay`, the
//! platform's visual tree (DOM on the web, a recorder when headless).

pub mod game_over;
pub mod layout;
pub mod menu;
pub mod play;

pub use game_over::GameOverScene;
pub use layout::Rect;
pub use menu::MenuScene;
pub use play::{Burst, CoinSprite, PlayScene};

use crate::viewport::Viewport;

/// Identifies a scene (and the overlay created for it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKind {
    Menu,
    Play,
    GameOver,
}

impl SceneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneKind::Menu => "menu",
            SceneKind::Play => "play",
            SceneKind::GameOver => "game-over",
        }
    }
}

/// Widget positions inside an overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Title,
    Subtitle,
    Detail,
    PrimaryButton,
    SecondaryButton,
    Score,
    Clock,
    Lives,
}

impl Slot {
    pub fn is_button(&self) -> bool {
        matches!(self, Slot::PrimaryButton | Slot::SecondaryButton)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Title => "title",
            Slot::Subtitle => "subtitle",
            Slot::Detail => "detail",
            Slot::PrimaryButton => "primary",
            Slot::SecondaryButton => "secondary",
            Slot::Score => "score",
            Slot::Clock => "clock",
            Slot::Lives => "lives",
        }
    }
}

/// User intents scenes can raise
pub trait SceneActions {
    fn on_start(&self);
    fn on_restart(&self);
    fn on_leaderboard_open(&self);
}

pub type ClickHandler = Box<dyn FnMut()>;

/// A scene's visual tree
pub trait Overlay {
    fn set_visible(&mut self, visible: bool);
    fn set_text(&mut self, slot: Slot, text: &str);
    /// Position a widget (CSS pixels) with a font size
    fn place(&mut self, slot: Slot, rect: Rect, font_px: f32);
    fn on_click(&mut self, slot: Slot, handler: ClickHandler);
    /// Remove every widget and listener; the overlay is unusable afterwards
    fn release(&mut self);
}

/// Operations common to all scenes
pub trait Scene {
    fn kind(&self) -> SceneKind;
    fn hide(&mut self);
    /// Rebuild the layout for a new viewport
    fn on_resize(&mut self, viewport: Viewport);
    fn is_visible(&self) -> bool;
    /// Number of layout rebuilds so far
    fn layout_passes(&self) -> u32;
    fn release(&mut self);
}

/// Overlay plus the bookkeeping every scene needs
pub(crate) struct SceneView {
    overlay: Box<dyn Overlay>,
    visible: bool,
    viewport: Viewport,
    layout_passes: u32,
    released: bool,
}

impl SceneView {
    pub(crate) fn new(overlay: Box<dyn Overlay>, viewport: Viewport) -> Self {
        Self {
            overlay,
            visible: false,
            viewport,
            layout_passes: 0,
            released: false,
        }
    }

    pub(crate) fn overlay(&mut self) -> &mut dyn Overlay {
        self.overlay.as_mut()
    }

    pub(crate) fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        if self.released {
            return;
        }
        self.visible = visible;
        self.overlay.set_visible(visible);
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_text(&mut self, slot: Slot, text: &str) {
        if !self.released {
            self.overlay.set_text(slot, text);
        }
    }

    /// Store the viewport and place each widget; returns false once released
    pub(crate) fn relayout(&mut self, viewport: Viewport, widgets: &[(Slot, Rect, f32)]) -> bool {
        if self.released {
            return false;
        }
        self.viewport = viewport;
        for (slot, rect, font_px) in widgets {
            self.overlay.place(*slot, *rect, *font_px);
        }
        self.layout_passes += 1;
        true
    }

    pub(crate) fn layout_passes(&self) -> u32 {
        self.layout_passes
    }

    pub(crate) fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.visible = false;
        self.overlay.release();
    }
}

/// The three scenes owned by the engine
pub struct SceneSet {
    pub menu: MenuScene,
    pub play: PlayScene,
    pub game_over: GameOverScene,
}

impl SceneSet {
    pub fn all_mut(&mut self) -> [&mut dyn Scene; 3] {
        [&mut self.menu, &mut self.play, &mut self.game_over]
    }

    /// Kind of the scene currently on screen
    pub fn visible(&self) -> Option<SceneKind> {
        if self.menu.is_visible() {
            Some(SceneKind::Menu)
        } else if self.play.is_visible() {
            Some(SceneKind::Play)
        } else if self.game_over.is_visible() {
            Some(SceneKind::GameOver)
        } else {
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Action double shared by scene and engine tests

    use std::cell::Cell;

    use super::SceneActions;

    /// Counts intents raised by scenes
    #[derive(Default)]
    pub(crate) struct CountingActions {
        pub starts: Cell<u32>,
        pub restarts: Cell<u32>,
        pub leaderboard_opens: Cell<u32>,
    }

    impl SceneActions for CountingActions {
        fn on_start(&self) {
            self.starts.set(self.starts.get() + 1);
        }

        fn on_restart(&self) {
            self.restarts.set(self.restarts.get() + 1);
        }

        fn on_leaderboard_open(&self) {
            self.leaderboard_opens.set(self.leaderboard_opens.get() + 1);
        }
    }
}
