//! Title screen: start button, leaderboard button, who is playing

use std::rc::Rc;

use super::layout::{Rect, project_all};
use super::{Overlay, Scene, SceneActions, SceneKind, SceneView, Slot};
use crate::viewport::Viewport;

const TITLE: &str = "Coin Rush";

/// Design-space layout (800x600 reference)
const LAYOUT: [(Slot, Rect, f32); 5] = [
    (Slot::Title, Rect::new(100.0, 120.0, 600.0, 80.0), 56.0),
    (Slot::Subtitle, Rect::new(100.0, 210.0, 600.0, 30.0), 22.0),
    (Slot::Detail, Rect::new(100.0, 245.0, 600.0, 30.0), 18.0),
    (Slot::PrimaryButton, Rect::new(280.0, 320.0, 240.0, 64.0), 28.0),
    (Slot::SecondaryButton, Rect::new(280.0, 404.0, 240.0, 52.0), 22.0),
];

pub struct MenuScene {
    view: SceneView,
    player: Option<String>,
    best_score: Option<u32>,
}

impl MenuScene {
    pub fn new(overlay: Box<dyn Overlay>, viewport: Viewport, actions: Rc<dyn SceneActions>) -> Self {
        let mut view = SceneView::new(overlay, viewport);
        view.set_text(Slot::Title, TITLE);
        view.set_text(Slot::PrimaryButton, "Play");
        view.set_text(Slot::SecondaryButton, "Leaderboard");

        let start = actions.clone();
        view.overlay()
            .on_click(Slot::PrimaryButton, Box::new(move || start.on_start()));
        view.overlay().on_click(
            Slot::SecondaryButton,
            Box::new(move || actions.on_leaderboard_open()),
        );

        let mut scene = Self {
            view,
            player: None,
            best_score: None,
        };
        scene.on_resize(viewport);
        scene.view.set_visible(false);
        scene
    }

    /// Identity line ("not signed in" when None)
    pub fn set_player(&mut self, player: Option<String>) {
        self.player = player;
        self.refresh_text();
    }

    /// Best score currently on the leaderboard
    pub fn set_best_score(&mut self, best: Option<u32>) {
        self.best_score = best;
        self.refresh_text();
    }

    pub fn show(&mut self) {
        self.refresh_text();
        self.view.set_visible(true);
    }

    fn refresh_text(&mut self) {
        let who = match &self.player {
            Some(name) => format!("Playing as {}", name),
            None => "Not signed in".to_string(),
        };
        self.view.set_text(Slot::Subtitle, &who);
        let best = match self.best_score {
            Some(score) => format!("Top score: {}", score),
            None => String::new(),
        };
        self.view.set_text(Slot::Detail, &best);
    }
}

impl Scene for MenuScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Menu
    }

    fn hide(&mut self) {
        self.view.set_visible(false);
    }

    fn on_resize(&mut self, viewport: Viewport) {
        let widgets = project_all(&viewport, &LAYOUT);
        self.view.relayout(viewport, &widgets);
    }

    fn is_visible(&self) -> bool {
        self.view.is_visible()
    }

    fn layout_passes(&self) -> u32 {
        self.view.layout_passes()
    }

    fn release(&mut self) {
        self.view.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::HeadlessOverlay;
    use crate::scene::testing::CountingActions;

    fn menu() -> (MenuScene, HeadlessOverlay, Rc<CountingActions>) {
        let overlay = HeadlessOverlay::default();
        let actions = Rc::new(CountingActions::default());
        let scene = MenuScene::new(
            Box::new(overlay.clone()),
            Viewport::new(800, 600, (800, 600)),
            actions.clone(),
        );
        (scene, overlay, actions)
    }

    #[test]
    fn test_buttons_forward_intents() {
        let (_scene, overlay, actions) = menu();
        overlay.click(Slot::PrimaryButton);
        overlay.click(Slot::SecondaryButton);
        assert_eq!(actions.starts.get(), 1);
        assert_eq!(actions.leaderboard_opens.get(), 1);
        assert_eq!(actions.restarts.get(), 0);
    }

    #[test]
    fn test_identity_line() {
        let (mut scene, overlay, _) = menu();
        scene.show();
        assert!(overlay.is_visible());
        assert_eq!(overlay.text(Slot::Subtitle).as_deref(), Some("Not signed in"));
        scene.set_player(Some("Ada".into()));
        scene.set_best_score(Some(42));
        assert_eq!(overlay.text(Slot::Subtitle).as_deref(), Some("Playing as Ada"));
        assert_eq!(overlay.text(Slot::Detail).as_deref(), Some("Top score: 42"));
    }

    #[test]
    fn test_resize_rebuilds_layout() {
        let (mut scene, overlay, _) = menu();
        let before = scene.layout_passes();
        scene.on_resize(Viewport::new(1600, 1200, (800, 600)));
        assert_eq!(scene.layout_passes(), before + 1);
        let title = overlay.rect(Slot::Title).unwrap();
        assert_eq!(title, Rect::new(200.0, 240.0, 1200.0, 160.0));
    }

    #[test]
    fn test_release_is_final() {
        let (mut scene, overlay, actions) = menu();
        scene.release();
        scene.show();
        assert!(!scene.is_visible());
        overlay.click(Slot::PrimaryButton);
        assert_eq!(actions.starts.get(), 0);
        assert!(overlay.is_released());
    }
}
