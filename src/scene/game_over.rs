//! Game over screen
//!
//! The final score arrives as a `show` parameter, so this scene never reads
//! live round state.

use std::rc::Rc;

use super::layout::{Rect, project_all};
use super::{Overlay, Scene, SceneActions, SceneKind, SceneView, Slot};
use crate::viewport::Viewport;

const LAYOUT: [(Slot, Rect, f32); 5] = [
    (Slot::Title, Rect::new(100.0, 110.0, 600.0, 80.0), 56.0),
    (Slot::Detail, Rect::new(100.0, 200.0, 600.0, 50.0), 36.0),
    (Slot::Subtitle, Rect::new(100.0, 255.0, 600.0, 30.0), 20.0),
    (Slot::PrimaryButton, Rect::new(280.0, 320.0, 240.0, 64.0), 28.0),
    (Slot::SecondaryButton, Rect::new(280.0, 404.0, 240.0, 52.0), 22.0),
];

pub struct GameOverScene {
    view: SceneView,
    final_score: Option<u32>,
}

impl GameOverScene {
    pub fn new(overlay: Box<dyn Overlay>, viewport: Viewport, actions: Rc<dyn SceneActions>) -> Self {
        let mut view = SceneView::new(overlay, viewport);
        view.set_text(Slot::Title, "Game Over");
        view.set_text(Slot::PrimaryButton, "Play again");
        view.set_text(Slot::SecondaryButton, "Leaderboard");

        let restart = actions.clone();
        view.overlay()
            .on_click(Slot::PrimaryButton, Box::new(move || restart.on_restart()));
        view.overlay().on_click(
            Slot::SecondaryButton,
            Box::new(move || actions.on_leaderboard_open()),
        );

        let mut scene = Self {
            view,
            final_score: None,
        };
        scene.on_resize(viewport);
        scene.view.set_visible(false);
        scene
    }

    pub fn show(&mut self, score: u32) {
        self.final_score = Some(score);
        self.view.set_text(Slot::Detail, &format!("Score: {}", score));
        self.view.set_text(Slot::Subtitle, "");
        self.view.set_visible(true);
    }

    /// Where the score would land on the leaderboard
    pub fn set_rank_hint(&mut self, rank: Option<usize>) {
        let text = match rank {
            Some(rank) => format!("Leaderboard rank #{}", rank),
            None => String::new(),
        };
        self.view.set_text(Slot::Subtitle, &text);
    }

    pub fn final_score(&self) -> Option<u32> {
        self.final_score
    }
}

impl Scene for GameOverScene {
    fn kind(&self) -> SceneKind {
        SceneKind::GameOver
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
