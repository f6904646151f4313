//! Queue of user intents raised by scene buttons
//!
//! Scenes hold the queue as their `SceneActions`. Pushing never touches the
//! engine; the engine drains the queue in `process_intents` once the host's
//! waker has scheduled it.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::scene::SceneActions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    Restart,
    OpenLeaderboard,
}

pub struct IntentQueue {
    queue: RefCell<VecDeque<Intent>>,
    waker: Box<dyn Fn()>,
}

impl IntentQueue {
    pub fn new(waker: Box<dyn Fn()>) -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            waker,
        }
    }

    fn push(&self, intent: Intent) {
        self.queue.borrow_mut().push_back(intent);
        (self.waker)();
    }

    pub fn pop(&self) -> Option<Intent> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn clear(&self) {
        self.queue.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl SceneActions for IntentQueue {
    fn on_start(&self) {
        self.push(Intent::Start);
    }

    fn on_restart(&self) {
        self.push(Intent::Restart);
    }

    fn on_leaderboard_open(&self) {
        self.push(Intent::OpenLeaderboard);
    }
}
