//! Leaderboard and score submission
//!
//! The backend is external: the engine only talks to a `ScoreService`.
//! Failed submissions stay in a small retry queue and are resent ahead of
//! the next round's score.

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of unsent scores kept for retry
pub const MAX_PENDING_SCORES: usize = 8;

/// Single-threaded boxed future (everything runs on the browser event loop)
pub type LocalFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// Failures reported by the score backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("score rejected by server")]
    Rejected,
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One row as delivered by the backend (sorted descending by score)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub score: u32,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Network name -> profile URL
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
}

/// Entry with the rank shown to the player
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub rank: usize,
    pub entry: LeaderboardEntry,
}

/// Assign display ranks; tied scores share a rank and the next score
/// takes the following rank (50, 50, 30 -> 1, 1, 2)
pub fn rank_entries(entries: &[LeaderboardEntry]) -> Vec<RankedEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));

    let mut rank = 0;
    let mut last_score = None;
    sorted
        .into_iter()
        .map(|entry| {
            if last_score != Some(entry.score) {
                rank += 1;
                last_score = Some(entry.score);
            }
            RankedEntry { rank, entry }
        })
        .collect()
}

/// Last leaderboard snapshot fetched from the backend
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.score).max()
    }

    pub fn ranked(&self) -> Vec<RankedEntry> {
        rank_entries(&self.entries)
    }

    /// Rank a score would be displayed at, using the same tie rule as
    /// `rank_entries` (None for a zero score)
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let mut better: Vec<u32> = self
            .entries
            .iter()
            .map(|e| e.score)
            .filter(|s| *s > score)
            .collect();
        better.sort_unstable();
        better.dedup();
        Some(better.len() + 1)
    }
}

/// External collaborator providing identity and score persistence
pub trait ScoreService {
    /// Display name of the signed-in viewer, None when signed out
    fn current_player(&self) -> Option<String>;
    fn submit_score(&self, score: u32) -> LocalFuture<Result<(), ServiceError>>;
    fn fetch_leaderboard(&self) -> LocalFuture<Result<Vec<LeaderboardEntry>, ServiceError>>;
}

/// Submits one score per round and keeps the leaderboard cache fresh
pub struct ScoreReporter {
    service: Rc<dyn ScoreService>,
    last_round: Option<u64>,
    pending: Rc<RefCell<VecDeque<u32>>>,
    board: Rc<RefCell<Leaderboard>>,
}

impl ScoreReporter {
    pub fn new(service: Rc<dyn ScoreService>) -> Self {
        Self {
            service,
            last_round: None,
            pending: Rc::new(RefCell::new(VecDeque::new())),
            board: Rc::new(RefCell::new(Leaderboard::new())),
        }
    }

    pub fn player_name(&self) -> Option<String> {
        self.service.current_player()
    }

    pub fn board(&self) -> Ref<'_, Leaderboard> {
        self.board.borrow()
    }

    /// Scores waiting for a retry, oldest first
    pub fn pending(&self) -> Vec<u32> {
        self.pending.borrow().iter().copied().collect()
    }

    /// Task that submits `score` for `round`, or None if this round was
    /// already reported or nobody is signed in
    pub fn submit(&mut self, round: u64, score: u32) -> Option<LocalFuture<()>> {
        if self.last_round == Some(round) {
            log::debug!("Round {} already submitted", round);
            return None;
        }
        self.last_round = Some(round);

        if self.service.current_player().is_none() {
            log::info!("Not signed in, score {} not submitted", score);
            return None;
        }

        let service = self.service.clone();
        let pending = self.pending.clone();
        let board = self.board.clone();
        Some(Box::pin(async move {
            let mut batch: Vec<u32> = pending.borrow_mut().drain(..).collect();
            batch.push(score);

            for score in batch {
                match service.submit_score(score).await {
                    Ok(()) => log::info!("Score {} submitted", score),
                    Err(e) => {
                        log::warn!("Score {} not submitted ({}), queued for retry", score, e);
                        let mut queue = pending.borrow_mut();
                        if queue.len() >= MAX_PENDING_SCORES {
                            if let Some(dropped) = queue.pop_front() {
                                log::warn!("Retry queue full, dropping score {}", dropped);
                            }
                        }
                        queue.push_back(score);
                    }
                }
            }

            refresh_into(service.as_ref(), &board).await;
        }))
    }

    /// Task that refetches the leaderboard into the cache
    pub fn refresh(&self) -> LocalFuture<()> {
        let service = self.service.clone();
        let board = self.board.clone();
        Box::pin(async move {
            refresh_into(service.as_ref(), &board).await;
        })
    }
}

/// Fetch and replace the cache; on failure the stale snapshot is kept
async fn refresh_into(service: &dyn ScoreService, board: &RefCell<Leaderboard>) {
    match service.fetch_leaderboard().await {
        Ok(entries) => {
            log::debug!("Leaderboard refreshed ({} entries)", entries.len());
            board.borrow_mut().entries = entries;
        }
        Err(e) => log::warn!("Leaderboard fetch failed, keeping cached data: {}", e),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use proptest::prelude::*;
    use std::task::{Context, Poll, Waker};

    /// Drive a future that never actually waits
    pub(crate) fn block_on<F: Future>(fut: F) -> F::Output {
        let mut fut = std::pin::pin!(fut);
        let mut cx = Context::from_waker(Waker::noop());
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(out) => out,
            Poll::Pending => panic!("future unexpectedly pending"),
        }
    }

    /// In-memory backend with a switchable network
    #[derive(Default)]
    pub(crate) struct StubService {
        pub player: Option<String>,
        pub online: Cell<bool>,
        pub submitted: RefCell<Vec<u32>>,
        pub board: RefCell<Vec<LeaderboardEntry>>,
    }

    impl StubService {
        pub(crate) fn signed_in() -> Self {
            Self {
                player: Some("Ada".into()),
                online: Cell::new(true),
                ..Default::default()
            }
        }
    }

    impl ScoreService for StubService {
        fn current_player(&self) -> Option<String> {
            self.player.clone()
        }

        fn submit_score(&self, score: u32) -> LocalFuture<Result<(), ServiceError>> {
            let result = if self.online.get() {
                self.submitted.borrow_mut().push(score);
                self.board.borrow_mut().push(entry("Ada", score));
                Ok(())
            } else {
                Err(ServiceError::Network("offline".into()))
            };
            Box::pin(std::future::ready(result))
        }

        fn fetch_leaderboard(&self) -> LocalFuture<Result<Vec<LeaderboardEntry>, ServiceError>> {
            let result = if self.online.get() {
                Ok(self.board.borrow().clone())
            } else {
                Err(ServiceError::Network("offline".into()))
            };
            Box::pin(std::future::ready(result))
        }
    }

    pub(crate) fn entry(name: &str, score: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            display_name: name.into(),
            score,
            rank: None,
            user_id: None,
            avatar_url: None,
            social_links: BTreeMap::new(),
        }
    }

    #[test]
    fn test_tied_scores_share_rank() {
        let entries = vec![entry("a", 50), entry("b", 50), entry("c", 30)];
        let ranks: Vec<usize> = rank_entries(&entries).iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 1, 2]);
    }

    #[test]
    fn test_potential_rank_matches_display_rule() {
        let board = Leaderboard {
            entries: vec![entry("a", 50), entry("b", 50), entry("c", 30)],
        };
        assert_eq!(board.potential_rank(60), Some(1));
        assert_eq!(board.potential_rank(50), Some(1));
        assert_eq!(board.potential_rank(40), Some(2));
        assert_eq!(board.potential_rank(10), Some(3));
        assert_eq!(board.potential_rank(0), None);
        assert_eq!(board.top_score(), Some(50));
    }

    #[test]
    fn test_entry_parses_backend_json() {
        let json = r#"[{"displayName":"Ada","score":12,"rank":1,"userId":"u1",
            "avatarUrl":"https://cdn/a.png","socialLinks":{"github":"https://gh/ada"}},
            {"displayName":"Bob","score":9}]"#;
        let entries: Vec<LeaderboardEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].user_id.as_deref(), Some("u1"));
        assert_eq!(entries[0].social_links.len(), 1);
        assert_eq!(entries[1].rank, None);
    }

    #[test]
    fn test_submit_once_per_round() {
        let service = Rc::new(StubService::signed_in());
        let mut reporter = ScoreReporter::new(service.clone());

        let task = reporter.submit(1, 12).expect("first submission");
        block_on(task);
        assert!(reporter.submit(1, 12).is_none());
        assert_eq!(*service.submitted.borrow(), vec![12]);
        assert_eq!(reporter.board().top_score(), Some(12));
    }

    #[test]
    fn test_failed_submission_is_retried_next_round() {
        let service = Rc::new(StubService::signed_in());
        let mut reporter = ScoreReporter::new(service.clone());

        service.online.set(false);
        block_on(reporter.submit(1, 7).unwrap());
        assert_eq!(reporter.pending(), vec![7]);

        service.online.set(true);
        block_on(reporter.submit(2, 9).unwrap());
        assert!(reporter.pending().is_empty());
        assert_eq!(*service.submitted.borrow(), vec![7, 9]);
    }

    #[test]
    fn test_retry_queue_is_bounded() {
        let service = Rc::new(StubService::signed_in());
        let mut reporter = ScoreReporter::new(service.clone());
        service.online.set(false);
        for round in 0..(MAX_PENDING_SCORES as u64 + 3) {
            block_on(reporter.submit(round, round as u32).unwrap());
        }
        let pending = reporter.pending();
        assert_eq!(pending.len(), MAX_PENDING_SCORES);
        assert_eq!(*pending.last().unwrap(), MAX_PENDING_SCORES as u32 + 2);
    }

    #[test]
    fn test_signed_out_skips_submission() {
        let service = Rc::new(StubService {
            online: Cell::new(true),
            ..Default::default()
        });
        let mut reporter = ScoreReporter::new(service.clone());
        assert!(reporter.submit(1, 5).is_none());
        assert!(service.submitted.borrow().is_empty());
    }

    #[test]
    fn test_failed_refresh_keeps_stale_board() {
        let service = Rc::new(StubService::signed_in());
        service.board.borrow_mut().push(entry("Bob", 40));
        let reporter = ScoreReporter::new(service.clone());
        block_on(reporter.refresh());
        assert_eq!(reporter.board().top_score(), Some(40));

        service.online.set(false);
        block_on(reporter.refresh());
        assert_eq!(reporter.board().top_score(), Some(40));
    }

    proptest! {
        #[test]
        fn prop_ranks_are_dense(scores in prop::collection::vec(0u32..100, 0..20)) {
            let entries: Vec<_> = scores.iter().map(|s| entry("p", *s)).collect();
            let ranked = rank_entries(&entries);
            let board = Leaderboard { entries };
            for pair in ranked.windows(2) {
                let step = pair[1].rank - pair[0].rank;
                prop_assert!(pair[0].entry.score >= pair[1].entry.score);
                prop_assert_eq!(step, usize::from(pair[0].entry.score != pair[1].entry.score));
            }
            for r in ranked.iter().filter(|r| r.entry.score > 0) {
                prop_assert_eq!(board.potential_rank(r.entry.score), Some(r.rank));
            }
        }
    }
}
