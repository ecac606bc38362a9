use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::api::{GameApi, RequestError};
use crate::domain::Game;

const LOG_TARGET: &str = "seat_trap::store";

pub type Shared<T> = Arc<T>;

/// The single local copy of the authoritative game.
///
/// Writes are unconditional last-write-wins: there is no version to compare,
/// so whichever snapshot is applied last is current. Every applied snapshot is
/// published to subscribers.
#[derive(Debug)]
pub struct StateStore {
    current: Option<Shared<Game>>,
    revision: u64,
    notify: watch::Sender<Option<Shared<Game>>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(None);
        Self {
            current: None,
            revision: 0,
            notify,
        }
    }

    /// One-shot pull of `game_id`. A failed pull leaves the store as it was.
    pub async fn initialize(
        &mut self,
        api: &dyn GameApi,
        game_id: &str,
    ) -> Result<Shared<Game>, RequestError> {
        let game = api.fetch_game(game_id).await?;
        let game = self.replace(game);
        info!(target: LOG_TARGET, game_id, revision = self.revision, "store initialized");
        Ok(game)
    }

    /// Overwrite the held snapshot wholesale.
    pub fn replace(&mut self, game: Game) -> Shared<Game> {
        let game = Arc::new(game);
        self.current = Some(Arc::clone(&game));
        self.revision += 1;
        self.notify.send_replace(Some(Arc::clone(&game)));
        debug!(
            target: LOG_TARGET,
            game_id = %game.id,
            status = ?game.status,
            revision = self.revision,
            "snapshot replaced"
        );
        game
    }

    pub fn current(&self) -> Option<Shared<Game>> {
        self.current.clone()
    }

    /// Number of snapshots applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Shared<Game>>> {
        self.notify.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Operation;
    use crate::domain::GameStatus;
    use crate::engine::{classify, scoreboard, seat_layout};
    use crate::test_utils::{ApiCall, GameBuilder, MockGameApi};

    #[test]
    fn replacing_twice_with_the_same_snapshot_is_idempotent() {
        let game = GameBuilder::new("g", "p1", "p2").build();

        let mut once = StateStore::new();
        once.replace(game.clone());

        let mut twice = StateStore::new();
        twice.replace(game.clone());
        twice.replace(game);

        assert_eq!(once.current(), twice.current());
        assert_eq!(twice.revision(), 2);
    }

    #[test]
    fn replace_overwrites_without_merging() {
        let mut store = StateStore::new();
        store.replace(
            GameBuilder::new("g", "p1", "p2")
                .trap(4)
                .score("p1", 3, 1)
                .build(),
        );
        let later = GameBuilder::new("g", "p1", "p2")
            .status(GameStatus::SettingTrap)
            .seats(&[1, 2])
            .build();
        store.replace(later.clone());

        let current = store.current().unwrap();
        assert_eq!(*current, later);
        assert!(current.trap.is_none());
    }

    #[tokio::test]
    async fn initialize_then_identical_push_leaves_derivations_unchanged() {
        let game = GameBuilder::new("g", "p1", "p2")
            .status(GameStatus::SettingTrap)
            .score("p2", 5, 2)
            .build();
        let api = MockGameApi::new().with_game(game.clone());
        let mut store = StateStore::new();

        let first = store.initialize(&api, "g").await.unwrap();
        let turn = classify(&first, "p1");
        let board = scoreboard(&first, "p1");
        let layout = seat_layout(&first.available_seats, 120.0);

        let pushed = store.replace(game);
        assert_eq!(classify(&pushed, "p1"), turn);
        assert_eq!(scoreboard(&pushed, "p1"), board);
        assert_eq!(seat_layout(&pushed.available_seats, 120.0), layout);
        assert_eq!(api.calls(), vec![ApiCall::Fetch("g".into())]);
    }

    #[tokio::test]
    async fn failed_initialize_leaves_store_untouched() {
        let api = MockGameApi::new().with_game(GameBuilder::new("g", "p1", "p2").build());
        api.fail(Operation::FetchGame);
        let mut store = StateStore::new();

        let err = store.initialize(&api, "g").await.unwrap_err();
        assert_eq!(err.operation(), Operation::FetchGame);
        assert!(store.current().is_none());
        assert_eq!(store.revision(), 0);
    }

    #[tokio::test]
    async fn subscribers_see_every_replace() {
        let mut store = StateStore::new();
        let mut rx = store.subscribe();
        assert!(rx.borrow().is_none());

        store.replace(GameBuilder::new("g", "p1", "p2").build());
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|g| g.status),
            Some(GameStatus::InProgress)
        );

        store.replace(
            GameBuilder::new("g", "p1", "p2")
                .status(GameStatus::Finished)
                .build(),
        );
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow().as_ref().map(|g| g.status),
            Some(GameStatus::Finished)
        );
    }
}
